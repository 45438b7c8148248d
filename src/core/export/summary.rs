//! Run summaries

use super::outcome::{ExportOutcome, MeasurementReport};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Counters for one orchestration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,

    /// Measurements acted on in this run: exported, rejected or failed
    ///
    /// Rows already in a terminal state are counted in `handled` only.
    pub total: usize,

    pub exported: usize,

    /// Ineligible types moved to `NO_EXPORT`
    pub rejected: usize,

    pub failed: usize,

    /// Already terminal, skipped
    pub handled: usize,

    /// Source pages fetched
    pub iterations: usize,

    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            ..Default::default()
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Count one measurement
    pub fn record(&mut self, report: &MeasurementReport) {
        match &report.result {
            Ok(ExportOutcome::Exported) => self.exported += 1,
            Ok(ExportOutcome::Rejected) => self.rejected += 1,
            Ok(ExportOutcome::Handled) => self.handled += 1,
            Err(_) => self.failed += 1,
        }
        self.total = self.exported + self.rejected + self.failed;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn log(&self) {
        tracing::info!(
            run_id = %self.run_id,
            total = self.total,
            exported = self.exported,
            rejected = self.rejected,
            failed = self.failed,
            handled = self.handled,
            iterations = self.iterations,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "Export run completed"
        );
    }
}

/// Summary plus per-item detail of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub outcomes: Vec<MeasurementReport>,
}

/// Result of retrying the `TEMP_FAILURE` pool
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryReport {
    pub retried: usize,
    pub exported: usize,
    pub failed: usize,

    /// Rows moved to `FAILED` by the ageing pass
    pub aged: usize,

    pub outcomes: Vec<MeasurementReport>,
}

impl RetryReport {
    pub fn is_empty(&self) -> bool {
        self.retried == 0
    }

    pub fn push(&mut self, report: MeasurementReport) {
        self.retried += 1;
        match report.result {
            Ok(ExportOutcome::Exported) => self.exported += 1,
            Ok(_) => {}
            Err(_) => self.failed += 1,
        }
        self.outcomes.push(report);
    }
}
