//! Process-local state store
//!
//! Used for tests and for dry deployments where losing state on restart is
//! acceptable. Semantics match the PostgreSQL store.

use super::traits::StateStore;
use crate::domain::ids::MeasurementRef;
use crate::domain::state::watermark_overlap;
use crate::domain::{
    ExportState, ExportStatus, MeasurementTotals, Result, RunOverview, RunStatus, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    measurements: HashMap<MeasurementRef, ExportState>,
    runs: Vec<RunStatus>,
}

/// In-memory implementation of [`StateStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("state lock poisoned: {e}")).into())
    }

    /// Insert or replace a row as-is, keeping its timestamps
    ///
    /// Lets callers seed aged rows.
    pub fn insert(&self, state: ExportState) -> Result<()> {
        let mut tables = self.lock()?;
        tables.measurements.insert(state.measurement.clone(), state);
        Ok(())
    }

    /// Every run row, oldest first
    pub fn runs(&self) -> Result<Vec<RunStatus>> {
        Ok(self.lock()?.runs.clone())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn find_or_create(
        &self,
        measurement: &MeasurementRef,
        patient: Option<&str>,
    ) -> Result<ExportState> {
        let mut tables = self.lock()?;
        let state = tables
            .measurements
            .entry(measurement.clone())
            .or_insert_with(|| {
                tracing::debug!(measurement = %measurement, "Creating export state");
                ExportState::new(measurement.clone(), patient.map(str::to_string))
            });
        Ok(state.clone())
    }

    async fn update(&self, state: &ExportState) -> Result<ExportState> {
        if state.id.is_nil() {
            return Err(StoreError::InvalidState("state id is empty".to_string()).into());
        }

        let mut tables = self.lock()?;
        let stored = tables
            .measurements
            .get_mut(&state.measurement)
            .filter(|stored| stored.id == state.id)
            .ok_or_else(|| StoreError::NotFound(state.measurement.to_string()))?;

        stored.status = state.status;
        stored.patient = state.patient.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn find_by_status(&self, status: ExportStatus) -> Result<Vec<ExportState>> {
        let tables = self.lock()?;
        let mut rows: Vec<ExportState> = tables
            .measurements
            .values()
            .filter(|state| state.status == status)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn find_by_ref(&self, measurement: &MeasurementRef) -> Result<Option<ExportState>> {
        Ok(self.lock()?.measurements.get(measurement).cloned())
    }

    async fn start_run(&self, start: DateTime<Utc>) -> Result<RunStatus> {
        let mut tables = self.lock()?;

        let latest_completed = tables
            .runs
            .iter()
            .filter(|run| run.status == ExportStatus::Completed)
            .map(|run| run.lastrun)
            .max();

        let watermark = match latest_completed {
            Some(lastrun) => lastrun - watermark_overlap(),
            None => {
                tracing::warn!(start = %start, "No completed run found, exporting from start date");
                let mut seed = RunStatus::new(start, ExportStatus::Completed);
                seed.created_at = start;
                seed.updated_at = start;
                tables.runs.push(seed);
                start
            }
        };

        let run = RunStatus::new(Utc::now(), ExportStatus::Initial);
        tables.runs.push(run.clone());

        Ok(RunStatus {
            lastrun: watermark,
            ..run
        })
    }

    async fn update_run(&self, run: &RunStatus) -> Result<RunStatus> {
        let mut tables = self.lock()?;
        let stored = tables
            .runs
            .iter_mut()
            .find(|stored| stored.id == run.id)
            .ok_or_else(|| StoreError::NotFound(format!("run {}", run.id)))?;

        stored.status = run.status;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn totals(&self) -> Result<MeasurementTotals> {
        let tables = self.lock()?;
        let mut totals = MeasurementTotals::default();
        for state in tables.measurements.values() {
            totals.total += 1;
            match state.status {
                ExportStatus::Completed => totals.completed += 1,
                ExportStatus::Failed => totals.failed += 1,
                ExportStatus::TempFailure => totals.temp_failed += 1,
                ExportStatus::NoExport => totals.rejected += 1,
                ExportStatus::Initial | ExportStatus::Created => {}
            }
        }
        Ok(totals)
    }

    async fn run_overview(&self) -> Result<RunOverview> {
        let tables = self.lock()?;
        let latest = tables.runs.iter().max_by_key(|run| run.created_at);

        Ok(RunOverview {
            last_run: latest.map(|run| run.lastrun),
            last_status: latest.map(|run| run.status),
            total: tables.runs.len() as u64,
            completed: count_runs(&tables.runs, ExportStatus::Completed),
            failed: count_runs(&tables.runs, ExportStatus::Failed),
        })
    }

    async fn health_check(&self) -> Result<()> {
        self.lock().map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn count_runs(runs: &[RunStatus], status: ExportStatus) -> u64 {
    runs.iter().filter(|run| run.status == status).count() as u64
}
