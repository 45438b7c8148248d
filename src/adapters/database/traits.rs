//! State store abstraction
//!
//! The store keeps one export state row per source measurement and an
//! append-only history of orchestration runs.

use crate::domain::ids::MeasurementRef;
use crate::domain::{ExportState, ExportStatus, MeasurementTotals, Result, RunOverview, RunStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable export bookkeeping
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Return the state row for a measurement, creating an `INITIAL` row if absent
    ///
    /// Concurrent callers with the same reference observe the same row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` when the store cannot be reached.
    async fn find_or_create(
        &self,
        measurement: &MeasurementRef,
        patient: Option<&str>,
    ) -> Result<ExportState>;

    /// Persist the status of a state row, stamping `updated_at`
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidState` for a nil id, `StoreError::NotFound` when
    /// the row is gone, `StoreError::Unavailable` on connection loss.
    async fn update(&self, state: &ExportState) -> Result<ExportState>;

    /// All rows with the given status, empty when none match
    async fn find_by_status(&self, status: ExportStatus) -> Result<Vec<ExportState>>;

    /// Row for a measurement reference, if one exists
    async fn find_by_ref(&self, measurement: &MeasurementRef) -> Result<Option<ExportState>>;

    /// Record the start of a run and compute its watermark
    ///
    /// Without a prior completed run a synthetic completed run anchored at
    /// `start` is inserted and `start` is the watermark. Otherwise the
    /// watermark is the latest completed run's `lastrun` minus
    /// [`watermark_overlap`](crate::domain::state::watermark_overlap).
    ///
    /// A new `INITIAL` row stamped with the current time is persisted. The
    /// returned run carries that row's id with `lastrun` set to the watermark.
    async fn start_run(&self, start: DateTime<Utc>) -> Result<RunStatus>;

    /// Persist the status of a run, stamping `updated_at`
    async fn update_run(&self, run: &RunStatus) -> Result<RunStatus>;

    /// Row counts per status
    async fn totals(&self) -> Result<MeasurementTotals>;

    /// Latest run and run counts
    async fn run_overview(&self) -> Result<RunOverview>;

    /// Liveness probe
    async fn health_check(&self) -> Result<()>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
