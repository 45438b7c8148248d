//! Durable export bookkeeping records

use crate::domain::ids::MeasurementRef;
use crate::domain::status::ExportStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Export state of a single source measurement
///
/// One row exists per measurement reference. Rows are mutated in place and
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportState {
    /// Generated identifier, also used as the downstream record id
    pub id: Uuid,

    /// Source measurement reference, unique
    pub measurement: MeasurementRef,

    /// Linked patient reference
    pub patient: Option<String>,

    /// Current status
    pub status: ExportStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ExportState {
    /// Fresh `INITIAL` state for a measurement seen for the first time
    pub fn new(measurement: MeasurementRef, patient: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            measurement,
            patient,
            status: ExportStatus::Initial,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whole hours elapsed since the row was created
    pub fn age_hours(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_hours()
    }

    /// Whether a `TEMP_FAILURE` row has outlived its retry window
    pub fn retry_window_expired(&self, retry_days: u32, now: DateTime<Utc>) -> bool {
        self.status == ExportStatus::TempFailure
            && self.age_hours(now) > i64::from(retry_days) * 24
    }
}

/// One orchestration run
///
/// `lastrun` is the watermark the run exports from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub id: Uuid,

    /// Watermark timestamp
    pub lastrun: DateTime<Utc>,

    pub status: ExportStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl RunStatus {
    /// New run record with the given watermark and status
    pub fn new(lastrun: DateTime<Utc>, status: ExportStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            lastrun,
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Safety overlap subtracted from the previous watermark
pub fn watermark_overlap() -> Duration {
    Duration::minutes(30)
}

/// Aggregate measurement counts for the status surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementTotals {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub temp_failed: u64,
    pub rejected: u64,
}

/// Aggregate run history for the status surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOverview {
    pub last_run: Option<DateTime<Utc>>,
    pub last_status: Option<ExportStatus>,
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_created(hours_ago: i64, status: ExportStatus) -> ExportState {
        let mut state = ExportState::new(MeasurementRef::new("m-1").unwrap(), None);
        state.created_at = Utc::now() - Duration::hours(hours_ago);
        state.status = status;
        state
    }

    #[test]
    fn test_new_state_is_initial() {
        let state = ExportState::new(MeasurementRef::new("m-1").unwrap(), Some("p-1".into()));
        assert_eq!(state.status, ExportStatus::Initial);
        assert_eq!(state.created_at, state.updated_at);
    }

    #[test]
    fn test_retry_window_expired_after_retry_days() {
        let now = Utc::now();
        assert!(state_created(8 * 24, ExportStatus::TempFailure).retry_window_expired(7, now));
        assert!(!state_created(6 * 24, ExportStatus::TempFailure).retry_window_expired(7, now));
    }

    #[test]
    fn test_retry_window_requires_temp_failure() {
        let now = Utc::now();
        assert!(!state_created(30 * 24, ExportStatus::Completed).retry_window_expired(7, now));
    }

    #[test]
    fn test_retry_window_boundary_is_exclusive() {
        let now = Utc::now();
        let state = state_created(7 * 24, ExportStatus::TempFailure);
        assert!(!state.retry_window_expired(7, now));
    }
}
