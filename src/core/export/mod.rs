//! Export orchestration
//!
//! - [`coordinator`] drives runs, retries and ageing
//! - [`outcome`] types the result of each measurement
//! - [`summary`] aggregates a run

pub mod coordinator;
pub mod outcome;
pub mod summary;

pub use coordinator::{
    CoordinatorSettings, EndpointHealth, ExportCoordinator, HealthIssue, MeasurementLookup,
    Overview,
};
pub use outcome::{ExportOutcome, FailureCategory, MeasurementFailure, MeasurementReport};
pub use summary::{RetryReport, RunReport, RunSummary};
