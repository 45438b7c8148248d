//! Measurement source adapter
//!
//! The source is a paginated REST API listing home measurements. Items link
//! to their patient and to their own canonical URL.

pub mod client;
pub mod models;

pub use client::ClinicianClient;
pub use models::{MeasurementPage, PageLinks};

use crate::domain::ids::{MeasurementRef, PatientRef};
use crate::domain::{Measurement, Patient, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read access to measurements and patients
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Fetch one page of measurements recorded at or after `since`
    ///
    /// Implementations may widen the window backwards to catch late arrivals.
    async fn fetch_measurements(&self, since: DateTime<Utc>, offset: usize)
        -> Result<MeasurementPage>;

    /// Fetch a single measurement by its canonical link
    async fn fetch_measurement(&self, reference: &MeasurementRef) -> Result<Measurement>;

    /// Fetch a patient by link
    async fn fetch_patient(&self, reference: &PatientRef) -> Result<Patient>;

    /// Probe the source health endpoint
    async fn check_health(&self) -> Result<()>;

    /// Configured page size
    fn page_size(&self) -> usize;

    /// Base URL, for logs and status output
    fn endpoint(&self) -> &str;
}
