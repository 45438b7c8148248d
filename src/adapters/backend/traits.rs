//! Export backend trait

use crate::domain::{ExportState, Measurement, Result};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// A converted document ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPayload {
    /// Identifier of the document, equal to the export state id
    pub document_id: Uuid,

    /// Wire body as posted downstream
    pub body: serde_json::Value,
}

/// Downstream clinical document backend
///
/// Implementations decide which measurement types they accept, turn a
/// measurement into their wire payload and post it.
#[async_trait]
pub trait ExportBackend: Send + Sync {
    /// Whether the measurement's type is registered and marked for export
    fn should_export(&self, measurement: &Measurement) -> bool;

    /// Build the payload for one measurement
    ///
    /// # Errors
    ///
    /// [`crate::domain::MappingError`] when the value does not fit its type,
    /// or a source error when patient data cannot be fetched.
    async fn convert(&self, measurement: &Measurement, state: &ExportState)
        -> Result<ExportPayload>;

    /// Post a payload downstream
    ///
    /// # Errors
    ///
    /// [`crate::domain::DeliveryError`] on transport failure or a rejecting status.
    async fn deliver(&self, payload: &ExportPayload) -> Result<()>;

    /// Probe the downstream health endpoint
    async fn check_health(&self) -> Result<()>;

    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Delivery endpoint for logs and status output
    fn endpoint(&self) -> &str;
}
