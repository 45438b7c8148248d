//! Export backends
//!
//! A backend owns the downstream wire format. The OIO XDS backend is the
//! only one shipped; others plug in through [`ExportBackend`].

pub mod cache;
pub mod models;
pub mod traits;
pub mod xds;

pub use cache::PatientCache;
pub use models::{Citizen, XdsErrorResponse, XdsGeneratorRequest};
pub use traits::{ExportBackend, ExportPayload};
pub use xds::XdsBackend;

use crate::adapters::source::MeasurementSource;
use crate::config::ExportConfig;
use crate::domain::{Result, VitexError};
use std::sync::Arc;

/// Create the backend named by `export.backend`
///
/// # Errors
///
/// Returns a configuration error for unknown backend names.
pub fn create_backend(
    config: &ExportConfig,
    source: Arc<dyn MeasurementSource>,
) -> Result<Arc<dyn ExportBackend>> {
    match config.backend.as_str() {
        "oioxds" => Ok(Arc::new(XdsBackend::new(config, source)?)),
        other => Err(VitexError::Configuration(format!(
            "Unknown export backend '{other}'"
        ))),
    }
}
