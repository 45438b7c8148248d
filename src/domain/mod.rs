//! Domain models and types for Vitex.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed references** ([`MeasurementRef`], [`PatientRef`])
//! - **Source models** ([`Measurement`], [`Patient`])
//! - **Bookkeeping records** ([`ExportState`], [`RunStatus`]) and their [`ExportStatus`]
//! - **Error types** ([`VitexError`] and the per-collaborator enums)
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, VitexError>`]:
//!
//! ```rust
//! use vitex::domain::{Result, StoreError, VitexError};
//!
//! fn example() -> Result<()> {
//!     Err(StoreError::InvalidState("missing id".to_string()).into())
//! }
//!
//! assert!(matches!(example(), Err(VitexError::Store(_))));
//! ```

pub mod errors;
pub mod ids;
pub mod measurement;
pub mod result;
pub mod state;
pub mod status;

// Re-export commonly used types for convenience
pub use errors::{DeliveryError, MappingError, SourceError, StoreError, VitexError};
pub use ids::{MeasurementRef, PatientRef};
pub use measurement::{Measurement, Patient, RawValue};
pub use result::Result;
pub use state::{ExportState, MeasurementTotals, RunOverview, RunStatus};
pub use status::ExportStatus;
