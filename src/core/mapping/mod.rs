//! Measurement type mapping
//!
//! Turns a raw measurement into laboratory report records:
//!
//! - [`registry`] maps a source type name to a [`MeasurementType`]
//! - [`layout`] renders values (fixed precision or ordinal strip tables)
//! - [`devices`] identifies the device behind a reading
//! - [`report`] assembles the records with national defaults and provenance
//!
//! # Example
//!
//! ```
//! use vitex::config::DeviceProvenance;
//! use vitex::core::mapping::{ReportBuilder, TypeRegistry};
//! use vitex::domain::{ids::MeasurementRef, ExportState, Measurement};
//!
//! let measurement: Measurement = serde_json::from_str(r#"{
//!     "timestamp": "2024-03-01T08:15:00Z",
//!     "type": "weight",
//!     "measurement": {"unit": "kg", "value": 84.9}
//! }"#).unwrap();
//! let state = ExportState::new(MeasurementRef::new("https://s/m/1").unwrap(), None);
//!
//! let builder = ReportBuilder::new(TypeRegistry::standard(), DeviceProvenance::Whitelist);
//! let reports = builder.build(&measurement, &state).unwrap();
//! assert_eq!(reports[0].result_text, "84.9");
//! ```

pub mod devices;
pub mod layout;
pub mod registry;
pub mod report;
pub mod types;

pub use devices::{Device, DeviceMatcher};
pub use layout::{Layout, OrdinalTable, Precision, Scale};
pub use registry::TypeRegistry;
pub use report::{Instrument, LaboratoryReport, ReportBuilder, TransferredBy};
pub use types::{CompositeType, MeasurementType, SimpleType, ValueField};
