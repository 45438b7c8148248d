//! Core business logic for Vitex.
//!
//! # Modules
//!
//! - [`mapping`] - Measurement types, value layouts, devices and report records
//! - [`state`] - Export state bookkeeping and ageing of temporary failures
//! - [`export`] - Run orchestration, retries and summaries
//!
//! # Export Workflow
//!
//! 1. **Open run**: read the watermark (previous completed run minus 30 minutes)
//! 2. **Page**: fetch measurements from the source since the watermark
//! 3. **Deduplicate**: find or create the export state of each measurement
//! 4. **Skip** measurements whose state is terminal
//! 5. **Export**: map, convert and deliver eligible measurements
//! 6. **Record**: store each outcome and close the run
//!
//! # Example
//!
//! ```rust,no_run
//! use vitex::config::load_config;
//! use vitex::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vitex.toml")?;
//! let coordinator = ExportCoordinator::from_config(&config).await?;
//!
//! let report = coordinator.run_export().await?;
//! println!("Exported: {}", report.summary.exported);
//! println!("Rejected: {}", report.summary.rejected);
//! println!("Failed: {}", report.summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod mapping;
pub mod state;
