// Vitex - Vital-sign measurement export engine
// Copyright (c) 2025 Vitex Contributors
// Licensed under the MIT License

//! # Vitex - Vital-sign measurement export engine
//!
//! Vitex exports patient-collected vital-sign measurements (weight, pulse,
//! blood pressure, spirometry, urine strips and more) from a remote
//! measurement source to a clinical document backend. Every measurement's
//! export status is tracked so re-runs are idempotent, transient failures
//! are retried and permanent failures are eventually given up.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface
//! - [`server`] - HTTP health, status and export endpoints
//! - [`core`] - Type mapping, export orchestration and state bookkeeping
//! - [`adapters`] - Measurement source, state stores and export backends
//! - [`domain`] - Measurements, export state, statuses and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vitex::config::load_config;
//! use vitex::core::export::ExportCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("vitex.toml")?;
//!     let coordinator = ExportCoordinator::from_config(&config).await?;
//!
//!     let report = coordinator.run_export().await?;
//!     println!(
//!         "exported={} rejected={} failed={}",
//!         report.summary.exported, report.summary.rejected, report.summary.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Export states
//!
//! ```text
//! INITIAL --(type not exported)--> NO_EXPORT
//! INITIAL --(delivered)----------> COMPLETED
//! INITIAL --(failure)------------> TEMP_FAILURE --(retry ok)--> COMPLETED
//!                                  TEMP_FAILURE --(too old)---> FAILED
//! ```
//!
//! `COMPLETED`, `NO_EXPORT` and `FAILED` are terminal and never exported again.
//!
//! ## Type mapping
//!
//! ```rust
//! use vitex::core::mapping::TypeRegistry;
//!
//! let registry = TypeRegistry::standard();
//! assert_eq!(registry.lookup("blood_pressure").unwrap().code(), "DNK05472,DNK05473");
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], whose error type
//! [`domain::VitexError`] wraps one enum per collaborator.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod server;
