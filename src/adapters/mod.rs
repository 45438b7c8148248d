//! External system integrations for Vitex.
//!
//! - [`source`] - Clinician measurement API (paginated REST)
//! - [`database`] - State store abstraction, factory and in-memory store
//! - [`postgresql`] - PostgreSQL state store
//! - [`backend`] - Downstream export backends (OIO XDS)
//!
//! # Design Pattern
//!
//! Each collaborator sits behind a trait so the export engine can be driven
//! by mock implementations in tests:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitex::adapters::backend::create_backend;
//! use vitex::adapters::database::create_state_store;
//! use vitex::adapters::source::{ClinicianClient, MeasurementSource};
//! use vitex::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vitex.toml")?;
//!
//! let source: Arc<dyn MeasurementSource> = Arc::new(ClinicianClient::new(config.source.clone())?);
//! let store = create_state_store(&config.database).await?;
//! let backend = create_backend(&config.export, Arc::clone(&source))?;
//!
//! println!("{} -> {} ({})", source.endpoint(), backend.endpoint(), store.backend_name());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod database;
pub mod postgresql;
pub mod source;
