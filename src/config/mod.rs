//! Configuration management for Vitex.
//!
//! # Overview
//!
//! Vitex uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `VITEX_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vitex::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vitex.toml")?;
//!
//! println!("Source: {}", config.source.url);
//! println!("XDS generator: {}", config.export.oioxds.url);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`SourceConfig`] - Measurement source API, credentials and paging
//! - [`ExportConfig`] - Start date, retry window, provenance mode, XDS endpoints
//! - [`DatabaseConfig`] - State store selection and PostgreSQL settings
//! - [`ServerConfig`] - HTTP bind address
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [source]
//! url = "https://clinician.example.com/clinician/api"
//! key = "exporter"
//! secret = "${VITEX_SOURCE_SECRET}"
//!
//! [export]
//! start = "2024-01-01"
//! created_by = "Telemedicine"
//!
//! [export.oioxds]
//! url = "http://xds-generator:8080/generate"
//! health_check_url = "http://xds-generator:8080/health"
//!
//! [database.postgresql]
//! connection_string = "${VITEX_DATABASE_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DatabaseConfig, DeviceProvenance, Environment, ExportConfig,
    LoggingConfig, OioXdsConfig, PostgreSQLConfig, RetryConfig, ServerConfig, SourceConfig,
    StoreKind, VitexConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
