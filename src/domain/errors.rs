//! Domain error types
//!
//! This module defines the error hierarchy for Vitex.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Vitex error type
///
/// This is the primary error type used throughout the application.
/// It wraps the per-collaborator error enums and provides context for error handling.
#[derive(Debug, Error)]
pub enum VitexError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Measurement source errors
    #[error("Measurement source error: {0}")]
    Source(#[from] SourceError),

    /// State store errors
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    /// Measurement type mapping errors
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Downstream delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised by the measurement source API
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be reached or answered with a failure status
    #[error("Measurement source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with an unexpected status code
    #[error("Measurement source returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Invalid response from measurement source: {0}")]
    InvalidResponse(String),

    /// A referenced measurement or patient does not exist
    #[error("Resource not found at source: {0}")]
    NotFound(String),
}

/// Errors raised by the export state store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("State store unavailable: {0}")]
    Unavailable(String),

    /// The addressed row does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The record handed to the store is missing required fields
    #[error("Invalid state record: {0}")]
    InvalidState(String),

    /// A statement failed for a reason other than connectivity
    #[error("Query failed: {0}")]
    Query(String),
}

/// Errors raised while mapping a measurement to report records
#[derive(Debug, Error)]
pub enum MappingError {
    /// The measurement type has no registered mapping
    #[error("No mapping registered for measurement type '{0}'")]
    UnmappedType(String),

    /// The measurement payload does not fit the mapping
    #[error("Conversion failed: {0}")]
    Conversion(String),
}

/// Errors raised while delivering a payload downstream
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The backend answered with a failure status
    #[error("Server said {message} (status {status})")]
    Rejected { status: u16, message: String },

    /// The request never produced a response
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The backend health probe did not succeed
    #[error("Backend unhealthy: {0}")]
    Unhealthy(String),
}

impl VitexError {
    /// Whether the error came from the state store being unreachable
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, VitexError::Store(StoreError::Unavailable(_)))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for VitexError {
    fn from(err: std::io::Error) -> Self {
        VitexError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for VitexError {
    fn from(err: serde_json::Error) -> Self {
        VitexError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for VitexError {
    fn from(err: toml::de::Error) -> Self {
        VitexError::Configuration(format!("TOML parse error: {err}"))
    }
}
