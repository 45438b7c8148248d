//! Logging and observability
//!
//! Structured logging with:
//! - console output
//! - optional JSON file output with rotation
//! - shared macros for the events every run emits
//!
//! # Example
//!
//! ```no_run
//! use vitex::logging::init_logging;
//! use vitex::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an orchestration run
///
/// # Example
///
/// ```no_run
/// use vitex::log_run_started;
///
/// let run_id = uuid::Uuid::new_v4();
/// let watermark = chrono::Utc::now();
/// log_run_started!(run_id, watermark);
/// ```
#[macro_export]
macro_rules! log_run_started {
    ($run_id:expr, $watermark:expr) => {
        tracing::info!(
            run_id = %$run_id,
            watermark = %$watermark,
            "Starting export run"
        );
    };
}

/// Log a per-measurement failure that does not abort the run
///
/// # Example
///
/// ```no_run
/// use vitex::log_measurement_failed;
///
/// let err = vitex::domain::VitexError::Export("boom".to_string());
/// log_measurement_failed!("https://source/measurements/1", &err);
/// ```
#[macro_export]
macro_rules! log_measurement_failed {
    ($measurement:expr, $error:expr) => {
        tracing::warn!(
            measurement = %$measurement,
            error = %$error,
            "Measurement export failed"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use vitex::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 2000u64, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying request after error"
        );
    };
}
