//! Reading `vitex.toml`
//!
//! The file is read, `${NAME}` placeholders are filled from the environment,
//! the TOML is parsed, `VITEX_*` overrides are applied and finally every
//! section is validated.

use super::schema::{DeviceProvenance, StoreKind, VitexConfig};
use super::secret::secret_string;
use crate::domain::errors::VitexError;
use crate::domain::result::Result;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;

/// Load and validate the configuration at `path`
///
/// # Errors
///
/// Returns `VitexError::Configuration` if the file is missing or unreadable,
/// a referenced variable is unset, the TOML is malformed, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use vitex::config::loader::load_config;
///
/// let config = load_config("vitex.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<VitexConfig> {
    let path = path.as_ref();
    let config_error = |what: &str, detail: &dyn std::fmt::Display| {
        VitexError::Configuration(format!("{what}: {detail}"))
    };

    if !path.is_file() {
        return Err(config_error("Configuration file not found", &path.display()));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| config_error(format!("Cannot read {}", path.display()).as_str(), &e))?;
    let expanded = substitute_env_vars(&raw)?;

    let mut config: VitexConfig =
        toml::from_str(&expanded).map_err(|e| config_error("Malformed TOML", &e))?;
    apply_env_overrides(&mut config)?;
    config
        .validate()
        .map_err(|e| config_error("Invalid configuration", &e))?;

    Ok(config)
}

/// Replace `${NAME}` with the value of environment variable `NAME`
///
/// Comment lines are left untouched. Every unset variable is reported at
/// once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let placeholder = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| VitexError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut unset: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            placeholder
                .replace_all(line, |caps: &Captures| {
                    let name = &caps[1];
                    std::env::var(name).unwrap_or_else(|_| {
                        if !unset.iter().any(|n| n == name) {
                            unset.push(name.to_string());
                        }
                        caps[0].to_string()
                    })
                })
                .into_owned()
        })
        .collect();

    if !unset.is_empty() {
        return Err(VitexError::Configuration(format!(
            "Unset environment variables referenced in configuration: {}",
            unset.join(", ")
        )));
    }

    let mut result = lines.join("\n");
    result.push('\n');
    Ok(result)
}

/// Applies environment variable overrides using the VITEX_* prefix
///
/// Variables follow the pattern `VITEX_<SECTION>_<KEY>`, for example
/// `VITEX_SOURCE_URL` or `VITEX_EXPORT_RETRY_DAYS`.
fn apply_env_overrides(config: &mut VitexConfig) -> Result<()> {
    if let Ok(val) = std::env::var("VITEX_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Source overrides
    if let Ok(val) = std::env::var("VITEX_SOURCE_URL") {
        config.source.url = val;
    }
    if let Ok(val) = std::env::var("VITEX_SOURCE_KEY") {
        config.source.key = val;
    }
    if let Ok(val) = std::env::var("VITEX_SOURCE_SECRET") {
        config.source.secret = secret_string(val);
    }
    if let Ok(val) = std::env::var("VITEX_SOURCE_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.source.batch_size = size;
        }
    }
    if let Ok(val) = std::env::var("VITEX_SOURCE_TLS_VERIFY") {
        config.source.tls_verify = val.parse().unwrap_or(true);
    }

    // Export overrides
    if let Ok(val) = std::env::var("VITEX_EXPORT_START") {
        config.export.start = val;
    }
    if let Ok(val) = std::env::var("VITEX_EXPORT_CREATED_BY") {
        config.export.created_by = val;
    }
    if let Ok(val) = std::env::var("VITEX_EXPORT_RETRY_DAYS") {
        if let Ok(days) = val.parse() {
            config.export.retry_days = days;
        }
    }
    if let Ok(val) = std::env::var("VITEX_EXPORT_DEVICE_PROVENANCE") {
        config.export.device_provenance = match val.to_lowercase().as_str() {
            "manufacturer" => DeviceProvenance::Manufacturer,
            "whitelist" => DeviceProvenance::Whitelist,
            other => {
                return Err(VitexError::Configuration(format!(
                    "Invalid VITEX_EXPORT_DEVICE_PROVENANCE '{other}'. Must be whitelist or manufacturer"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("VITEX_EXPORT_OIOXDS_URL") {
        config.export.oioxds.url = val;
    }
    if let Ok(val) = std::env::var("VITEX_EXPORT_OIOXDS_HEALTH_CHECK_URL") {
        config.export.oioxds.health_check_url = val;
    }

    // Database overrides
    if let Ok(val) = std::env::var("VITEX_DATABASE_STORE") {
        config.database.store = match val.to_lowercase().as_str() {
            "memory" => StoreKind::Memory,
            "postgresql" => StoreKind::PostgreSQL,
            other => {
                return Err(VitexError::Configuration(format!(
                    "Invalid VITEX_DATABASE_STORE '{other}'. Must be postgresql or memory"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("VITEX_DATABASE_CONNECTION_STRING") {
        if let Some(ref mut pg) = config.database.postgresql {
            pg.connection_string = secret_string(val);
        }
    }

    // Server overrides
    if let Ok(val) = std::env::var("VITEX_SERVER_HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("VITEX_SERVER_PORT") {
        if let Ok(port) = val.parse() {
            config.server.port = port;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("VITEX_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("VITEX_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
