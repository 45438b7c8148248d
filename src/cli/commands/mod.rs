//! CLI command implementations
//!
//! Every command returns its process exit code:
//! 0 ok, 1 run finished with failed items, 2 configuration error,
//! 4 connection error, 5 fatal error.

pub mod export;
pub mod init;
pub mod migrate;
pub mod serve;
pub mod status;
pub mod validate;

use crate::config::{load_config, VitexConfig};
use crate::core::export::ExportCoordinator;

pub const EXIT_OK: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_CONNECTION: i32 = 4;
pub const EXIT_FATAL: i32 = 5;

/// Load the configuration, printing the failure and its exit code
pub(crate) fn load_or_exit(config_path: &str) -> Result<VitexConfig, i32> {
    load_config(config_path).map_err(|e| {
        tracing::error!(error = %e, config_path = %config_path, "Failed to load configuration");
        eprintln!("❌ Failed to load configuration from {config_path}");
        eprintln!("   Error: {e}");
        EXIT_CONFIG
    })
}

/// Wire the coordinator, printing the failure and its exit code
pub(crate) async fn coordinator_or_exit(config: &VitexConfig) -> Result<ExportCoordinator, i32> {
    ExportCoordinator::from_config(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize export coordinator");
        eprintln!("❌ Failed to initialize export: {e}");
        EXIT_CONNECTION
    })
}
