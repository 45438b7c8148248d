//! `validate-config` command

use super::{load_or_exit, EXIT_OK};
use crate::config::StoreKind;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {}

impl ValidateArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");
        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_or_exit(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {}", config.environment.as_str());
        println!("  Log Level: {}", config.application.log_level);
        println!("  Source: {}", config.source.url);
        println!("  Batch Size: {}", config.source.batch_size);
        println!("  Start Date: {}", config.export.start);
        println!("  Backend: {}", config.export.backend);
        println!("  XDS Generator: {}", config.export.oioxds.url);
        println!("  Retry Days: {}", config.export.retry_days);
        println!("  Device Provenance: {:?}", config.export.device_provenance);
        match config.database.store {
            StoreKind::PostgreSQL => println!("  State Store: PostgreSQL"),
            StoreKind::Memory => println!("  State Store: in-memory"),
        }
        println!("  HTTP: {}", config.server.bind_address());
        println!();
        Ok(EXIT_OK)
    }
}
