//! `migrate` command

use super::{load_or_exit, EXIT_CONFIG, EXIT_CONNECTION, EXIT_OK};
use crate::adapters::postgresql::PostgreSQLClient;
use crate::config::StoreKind;
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Apply the PostgreSQL schema
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_or_exit(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };

        if config.database.store == StoreKind::Memory {
            println!("In-memory store selected, nothing to migrate.");
            return Ok(EXIT_OK);
        }
        let Some(pg_config) = config.database.postgresql.clone() else {
            eprintln!("❌ database.postgresql section is missing");
            return Ok(EXIT_CONFIG);
        };

        let client = match PostgreSQLClient::new(pg_config) {
            Ok(client) => client,
            Err(e) => {
                eprintln!("❌ Invalid PostgreSQL settings: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("🗄️  Applying schema to {}", client.connection_string_safe());
        match client.ensure_schema().await {
            Ok(()) => {
                println!("✅ Schema is up to date");
                Ok(EXIT_OK)
            }
            Err(e) => {
                tracing::error!(error = %e, "Schema migration failed");
                eprintln!("❌ Schema migration failed: {e}");
                Ok(EXIT_CONNECTION)
            }
        }
    }
}
