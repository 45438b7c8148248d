//! State store factory

use super::memory::MemoryStateStore;
use super::traits::StateStore;
use crate::adapters::postgresql::{PostgreSQLClient, PostgreSQLStateStore};
use crate::config::{DatabaseConfig, StoreKind};
use crate::domain::{Result, VitexError};
use std::sync::Arc;

/// Create the configured state store
///
/// PostgreSQL stores get their schema applied before they are returned.
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing, the pool cannot be
/// built or the schema cannot be applied.
pub async fn create_state_store(config: &DatabaseConfig) -> Result<Arc<dyn StateStore>> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory state store, export state is lost on exit");
            Ok(Arc::new(MemoryStateStore::new()))
        }
        StoreKind::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                VitexError::Configuration(
                    "database.postgresql section is required when store = \"postgresql\""
                        .to_string(),
                )
            })?;

            let client = PostgreSQLClient::new(pg_config.clone())?;
            tracing::info!(target_db = %client.connection_string_safe(), "Creating PostgreSQL state store");
            client.ensure_schema().await?;

            Ok(Arc::new(PostgreSQLStateStore::new(client)))
        }
    }
}
