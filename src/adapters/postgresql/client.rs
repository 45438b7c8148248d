//! Pooled PostgreSQL client
//!
//! Wraps a deadpool pool. Every statement runs with the configured
//! statement timeout.

use crate::config::PostgreSQLConfig;
use crate::domain::{Result, StoreError, VitexError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

const SCHEMA_SQL: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// PostgreSQL client backing the state store
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Build the connection pool
    ///
    /// Connections are opened lazily, so this succeeds without a reachable server.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparseable connection string or
    /// TLS setup failure.
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .parse()
            .map_err(|e| {
                VitexError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            mode => {
                pg_config.ssl_mode(if mode == "require" {
                    SslMode::Require
                } else {
                    SslMode::Prefer
                });
                let connector = native_tls::TlsConnector::builder().build().map_err(|e| {
                    VitexError::Configuration(format!("Failed to set up PostgreSQL TLS: {e}"))
                })?;
                Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
            }
        };

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                VitexError::Configuration(format!("Failed to create connection pool: {e}"))
            })?;

        Ok(Self { pool, config })
    }

    /// Run `SELECT 1` on a pooled connection
    pub async fn ping(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(classify)?;
        Ok(())
    }

    /// Create tables and indexes if they do not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client
            .batch_execute(SCHEMA_SQL)
            .await
            .map_err(|e| StoreError::Query(format!("Failed to apply schema: {e}")))?;

        tracing::info!(target_db = %self.connection_string_safe(), "PostgreSQL schema ready");
        Ok(())
    }

    async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        let client = self.pool.get().await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to get connection from pool: {e}"))
        })?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client.batch_execute(&timeout_query).await.map_err(classify)?;

        Ok(client)
    }

    /// Execute a query and return rows
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.get_connection().await?;
        client.query(query, params).await.map_err(classify)
    }

    /// Execute a query expected to return at most one row
    pub async fn query_opt(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>> {
        let client = self.get_connection().await?;
        client.query_opt(query, params).await.map_err(classify)
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let client = self.get_connection().await?;
        client.execute(statement, params).await.map_err(classify)
    }

    /// Run statements in one transaction
    pub async fn transaction(&self, statements: &[(&str, &[&(dyn ToSql + Sync)])]) -> Result<()> {
        let mut client = self.get_connection().await?;
        let tx = client.transaction().await.map_err(classify)?;
        for (statement, params) in statements {
            tx.execute(*statement, params).await.map_err(classify)?;
        }
        tx.commit().await.map_err(classify)
    }

    /// Connection target with credentials redacted
    pub fn connection_string_safe(&self) -> String {
        redact(self.config.connection_string.expose_secret().as_ref())
    }

    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

/// Server-side errors are query failures, everything else means the
/// connection is gone
fn classify(error: tokio_postgres::Error) -> VitexError {
    if error.as_db_error().is_some() {
        StoreError::Query(error.to_string()).into()
    } else {
        StoreError::Unavailable(error.to_string()).into()
    }
}

fn redact(connection_string: &str) -> String {
    connection_string
        .rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{host}"))
        .unwrap_or_else(|| "postgresql://***".to_string())
}
