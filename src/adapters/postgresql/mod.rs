//! PostgreSQL state store
//!
//! Export state and run history live in the `measurements` and `runstatus`
//! tables. The schema ships in `migrations/` and is applied by
//! [`PostgreSQLClient::ensure_schema`].

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLStateStore;
pub use client::PostgreSQLClient;
pub use models::{MeasurementRow, RunRow};
