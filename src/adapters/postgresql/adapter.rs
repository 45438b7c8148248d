//! PostgreSQL implementation of the state store

use super::client::PostgreSQLClient;
use super::models::{MeasurementRow, RunRow, MEASUREMENT_COLUMNS, RUN_COLUMNS};
use crate::adapters::database::StateStore;
use crate::domain::ids::MeasurementRef;
use crate::domain::state::watermark_overlap;
use crate::domain::{
    ExportState, ExportStatus, MeasurementTotals, Result, RunOverview, RunStatus, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

/// State store backed by PostgreSQL
pub struct PostgreSQLStateStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLStateStore {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn latest_completed_run(&self) -> Result<Option<RunStatus>> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM runstatus WHERE status = $1 ORDER BY lastrun DESC LIMIT 1"
        );
        self.client
            .query_opt(&query, &[&ExportStatus::Completed.code()])
            .await?
            .map(|row| RunRow::from_row(&row)?.into_domain())
            .transpose()
    }

    async fn count(&self, table: &str, status: Option<ExportStatus>) -> Result<u64> {
        let count: i64 = match status {
            Some(status) => {
                let query = format!("SELECT COUNT(*) AS n FROM {table} WHERE status = $1");
                let rows = self.client.query(&query, &[&status.code()]).await?;
                first_count(&rows)?
            }
            None => {
                let query = format!("SELECT COUNT(*) AS n FROM {table}");
                let rows = self.client.query(&query, &[]).await?;
                first_count(&rows)?
            }
        };
        Ok(count.max(0) as u64)
    }
}

/// Watermark for a new run and whether a completed seed run must be written
///
/// Without run history the export starts at `start`.
fn run_watermark(previous: Option<&RunStatus>, start: DateTime<Utc>) -> (DateTime<Utc>, bool) {
    match previous {
        Some(run) => (run.lastrun - watermark_overlap(), false),
        None => (start, true),
    }
}

fn first_count(rows: &[tokio_postgres::Row]) -> Result<i64> {
    rows.first()
        .map(|row| row.try_get::<_, i64>("n"))
        .transpose()
        .map_err(|e| StoreError::Query(e.to_string()))?
        .ok_or_else(|| StoreError::Query("count returned no rows".to_string()).into())
}

#[async_trait]
impl StateStore for PostgreSQLStateStore {
    async fn find_or_create(
        &self,
        measurement: &MeasurementRef,
        patient: Option<&str>,
    ) -> Result<ExportState> {
        let fresh = ExportState::new(measurement.clone(), patient.map(str::to_string));

        let inserted = self
            .client
            .execute(
                "INSERT INTO measurements (id, measurement, patient, status, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (measurement) DO NOTHING",
                &[
                    &fresh.id,
                    &measurement.as_str(),
                    &fresh.patient,
                    &fresh.status.code(),
                    &fresh.created_at,
                    &fresh.updated_at,
                ],
            )
            .await?;

        if inserted == 1 {
            tracing::debug!(measurement = %measurement, state_id = %fresh.id, "Created export state");
        }

        self.find_by_ref(measurement).await?.ok_or_else(|| {
            StoreError::NotFound(format!("{measurement} vanished after insert")).into()
        })
    }

    async fn update(&self, state: &ExportState) -> Result<ExportState> {
        if state.id.is_nil() {
            return Err(StoreError::InvalidState("state id is empty".to_string()).into());
        }

        let query = format!(
            "UPDATE measurements SET status = $1, patient = $2, updated_at = $3 \
             WHERE id = $4 RETURNING {MEASUREMENT_COLUMNS}"
        );
        let row = self
            .client
            .query_opt(
                &query,
                &[&state.status.code(), &state.patient, &Utc::now(), &state.id],
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(state.measurement.to_string()))?;

        MeasurementRow::from_row(&row)?.into_domain()
    }

    async fn find_by_status(&self, status: ExportStatus) -> Result<Vec<ExportState>> {
        let query = format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements WHERE status = $1 ORDER BY created_at"
        );
        self.client
            .query(&query, &[&status.code()])
            .await?
            .iter()
            .map(|row| MeasurementRow::from_row(row)?.into_domain())
            .collect()
    }

    async fn find_by_ref(&self, measurement: &MeasurementRef) -> Result<Option<ExportState>> {
        let query = format!("SELECT {MEASUREMENT_COLUMNS} FROM measurements WHERE measurement = $1");
        self.client
            .query_opt(&query, &[&measurement.as_str()])
            .await?
            .map(|row| MeasurementRow::from_row(&row)?.into_domain())
            .transpose()
    }

    async fn start_run(&self, start: DateTime<Utc>) -> Result<RunStatus> {
        const INSERT_RUN: &str = "INSERT INTO runstatus (id, lastrun, status, created_at, updated_at) \
                                  VALUES ($1, $2, $3, $4, $5)";

        let previous = self.latest_completed_run().await?;
        let (watermark, needs_seed) = run_watermark(previous.as_ref(), start);

        let seed_id = Uuid::new_v4();
        let completed = ExportStatus::Completed.code();
        let seed_params: [&(dyn ToSql + Sync); 5] = [&seed_id, &start, &completed, &start, &start];

        let run = RunStatus::new(Utc::now(), ExportStatus::Initial);
        let initial = run.status.code();
        let run_params: [&(dyn ToSql + Sync); 5] = [
            &run.id,
            &run.lastrun,
            &initial,
            &run.created_at,
            &run.updated_at,
        ];

        let mut statements: Vec<(&str, &[&(dyn ToSql + Sync)])> = Vec::with_capacity(2);
        if needs_seed {
            tracing::warn!(start = %start, "No completed run found, exporting from start date");
            statements.push((INSERT_RUN, &seed_params[..]));
        }
        statements.push((INSERT_RUN, &run_params[..]));

        // the seed row must not outlive a failed run insert
        self.client.transaction(&statements).await?;

        Ok(RunStatus {
            lastrun: watermark,
            ..run
        })
    }

    async fn update_run(&self, run: &RunStatus) -> Result<RunStatus> {
        let query = format!(
            "UPDATE runstatus SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {RUN_COLUMNS}"
        );
        let row = self
            .client
            .query_opt(&query, &[&run.status.code(), &Utc::now(), &run.id])
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("run {}", run.id)))?;

        RunRow::from_row(&row)?.into_domain()
    }

    async fn totals(&self) -> Result<MeasurementTotals> {
        Ok(MeasurementTotals {
            total: self.count("measurements", None).await?,
            completed: self
                .count("measurements", Some(ExportStatus::Completed))
                .await?,
            failed: self.count("measurements", Some(ExportStatus::Failed)).await?,
            temp_failed: self
                .count("measurements", Some(ExportStatus::TempFailure))
                .await?,
            rejected: self
                .count("measurements", Some(ExportStatus::NoExport))
                .await?,
        })
    }

    async fn run_overview(&self) -> Result<RunOverview> {
        let query = format!("SELECT {RUN_COLUMNS} FROM runstatus ORDER BY created_at DESC LIMIT 1");
        let latest = self
            .client
            .query_opt(&query, &[])
            .await?
            .map(|row| RunRow::from_row(&row)?.into_domain())
            .transpose()?;

        Ok(RunOverview {
            last_run: latest.as_ref().map(|run| run.lastrun),
            last_status: latest.map(|run| run.status),
            total: self.count("runstatus", None).await?,
            completed: self.count("runstatus", Some(ExportStatus::Completed)).await?,
            failed: self.count("runstatus", Some(ExportStatus::Failed)).await?,
        })
    }

    async fn health_check(&self) -> Result<()> {
        self.client.ping().await
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }
}
