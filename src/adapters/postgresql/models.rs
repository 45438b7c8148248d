//! Row mappings for the `measurements` and `runstatus` tables

use crate::domain::ids::MeasurementRef;
use crate::domain::{ExportState, ExportStatus, Result, RunStatus, StoreError};
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use uuid::Uuid;

/// Column list shared by every measurement query
pub const MEASUREMENT_COLUMNS: &str = "id, measurement, patient, status, created_at, updated_at";

/// Column list shared by every run query
pub const RUN_COLUMNS: &str = "id, lastrun, status, created_at, updated_at";

/// Raw `measurements` row
#[derive(Debug, Clone)]
pub struct MeasurementRow {
    pub id: Uuid,
    pub measurement: String,
    pub patient: Option<String>,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MeasurementRow {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: column(row, "id")?,
            measurement: column(row, "measurement")?,
            patient: column(row, "patient")?,
            status: column(row, "status")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    pub fn into_domain(self) -> Result<ExportState> {
        Ok(ExportState {
            id: self.id,
            measurement: MeasurementRef::new(self.measurement)
                .map_err(StoreError::InvalidState)?,
            patient: self.patient,
            status: ExportStatus::from_code(self.status).map_err(StoreError::InvalidState)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Raw `runstatus` row
#[derive(Debug, Clone)]
pub struct RunRow {
    pub id: Uuid,
    pub lastrun: DateTime<Utc>,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunRow {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: column(row, "id")?,
            lastrun: column(row, "lastrun")?,
            status: column(row, "status")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    pub fn into_domain(self) -> Result<RunStatus> {
        Ok(RunStatus {
            id: self.id,
            lastrun: self.lastrun,
            status: ExportStatus::from_code(self.status).map_err(StoreError::InvalidState)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn column<'a, T>(row: &'a Row, name: &str) -> Result<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Query(format!("Failed to read column {name}: {e}")).into())
}
