//! Per-measurement results
//!
//! Each measurement handled in a run produces one [`MeasurementReport`]
//! holding `Result<ExportOutcome, MeasurementFailure>`. Failures never abort
//! the run; they are captured here and in the stored state.

use crate::domain::{ExportStatus, VitexError};
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// What happened to a measurement that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportOutcome {
    /// Delivered downstream, now `COMPLETED`
    Exported,
    /// Type not eligible, now `NO_EXPORT`
    Rejected,
    /// Already terminal, left alone
    Handled,
}

/// Which collaborator a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Store,
    Conversion,
    Delivery,
    Source,
}

impl FailureCategory {
    /// Category of a library error
    pub fn of(error: &VitexError) -> Self {
        match error {
            VitexError::Store(_) => FailureCategory::Store,
            VitexError::Source(_) => FailureCategory::Source,
            VitexError::Delivery(_) => FailureCategory::Delivery,
            _ => FailureCategory::Conversion,
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureCategory::Store => "store",
            FailureCategory::Conversion => "conversion",
            FailureCategory::Delivery => "delivery",
            FailureCategory::Source => "source",
        };
        f.write_str(name)
    }
}

/// A failed measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementFailure {
    pub category: FailureCategory,
    pub message: String,
}

impl MeasurementFailure {
    pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl From<&VitexError> for MeasurementFailure {
    fn from(error: &VitexError) -> Self {
        Self::new(FailureCategory::of(error), error.to_string())
    }
}

impl fmt::Display for MeasurementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {}", self.category, self.message)
    }
}

/// Result of handling one measurement
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementReport {
    /// Source reference, empty when the measurement carried none
    pub measurement: String,

    /// Export state id, when a state row was reached
    pub state_id: Option<Uuid>,

    /// Stored status after handling
    pub status: Option<ExportStatus>,

    pub result: Result<ExportOutcome, MeasurementFailure>,
}

impl MeasurementReport {
    pub fn outcome(&self) -> Option<ExportOutcome> {
        self.result.as_ref().ok().copied()
    }
}

#[derive(Serialize)]
struct ReportView<'a> {
    measurement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<ExportStatus>,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<FailureCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for MeasurementReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (outcome, category, error) = match &self.result {
            Ok(ExportOutcome::Exported) => ("exported", None, None),
            Ok(ExportOutcome::Rejected) => ("rejected", None, None),
            Ok(ExportOutcome::Handled) => ("handled", None, None),
            Err(failure) => ("failed", Some(failure.category), Some(failure.message.as_str())),
        };

        ReportView {
            measurement: &self.measurement,
            state_id: self.state_id,
            status: self.status,
            outcome,
            category,
            error,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryError, MappingError, StoreError};

    #[test]
    fn test_category_of_error() {
        let delivery: VitexError = DeliveryError::Transport("reset".to_string()).into();
        let mapping: VitexError = MappingError::Conversion("bad".to_string()).into();
        let store: VitexError = StoreError::Unavailable("down".to_string()).into();

        assert_eq!(FailureCategory::of(&delivery), FailureCategory::Delivery);
        assert_eq!(FailureCategory::of(&mapping), FailureCategory::Conversion);
        assert_eq!(FailureCategory::of(&store), FailureCategory::Store);
    }

    #[test]
    fn test_serialize_failure() {
        let report = MeasurementReport {
            measurement: "https://s/m/1".to_string(),
            state_id: None,
            status: Some(ExportStatus::TempFailure),
            result: Err(MeasurementFailure::new(FailureCategory::Delivery, "Server said no")),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["category"], "delivery");
        assert_eq!(json["status"], "TEMP_FAILURE");
        assert!(json.get("state_id").is_none());
    }

    #[test]
    fn test_serialize_success() {
        let report = MeasurementReport {
            measurement: "https://s/m/2".to_string(),
            state_id: Some(Uuid::nil()),
            status: Some(ExportStatus::Completed),
            result: Ok(ExportOutcome::Exported),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "exported");
        assert!(json.get("error").is_none());
        assert_eq!(report.outcome(), Some(ExportOutcome::Exported));
    }
}
