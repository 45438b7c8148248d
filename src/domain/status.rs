//! Export status shared by measurement states and run records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an exported measurement or an orchestration run
///
/// Stored as a small integer. Runs only ever use `Initial`, `Completed`
/// and `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportStatus {
    /// Freshly created, never attempted
    #[default]
    Initial,
    /// Picked up for export
    Created,
    /// Delivered downstream
    Completed,
    /// Last attempt failed, will be retried
    TempFailure,
    /// Retry window expired
    Failed,
    /// Type is not eligible for export
    NoExport,
}

impl ExportStatus {
    /// Integer code persisted in the store
    pub fn code(self) -> i16 {
        match self {
            ExportStatus::Initial => 0,
            ExportStatus::Created => 1,
            ExportStatus::Completed => 2,
            ExportStatus::TempFailure => 3,
            ExportStatus::Failed => 4,
            ExportStatus::NoExport => 5,
        }
    }

    /// Decode a persisted integer code
    pub fn from_code(code: i16) -> Result<Self, String> {
        match code {
            0 => Ok(ExportStatus::Initial),
            1 => Ok(ExportStatus::Created),
            2 => Ok(ExportStatus::Completed),
            3 => Ok(ExportStatus::TempFailure),
            4 => Ok(ExportStatus::Failed),
            5 => Ok(ExportStatus::NoExport),
            other => Err(format!("Unknown export status code: {other}")),
        }
    }

    /// Upper-case status name
    pub fn as_str(self) -> &'static str {
        match self {
            ExportStatus::Initial => "INITIAL",
            ExportStatus::Created => "CREATED",
            ExportStatus::Completed => "COMPLETED",
            ExportStatus::TempFailure => "TEMP_FAILURE",
            ExportStatus::Failed => "FAILED",
            ExportStatus::NoExport => "NO_EXPORT",
        }
    }

    /// Terminal states are never exported again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExportStatus::Completed | ExportStatus::Failed | ExportStatus::NoExport
        )
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INITIAL" => Ok(ExportStatus::Initial),
            "CREATED" => Ok(ExportStatus::Created),
            "COMPLETED" => Ok(ExportStatus::Completed),
            "TEMP_FAILURE" => Ok(ExportStatus::TempFailure),
            "FAILED" => Ok(ExportStatus::Failed),
            "NO_EXPORT" => Ok(ExportStatus::NoExport),
            other => Err(format!("Unknown export status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping_is_stable() {
        assert_eq!(ExportStatus::Initial.code(), 0);
        assert_eq!(ExportStatus::TempFailure.code(), 3);
        assert_eq!(ExportStatus::NoExport.code(), 5);
        assert_eq!(ExportStatus::from_code(4).unwrap(), ExportStatus::Failed);
        assert!(ExportStatus::from_code(9).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(ExportStatus::Completed.is_terminal());
        assert!(ExportStatus::Failed.is_terminal());
        assert!(ExportStatus::NoExport.is_terminal());
        assert!(!ExportStatus::Initial.is_terminal());
        assert!(!ExportStatus::Created.is_terminal());
        assert!(!ExportStatus::TempFailure.is_terminal());
    }

    #[test]
    fn test_parse_and_display() {
        let status: ExportStatus = "temp_failure".parse().unwrap();
        assert_eq!(status, ExportStatus::TempFailure);
        assert_eq!(status.to_string(), "TEMP_FAILURE");
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&ExportStatus::NoExport).unwrap();
        assert_eq!(json, "\"NO_EXPORT\"");
    }
}
