//! Domain identifier types with validation
//!
//! Measurements and patients are addressed by the link URL the source
//! hands out for them. These newtypes keep the two apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a measurement at the source
///
/// This is the unique key of an export state row.
///
/// # Examples
///
/// ```
/// use vitex::domain::ids::MeasurementRef;
///
/// let r = MeasurementRef::new("https://source.example/measurements/42").unwrap();
/// assert_eq!(r.as_str(), "https://source.example/measurements/42");
/// assert!(MeasurementRef::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementRef(String);

impl MeasurementRef {
    /// Creates a new MeasurementRef, rejecting blank input
    pub fn new(reference: impl Into<String>) -> Result<Self, String> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err("Measurement reference cannot be empty".to_string());
        }
        Ok(Self(reference))
    }

    /// Returns the reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MeasurementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MeasurementRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for MeasurementRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reference to a patient at the source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientRef(String);

impl PatientRef {
    /// Creates a new PatientRef, rejecting blank input
    pub fn new(reference: impl Into<String>) -> Result<Self, String> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err("Patient reference cannot be empty".to_string());
        }
        Ok(Self(reference))
    }

    /// Returns the reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
