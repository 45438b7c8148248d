//! Measurement and patient models as served by the measurement source
//!
//! These types are deserialized straight from the source's JSON and are
//! immutable once fetched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw measured value
///
/// The source sends integers, decimals or text depending on the type. Any
/// other JSON shape is kept as-is so one odd value never fails a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Whole number
    Integer(i64),
    /// Decimal number
    Float(f64),
    /// Text, either a numeric string or a qualitative code such as "+2"
    Text(String),
    /// Booleans, arrays and objects
    Other(serde_json::Value),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Integer(v) => write!(f, "{v}"),
            RawValue::Float(v) => write!(f, "{v}"),
            RawValue::Text(v) => f.write_str(v),
            RawValue::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Value payload of a measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Unit reported by the source
    #[serde(default)]
    pub unit: String,

    /// Single value for simple types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RawValue>,

    /// Systolic pressure for blood pressure readings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<f64>,

    /// Diastolic pressure for blood pressure readings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,

    #[serde(default)]
    pub is_after_meal: bool,

    #[serde(default)]
    pub is_before_meal: bool,

    #[serde(default)]
    pub is_control_measurement: bool,
}

/// Manual entry details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    /// Who typed the value ("clinician", "patient", ...)
    #[serde(default)]
    pub entered_by: String,
}

/// Primary identifier of a device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentifier {
    #[serde(default)]
    pub mac_address: String,
}

/// Device capture details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapture {
    #[serde(default)]
    pub connection_type: String,

    #[serde(default)]
    pub manufacturer: String,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub primary_device_identifier: DeviceIdentifier,

    #[serde(default)]
    pub hardware_version: String,

    #[serde(default)]
    pub firmware_version: String,

    #[serde(default)]
    pub software_version: String,
}

/// How a measurement was taken
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    #[serde(default)]
    pub manual_measurement: ManualEntry,

    #[serde(default)]
    pub device_measurement: DeviceCapture,
}

impl Origin {
    /// Whether a device model was reported
    pub fn has_device(&self) -> bool {
        !self.device_measurement.model.is_empty()
    }
}

/// Hypermedia links attached to a measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinician: Option<String>,
}

/// A measurement fetched from the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// When the value was measured
    pub timestamp: DateTime<Utc>,

    /// Logical type name, e.g. "weight" or "blood_pressure"
    #[serde(rename = "type")]
    pub kind: String,

    /// Value payload
    #[serde(default)]
    pub measurement: Reading,

    /// Provenance
    #[serde(default)]
    pub origin: Origin,

    #[serde(default)]
    pub links: MeasurementLinks,
}

impl Measurement {
    /// Self link, the measurement's unique reference
    pub fn reference(&self) -> Option<&str> {
        self.links.measurement.as_deref().filter(|s| !s.is_empty())
    }

    /// Patient link
    pub fn patient_reference(&self) -> Option<&str> {
        self.links.patient.as_deref().filter(|s| !s.is_empty())
    }
}

/// Patient demographics as served by the source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub created_date: String,

    /// Civil registration number
    #[serde(default)]
    pub unique_id: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub sex: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub postal_code: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub mobile_phone: String,

    #[serde(default)]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_device_measurement() {
        let json = r#"{
            "timestamp": "2024-03-01T08:15:00Z",
            "type": "weight",
            "measurement": {"unit": "kg", "value": 84.9},
            "origin": {
                "deviceMeasurement": {
                    "connectionType": "Bluetooth",
                    "manufacturer": "A&D Medical",
                    "model": "UC-351PlusBT-Ci Bluetooth",
                    "primaryDeviceIdentifier": {"macAddress": "00:09:1F:80:00:01"},
                    "firmwareVersion": "1.2"
                }
            },
            "links": {
                "measurement": "https://source/measurements/1",
                "patient": "https://source/patients/9"
            }
        }"#;

        let m: Measurement = serde_json::from_str(json).unwrap();
        assert_eq!(m.kind, "weight");
        assert_eq!(m.measurement.value, Some(RawValue::Float(84.9)));
        assert!(m.origin.has_device());
        assert_eq!(m.origin.device_measurement.firmware_version, "1.2");
        assert_eq!(m.reference(), Some("https://source/measurements/1"));
        assert_eq!(m.patient_reference(), Some("https://source/patients/9"));
    }

    #[test]
    fn test_deserialize_value_variants() {
        let int: Reading = serde_json::from_str(r#"{"unit":"1/min","value":72}"#).unwrap();
        assert_eq!(int.value, Some(RawValue::Integer(72)));

        let text: Reading = serde_json::from_str(r#"{"unit":"","value":"+2"}"#).unwrap();
        assert_eq!(text.value, Some(RawValue::Text("+2".to_string())));

        let flag: Reading = serde_json::from_str(r#"{"unit":"","value":true}"#).unwrap();
        assert_eq!(flag.value, Some(RawValue::Other(serde_json::Value::Bool(true))));

        let series: Reading =
            serde_json::from_str(r#"{"unit":"mmol/L","value":[5.1,5.3]}"#).unwrap();
        assert_eq!(series.value.unwrap().to_string(), "[5.1,5.3]");

        let bp: Reading =
            serde_json::from_str(r#"{"unit":"mmHg","systolic":130,"diastolic":80}"#).unwrap();
        assert_eq!(bp.systolic, Some(130.0));
        assert_eq!(bp.diastolic, Some(80.0));
        assert!(bp.value.is_none());
    }

    #[test]
    fn test_manual_measurement_without_device() {
        let json = r#"{
            "timestamp": "2024-03-01T08:15:00Z",
            "type": "temperature",
            "measurement": {"unit": "C", "value": "37.2"},
            "origin": {"manualMeasurement": {"enteredBy": "clinician"}},
            "links": {}
        }"#;

        let m: Measurement = serde_json::from_str(json).unwrap();
        assert!(!m.origin.has_device());
        assert_eq!(m.origin.manual_measurement.entered_by, "clinician");
        assert!(m.reference().is_none());
    }

    #[test]
    fn test_deserialize_patient_ignores_unknown_fields() {
        let json = r#"{
            "uniqueId": "2512484916",
            "firstName": "Nancy",
            "lastName": "Berggren",
            "mobilePhone": "12345678",
            "patientGroups": [{"name": "COPD"}],
            "links": {"self": "https://source/patients/9"}
        }"#;

        let p: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(p.unique_id, "2512484916");
        assert_eq!(p.last_name, "Berggren");
        assert!(p.address.is_empty());
    }
}
