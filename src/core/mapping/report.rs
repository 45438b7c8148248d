//! Laboratory report records built from measurements
//!
//! One record per simple type, two for blood pressure. Records carry the
//! national defaults for home measurements plus optional device provenance.

use super::devices;
use super::registry::TypeRegistry;
use super::types::{MeasurementType, SimpleType};
use crate::config::DeviceProvenance;
use crate::domain::measurement::DeviceCapture;
use crate::domain::{ExportState, MappingError, Measurement};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PRODUCER_IDENTIFIER: &str = "Patient målt";
const PRODUCER_CODE: &str = "POT";
const MEASUREMENT_LOCATION: &str = "home";
const MEASUREMENT_SCHEDULED: &str = "scheduled";
const NATIONAL_SAMPLE_IDENTIFIER: &str = "9999999999";
const INTERVAL_UNSPECIFIED: &str = "unspecified";

/// Who or what moved the value into the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferredBy {
    /// Typed in by a healthcare professional
    TypedByHcProf,
    /// Typed in by the patient or a relative
    Typed,
    /// Transferred from a device
    Automatic,
}

/// Encoding of the result text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultEncoding {
    Numeric,
    Alphanumeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProducerOfLabResult {
    pub identifier: String,
    pub identifier_code: String,
}

impl Default for ProducerOfLabResult {
    fn default() -> Self {
        Self {
            identifier: PRODUCER_IDENTIFIER.to_string(),
            identifier_code: PRODUCER_CODE.to_string(),
        }
    }
}

/// Device provenance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instrument {
    #[serde(rename = "MedComId", default, skip_serializing_if = "String::is_empty")]
    pub medcom_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manufacturer: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub product_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub software_version: String,
}

/// One laboratory result record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LaboratoryReport {
    pub uuid_identifier: String,

    /// Measurement timestamp, RFC 3339
    pub created_date_time: String,

    pub analysis_text: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result_text: String,

    pub result_encoding_identifier: ResultEncoding,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_operator_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result_unit_text: String,

    pub result_type_of_interval: String,

    pub national_sample_identifier: String,

    /// Clinical code
    pub iupac_identifier: String,

    pub producer_of_lab_result: ProducerOfLabResult,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,

    pub measurement_transferred_by: TransferredBy,

    pub measurement_location: String,

    pub measurement_scheduled: String,
}

/// Builds report records for measurements
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    registry: TypeRegistry,
    provenance: DeviceProvenance,
}

impl ReportBuilder {
    pub fn new(registry: TypeRegistry, provenance: DeviceProvenance) -> Self {
        Self {
            registry,
            provenance,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Convert a measurement into report records
    ///
    /// The first record is identified by the export state id so a re-export
    /// replaces rather than duplicates it downstream.
    ///
    /// # Errors
    ///
    /// [`MappingError::UnmappedType`] for unknown types and
    /// [`MappingError::Conversion`] when the value does not fit the type.
    pub fn build(
        &self,
        measurement: &Measurement,
        state: &ExportState,
    ) -> Result<Vec<LaboratoryReport>, MappingError> {
        let measurement_type = self.registry.lookup(&measurement.kind)?;

        let reports = match measurement_type {
            MeasurementType::Simple(simple) => {
                vec![self.record(measurement_type, simple, measurement, state.id)?]
            }
            MeasurementType::Composite(composite) => {
                let systolic =
                    self.record(measurement_type, &composite.systolic, measurement, state.id)?;
                let diastolic = self.record(
                    measurement_type,
                    &composite.diastolic,
                    measurement,
                    Uuid::new_v4(),
                )?;
                vec![systolic, diastolic]
            }
        };

        tracing::debug!(
            measurement_type = %measurement.kind,
            records = reports.len(),
            "Built laboratory reports"
        );

        Ok(reports)
    }

    fn record(
        &self,
        measurement_type: &MeasurementType,
        simple: &SimpleType,
        measurement: &Measurement,
        id: Uuid,
    ) -> Result<LaboratoryReport, MappingError> {
        let (transferred_by, instrument) = self.provenance_for(measurement_type, measurement);

        let encoding = if simple.layout.is_numeric() {
            ResultEncoding::Numeric
        } else {
            ResultEncoding::Alphanumeric
        };

        Ok(LaboratoryReport {
            uuid_identifier: id.to_string(),
            created_date_time: measurement
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            analysis_text: simple.description.to_string(),
            result_text: simple.result_text(measurement)?,
            result_encoding_identifier: encoding,
            result_operator_identifier: None,
            result_unit_text: simple.unit.to_string(),
            result_type_of_interval: INTERVAL_UNSPECIFIED.to_string(),
            national_sample_identifier: NATIONAL_SAMPLE_IDENTIFIER.to_string(),
            iupac_identifier: simple.code.to_string(),
            producer_of_lab_result: ProducerOfLabResult::default(),
            instrument,
            measurement_transferred_by: transferred_by,
            measurement_location: MEASUREMENT_LOCATION.to_string(),
            measurement_scheduled: MEASUREMENT_SCHEDULED.to_string(),
        })
    }

    fn provenance_for(
        &self,
        measurement_type: &MeasurementType,
        measurement: &Measurement,
    ) -> (TransferredBy, Option<Instrument>) {
        let origin = &measurement.origin;

        if origin.has_device() {
            let instrument = match self.provenance {
                DeviceProvenance::Manufacturer => {
                    Some(instrument_from_capture(&origin.device_measurement))
                }
                DeviceProvenance::Whitelist => {
                    instrument_from_registry(measurement_type, &origin.device_measurement)
                }
            };
            return (TransferredBy::Automatic, instrument);
        }

        let transferred_by = match origin.manual_measurement.entered_by.as_str() {
            "clinician" => TransferredBy::TypedByHcProf,
            _ => TransferredBy::Typed,
        };
        (transferred_by, None)
    }
}

/// Provenance copied from what the device reported
pub fn instrument_from_capture(capture: &DeviceCapture) -> Instrument {
    let software_version = [
        capture.firmware_version.as_str(),
        capture.software_version.as_str(),
        capture.hardware_version.as_str(),
    ]
    .into_iter()
    .filter(|v| !v.is_empty())
    .collect::<Vec<_>>()
    .join("/");

    let software_version = if software_version.is_empty() {
        capture.model.clone()
    } else {
        software_version
    };

    Instrument {
        medcom_id: String::new(),
        manufacturer: capture.manufacturer.clone(),
        product_type: capture.connection_type.clone(),
        model: capture.model.clone(),
        software_version,
    }
}

/// Provenance resolved against the devices eligible for the type
///
/// `None` when no eligible device matches.
pub fn instrument_from_registry(
    measurement_type: &MeasurementType,
    capture: &DeviceCapture,
) -> Option<Instrument> {
    let device = devices::resolve(measurement_type.devices(), capture)?;

    tracing::debug!(device = device.name, medcom_id = device.medcom_id, "Resolved device");

    Some(Instrument {
        medcom_id: device.medcom_id.to_string(),
        manufacturer: device.manufacturer.to_string(),
        product_type: device.product_type.to_string(),
        model: device.model.to_string(),
        software_version: String::new(),
    })
}
