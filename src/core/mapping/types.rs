//! Measurement type definitions

use super::devices::Device;
use super::layout::Layout;
use crate::domain::{MappingError, Measurement, RawValue};

/// Which field of a reading a type reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueField {
    Value,
    Systolic,
    Diastolic,
}

/// A type reported as one laboratory record
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    /// Clinical code (NPU, DNK or MCS)
    pub code: &'static str,
    pub exportable: bool,
    pub unit: &'static str,
    /// Analysis description shown downstream
    pub description: &'static str,
    pub layout: Layout,
    pub field: ValueField,
    pub devices: &'static [Device],
}

impl SimpleType {
    /// Render the result text for a measurement
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Conversion`] when the reading lacks the field
    /// this type reports, or the value shape does not fit the layout.
    pub fn result_text(&self, measurement: &Measurement) -> Result<String, MappingError> {
        let reading = &measurement.measurement;
        let value = match self.field {
            ValueField::Value => reading.value.clone(),
            ValueField::Systolic => reading.systolic.map(RawValue::Float),
            ValueField::Diastolic => reading.diastolic.map(RawValue::Float),
        };

        let value = value.ok_or_else(|| {
            MappingError::Conversion(format!(
                "{} measurement carries no {:?} value",
                measurement.kind, self.field
            ))
        })?;

        self.layout.render(&value)
    }
}

/// Two simple types reported together, systolic first
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeType {
    pub systolic: SimpleType,
    pub diastolic: SimpleType,
    pub devices: &'static [Device],
}

/// A registered measurement type
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementType {
    Simple(SimpleType),
    Composite(CompositeType),
}

impl MeasurementType {
    /// Composite types are always exported
    pub fn is_exportable(&self) -> bool {
        match self {
            MeasurementType::Simple(simple) => simple.exportable,
            MeasurementType::Composite(_) => true,
        }
    }

    /// Clinical code, comma separated for composite types
    pub fn code(&self) -> String {
        match self {
            MeasurementType::Simple(simple) => simple.code.to_string(),
            MeasurementType::Composite(composite) => {
                format!("{},{}", composite.systolic.code, composite.diastolic.code)
            }
        }
    }

    /// Devices eligible to have produced this type
    pub fn devices(&self) -> &'static [Device] {
        match self {
            MeasurementType::Simple(simple) => simple.devices,
            MeasurementType::Composite(composite) => composite.devices,
        }
    }
}
