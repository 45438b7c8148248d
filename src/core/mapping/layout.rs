//! Result text layout rules
//!
//! Every measurement type renders its raw value through one [`Layout`]:
//! either a fixed-precision decimal or a lookup in an ordinal strip table.

use crate::domain::{MappingError, RawValue};

/// Number of decimals in a rendered numeric result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Whole,
    One,
    Two,
}

impl Precision {
    pub fn decimals(self) -> usize {
        match self {
            Precision::Whole => 0,
            Precision::One => 1,
            Precision::Two => 2,
        }
    }
}

/// Scaling applied before formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Value is reported as measured
    Unit,
    /// Value arrives in percent and is reported as a fraction
    Percent,
}

/// Urine strip ordinal tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalTable {
    /// Neg., +/-, +1 .. +4
    Protein,
    /// Neg., +1 .. +4 (leukocytes, erythrocytes, glucose)
    Cellular,
    /// Neg., Pos.
    Nitrite,
}

impl OrdinalTable {
    /// Ordinal symbol for a strip reading, `None` when the reading is unknown
    pub fn lookup(self, reading: &str) -> Option<&'static str> {
        match (self, reading) {
            (OrdinalTable::Nitrite, "Neg.") => Some("0"),
            (OrdinalTable::Nitrite, "Pos.") => Some("1"),
            (OrdinalTable::Nitrite, _) => None,
            (OrdinalTable::Protein, "+/-") => Some("0"),
            (_, "Neg.") => Some("0"),
            (_, "+1") => Some("1"),
            (_, "+2") => Some("2"),
            (_, "+3") | (_, "+4") => Some("3"),
            _ => None,
        }
    }
}

/// How a raw value becomes result text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Numeric { precision: Precision, scale: Scale },
    Ordinal(OrdinalTable),
}

impl Layout {
    pub const fn numeric(precision: Precision) -> Self {
        Layout::Numeric {
            precision,
            scale: Scale::Unit,
        }
    }

    pub const fn percent(precision: Precision) -> Self {
        Layout::Numeric {
            precision,
            scale: Scale::Percent,
        }
    }

    /// Whether results are encoded as numbers downstream
    pub fn is_numeric(&self) -> bool {
        matches!(self, Layout::Numeric { .. })
    }

    /// Render a raw value
    ///
    /// Ordinal layouts require a text value. An unknown strip reading
    /// renders as an empty string and is logged.
    pub fn render(&self, value: &RawValue) -> Result<String, MappingError> {
        match self {
            Layout::Numeric { precision, scale } => {
                let mut number = coerce(value);
                if *scale == Scale::Percent {
                    number /= 100.0;
                }
                Ok(format_fixed(number, precision.decimals()))
            }
            Layout::Ordinal(table) => {
                let RawValue::Text(reading) = value else {
                    return Err(MappingError::Conversion(format!(
                        "expected a text reading for an ordinal result, got '{value}'"
                    )));
                };

                match table.lookup(reading) {
                    Some(symbol) => Ok(symbol.to_string()),
                    None => {
                        tracing::warn!(
                            reading = %reading,
                            table = ?table,
                            "Unknown strip reading, exporting empty result"
                        );
                        Ok(String::new())
                    }
                }
            }
        }
    }
}

/// Best-effort conversion of a raw value to f64, 0.0 when unparseable
pub fn coerce(value: &RawValue) -> f64 {
    match value {
        RawValue::Integer(i) => *i as f64,
        RawValue::Float(f) => *f,
        RawValue::Text(s) => s.trim().parse::<f64>().unwrap_or_else(|_| {
            tracing::error!(value = %s, "Failed to parse numeric measurement value");
            0.0
        }),
        RawValue::Other(v) => {
            tracing::error!(value = %v, "Measurement value is not numeric");
            0.0
        }
    }
}

/// Fixed-precision decimal, rounding half away from zero
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // avoid "-0" for values that round to zero
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.decimals$}")
}
