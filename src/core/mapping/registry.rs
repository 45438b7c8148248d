//! Registry of exportable measurement types keyed by source type name

use super::devices::{
    Device, AND_302, AND_321, AND_351, AND_767C, AND_767CI, NONIN_3230, NONIN_9560,
};
use super::layout::{Layout, OrdinalTable, Precision};
use super::types::{CompositeType, MeasurementType, SimpleType, ValueField};
use crate::domain::MappingError;
use std::collections::HashMap;

const PULSE_DEVICES: &[Device] = &[NONIN_3230, NONIN_9560, AND_767C, AND_767CI];
const WEIGHT_DEVICES: &[Device] = &[AND_321, AND_351];
const OXIMETER_DEVICES: &[Device] = &[NONIN_3230, NONIN_9560];
const BLOOD_PRESSURE_DEVICES: &[Device] = &[AND_767C, AND_767CI];
const THERMOMETER_DEVICES: &[Device] = &[AND_302];

/// Measurement type lookup, built once at startup
///
/// # Example
///
/// ```
/// use vitex::core::mapping::TypeRegistry;
///
/// let registry = TypeRegistry::standard();
/// assert!(registry.is_exportable("weight"));
/// assert!(!registry.is_exportable("fev1/fev6"));
/// assert!(!registry.is_exportable("pain_scale"));
/// ```
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<&'static str, MeasurementType>,
}

impl TypeRegistry {
    /// Registry with every type the XDS export knows about
    pub fn standard() -> Self {
        let mut types = HashMap::new();

        types.insert(
            "pulse",
            simple("NPU21692", "1/min", "Hjerte—Systole; frekv. = ? * 1/min")
                .layout(Layout::numeric(Precision::Whole))
                .devices(PULSE_DEVICES)
                .build(),
        );
        types.insert(
            "weight",
            simple("NPU03804", "kg", "Pt—Legeme; masse = ? kg")
                .layout(Layout::numeric(Precision::One))
                .devices(WEIGHT_DEVICES)
                .build(),
        );
        types.insert(
            "saturation",
            simple("NPU03011", "", "Hb(Fe; O2-bind.; aB)—Oxygen(O2); mætn. = ?")
                .layout(Layout::percent(Precision::Two))
                .devices(OXIMETER_DEVICES)
                .build(),
        );
        types.insert(
            "respiratory_rate",
            simple("MCS88122", "1/min", "Pt—Respiration; frekvens = ? X 1/min")
                .layout(Layout::numeric(Precision::Whole))
                .build(),
        );
        types.insert(
            "protein_in_urine",
            simple("NPU04206", "", "U—Protein; arb.k.(proc.) = ?")
                .layout(Layout::Ordinal(OrdinalTable::Protein))
                .build(),
        );
        types.insert(
            "leukocytes_in_urine",
            simple("NPU03987", "", "U—Leukocytter; arb.k.(proc.) = ?")
                .layout(Layout::Ordinal(OrdinalTable::Cellular))
                .build(),
        );
        types.insert(
            "nitrite_in_urine",
            simple("NPU21578", "", "U—Nitrit; arb.k.(proc.) = ?")
                .layout(Layout::Ordinal(OrdinalTable::Nitrite))
                .build(),
        );
        // blood on the strip is reported as erythrocytes
        let erythrocytes = simple("NPU03963", "", "U—Erythrocytter; arb.k.(proc.) = ?")
            .layout(Layout::Ordinal(OrdinalTable::Cellular))
            .build();
        types.insert("blood_in_urine", erythrocytes.clone());
        types.insert("erythrocytes_in_urine", erythrocytes);
        types.insert(
            "glucose_in_urine",
            simple("NPU04207", "", "U—Glucose; arb.k.(proc.) = ?")
                .layout(Layout::Ordinal(OrdinalTable::Cellular))
                .build(),
        );
        types.insert(
            "bloodsugar",
            simple("NPU22089", "mmol/L", "P(kB)—Glucose; stofk. = ? mmol/L")
                .layout(Layout::numeric(Precision::One))
                .build(),
        );
        types.insert(
            "crp",
            simple("NPU19748", "mg/L", "P—C-reaktivt protein; massek. = ? mg/L")
                .layout(Layout::numeric(Precision::Whole))
                .build(),
        );
        types.insert(
            "fev1",
            simple("MCS88015", "L", "Lunge—Lungefunktionsundersøgelse FEV1; vol. = ? L")
                .layout(Layout::numeric(Precision::Two))
                .build(),
        );
        types.insert(
            "fev6",
            simple(
                "MCS88100",
                "L",
                "Lunge—Lungefunktionsundersøgelse COPD FEV6; vol. = ? L",
            )
            .layout(Layout::numeric(Precision::Two))
            .build(),
        );
        types.insert(
            "fev1/fev6",
            simple("MCS88099", "", "Lunge—FEV1/FEV6 ratio = ?")
                .layout(Layout::percent(Precision::Two))
                .not_exported()
                .build(),
        );
        types.insert(
            "temperature",
            simple("NPU08676", "°C", "Pt—Legeme; temp. = ? °C")
                .layout(Layout::numeric(Precision::One))
                .devices(THERMOMETER_DEVICES)
                .build(),
        );
        types.insert(
            "blood_pressure",
            MeasurementType::Composite(CompositeType {
                systolic: simple("DNK05472", "mmHg", "Arm—Blodtryk(systolisk); tryk = ? mmHg")
                    .layout(Layout::numeric(Precision::Whole))
                    .field(ValueField::Systolic)
                    .devices(BLOOD_PRESSURE_DEVICES)
                    .simple(),
                diastolic: simple(
                    "DNK05473",
                    "mmHg",
                    "Arm—Blodtryk(diastolisk); tryk = ? mmHg",
                )
                .layout(Layout::numeric(Precision::Whole))
                .field(ValueField::Diastolic)
                .devices(BLOOD_PRESSURE_DEVICES)
                .simple(),
                devices: BLOOD_PRESSURE_DEVICES,
            }),
        );

        Self { types }
    }

    /// Look up a type by its source name
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnmappedType`] when the name is not registered.
    pub fn lookup(&self, name: &str) -> Result<&MeasurementType, MappingError> {
        self.types
            .get(name)
            .ok_or_else(|| MappingError::UnmappedType(name.to_string()))
    }

    /// Whether measurements of this type are delivered downstream
    ///
    /// Unknown names are not exportable.
    pub fn is_exportable(&self, name: &str) -> bool {
        self.lookup(name)
            .map(MeasurementType::is_exportable)
            .unwrap_or(false)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.types.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

struct SimpleBuilder(SimpleType);

fn simple(code: &'static str, unit: &'static str, description: &'static str) -> SimpleBuilder {
    SimpleBuilder(SimpleType {
        code,
        exportable: true,
        unit,
        description,
        layout: Layout::numeric(Precision::Whole),
        field: ValueField::Value,
        devices: &[],
    })
}

impl SimpleBuilder {
    fn layout(mut self, layout: Layout) -> Self {
        self.0.layout = layout;
        self
    }

    fn field(mut self, field: ValueField) -> Self {
        self.0.field = field;
        self
    }

    fn devices(mut self, devices: &'static [Device]) -> Self {
        self.0.devices = devices;
        self
    }

    fn not_exported(mut self) -> Self {
        self.0.exportable = false;
        self
    }

    fn simple(self) -> SimpleType {
        self.0
    }

    fn build(self) -> MeasurementType {
        MeasurementType::Simple(self.0)
    }
}
