//! Static registry of known home-monitoring devices
//!
//! Devices only decorate a report with provenance. They never decide
//! whether a measurement is exported.

use crate::domain::measurement::DeviceCapture;

/// Declarative match rule over the manufacturer and model reported by a device
///
/// Manufacturer must match ignoring case. Every entry in `model_contains`
/// must occur in the lowercased model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMatcher {
    pub manufacturer: &'static str,
    pub model_contains: &'static [&'static str],
}

impl DeviceMatcher {
    pub fn matches(&self, capture: &DeviceCapture) -> bool {
        if !self.manufacturer.eq_ignore_ascii_case(capture.manufacturer.trim()) {
            return false;
        }
        let model = capture.model.to_lowercase();
        self.model_contains
            .iter()
            .all(|fragment| model.contains(fragment))
    }
}

/// A device with a national device identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub name: &'static str,
    pub medcom_id: &'static str,
    pub manufacturer: &'static str,
    pub product_type: &'static str,
    pub model: &'static str,
    pub matcher: DeviceMatcher,
}

impl Device {
    pub fn matches(&self, capture: &DeviceCapture) -> bool {
        self.matcher.matches(capture)
    }
}

const AND_MEDICAL: &str = "A&D Medical";
const NONIN: &str = "Nonin";

pub const AND_302: Device = Device {
    name: "AnD302",
    medcom_id: "MCI00010",
    manufacturer: AND_MEDICAL,
    product_type: "Thermometer",
    model: "UT-302PlusBT Bluetooth",
    matcher: DeviceMatcher {
        manufacturer: AND_MEDICAL,
        model_contains: &["302"],
    },
};

pub const AND_321: Device = Device {
    name: "AnD321",
    medcom_id: "MCI00002",
    manufacturer: AND_MEDICAL,
    product_type: "Weight",
    model: "UC-321PlusBT-C Bluetooth",
    matcher: DeviceMatcher {
        manufacturer: AND_MEDICAL,
        model_contains: &["321"],
    },
};

pub const AND_351: Device = Device {
    name: "AnD351",
    medcom_id: "MCI00011",
    manufacturer: AND_MEDICAL,
    product_type: "Weight",
    model: "UC-351PlusBT-Ci Bluetooth",
    matcher: DeviceMatcher {
        manufacturer: AND_MEDICAL,
        model_contains: &["351"],
    },
};

pub const AND_767C: Device = Device {
    name: "AnD767C",
    medcom_id: "MCI00004",
    manufacturer: AND_MEDICAL,
    product_type: "Blood Pressure Monitor",
    model: "UA-767PlusBT-C Bluetooth",
    matcher: DeviceMatcher {
        manufacturer: AND_MEDICAL,
        model_contains: &["767", "c"],
    },
};

pub const AND_767CI: Device = Device {
    name: "AnD767Ci",
    medcom_id: "MCI00012",
    manufacturer: AND_MEDICAL,
    product_type: "Blood Pressure Monitor",
    model: "UA-767PlusBT-Ci Bluetooth",
    matcher: DeviceMatcher {
        manufacturer: AND_MEDICAL,
        model_contains: &["767", "ci"],
    },
};

pub const NONIN_3230: Device = Device {
    name: "Nonin3230",
    medcom_id: "MCI00013",
    manufacturer: NONIN,
    product_type: "Pulse Oximeter",
    model: "3230 Bluetooth Smart Pulse Oximeter",
    matcher: DeviceMatcher {
        manufacturer: NONIN,
        model_contains: &["3230"],
    },
};

pub const NONIN_9560: Device = Device {
    name: "Nonin9560",
    medcom_id: "MCI00005",
    manufacturer: NONIN,
    product_type: "Pulse Oximeter",
    model: "Onyx II 9560 Bluetooth Pulse Oximeter",
    matcher: DeviceMatcher {
        manufacturer: NONIN,
        model_contains: &["9560"],
    },
};

pub const VITALOGRAPH_4000: Device = Device {
    name: "Vitalograph4000",
    medcom_id: "MCI00014",
    manufacturer: "Vitalograph",
    product_type: "Lung Monitor",
    model: "4000 Lung Monitor Bluetooth",
    matcher: DeviceMatcher {
        manufacturer: "Vitalograph",
        model_contains: &[],
    },
};

/// Every known device
pub const ALL_DEVICES: &[Device] = &[
    AND_302,
    AND_321,
    AND_351,
    AND_767C,
    AND_767CI,
    NONIN_3230,
    NONIN_9560,
    VITALOGRAPH_4000,
];

/// Last device in `candidates` matching the capture
///
/// Later entries win, so a more specific model listed after a general one
/// takes precedence.
pub fn resolve<'a>(candidates: &'a [Device], capture: &DeviceCapture) -> Option<&'a Device> {
    candidates.iter().rev().find(|device| device.matches(capture))
}
