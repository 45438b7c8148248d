//! Wire models for the measurement listing endpoint

use crate::domain::Measurement;
use serde::{Deserialize, Serialize};

/// One page of measurements
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementPage {
    #[serde(default)]
    pub results: Vec<Measurement>,

    /// Total number of measurements matching the query
    #[serde(default)]
    pub total: usize,

    /// Page size the source applied
    #[serde(default)]
    pub max: usize,

    #[serde(default)]
    pub offset: usize,

    #[serde(default)]
    pub links: PageLinks,
}

/// Paging links
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default, rename = "self")]
    pub self_link: Option<String>,

    #[serde(default)]
    pub next: Option<String>,

    #[serde(default)]
    pub previous: Option<String>,
}
