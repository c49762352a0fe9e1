use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::StationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatumId(pub i64);

impl fmt::Display for DatumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Additive offset taking one station's readings from `from` to `to`.
///
/// The factor is an empirical calibration for this station only; it says
/// nothing about other stations on the same datum pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatumConversion {
    pub station_id: StationId,
    pub from: DatumId,
    pub to: DatumId,
    pub factor: Option<f64>,
}

impl DatumConversion {
    pub fn new(station_id: StationId, from: DatumId, to: DatumId, factor: Option<f64>) -> Self {
        Self {
            station_id,
            from,
            to,
            factor,
        }
    }

    /// A conversion with a null factor is not usable as an edge.
    pub fn usable_factor(&self) -> Option<f64> {
        self.factor.filter(|f| f.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatumUsageCount {
    pub datum: DatumId,
    pub stations: usize,
}

impl DatumUsageCount {
    pub fn new(datum: DatumId, stations: usize) -> Self {
        Self { datum, stations }
    }
}
