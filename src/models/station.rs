use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use crate::models::DatumId;
use crate::utils::constants::{MAP_MAX_LAT, MAP_MAX_LON, MAP_MIN_LAT, MAP_MIN_LON};

/// HYDAT station number, e.g. `01AD009`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StationId {
    fn from(number: &str) -> Self {
        Self::new(number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Station {
    pub id: StationId,

    pub name: String,

    /// NaN when the store has no value.
    #[validate(range(min = -90.0, max = 90.0), custom(function = "finite_coordinate"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0), custom(function = "finite_coordinate"))]
    pub longitude: f64,

    /// Datum the station's water levels are recorded against, if any.
    pub datum: Option<DatumId>,
}

impl Station {
    pub fn new(
        id: StationId,
        name: String,
        latitude: f64,
        longitude: f64,
        datum: Option<DatumId>,
    ) -> Self {
        Self {
            id,
            name,
            latitude,
            longitude,
            datum,
        }
    }

    pub fn is_on_datum(&self, datum: DatumId) -> bool {
        self.datum == Some(datum)
    }
}

// Range checks alone let NaN through.
fn finite_coordinate(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("missing_coordinate"))
    }
}

/// Geographic window used when exporting stations for the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl MapExtent {
    pub fn canada() -> Self {
        Self {
            min_lon: MAP_MIN_LON,
            max_lon: MAP_MAX_LON,
            min_lat: MAP_MIN_LAT,
            max_lat: MAP_MAX_LAT,
        }
    }

    pub fn contains(&self, station: &Station) -> bool {
        (self.min_lat..=self.max_lat).contains(&station.latitude)
            && (self.min_lon..=self.max_lon).contains(&station.longitude)
    }
}

impl Default for MapExtent {
    fn default() -> Self {
        Self::canada()
    }
}
