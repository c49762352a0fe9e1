use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::StationId;

/// Water temperature taken with a sediment sample (`SED_SAMPLES`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    pub station_id: StationId,
    pub date: NaiveDate,
    pub temperature: f64,
}

impl TemperatureSample {
    pub fn new(station_id: StationId, date: NaiveDate, temperature: f64) -> Self {
        Self {
            station_id,
            date,
            temperature,
        }
    }
}
