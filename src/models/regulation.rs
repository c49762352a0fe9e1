use serde::{Deserialize, Serialize};

use crate::models::StationId;

/// Row of `STN_REGULATION`. A station with no record is unregulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationRecord {
    pub station_id: StationId,
    pub regulated: bool,
}

impl RegulationRecord {
    pub fn new(station_id: StationId, regulated: bool) -> Self {
        Self {
            station_id,
            regulated,
        }
    }
}
