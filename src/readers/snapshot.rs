use crate::models::{DataType, DatumConversion, Observation, RegulationRecord, Station, StationId};
use std::collections::HashMap;
use tracing::warn;

/// Stations keyed by id, bulk-loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct StationIndex {
    stations: HashMap<StationId, Station>,
}

impl StationIndex {
    pub fn from_stations(stations: Vec<Station>) -> Self {
        let mut map = HashMap::with_capacity(stations.len());

        for station in stations {
            map.insert(station.id.clone(), station);
        }

        Self { stations: map }
    }

    pub fn get(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn contains(&self, id: &StationId) -> bool {
        self.stations.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Stations ordered by id, for stable output.
    pub fn sorted(&self) -> Vec<&Station> {
        let mut stations: Vec<&Station> = self.stations.values().collect();
        stations.sort_by(|a, b| a.id.cmp(&b.id));
        stations
    }
}

/// Immutable view of the store for one analysis run.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub data_type: DataType,
    pub stations: StationIndex,
    pub observations: Vec<Observation>,
    pub regulation: Vec<RegulationRecord>,
    pub conversions: Vec<DatumConversion>,
    /// Observations dropped because their station is not in `STATIONS`.
    pub orphan_observations: usize,
}

impl Snapshot {
    pub fn new(
        data_type: DataType,
        stations: Vec<Station>,
        observations: Vec<Observation>,
        regulation: Vec<RegulationRecord>,
        conversions: Vec<DatumConversion>,
    ) -> Self {
        let stations = StationIndex::from_stations(stations);

        let total = observations.len();
        let observations: Vec<Observation> = observations
            .into_iter()
            .filter(|obs| stations.contains(&obs.station_id))
            .collect();
        let orphan_observations = total - observations.len();

        if orphan_observations > 0 {
            warn!(
                "Dropped {} observations whose station is not listed in STATIONS",
                orphan_observations
            );
        }

        Self {
            data_type,
            stations,
            observations,
            regulation,
            conversions,
            orphan_observations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatumId;

    fn station(id: &str) -> Station {
        Station::new(StationId::new(id), id.to_string(), 50.0, -100.0, Some(DatumId(35)))
    }

    fn observation(id: &str, year: i32) -> Observation {
        Observation::new(StationId::new(id), year, DataType::WaterLevel, Some(1.0), None, None)
    }

    #[test]
    fn test_orphan_observations_are_dropped() {
        let snapshot = Snapshot::new(
            DataType::WaterLevel,
            vec![station("01AA001")],
            vec![observation("01AA001", 2000), observation("09ZZ999", 2000)],
            vec![],
            vec![],
        );

        assert_eq!(snapshot.observations.len(), 1);
        assert_eq!(snapshot.orphan_observations, 1);
        assert_eq!(snapshot.stations.len(), 1);
    }

    #[test]
    fn test_sorted_stations() {
        let index = StationIndex::from_stations(vec![station("02B"), station("01A")]);
        let ids: Vec<&str> = index.sorted().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["01A", "02B"]);
    }
}
