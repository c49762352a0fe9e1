use crate::models::{Observation, RegulationRecord, StationId};
use std::collections::HashSet;
use tracing::info;

/// Drops observations from stations on artificially controlled waterways.
///
/// A station is regulated when any of its regulation records carries a true
/// flag. Stations with no record, or only false flags, are unregulated.
pub struct RegulationFilter {
    regulated: HashSet<StationId>,
}

impl RegulationFilter {
    pub fn new(records: &[RegulationRecord]) -> Self {
        let regulated = records
            .iter()
            .filter(|r| r.regulated)
            .map(|r| r.station_id.clone())
            .collect();

        Self { regulated }
    }

    pub fn is_unregulated(&self, station_id: &StationId) -> bool {
        !self.regulated.contains(station_id)
    }

    pub fn regulated_count(&self) -> usize {
        self.regulated.len()
    }

    pub fn filter_unregulated(&self, observations: Vec<Observation>) -> Vec<Observation> {
        let total = observations.len();
        let kept: Vec<Observation> = observations
            .into_iter()
            .filter(|obs| self.is_unregulated(&obs.station_id))
            .collect();

        info!(
            "Regulation filter kept {} of {} observations ({} regulated stations)",
            kept.len(),
            total,
            self.regulated.len()
        );

        kept
    }
}

pub fn is_unregulated(station_id: &StationId, records: &[RegulationRecord]) -> bool {
    !records
        .iter()
        .any(|r| r.regulated && &r.station_id == station_id)
}

pub fn filter_unregulated(
    observations: Vec<Observation>,
    records: &[RegulationRecord],
) -> Vec<Observation> {
    RegulationFilter::new(records).filter_unregulated(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataType;
    use pretty_assertions::assert_eq;

    fn obs(id: &str, year: i32) -> Observation {
        Observation::new(StationId::new(id), year, DataType::WaterLevel, Some(1.0), None, None)
    }

    fn records() -> Vec<RegulationRecord> {
        vec![
            RegulationRecord::new(StationId::new("A"), true),
            RegulationRecord::new(StationId::new("B"), false),
        ]
    }

    #[test]
    fn test_is_unregulated() {
        let records = records();
        assert!(!is_unregulated(&StationId::new("A"), &records));
        assert!(is_unregulated(&StationId::new("B"), &records));
        // No record at all
        assert!(is_unregulated(&StationId::new("C"), &records));
    }

    #[test]
    fn test_any_true_flag_marks_station_regulated() {
        let records = vec![
            RegulationRecord::new(StationId::new("A"), false),
            RegulationRecord::new(StationId::new("A"), true),
        ];
        let filter = RegulationFilter::new(&records);
        assert!(!filter.is_unregulated(&StationId::new("A")));
        assert_eq!(filter.regulated_count(), 1);
    }

    #[test]
    fn test_filter_removes_regulated_stations() {
        let input = vec![obs("A", 2000), obs("B", 2000), obs("C", 2000), obs("A", 2001)];
        let kept = filter_unregulated(input, &records());

        let ids: Vec<&str> = kept.iter().map(|o| o.station_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let input = vec![obs("A", 2000), obs("B", 2000), obs("C", 2001)];
        let filter = RegulationFilter::new(&records());

        let once = filter.filter_unregulated(input);
        let twice = filter.filter_unregulated(once.clone());
        assert_eq!(once, twice);
    }
}
