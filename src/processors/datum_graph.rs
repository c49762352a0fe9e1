use crate::models::{DatumConversion, DatumId, DatumUsageCount, Observation, Station, StationId};
use crate::readers::StationIndex;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    from: DatumId,
    to: DatumId,
    factor: f64,
}

/// Station-specific conversion edges between datums.
///
/// Lookups are on (station, from, to), or on (station, to) via
/// [`DatumGraph::edge_to`]. Edges are never chained through intermediate
/// datums: each factor is a calibration for one station, and a missing direct
/// edge means the station cannot be expressed on that datum.
#[derive(Debug, Clone, Default)]
pub struct DatumGraph {
    edges: HashMap<StationId, Vec<Edge>>,
    edge_count: usize,
}

impl DatumGraph {
    pub fn from_conversions(conversions: &[DatumConversion]) -> Self {
        let mut graph = Self::default();
        let mut null_factors = 0usize;

        for conversion in conversions {
            let Some(factor) = conversion.usable_factor() else {
                null_factors += 1;
                continue;
            };

            let edges = graph.edges.entry(conversion.station_id.clone()).or_default();
            if edges
                .iter()
                .any(|e| e.from == conversion.from && e.to == conversion.to)
            {
                warn!(
                    "Duplicate conversion {} -> {} for station {}, keeping the first",
                    conversion.from, conversion.to, conversion.station_id
                );
                continue;
            }

            edges.push(Edge {
                from: conversion.from,
                to: conversion.to,
                factor,
            });
            graph.edge_count += 1;
        }

        if null_factors > 0 {
            debug!("Ignored {} conversions without a factor", null_factors);
        }

        graph
    }

    /// Direct conversion factor for this station and datum pair, if one exists.
    pub fn conversion_factor(
        &self,
        station_id: &StationId,
        from: DatumId,
        to: DatumId,
    ) -> Option<f64> {
        self.edges
            .get(station_id)?
            .iter()
            .find(|e| e.from == from && e.to == to)
            .map(|e| e.factor)
    }

    /// Factor of this station's only edge into `to`, whatever datum it starts from.
    ///
    /// `None` when the station has no such edge, or several that disagree on
    /// their origin; the latter are ambiguous and logged.
    pub fn edge_to(&self, station_id: &StationId, to: DatumId) -> Option<f64> {
        let mut into_target = self.edges.get(station_id)?.iter().filter(|e| e.to == to);
        let first = into_target.next()?;

        if into_target.next().is_some() {
            warn!(
                "Station {} has several conversions into datum {}, excluding it",
                station_id, to
            );
            return None;
        }

        Some(first.factor)
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn station_count(&self) -> usize {
        self.edges.len()
    }
}

/// Stations that report at least one observation.
pub fn producing_stations<'a>(
    stations: &'a StationIndex,
    observations: &[Observation],
) -> Vec<&'a Station> {
    let ids: HashSet<&StationId> = observations.iter().map(|o| &o.station_id).collect();
    let mut producing: Vec<&Station> = ids.into_iter().filter_map(|id| stations.get(id)).collect();
    producing.sort_by(|a, b| a.id.cmp(&b.id));
    producing
}

/// Datums ordered by how many of the given stations are assigned to them.
///
/// Most-used first; ties go to the smaller datum id. Stations without an
/// assigned datum are not counted.
pub fn rank_datums_by_usage<'a, I>(stations: I) -> Vec<DatumUsageCount>
where
    I: IntoIterator<Item = &'a Station>,
{
    let mut counts: BTreeMap<DatumId, usize> = BTreeMap::new();
    for station in stations {
        if let Some(datum) = station.datum {
            *counts.entry(datum).or_default() += 1;
        }
    }

    sort_usage(counts)
}

/// Datums ordered by how many conversion records point at them.
pub fn rank_conversion_targets(conversions: &[DatumConversion]) -> Vec<DatumUsageCount> {
    let mut counts: BTreeMap<DatumId, usize> = BTreeMap::new();
    for conversion in conversions {
        *counts.entry(conversion.to).or_default() += 1;
    }

    sort_usage(counts)
}

fn sort_usage(counts: BTreeMap<DatumId, usize>) -> Vec<DatumUsageCount> {
    let mut ranked: Vec<DatumUsageCount> = counts
        .into_iter()
        .map(|(datum, stations)| DatumUsageCount { datum, stations })
        .collect();

    ranked.sort_by(|a, b| b.stations.cmp(&a.stations).then_with(|| a.datum.cmp(&b.datum)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataType;
    use pretty_assertions::assert_eq;

    fn conversion(id: &str, from: i64, to: i64, factor: Option<f64>) -> DatumConversion {
        DatumConversion::new(StationId::new(id), DatumId(from), DatumId(to), factor)
    }

    fn station(id: &str, datum: Option<i64>) -> Station {
        Station::new(StationId::new(id), id.to_string(), 50.0, -100.0, datum.map(DatumId))
    }

    #[test]
    fn test_exact_lookup_only() {
        let graph = DatumGraph::from_conversions(&[
            conversion("A", 10, 35, Some(141.9)),
            conversion("A", 35, 90, Some(-0.06)),
        ]);

        let a = StationId::new("A");
        assert_eq!(graph.conversion_factor(&a, DatumId(10), DatumId(35)), Some(141.9));
        assert_eq!(graph.conversion_factor(&a, DatumId(35), DatumId(90)), Some(-0.06));
        // No chaining 10 -> 35 -> 90
        assert_eq!(graph.conversion_factor(&a, DatumId(10), DatumId(90)), None);
        // No reverse edge
        assert_eq!(graph.conversion_factor(&a, DatumId(35), DatumId(10)), None);
    }

    #[test]
    fn test_edge_to_ignores_origin_but_not_ambiguity() {
        let graph = DatumGraph::from_conversions(&[
            conversion("N", 405, 35, Some(5.0)),
            conversion("M", 10, 35, Some(1.5)),
            conversion("M", 405, 35, Some(2.5)),
            conversion("M", 405, 90, Some(7.0)),
        ]);

        assert_eq!(graph.edge_to(&StationId::new("N"), DatumId(35)), Some(5.0));
        assert_eq!(graph.edge_to(&StationId::new("M"), DatumId(90)), Some(7.0));
        // Two edges into 35 from different datums
        assert_eq!(graph.edge_to(&StationId::new("M"), DatumId(35)), None);
        assert_eq!(graph.edge_to(&StationId::new("N"), DatumId(90)), None);
        assert_eq!(graph.edge_to(&StationId::new("X"), DatumId(35)), None);
    }

    #[test]
    fn test_factor_is_not_transferable_between_stations() {
        let graph = DatumGraph::from_conversions(&[conversion("A", 10, 35, Some(5.0))]);
        assert_eq!(
            graph.conversion_factor(&StationId::new("B"), DatumId(10), DatumId(35)),
            None
        );
    }

    #[test]
    fn test_null_factor_is_no_edge() {
        let graph = DatumGraph::from_conversions(&[conversion("A", 10, 35, None)]);
        assert_eq!(
            graph.conversion_factor(&StationId::new("A"), DatumId(10), DatumId(35)),
            None
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_edges_keep_first() {
        let graph = DatumGraph::from_conversions(&[
            conversion("A", 10, 35, Some(1.0)),
            conversion("A", 10, 35, Some(2.0)),
        ]);
        assert_eq!(
            graph.conversion_factor(&StationId::new("A"), DatumId(10), DatumId(35)),
            Some(1.0)
        );
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.station_count(), 1);
    }

    #[test]
    fn test_rank_datums_by_usage() {
        let stations = vec![
            station("A", Some(605)),
            station("B", Some(35)),
            station("C", Some(605)),
            station("D", Some(35)),
            station("E", Some(10)),
            station("F", None),
        ];

        let ranked = rank_datums_by_usage(&stations);
        let order: Vec<(i64, usize)> = ranked.iter().map(|u| (u.datum.0, u.stations)).collect();

        // 35 and 605 tie at 2, smaller id first
        assert_eq!(order, vec![(35, 2), (605, 2), (10, 1)]);
    }

    #[test]
    fn test_ranking_counts_only_producing_stations() {
        let index = StationIndex::from_stations(vec![
            station("A", Some(605)),
            station("B", Some(35)),
            station("C", Some(35)),
        ]);
        let observations = vec![Observation::new(
            StationId::new("A"),
            2000,
            DataType::WaterLevel,
            Some(1.0),
            None,
            None,
        )];

        let producing = producing_stations(&index, &observations);
        let ranked = rank_datums_by_usage(producing);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].datum, DatumId(605));
    }

    #[test]
    fn test_rank_conversion_targets() {
        let ranked = rank_conversion_targets(&[
            conversion("A", 405, 415, Some(168.2)),
            conversion("B", 10, 35, Some(141.9)),
            conversion("C", 10, 35, Some(104.5)),
        ]);
        assert_eq!(ranked[0].datum, DatumId(35));
        assert_eq!(ranked[0].stations, 2);
        assert_eq!(ranked[1].datum, DatumId(415));
    }
}
