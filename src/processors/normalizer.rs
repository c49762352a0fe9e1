use crate::models::{DatumId, Observation, StatColumn, StationId};
use crate::processors::DatumGraph;
use crate::readers::StationIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How observations recorded on different datums are made comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationPolicy {
    /// Shift every station onto one target datum using its own conversion factor.
    #[default]
    TargetDatum,
    /// Forward-fill and z-score each station's series independently.
    Statistical,
}

/// Missing-value handling before aggregation under the target-datum policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingValuePolicy {
    /// Missing values simply do not contribute.
    #[default]
    Skip,
    /// Carry each station's last valid value forward.
    ForwardFill,
}

/// Which statistic columns receive the conversion factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionColumns {
    pub mean: bool,
    pub min: bool,
    pub max: bool,
}

impl ConversionColumns {
    pub fn all() -> Self {
        Self {
            mean: true,
            min: true,
            max: true,
        }
    }

    pub fn only(column: StatColumn) -> Self {
        Self {
            mean: column == StatColumn::Mean,
            min: column == StatColumn::Min,
            max: column == StatColumn::Max,
        }
    }

    pub fn applies_to(&self, column: StatColumn) -> bool {
        match column {
            StatColumn::Mean => self.mean,
            StatColumn::Min => self.min,
            StatColumn::Max => self.max,
        }
    }
}

impl Default for ConversionColumns {
    fn default() -> Self {
        Self::all()
    }
}

/// Which conversion edges may carry a station onto a target datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeMatch {
    /// Only the edge leaving the station's assigned datum.
    AssignedFrom,
    /// The edge from the assigned datum if present, otherwise the station's
    /// single edge into the target from any datum.
    #[default]
    AnyFrom,
}

/// How one station relates to a target datum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignmentOutcome {
    /// Already recorded on the target.
    Native,
    /// Direct edge to the target with this additive factor.
    Converted(f64),
    /// Neither native nor directly convertible.
    Excluded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentReport {
    pub target: Option<DatumId>,
    pub native_rows: usize,
    pub converted_rows: usize,
    pub excluded_rows: usize,
    pub native_stations: usize,
    pub converted_stations: usize,
    pub excluded_stations: usize,
}

impl AlignmentReport {
    pub fn aligned_rows(&self) -> usize {
        self.native_rows + self.converted_rows
    }
}

/// Target-datum policy.
pub struct DatumAligner<'a> {
    stations: &'a StationIndex,
    graph: &'a DatumGraph,
    columns: ConversionColumns,
    edge_match: EdgeMatch,
}

impl<'a> DatumAligner<'a> {
    pub fn new(stations: &'a StationIndex, graph: &'a DatumGraph) -> Self {
        Self {
            stations,
            graph,
            columns: ConversionColumns::all(),
            edge_match: EdgeMatch::default(),
        }
    }

    pub fn with_columns(mut self, columns: ConversionColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_edge_match(mut self, edge_match: EdgeMatch) -> Self {
        self.edge_match = edge_match;
        self
    }

    pub fn outcome(&self, station_id: &StationId, target: DatumId) -> AlignmentOutcome {
        let Some(station) = self.stations.get(station_id) else {
            return AlignmentOutcome::Excluded;
        };

        // A native match wins over any edge the station may also have to the target.
        if station.is_on_datum(target) {
            return AlignmentOutcome::Native;
        }

        let assigned = station
            .datum
            .and_then(|from| self.graph.conversion_factor(station_id, from, target));

        let factor = match (assigned, self.edge_match) {
            (Some(factor), _) => Some(factor),
            (None, EdgeMatch::AssignedFrom) => None,
            (None, EdgeMatch::AnyFrom) => self.graph.edge_to(station_id, target),
        };

        factor.map_or(AlignmentOutcome::Excluded, AlignmentOutcome::Converted)
    }

    /// Express `observations` on `target`, dropping stations that cannot be.
    pub fn align(
        &self,
        observations: &[Observation],
        target: DatumId,
    ) -> (Vec<Observation>, AlignmentReport) {
        let mut report = AlignmentReport {
            target: Some(target),
            ..Default::default()
        };
        let mut outcomes: BTreeMap<&StationId, AlignmentOutcome> = BTreeMap::new();
        let mut aligned = Vec::new();

        for obs in observations {
            let outcome = *outcomes
                .entry(&obs.station_id)
                .or_insert_with(|| self.outcome(&obs.station_id, target));

            match outcome {
                AlignmentOutcome::Native => {
                    report.native_rows += 1;
                    aligned.push(obs.clone());
                }
                AlignmentOutcome::Converted(factor) => {
                    report.converted_rows += 1;
                    aligned.push(self.convert(obs, factor));
                }
                AlignmentOutcome::Excluded => report.excluded_rows += 1,
            }
        }

        for outcome in outcomes.values() {
            match outcome {
                AlignmentOutcome::Native => report.native_stations += 1,
                AlignmentOutcome::Converted(_) => report.converted_stations += 1,
                AlignmentOutcome::Excluded => report.excluded_stations += 1,
            }
        }

        info!(
            "Datum {}: {} native rows, {} converted rows, {} stations excluded",
            target, report.native_rows, report.converted_rows, report.excluded_stations
        );

        (aligned, report)
    }

    fn convert(&self, obs: &Observation, factor: f64) -> Observation {
        let mut converted = obs.clone();
        for column in StatColumn::ALL {
            if self.columns.applies_to(column) {
                converted.set_value(column, obs.value(column).map(|v| v + factor));
            }
        }
        converted
    }
}

/// Replace each missing value with the last valid one before it.
///
/// Values before the first valid entry stay missing.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
}

/// Forward-fill `column` within each station, in year order.
///
/// The result is sorted by station then year.
pub fn forward_fill_by_station(observations: &mut [Observation], column: StatColumn) {
    observations.sort_by(|a, b| {
        a.station_id
            .cmp(&b.station_id)
            .then_with(|| a.year.cmp(&b.year))
    });

    let mut last: Option<f64> = None;

    for i in 0..observations.len() {
        if i > 0 && observations[i].station_id != observations[i - 1].station_id {
            last = None;
        }

        match observations[i].value(column) {
            Some(v) => last = Some(v),
            None => observations[i].set_value(column, last),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZScore {
    pub values: Vec<Option<f64>>,
    /// Fewer than two valid values or zero spread: every valid value is NaN.
    pub degenerate: bool,
}

/// Z-score a series against its own mean and sample standard deviation.
pub fn z_score(values: &[Option<f64>]) -> ZScore {
    let valid: Vec<f64> = values.iter().flatten().copied().collect();

    if valid.is_empty() {
        return ZScore {
            values: values.to_vec(),
            degenerate: false,
        };
    }

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let std_dev = if valid.len() > 1 {
        (valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        f64::NAN
    };

    let degenerate = !std_dev.is_finite() || std_dev == 0.0;
    let normalized = values
        .iter()
        .map(|value| {
            value.map(|v| {
                if degenerate {
                    f64::NAN
                } else {
                    (v - mean) / std_dev
                }
            })
        })
        .collect();

    ZScore {
        values: normalized,
        degenerate,
    }
}

/// A single normalized value, still attributed to its station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationYearValue {
    pub station_id: StationId,
    pub year: i32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationReport {
    pub stations: usize,
    /// Stations with no valid value at all; they contribute nothing.
    pub empty_stations: usize,
    /// Stations whose z-score is undefined; their values are NaN.
    pub degenerate_stations: Vec<StationId>,
}

/// Statistical policy: per-station forward fill, then per-station z-score.
pub struct StatisticalNormalizer {
    column: StatColumn,
}

impl StatisticalNormalizer {
    pub fn new(column: StatColumn) -> Self {
        Self { column }
    }

    pub fn normalize(
        &self,
        observations: &[Observation],
    ) -> (Vec<StationYearValue>, NormalizationReport) {
        let mut by_station: BTreeMap<&StationId, Vec<(i32, Option<f64>)>> = BTreeMap::new();
        for obs in observations {
            by_station
                .entry(&obs.station_id)
                .or_default()
                .push((obs.year, obs.value(self.column)));
        }

        let mut report = NormalizationReport {
            stations: by_station.len(),
            ..Default::default()
        };
        let mut output = Vec::with_capacity(observations.len());

        for (station_id, mut series) in by_station {
            series.sort_by_key(|(year, _)| *year);

            let mut values: Vec<Option<f64>> = series.iter().map(|(_, v)| *v).collect();
            forward_fill(&mut values);

            if values.iter().all(Option::is_none) {
                report.empty_stations += 1;
                continue;
            }

            let scored = z_score(&values);
            if scored.degenerate {
                debug!("Station {} has zero variance, z-scores undefined", station_id);
                report.degenerate_stations.push(station_id.clone());
            }

            output.extend(series.iter().zip(scored.values).map(|((year, _), value)| {
                StationYearValue {
                    station_id: station_id.clone(),
                    year: *year,
                    value,
                }
            }));
        }

        if !report.degenerate_stations.is_empty() {
            warn!(
                "{} stations have degenerate {} series (NaN z-scores)",
                report.degenerate_stations.len(),
                self.column
            );
        }

        (output, report)
    }
}
