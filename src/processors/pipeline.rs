use crate::config::{AnalysisConfig, RankingSource, TargetMode};
use crate::error::{AnalysisError, Result};
use crate::models::{
    DatumId, DatumUsageCount, LabeledSeries, Observation, Presentation, SeriesKind, Station,
    YearValue,
};
use crate::processors::aggregator::{aggregate_by_year, aggregate_values, overall_trend};
use crate::processors::datum_graph::{
    producing_stations, rank_conversion_targets, rank_datums_by_usage, DatumGraph,
};
use crate::processors::normalizer::{
    forward_fill_by_station, AlignmentReport, DatumAligner, MissingValuePolicy,
    NormalizationPolicy, NormalizationReport, StatisticalNormalizer,
};
use crate::processors::RegulationFilter;
use crate::readers::Snapshot;
use crate::utils::progress::ProgressReporter;
use std::collections::HashMap;
use tracing::{info, warn};

/// Counts gathered while the pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub observations_loaded: usize,
    pub orphan_observations: usize,
    pub regulated_dropped: usize,
    pub regulated_stations: usize,
    pub producing_stations: usize,
    pub ranking: Vec<DatumUsageCount>,
    pub targets: Vec<DatumId>,
    pub alignments: Vec<AlignmentReport>,
    pub normalizations: Vec<(String, NormalizationReport)>,
}

impl PipelineReport {
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Pipeline Report ===\n");
        summary.push_str(&format!("Observations loaded: {}\n", self.observations_loaded));
        summary.push_str(&format!(
            "Dropped (unknown station): {}\n",
            self.orphan_observations
        ));
        summary.push_str(&format!(
            "Dropped (regulated): {} from {} regulated stations\n",
            self.regulated_dropped, self.regulated_stations
        ));
        summary.push_str(&format!("Producing stations: {}\n", self.producing_stations));

        if !self.alignments.is_empty() {
            summary.push_str("\nDatum alignment:\n");
            for alignment in &self.alignments {
                let target = alignment
                    .target
                    .map_or_else(|| "-".to_string(), |d| d.to_string());
                summary.push_str(&format!(
                    "  datum {}: {} native / {} converted stations, {} excluded\n",
                    target,
                    alignment.native_stations,
                    alignment.converted_stations,
                    alignment.excluded_stations
                ));
            }
        }

        for (label, normalization) in &self.normalizations {
            if !normalization.degenerate_stations.is_empty() {
                summary.push_str(&format!(
                    "\n{}: {} stations with zero variance (NaN z-scores)\n",
                    label,
                    normalization.degenerate_stations.len()
                ));
            }
        }

        summary
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub series: Vec<LabeledSeries>,
    pub presentation: Presentation,
    pub report: PipelineReport,
}

/// Regulation filter, datum normalization and yearly aggregation over one snapshot.
pub struct TrendPipeline<'a> {
    config: &'a AnalysisConfig,
    datum_names: HashMap<DatumId, String>,
}

impl<'a> TrendPipeline<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            config,
            datum_names: HashMap::new(),
        }
    }

    pub fn with_datum_names(mut self, datum_names: HashMap<DatumId, String>) -> Self {
        self.datum_names = datum_names;
        self
    }

    pub fn run(
        &self,
        snapshot: &Snapshot,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        let mut report = PipelineReport {
            observations_loaded: snapshot.observations.len() + snapshot.orphan_observations,
            orphan_observations: snapshot.orphan_observations,
            ..Default::default()
        };

        if let Some(p) = progress {
            p.set_message("Filtering regulated stations...");
        }

        let (observations, regulated_stations) = self.unregulated(snapshot);
        report.regulated_dropped = snapshot.observations.len() - observations.len();
        report.regulated_stations = regulated_stations;

        let producing = producing_stations(&snapshot.stations, &observations);
        report.producing_stations = producing.len();
        report.ranking = self.ranking(snapshot, producing);

        let series = if self.config.targets == TargetMode::Unified {
            vec![self.unified_series(&observations, &mut report)]
        } else {
            report.targets = self.select_targets(&report.ranking)?;
            let graph = DatumGraph::from_conversions(&snapshot.conversions);
            let aligner = DatumAligner::new(&snapshot.stations, &graph)
                .with_columns(self.config.convert)
                .with_edge_match(self.config.edge_match);

            let mut series = Vec::with_capacity(report.targets.len() + 1);
            for target in report.targets.clone() {
                if let Some(p) = progress {
                    p.set_message(&format!("Normalizing onto datum {}...", target));
                }

                let (aligned, alignment) = aligner.align(&observations, target);
                report.alignments.push(alignment);

                let label = self.datum_label(target);
                let points = self.normalize_and_aggregate(aligned, &label, &mut report);
                if points.is_empty() {
                    warn!("No {} values could be expressed on {}", self.config.column, label);
                    continue;
                }

                series.push(LabeledSeries::new(
                    label,
                    SeriesKind::TargetDatum(target),
                    Some(self.config.column),
                    points,
                ));
            }

            if self.config.overall_trend && !series.is_empty() {
                let trend = overall_trend(&series);
                series.push(LabeledSeries::new(
                    "overall trend",
                    SeriesKind::OverallTrend,
                    Some(self.config.column),
                    trend,
                ));
            }

            series
        };

        info!("Pipeline produced {} series", series.len());

        Ok(PipelineOutput {
            series,
            presentation: self.presentation(),
            report,
        })
    }

    /// Datum usage ranking over the stations that survive the regulation filter.
    pub fn rank_datums(&self, snapshot: &Snapshot) -> Vec<DatumUsageCount> {
        let (observations, _) = self.unregulated(snapshot);
        self.ranking(snapshot, producing_stations(&snapshot.stations, &observations))
    }

    /// Observations kept by the regulation filter, and how many stations it excluded.
    fn unregulated(&self, snapshot: &Snapshot) -> (Vec<Observation>, usize) {
        if !self.config.exclude_regulated {
            return (snapshot.observations.clone(), 0);
        }

        let filter = RegulationFilter::new(&snapshot.regulation);
        let kept = filter.filter_unregulated(snapshot.observations.clone());
        (kept, filter.regulated_count())
    }

    fn ranking(&self, snapshot: &Snapshot, producing: Vec<&Station>) -> Vec<DatumUsageCount> {
        match self.config.ranking {
            RankingSource::AssignedDatum => rank_datums_by_usage(producing),
            RankingSource::ConversionTarget => rank_conversion_targets(&snapshot.conversions),
        }
    }

    pub fn datum_label(&self, datum: DatumId) -> String {
        match self.datum_names.get(&datum) {
            Some(name) => format!("datum {} ({})", datum, name),
            None => format!("datum {}", datum),
        }
    }

    fn select_targets(&self, ranking: &[DatumUsageCount]) -> Result<Vec<DatumId>> {
        let targets: Vec<DatumId> = match self.config.targets {
            TargetMode::Ranked => ranking
                .iter()
                .take(self.config.top_n)
                .map(|u| u.datum)
                .collect(),
            TargetMode::All => ranking.iter().map(|u| u.datum).collect(),
            TargetMode::Explicit => self.config.target_datums.clone(),
            TargetMode::Unified => Vec::new(),
        };

        if targets.is_empty() {
            return Err(AnalysisError::MissingData(
                "no datum is in use by the selected stations".to_string(),
            ));
        }

        info!(
            "Target datums: {}",
            targets
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(targets)
    }

    fn normalize_and_aggregate(
        &self,
        mut observations: Vec<Observation>,
        label: &str,
        report: &mut PipelineReport,
    ) -> Vec<YearValue> {
        let column = self.config.column;

        match self.config.policy {
            NormalizationPolicy::TargetDatum => {
                if self.config.missing == MissingValuePolicy::ForwardFill {
                    forward_fill_by_station(&mut observations, column);
                }
                aggregate_by_year(&observations, column)
            }
            NormalizationPolicy::Statistical => {
                let (values, normalization) =
                    StatisticalNormalizer::new(column).normalize(&observations);
                report
                    .normalizations
                    .push((label.to_string(), normalization));
                aggregate_values(values.into_iter().map(|v| (v.year, v.value)))
            }
        }
    }

    fn unified_series(
        &self,
        observations: &[Observation],
        report: &mut PipelineReport,
    ) -> LabeledSeries {
        let label = "all stations";
        let points = self.normalize_and_aggregate(observations.to_vec(), label, report);

        LabeledSeries::new(label, SeriesKind::Unified, Some(self.config.column), points)
    }

    fn presentation(&self) -> Presentation {
        let column = self.config.column.title();
        let data = self.config.data_type.display_name().to_lowercase();

        match self.config.policy {
            NormalizationPolicy::TargetDatum => Presentation::new(
                format!("{} annual {} by reference datum", column, data),
                "Year",
                format!("{} {}", column, data),
            ),
            NormalizationPolicy::Statistical => Presentation::new(
                format!("Normalized {} annual {} (all datums)", column, data),
                "Year",
                format!("Z-score normalized {} {}", column, data),
            ),
        }
    }
}
