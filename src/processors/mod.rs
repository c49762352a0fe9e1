pub mod aggregator;
pub mod datum_graph;
pub mod normalizer;
pub mod pipeline;
pub mod regulation_filter;

pub use aggregator::{aggregate_by_year, aggregate_values, overall_trend, yearly_temperature};
pub use datum_graph::{rank_conversion_targets, rank_datums_by_usage, DatumGraph};
pub use normalizer::{
    AlignmentOutcome, AlignmentReport, ConversionColumns, DatumAligner, EdgeMatch,
    MissingValuePolicy, NormalizationPolicy, NormalizationReport, StatisticalNormalizer,
};
pub use pipeline::{PipelineOutput, PipelineReport, TrendPipeline};
pub use regulation_filter::RegulationFilter;
