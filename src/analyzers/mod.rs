pub mod series_analyzer;

pub use series_analyzer::{least_squares_slope, SeriesAnalyzer, SeriesStatistics};
