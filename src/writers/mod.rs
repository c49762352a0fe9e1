pub mod csv_writer;
pub mod json_writer;
pub mod parquet_writer;

pub use csv_writer::{write_series_csv, write_series_csv_file, write_stations_csv};
pub use json_writer::{write_series_json, write_series_json_file, SeriesDocument};
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};

use crate::config::{OutputConfig, OutputFormat};
use crate::error::Result;
use crate::models::{LabeledSeries, Presentation};
use std::path::Path;

/// Write series to `path` in the configured format, creating parent directories.
pub fn write_series(
    series: &[LabeledSeries],
    presentation: &Presentation,
    path: &Path,
    output: &OutputConfig,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match output.format {
        OutputFormat::Csv => write_series_csv_file(series, path),
        OutputFormat::Json => write_series_json_file(series, presentation, path),
        OutputFormat::Parquet => ParquetWriter::new()
            .with_compression(&output.compression)?
            .write_series(series, path),
    }
}
