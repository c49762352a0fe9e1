use crate::error::{AnalysisError, Result};
use crate::models::LabeledSeries;
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{Float64Array, Int32Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(AnalysisError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    /// Write all series in long format, one row per (series, year).
    pub fn write_series(&self, series: &[LabeledSeries], path: &Path) -> Result<()> {
        let schema = self.create_schema();
        let batch = self.series_to_batch(series, schema.clone())?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(DEFAULT_ROW_GROUP_SIZE)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    fn create_schema(&self) -> Arc<Schema> {
        let fields = vec![
            Field::new("series", DataType::Utf8, false),
            Field::new("kind", DataType::Utf8, false),
            Field::new("column", DataType::Utf8, true),
            Field::new("year", DataType::Int32, false),
            Field::new("value", DataType::Float64, false),
            Field::new("contributors", DataType::UInt64, false),
        ];

        Arc::new(Schema::new(fields))
    }

    fn series_to_batch(&self, series: &[LabeledSeries], schema: Arc<Schema>) -> Result<RecordBatch> {
        let rows = series.iter().map(|s| s.points.len()).sum();

        let mut labels: Vec<String> = Vec::with_capacity(rows);
        let mut kinds: Vec<String> = Vec::with_capacity(rows);
        let mut columns: Vec<Option<&'static str>> = Vec::with_capacity(rows);
        let mut years: Vec<i32> = Vec::with_capacity(rows);
        let mut values: Vec<f64> = Vec::with_capacity(rows);
        let mut contributors: Vec<u64> = Vec::with_capacity(rows);

        for s in series {
            let kind = s.kind.to_string();
            for point in &s.points {
                labels.push(s.label.clone());
                kinds.push(kind.clone());
                columns.push(s.column.map(|c| c.as_str()));
                years.push(point.year);
                values.push(point.value);
                contributors.push(point.contributors as u64);
            }
        }

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(labels)),
                Arc::new(StringArray::from(kinds)),
                Arc::new(StringArray::from(columns)),
                Arc::new(Int32Array::from(years)),
                Arc::new(Float64Array::from(values)),
                Arc::new(UInt64Array::from(contributors)),
            ],
        )?;

        Ok(batch)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatumId, SeriesKind, StatColumn, YearValue};
    use tempfile::NamedTempFile;

    fn sample_series() -> Vec<LabeledSeries> {
        vec![
            LabeledSeries::new(
                "datum 35",
                SeriesKind::TargetDatum(DatumId(35)),
                Some(StatColumn::Mean),
                vec![YearValue::new(2019, 101.0, 2), YearValue::new(2020, 102.5, 2)],
            ),
            LabeledSeries::new(
                "water temperature",
                SeriesKind::Temperature,
                None,
                vec![YearValue::new(1965, 12.0, 4)],
            ),
        ]
    }

    #[test]
    fn test_write_series() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_series(&sample_series(), temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 3);
        assert!(info.file_size > 0);

        Ok(())
    }

    #[test]
    fn test_write_empty_series() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_series(&[], temp_file.path())?;
        assert_eq!(writer.get_file_info(temp_file.path())?.total_rows, 0);

        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in crate::utils::constants::COMPRESSIONS {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_series(&sample_series(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-max").is_err());
        Ok(())
    }
}
