use crate::error::{AnalysisError, Result};
use crate::models::{DataType, DatumId, StatColumn};
use crate::processors::{ConversionColumns, EdgeMatch, MissingValuePolicy, NormalizationPolicy};
use crate::utils::constants::{
    COMPRESSIONS, DEFAULT_TEMPERATURE_SINCE, DEFAULT_TOP_N, ENV_PREFIX,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings for one analysis run.
///
/// Layered lowest to highest: serde defaults, TOML file, `HYDAT_*`
/// environment variables (`__` separates nested keys), command-line flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// HYDAT SQLite file.
    #[serde(default)]
    pub dataset: Option<PathBuf>,

    /// Zip archive containing the SQLite file, used instead of `dataset`.
    #[serde(default)]
    pub archive: Option<PathBuf>,

    #[serde(default = "default_data_type")]
    pub data_type: DataType,

    #[serde(default = "default_column")]
    pub column: StatColumn,

    #[serde(default)]
    pub policy: NormalizationPolicy,

    #[serde(default)]
    pub targets: TargetMode,

    /// Datums analysed when `targets = "explicit"`.
    #[serde(default)]
    pub target_datums: Vec<DatumId>,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub ranking: RankingSource,

    #[serde(default)]
    pub convert: ConversionColumns,

    #[serde(default)]
    pub edge_match: EdgeMatch,

    #[serde(default)]
    pub missing: MissingValuePolicy,

    #[serde(default = "default_true")]
    pub exclude_regulated: bool,

    #[serde(default = "default_true")]
    pub overall_trend: bool,

    #[serde(default)]
    pub temperature: TemperatureConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetMode {
    /// The `top_n` most-used datums.
    #[default]
    Ranked,
    /// Every datum in use.
    All,
    /// The datums listed in `target_datums`.
    Explicit,
    /// No datum grouping at all; statistical policy only.
    Unified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingSource {
    /// Stations producing data, counted by their assigned datum.
    #[default]
    AssignedDatum,
    /// Conversion records, counted by target datum.
    ConversionTarget,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemperatureConfig {
    /// Earlier samples are known to be unreliable.
    #[serde(default = "default_temperature_since")]
    pub since: NaiveDate,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            since: default_temperature_since(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_compression")]
    pub compression: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: OutputFormat::default(),
            compression: default_compression(),
        }
    }
}

fn default_data_type() -> DataType {
    DataType::WaterLevel
}
fn default_column() -> StatColumn {
    StatColumn::Mean
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_true() -> bool {
    true
}
fn default_compression() -> String {
    "snappy".to_string()
}
fn default_temperature_since() -> NaiveDate {
    NaiveDate::parse_from_str(DEFAULT_TEMPERATURE_SINCE, "%Y-%m-%d").unwrap_or_default()
}

/// Where the SQLite file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Archive(PathBuf),
}

/// Command-line values applied on top of file and environment settings.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    entries: Vec<(&'static str, config::Value)>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<config::Value>) -> &mut Self {
        self.entries.push((key, value.into()));
        self
    }

    pub fn set_opt<T>(&mut self, key: &'static str, value: Option<T>) -> &mut Self
    where
        T: Into<config::Value>,
    {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AnalysisConfig {
    pub fn load(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            if !path.is_file() {
                return Err(AnalysisError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder =
                builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("target_datums"),
        );

        for (key, value) in overrides.entries {
            builder = builder.set_override(key, value)?;
        }

        let config: AnalysisConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the pipeline cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.targets == TargetMode::Ranked && self.top_n == 0 {
            return Err(AnalysisError::Config(
                "top_n must be at least 1 when targets = \"ranked\"".to_string(),
            ));
        }

        if self.targets == TargetMode::Explicit && self.target_datums.is_empty() {
            return Err(AnalysisError::Config(
                "targets = \"explicit\" needs at least one entry in target_datums".to_string(),
            ));
        }

        if self.targets == TargetMode::Unified && self.policy == NormalizationPolicy::TargetDatum {
            return Err(AnalysisError::Config(
                "targets = \"unified\" is only meaningful with policy = \"statistical\"".to_string(),
            ));
        }

        if self.dataset.is_some() && self.archive.is_some() {
            return Err(AnalysisError::Config(
                "set either dataset or archive, not both".to_string(),
            ));
        }

        let compression = self.output.compression.to_lowercase();
        if !COMPRESSIONS.contains(&compression.as_str()) {
            return Err(AnalysisError::Config(format!(
                "unknown compression \"{}\" (expected one of: {})",
                self.output.compression,
                COMPRESSIONS.join(", ")
            )));
        }

        Ok(())
    }

    pub fn dataset_source(&self) -> Result<DatasetSource> {
        match (&self.dataset, &self.archive) {
            (Some(path), None) => Ok(DatasetSource::File(path.clone())),
            (None, Some(path)) => Ok(DatasetSource::Archive(path.clone())),
            (None, None) => Err(AnalysisError::Config(
                "no dataset configured (use --dataset or --archive)".to_string(),
            )),
            (Some(_), Some(_)) => Err(AnalysisError::Config(
                "set either dataset or archive, not both".to_string(),
            )),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            archive: None,
            data_type: default_data_type(),
            column: default_column(),
            policy: NormalizationPolicy::default(),
            targets: TargetMode::default(),
            target_datums: Vec::new(),
            top_n: default_top_n(),
            ranking: RankingSource::default(),
            convert: ConversionColumns::default(),
            edge_match: EdgeMatch::default(),
            missing: MissingValuePolicy::default(),
            exclude_regulated: true,
            overall_trend: true,
            temperature: TemperatureConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::load(None, ConfigOverrides::new()).unwrap();

        assert_eq!(config.data_type, DataType::WaterLevel);
        assert_eq!(config.column, StatColumn::Mean);
        assert_eq!(config.policy, NormalizationPolicy::TargetDatum);
        assert_eq!(config.targets, TargetMode::Ranked);
        assert_eq!(config.top_n, 3);
        assert_eq!(config.convert, ConversionColumns::all());
        assert_eq!(config.edge_match, EdgeMatch::AnyFrom);
        assert!(config.exclude_regulated);
        assert_eq!(
            config.temperature.since,
            NaiveDate::from_ymd_opt(1965, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_toml_file_and_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
dataset = "Hydat.sqlite3"
column = "max"
policy = "statistical"
targets = "explicit"
target_datums = [35, 605]
missing = "forward-fill"
edge_match = "assigned-from"

[convert]
mean = false

[output]
format = "parquet"
"#
        )
        .unwrap();

        let mut overrides = ConfigOverrides::new();
        overrides.set("column", "min");

        let config = AnalysisConfig::load(Some(file.path()), overrides).unwrap();

        assert_eq!(config.column, StatColumn::Min);
        assert_eq!(config.policy, NormalizationPolicy::Statistical);
        assert_eq!(config.target_datums, vec![DatumId(35), DatumId(605)]);
        assert_eq!(config.missing, MissingValuePolicy::ForwardFill);
        assert_eq!(config.edge_match, EdgeMatch::AssignedFrom);
        assert!(!config.convert.mean);
        assert!(config.convert.max);
        assert_eq!(config.output.format, OutputFormat::Parquet);
        assert_eq!(
            config.dataset_source().unwrap(),
            DatasetSource::File(PathBuf::from("Hydat.sqlite3"))
        );
    }

    #[test]
    fn test_invalid_combinations() {
        let unified = AnalysisConfig {
            targets: TargetMode::Unified,
            ..Default::default()
        };
        assert!(unified.validate().is_err());

        let zero = AnalysisConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let explicit = AnalysisConfig {
            targets: TargetMode::Explicit,
            ..Default::default()
        };
        assert!(explicit.validate().is_err());

        let mut brotli = AnalysisConfig::default();
        brotli.output.compression = "brotli".to_string();
        assert!(brotli.validate().is_err());

        let mut upper = AnalysisConfig::default();
        upper.output.compression = "ZSTD".to_string();
        assert!(upper.validate().is_ok());

        assert!(AnalysisConfig::default().dataset_source().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = AnalysisConfig::load(
            Some(Path::new("/nonexistent/hydat.toml")),
            ConfigOverrides::new(),
        );
        assert!(matches!(result, Err(AnalysisError::Config(_))));
    }
}
