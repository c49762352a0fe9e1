use crate::config::ConfigOverrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hydat-trends")]
#[command(about = "Long-term water level trends from the HYDAT hydrometric database")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase logging (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Only print errors; no progress output")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DatasetArgs {
    #[arg(short, long, help = "HYDAT SQLite file (Hydat.sqlite3)")]
    pub dataset: Option<PathBuf>,

    #[arg(short, long, conflicts_with = "dataset", help = "Zip archive containing the HYDAT SQLite file")]
    pub archive: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    #[arg(
        short,
        long,
        help = "Output file path [default: output/hydat-trends-{YYMMDD}.{ext}]"
    )]
    pub output_file: Option<PathBuf>,

    #[arg(short, long, help = "Output format: csv, json or parquet")]
    pub format: Option<String>,

    #[arg(short, long, help = "Parquet compression: snappy, gzip, lz4, zstd or none")]
    pub compression: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize annual statistics across reference datums and write yearly series
    Trend {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[arg(long, help = "Data type code: H, Q, I, S or T")]
        data_type: Option<String>,

        #[arg(long, help = "Statistic column: mean, min or max")]
        column: Option<String>,

        #[arg(long, help = "Normalization policy: target-datum or statistical")]
        policy: Option<String>,

        #[arg(long, help = "Target selection: ranked, all, explicit or unified")]
        targets: Option<String>,

        #[arg(long = "target-datum", value_delimiter = ',', help = "Datum ids for --targets explicit")]
        target_datums: Vec<i64>,

        #[arg(long, help = "Number of most-used datums for --targets ranked")]
        top_n: Option<usize>,

        #[arg(long, help = "Ranking source: assigned-datum or conversion-target")]
        ranking: Option<String>,

        #[arg(long, help = "Missing values: skip or forward-fill")]
        missing: Option<String>,

        #[arg(long, help = "Conversion edges used: any-from or assigned-from")]
        edge_match: Option<String>,

        #[arg(long, help = "Keep stations flagged as regulated")]
        include_regulated: bool,

        #[arg(long, help = "Do not emit the overall trend series")]
        no_overall_trend: bool,
    },

    /// Print reference datums ranked by the number of stations using them
    RankDatums {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[arg(long, help = "Data type code: H, Q, I, S or T")]
        data_type: Option<String>,

        #[arg(long, help = "Ranking source: assigned-datum or conversion-target")]
        ranking: Option<String>,

        #[arg(long, help = "Keep stations flagged as regulated")]
        include_regulated: bool,

        #[arg(short, long, default_value = "0", help = "Maximum datums to print (0 = all)")]
        limit: usize,
    },

    /// Yearly mean water temperature from sediment samples
    Temperature {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[arg(long, help = "Earliest sample date (YYYY-MM-DD)")]
        since: Option<String>,
    },

    /// Write the station list (id, name, coordinates, datum) as CSV
    ExportStations {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[arg(
            short,
            long,
            help = "Output CSV path [default: output/hydat-stations-{YYMMDD}.csv]"
        )]
        output_file: Option<PathBuf>,

        #[arg(long, help = "Only stations inside the Canada map extent")]
        canada_only: bool,
    },

    /// Show table row counts and check the dataset schema
    Inspect {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
}

impl DatasetArgs {
    fn apply(&self, overrides: &mut ConfigOverrides) {
        overrides.set_opt("dataset", path_value(&self.dataset));
        overrides.set_opt("archive", path_value(&self.archive));
    }
}

impl OutputArgs {
    fn apply(&self, overrides: &mut ConfigOverrides) {
        overrides.set_opt("output.path", path_value(&self.output_file));
        overrides.set_opt("output.format", self.format.clone());
        overrides.set_opt("output.compression", self.compression.clone());
    }
}

impl Commands {
    /// Flags given on the command line, as configuration keys.
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();

        match self {
            Commands::Trend {
                dataset,
                output,
                data_type,
                column,
                policy,
                targets,
                target_datums,
                top_n,
                ranking,
                missing,
                edge_match,
                include_regulated,
                no_overall_trend,
            } => {
                dataset.apply(&mut overrides);
                output.apply(&mut overrides);
                overrides
                    .set_opt("data_type", data_type.clone())
                    .set_opt("column", column.clone())
                    .set_opt("policy", policy.clone())
                    .set_opt("targets", targets.clone())
                    .set_opt("top_n", top_n.map(|n| n as i64))
                    .set_opt("ranking", ranking.clone())
                    .set_opt("missing", missing.clone())
                    .set_opt("edge_match", edge_match.clone());
                if !target_datums.is_empty() {
                    overrides.set("target_datums", target_datums.clone());
                }
                if *include_regulated {
                    overrides.set("exclude_regulated", false);
                }
                if *no_overall_trend {
                    overrides.set("overall_trend", false);
                }
            }
            Commands::RankDatums {
                dataset,
                data_type,
                ranking,
                include_regulated,
                ..
            } => {
                dataset.apply(&mut overrides);
                overrides
                    .set_opt("data_type", data_type.clone())
                    .set_opt("ranking", ranking.clone());
                if *include_regulated {
                    overrides.set("exclude_regulated", false);
                }
            }
            Commands::Temperature {
                dataset,
                output,
                since,
            } => {
                dataset.apply(&mut overrides);
                output.apply(&mut overrides);
                overrides.set_opt("temperature.since", since.clone());
            }
            Commands::ExportStations { dataset, .. } | Commands::Inspect { dataset } => {
                dataset.apply(&mut overrides);
            }
        }

        overrides
    }
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, OutputFormat, TargetMode};
    use crate::models::{DatumId, StatColumn};

    #[test]
    fn test_trend_flags_override_config() {
        let cli = Cli::try_parse_from([
            "hydat-trends",
            "-vv",
            "trend",
            "--dataset",
            "Hydat.sqlite3",
            "--column",
            "max",
            "--targets",
            "explicit",
            "--target-datum",
            "35,605",
            "--format",
            "json",
            "--include-regulated",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let config = AnalysisConfig::load(None, cli.command.overrides()).unwrap();

        assert_eq!(config.column, StatColumn::Max);
        assert_eq!(config.targets, TargetMode::Explicit);
        assert_eq!(config.target_datums, vec![DatumId(35), DatumId(605)]);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.exclude_regulated);
        assert!(config.overall_trend);
    }

    #[test]
    fn test_dataset_and_archive_conflict() {
        let result = Cli::try_parse_from([
            "hydat-trends",
            "inspect",
            "--dataset",
            "a.sqlite3",
            "--archive",
            "b.zip",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_flags_no_overrides() {
        let cli = Cli::try_parse_from(["hydat-trends", "rank-datums"]).unwrap();
        assert!(cli.command.overrides().is_empty());
    }
}
