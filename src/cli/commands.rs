use crate::analyzers::SeriesAnalyzer;
use crate::archive::DatasetArchive;
use crate::cli::args::{Cli, Commands};
use crate::config::{AnalysisConfig, DatasetSource, OutputFormat};
use crate::error::Result;
use crate::models::{LabeledSeries, MapExtent, Presentation, SeriesKind};
use crate::processors::{yearly_temperature, TrendPipeline};
use crate::readers::schema::{self, TableSchema};
use crate::readers::HydatStore;
use crate::utils::filename::{
    generate_default_output_filename, generate_default_stations_filename, generate_output_filename,
};
use crate::utils::progress::ProgressReporter;
use crate::writers::{write_series, write_stations_csv, ParquetWriter};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use validator::Validate;

pub async fn run(cli: Cli) -> Result<()> {
    let config = AnalysisConfig::load(cli.config.as_deref(), cli.command.overrides())?;
    let quiet = cli.quiet;

    let required = required_tables(&cli.command);
    let (store, archive) = match open_dataset(&config, required, quiet).await {
        Ok(opened) => opened,
        Err(e) => {
            if e.is_fatal_store_error() {
                error!("Cannot use HYDAT dataset: {}", e);
            }
            return Err(e);
        }
    };

    let result = match &cli.command {
        Commands::Trend { .. } => trend(&store, &config, quiet).await,
        Commands::RankDatums { limit, .. } => rank_datums(&store, &config, *limit, quiet).await,
        Commands::Temperature { .. } => temperature(&store, &config, quiet).await,
        Commands::ExportStations {
            output_file,
            canada_only,
            ..
        } => export_stations(&store, output_file.as_deref(), *canada_only, quiet).await,
        Commands::Inspect { .. } => inspect(&store, quiet).await,
    };

    // Close before the extracted archive directory goes away.
    store.close().await;
    drop(archive);

    result
}

/// Tables a command reads; `inspect` reports whatever is there.
fn required_tables(command: &Commands) -> &'static [&'static TableSchema] {
    match command {
        Commands::Trend { .. } | Commands::RankDatums { .. } => &schema::CORE_TABLES,
        Commands::Temperature { .. } => &[&schema::SED_SAMPLES],
        Commands::ExportStations { .. } => &[&schema::STATIONS],
        Commands::Inspect { .. } => &[],
    }
}

async fn open_dataset(
    config: &AnalysisConfig,
    required: &[&TableSchema],
    quiet: bool,
) -> Result<(HydatStore, Option<DatasetArchive>)> {
    match config.dataset_source()? {
        DatasetSource::File(path) => {
            let store = HydatStore::open_requiring(&path, required).await?;
            Ok((store, None))
        }
        DatasetSource::Archive(zip_path) => {
            let progress = ProgressReporter::new_spinner("Extracting HYDAT archive...", quiet);
            let archive =
                tokio::task::spawn_blocking(move || DatasetArchive::extract(&zip_path)).await??;
            progress.finish_with_message("Archive extracted");

            let store = HydatStore::open_requiring(archive.dataset_path(), required).await?;
            Ok((store, Some(archive)))
        }
    }
}

async fn trend(store: &HydatStore, config: &AnalysisConfig, quiet: bool) -> Result<()> {
    let progress = ProgressReporter::new_spinner("Loading HYDAT snapshot...", quiet);
    let snapshot = store.snapshot(config.data_type).await?;
    let datum_names = store.fetch_datum_names().await?;

    let output = TrendPipeline::new(config)
        .with_datum_names(datum_names)
        .run(&snapshot, Some(&progress))?;
    progress.finish_with_message(&format!("Produced {} series", output.series.len()));

    if !quiet {
        println!("\n{}", output.report.summary());
        print_series_statistics(&output.series);
    }

    let path = output_path(config, || generate_default_output_filename(config.output.format));
    write_output(&output.series, &output.presentation, &path, config, quiet)
}

async fn rank_datums(
    store: &HydatStore,
    config: &AnalysisConfig,
    limit: usize,
    quiet: bool,
) -> Result<()> {
    let progress = ProgressReporter::new_spinner("Loading HYDAT snapshot...", quiet);
    let snapshot = store.snapshot(config.data_type).await?;
    let datum_names = store.fetch_datum_names().await?;
    progress.finish_with_message("Snapshot loaded");

    let pipeline = TrendPipeline::new(config).with_datum_names(datum_names);
    let ranking = pipeline.rank_datums(&snapshot);
    let shown = if limit == 0 { ranking.len() } else { limit };

    println!(
        "Datums ranked by {} stations ({}):",
        if config.exclude_regulated {
            "unregulated"
        } else {
            "all"
        },
        config.data_type.display_name()
    );
    for (rank, usage) in ranking.iter().take(shown).enumerate() {
        println!(
            "{:>3}. {:<50} {:>6} stations",
            rank + 1,
            pipeline.datum_label(usage.datum),
            usage.stations
        );
    }

    if ranking.is_empty() {
        warn!("No datum is in use by the selected stations");
    }
    Ok(())
}

async fn temperature(store: &HydatStore, config: &AnalysisConfig, quiet: bool) -> Result<()> {
    let progress = ProgressReporter::new_spinner("Loading temperature samples...", quiet);
    let samples = store.fetch_temperature_samples().await?;

    let points = yearly_temperature(&samples, config.temperature.since);
    progress.finish_with_message(&format!(
        "{} samples, {} years",
        samples.len(),
        points.len()
    ));

    let series = vec![LabeledSeries::new(
        "water temperature",
        SeriesKind::Temperature,
        None,
        points,
    )];
    let presentation = Presentation::new(
        format!("Mean annual water temperature since {}", config.temperature.since),
        "Year",
        "Temperature (°C)",
    );

    if !quiet {
        print_series_statistics(&series);
    }

    let path = output_path(config, || {
        generate_output_filename("hydat-temperature", config.output.format)
    });
    write_output(&series, &presentation, &path, config, quiet)
}

async fn export_stations(
    store: &HydatStore,
    output_file: Option<&Path>,
    canada_only: bool,
    quiet: bool,
) -> Result<()> {
    let stations = store.fetch_stations().await?;
    let extent = MapExtent::canada();

    let selected: Vec<_> = stations
        .iter()
        .filter(|station| match station.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Skipping station {}: {}", station.id, e);
                false
            }
        })
        .filter(|station| !canada_only || extent.contains(station))
        .collect();

    let path = output_file
        .map(Path::to_path_buf)
        .unwrap_or_else(generate_default_stations_filename);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(&path)?;
    let written = write_stations_csv(selected, std::io::BufWriter::new(file))?;

    info!("Exported {} of {} stations", written, stations.len());
    if !quiet {
        println!("Wrote {} stations to {}", written, path.display());
    }
    Ok(())
}

async fn inspect(store: &HydatStore, quiet: bool) -> Result<()> {
    let counts = store.table_counts().await?;

    if !quiet {
        println!("Dataset: {}", store.path().display());
        println!("Schema check: required tables and columns present\n");
        for (table, count) in counts {
            match count {
                Some(rows) => println!("  {:<22} {:>12} rows", table, rows),
                None => println!("  {:<22} {:>12}", table, "absent"),
            }
        }
    }
    Ok(())
}

fn output_path(config: &AnalysisConfig, default: impl FnOnce() -> PathBuf) -> PathBuf {
    config.output.path.clone().unwrap_or_else(default)
}

fn write_output(
    series: &[LabeledSeries],
    presentation: &Presentation,
    path: &Path,
    config: &AnalysisConfig,
    quiet: bool,
) -> Result<()> {
    write_series(series, presentation, path, &config.output)?;
    info!("Wrote {} series to {}", series.len(), path.display());

    if !quiet {
        if config.output.format == OutputFormat::Parquet {
            let file_info = ParquetWriter::new().get_file_info(path)?;
            println!("\n{}", file_info.summary());
        }
        println!("Output written to {}", path.display());
    }
    Ok(())
}

fn print_series_statistics(series: &[LabeledSeries]) {
    let analyzer = SeriesAnalyzer::new();
    for stats in analyzer.analyze_all(series) {
        println!("{}\n", stats.summary());
    }
}
