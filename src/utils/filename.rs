use chrono::{Datelike, Local};
use std::path::PathBuf;

use crate::config::OutputFormat;

/// Default output path: `output/hydat-trends-{YYMMDD}.{ext}`
pub fn generate_default_output_filename(format: OutputFormat) -> PathBuf {
    generate_output_filename("hydat-trends", format)
}

/// Default station map path: `output/hydat-stations-{YYMMDD}.csv`
pub fn generate_default_stations_filename() -> PathBuf {
    generate_output_filename("hydat-stations", OutputFormat::Csv)
}

/// `output/{stem}-{YYMMDD}.{ext}`
pub fn generate_output_filename(stem: &str, format: OutputFormat) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100;

    let filename = format!(
        "{}-{:02}{:02}{:02}.{}",
        stem,
        year,
        now.month(),
        now.day(),
        format.extension()
    );
    PathBuf::from("output").join(filename)
}
