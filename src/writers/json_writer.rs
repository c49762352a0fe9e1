use crate::error::Result;
use crate::models::{LabeledSeries, Presentation};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Series plus the labels a plotting front end needs.
#[derive(Serialize)]
pub struct SeriesDocument<'a> {
    pub presentation: &'a Presentation,
    pub series: &'a [LabeledSeries],
}

pub fn write_series_json<W: Write>(
    series: &[LabeledSeries],
    presentation: &Presentation,
    writer: W,
) -> Result<()> {
    let document = SeriesDocument {
        presentation,
        series,
    };
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

pub fn write_series_json_file(
    series: &[LabeledSeries],
    presentation: &Presentation,
    path: &Path,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_series_json(series, presentation, &mut writer)?;
    writer.flush()?;
    Ok(())
}
