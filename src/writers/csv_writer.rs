use crate::error::Result;
use crate::models::{LabeledSeries, Station};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct SeriesRow<'a> {
    series: &'a str,
    kind: String,
    column: Option<&'a str>,
    year: i32,
    value: f64,
    contributors: usize,
}

#[derive(Serialize)]
struct StationRow<'a> {
    station_number: &'a str,
    name: &'a str,
    latitude: f64,
    longitude: f64,
    datum_id: Option<i64>,
}

/// Long-format CSV: one row per (series, year).
pub fn write_series_csv<W: Write>(series: &[LabeledSeries], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    for s in series {
        let kind = s.kind.to_string();
        for point in &s.points {
            csv.serialize(SeriesRow {
                series: &s.label,
                kind: kind.clone(),
                column: s.column.map(|c| c.as_str()),
                year: point.year,
                value: point.value,
                contributors: point.contributors,
            })?;
        }
    }

    csv.flush()?;
    Ok(())
}

pub fn write_series_csv_file(series: &[LabeledSeries], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_series_csv(series, std::io::BufWriter::new(file))
}

pub fn write_stations_csv<'a, W, I>(stations: I, writer: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Station>,
{
    let mut csv = csv::Writer::from_writer(writer);
    let mut written = 0;

    for station in stations {
        csv.serialize(StationRow {
            station_number: station.id.as_str(),
            name: &station.name,
            latitude: station.latitude,
            longitude: station.longitude,
            datum_id: station.datum.map(|d| d.0),
        })?;
        written += 1;
    }

    csv.flush()?;
    Ok(written)
}
