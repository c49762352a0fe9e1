use crate::models::{LabeledSeries, Observation, StatColumn, TemperatureSample, YearValue};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }
}

/// Mean per year over `(year, value)` pairs, ascending by year.
///
/// Missing and NaN values do not contribute; a year left with no
/// contributors is omitted rather than emitted as zero.
pub fn aggregate_values<I>(values: I) -> Vec<YearValue>
where
    I: IntoIterator<Item = (i32, Option<f64>)>,
{
    let mut years: BTreeMap<i32, Accumulator> = BTreeMap::new();

    for (year, value) in values {
        let entry = years.entry(year).or_default();
        if let Some(v) = value.filter(|v| v.is_finite()) {
            entry.push(v);
        }
    }

    years
        .into_iter()
        .filter(|(_, acc)| acc.count > 0)
        .map(|(year, acc)| YearValue::new(year, acc.sum / acc.count as f64, acc.count))
        .collect()
}

pub fn aggregate_by_year(observations: &[Observation], column: StatColumn) -> Vec<YearValue> {
    aggregate_values(observations.iter().map(|o| (o.year, o.value(column))))
}

/// Average of the per-year values of several already-normalized series.
pub fn overall_trend(series: &[LabeledSeries]) -> Vec<YearValue> {
    aggregate_values(
        series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| (p.year, Some(p.value)))),
    )
}

/// Calendar-year mean water temperature from samples taken on or after `since`.
pub fn yearly_temperature(samples: &[TemperatureSample], since: NaiveDate) -> Vec<YearValue> {
    aggregate_values(
        samples
            .iter()
            .filter(|s| s.date >= since)
            .map(|s| (s.date.year(), Some(s.temperature))),
    )
}
