use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{DatumId, StatColumn};

/// One emitted point of a yearly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
    /// Number of values averaged into `value`.
    pub contributors: usize,
}

impl YearValue {
    pub fn new(year: i32, value: f64, contributors: usize) -> Self {
        Self {
            year,
            value,
            contributors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "datum", rename_all = "kebab-case")]
pub enum SeriesKind {
    TargetDatum(DatumId),
    OverallTrend,
    Unified,
    Temperature,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::TargetDatum(datum) => write!(f, "target-datum:{}", datum),
            SeriesKind::OverallTrend => f.write_str("overall-trend"),
            SeriesKind::Unified => f.write_str("unified"),
            SeriesKind::Temperature => f.write_str("temperature"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries {
    pub label: String,
    pub kind: SeriesKind,
    pub column: Option<StatColumn>,
    pub points: Vec<YearValue>,
}

impl LabeledSeries {
    pub fn new(
        label: impl Into<String>,
        kind: SeriesKind,
        column: Option<StatColumn>,
        points: Vec<YearValue>,
    ) -> Self {
        Self {
            label: label.into(),
            kind,
            column,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn year_span(&self) -> Option<(i32, i32)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.year, last.year)),
            _ => None,
        }
    }
}

/// Labels handed to whatever renders the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Presentation {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
        }
    }
}
