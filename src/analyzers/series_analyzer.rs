use crate::error::{AnalysisError, Result};
use crate::models::{LabeledSeries, YearValue};

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStatistics {
    pub label: String,
    pub points: usize,
    pub year_span: (i32, i32),
    pub min: YearValue,
    pub max: YearValue,
    pub mean: f64,
    /// Ordinary least-squares slope, value units per year.
    pub slope: Option<f64>,
}

impl SeriesStatistics {
    pub fn years_covered(&self) -> i32 {
        self.year_span.1 - self.year_span.0 + 1
    }

    pub fn summary(&self) -> String {
        let trend = match self.slope {
            Some(slope) => format!("{:+.4} per year", slope),
            None => "n/a (single year)".to_string(),
        };

        format!(
            "{}\n\
            - Years: {} to {} ({} points over {} years)\n\
            - Range: {:.3} ({}) to {:.3} ({})\n\
            - Mean: {:.3}\n\
            - Trend: {}",
            self.label,
            self.year_span.0,
            self.year_span.1,
            self.points,
            self.years_covered(),
            self.min.value,
            self.min.year,
            self.max.value,
            self.max.year,
            self.mean,
            trend,
        )
    }
}

pub struct SeriesAnalyzer;

impl SeriesAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, series: &LabeledSeries) -> Result<SeriesStatistics> {
        let finite: Vec<YearValue> = series
            .points
            .iter()
            .copied()
            .filter(|p| p.value.is_finite())
            .collect();

        let (first, last) = match (finite.first(), finite.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(AnalysisError::MissingData(format!(
                    "Series '{}' has no values to analyze",
                    series.label
                )))
            }
        };

        let mut min = first;
        let mut max = first;
        let mut sum = 0.0;
        for point in &finite {
            if point.value < min.value {
                min = *point;
            }
            if point.value > max.value {
                max = *point;
            }
            sum += point.value;
        }

        Ok(SeriesStatistics {
            label: series.label.clone(),
            points: finite.len(),
            year_span: (first.year, last.year),
            min,
            max,
            mean: sum / finite.len() as f64,
            slope: least_squares_slope(&finite),
        })
    }

    /// Statistics for every non-empty series, in input order.
    pub fn analyze_all(&self, series: &[LabeledSeries]) -> Vec<SeriesStatistics> {
        series.iter().filter_map(|s| self.analyze(s).ok()).collect()
    }
}

impl Default for SeriesAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Slope of the least-squares line through (year, value). `None` with fewer
/// than two distinct years.
pub fn least_squares_slope(points: &[YearValue]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.year as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.value).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for p in points {
        let dx = p.year as f64 - mean_x;
        sxy += dx * (p.value - mean_y);
        sxx += dx * dx;
    }

    if sxx == 0.0 {
        None
    } else {
        Some(sxy / sxx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeriesKind;

    fn series(points: Vec<(i32, f64)>) -> LabeledSeries {
        LabeledSeries::new(
            "overall trend",
            SeriesKind::OverallTrend,
            None,
            points
                .into_iter()
                .map(|(year, value)| YearValue::new(year, value, 1))
                .collect(),
        )
    }

    #[test]
    fn test_linear_series() {
        let stats = SeriesAnalyzer::new()
            .analyze(&series(vec![(2000, 10.0), (2001, 12.0), (2003, 16.0)]))
            .unwrap();

        assert_eq!(stats.points, 3);
        assert_eq!(stats.year_span, (2000, 2003));
        assert_eq!(stats.years_covered(), 4);
        assert_eq!(stats.min.year, 2000);
        assert_eq!(stats.max.year, 2003);
        assert!((stats.slope.unwrap() - 2.0).abs() < 1e-12);
        assert!(stats.summary().contains("+2.0000 per year"));
    }

    #[test]
    fn test_single_point_has_no_slope() {
        let stats = SeriesAnalyzer::new()
            .analyze(&series(vec![(2000, 1.0)]))
            .unwrap();

        assert_eq!(stats.slope, None);
        assert_eq!(stats.mean, 1.0);
    }

    #[test]
    fn test_empty_and_nan_series() {
        let analyzer = SeriesAnalyzer::new();
        assert!(analyzer.analyze(&series(vec![])).is_err());
        assert!(analyzer.analyze(&series(vec![(2000, f64::NAN)])).is_err());

        let all = analyzer.analyze_all(&[series(vec![]), series(vec![(1999, 4.0)])]);
        assert_eq!(all.len(), 1);
    }
}
