use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};
use crate::models::StationId;

/// HYDAT `DATA_TYPE` codes for annual statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "H")]
    WaterLevel,
    #[serde(rename = "Q")]
    Flow,
    #[serde(rename = "I")]
    InstantaneousSediment,
    #[serde(rename = "S")]
    SedimentConcentration,
    #[serde(rename = "T")]
    DailyMeanTonnes,
}

impl DataType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(DataType::WaterLevel),
            "Q" => Some(DataType::Flow),
            "I" => Some(DataType::InstantaneousSediment),
            "S" => Some(DataType::SedimentConcentration),
            "T" => Some(DataType::DailyMeanTonnes),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DataType::WaterLevel => "H",
            DataType::Flow => "Q",
            DataType::InstantaneousSediment => "I",
            DataType::SedimentConcentration => "S",
            DataType::DailyMeanTonnes => "T",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DataType::WaterLevel => "Water Level",
            DataType::Flow => "Flow",
            DataType::InstantaneousSediment => "Instantaneous Sediment",
            DataType::SedimentConcentration => "Sediment in mg/L",
            DataType::DailyMeanTonnes => "Daily Mean Tonnes",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for DataType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        DataType::from_code(s)
            .ok_or_else(|| AnalysisError::InvalidFormat(format!("Unknown data type code: '{}'", s)))
    }
}

/// One of the three annual statistic columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatColumn {
    Mean,
    Min,
    Max,
}

impl StatColumn {
    pub const ALL: [StatColumn; 3] = [StatColumn::Mean, StatColumn::Min, StatColumn::Max];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatColumn::Mean => "mean",
            StatColumn::Min => "min",
            StatColumn::Max => "max",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StatColumn::Mean => "Mean",
            StatColumn::Min => "Min",
            StatColumn::Max => "Max",
        }
    }
}

impl fmt::Display for StatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatColumn {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(StatColumn::Mean),
            "min" => Ok(StatColumn::Min),
            "max" => Ok(StatColumn::Max),
            _ => Err(AnalysisError::InvalidFormat(format!(
                "Unknown statistic column: '{}'",
                s
            ))),
        }
    }
}

/// One row of `ANNUAL_STATISTICS`: a station's statistics for one year and data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub station_id: StationId,
    pub year: i32,
    pub data_type: DataType,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Observation {
    pub fn new(
        station_id: StationId,
        year: i32,
        data_type: DataType,
        mean: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        Self {
            station_id,
            year,
            data_type,
            mean,
            min,
            max,
        }
    }

    pub fn value(&self, column: StatColumn) -> Option<f64> {
        match column {
            StatColumn::Mean => self.mean,
            StatColumn::Min => self.min,
            StatColumn::Max => self.max,
        }
    }

    pub fn set_value(&mut self, column: StatColumn, value: Option<f64>) {
        match column {
            StatColumn::Mean => self.mean = value,
            StatColumn::Min => self.min = value,
            StatColumn::Max => self.max = value,
        }
    }

    pub fn has_any_value(&self) -> bool {
        self.mean.is_some() || self.min.is_some() || self.max.is_some()
    }
}
