pub mod datum;
pub mod observation;
pub mod regulation;
pub mod sample;
pub mod series;
pub mod station;

pub use datum::{DatumConversion, DatumId, DatumUsageCount};
pub use observation::{DataType, Observation, StatColumn};
pub use regulation::RegulationRecord;
pub use sample::TemperatureSample;
pub use series::{LabeledSeries, Presentation, SeriesKind, YearValue};
pub use station::{MapExtent, Station, StationId};
