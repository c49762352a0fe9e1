/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "HYDAT";

/// File extension of the HYDAT SQLite database inside a release archive
pub const DATASET_EXTENSION: &str = "sqlite3";

/// Temperature samples before this date are unreliable
pub const DEFAULT_TEMPERATURE_SINCE: &str = "1965-01-01";

/// Number of most-used datums analysed by default
pub const DEFAULT_TOP_N: usize = 3;

/// Canada geographic bounds for the station map
pub const MAP_MIN_LON: f64 = -141.0;
pub const MAP_MAX_LON: f64 = -52.0;
pub const MAP_MIN_LAT: f64 = 41.0;
pub const MAP_MAX_LAT: f64 = 84.0;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";

pub const COMPRESSIONS: [&str; 5] = [
    COMPRESSION_SNAPPY,
    COMPRESSION_GZIP,
    COMPRESSION_LZ4,
    COMPRESSION_ZSTD,
    COMPRESSION_NONE,
];
