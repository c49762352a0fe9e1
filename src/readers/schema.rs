//! HYDAT tables and columns the analysis reads.
//!
//! Reference: HYDAT_Definition_EN.pdf published with the national archive.

pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const STATIONS: TableSchema = TableSchema {
    name: "STATIONS",
    columns: &[
        "STATION_NUMBER",
        "STATION_NAME",
        "LATITUDE",
        "LONGITUDE",
        "DATUM_ID",
    ],
};

pub const ANNUAL_STATISTICS: TableSchema = TableSchema {
    name: "ANNUAL_STATISTICS",
    columns: &["STATION_NUMBER", "DATA_TYPE", "YEAR", "MEAN", "MIN", "MAX"],
};

pub const STN_DATUM_CONVERSION: TableSchema = TableSchema {
    name: "STN_DATUM_CONVERSION",
    columns: &[
        "STATION_NUMBER",
        "DATUM_ID_FROM",
        "DATUM_ID_TO",
        "CONVERSION_FACTOR",
    ],
};

pub const STN_REGULATION: TableSchema = TableSchema {
    name: "STN_REGULATION",
    columns: &["STATION_NUMBER", "REGULATED"],
};

pub const SED_SAMPLES: TableSchema = TableSchema {
    name: "SED_SAMPLES",
    columns: &["STATION_NUMBER", "DATE", "TEMPERATURE"],
};

pub const DATUM_LIST: TableSchema = TableSchema {
    name: "DATUM_LIST",
    columns: &["DATUM_ID", "DATUM_EN"],
};

/// Tables every water-level run needs; checked when the store is opened.
pub const CORE_TABLES: [&TableSchema; 4] = [
    &STATIONS,
    &ANNUAL_STATISTICS,
    &STN_DATUM_CONVERSION,
    &STN_REGULATION,
];

/// Every table the tool knows about, for `inspect`.
pub const KNOWN_TABLES: [&TableSchema; 6] = [
    &STATIONS,
    &ANNUAL_STATISTICS,
    &STN_DATUM_CONVERSION,
    &STN_REGULATION,
    &SED_SAMPLES,
    &DATUM_LIST,
];

/// Returns the first required column absent from `present` (case-insensitive).
pub fn first_missing_column<'a>(schema: &'a TableSchema, present: &[String]) -> Option<&'a str> {
    schema
        .columns
        .iter()
        .copied()
        .find(|column| !present.iter().any(|p| p.eq_ignore_ascii_case(column)))
}
