pub mod hydat_reader;
pub mod schema;
pub mod snapshot;

pub use hydat_reader::HydatStore;
pub use snapshot::{Snapshot, StationIndex};
