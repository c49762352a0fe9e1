pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{
    generate_default_output_filename, generate_default_stations_filename, generate_output_filename,
};
pub use progress::ProgressReporter;
