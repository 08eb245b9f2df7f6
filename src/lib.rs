// Ground-motion waveform windowing and characterization
// Module declarations

pub mod config;
pub mod geodetics;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod processing;
pub mod summary;
pub mod workspace;

pub use config::{Config, ConfigError};
pub use model::{ParamValue, ScalarEvent, StationStream, StationTrace};
