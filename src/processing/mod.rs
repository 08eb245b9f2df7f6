// Waveform processing steps
// Picking, windowing, spectral SNR, corner frequencies, cutting and resampling

pub mod corner_frequencies;
pub mod duration;
pub mod phase;
pub mod resample;
pub mod smoothing;
pub mod snr;
pub mod windows;

use thiserror::Error;

use crate::config::ConfigError;
use crate::model::trace::TraceError;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Only lanczos interpolation method is supported.")]
    UnsupportedResampleMethod(String),

    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

pub use corner_frequencies::get_corner_frequencies;
pub use resample::{resample, ResampleMethod};
pub use windows::{cut, signal_end, signal_split, window_checks};
