// Processing configuration
// JSON-backed option groups for windows, pickers, corner frequencies and processing steps

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::params::{CornerMethod, PickerType, SignalEndMethod};
use crate::processing::resample::ResampleMethod;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to get config directory")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub windows: WindowsConfig,
    pub pickers: PickerConfig,
    pub corner_frequencies: CornerFrequencyConfig,
    pub processing: ProcessingConfig,
}

// ==================== WINDOWS ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsConfig {
    pub signal_split: SignalSplitConfig,
    pub signal_end: SignalEndConfig,
    pub window_checks: WindowChecksConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSplitConfig {
    /// Primary picker
    pub picker: PickerType,

    /// Noise length (seconds from trace start) used when picking fails.
    /// Capped at half the trace duration.
    pub fallback_offset: f64,
}

impl Default for SignalSplitConfig {
    fn default() -> Self {
        SignalSplitConfig {
            picker: PickerType::TravelTime,
            fallback_offset: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalEndConfig {
    pub method: SignalEndMethod,

    /// Minimum apparent velocity in km/s ("velocity" method)
    pub vmin: f64,

    /// Minimum duration in seconds ("velocity" method)
    pub floor: f64,

    /// Standard deviations added to the model duration ("model" method)
    pub epsilon: f64,

    /// Site Vs30 in m/s ("model" method)
    pub vs30: f64,

    pub magnitude: MagnitudeDurationConfig,

    pub model: DurationModelConfig,
}

impl Default for SignalEndConfig {
    fn default() -> Self {
        SignalEndConfig {
            method: SignalEndMethod::Model,
            vmin: 1.0,
            floor: 120.0,
            epsilon: 3.0,
            vs30: 760.0,
            magnitude: MagnitudeDurationConfig::default(),
            model: DurationModelConfig::default(),
        }
    }
}

/// duration = intercept + slope * M (seconds after origin)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnitudeDurationConfig {
    pub intercept: f64,
    pub slope: f64,
}

impl Default for MagnitudeDurationConfig {
    fn default() -> Self {
        MagnitudeDurationConfig {
            intercept: -30.0,
            slope: 30.0,
        }
    }
}

/// Coefficients of the source/path/site significant-duration model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationModelConfig {
    pub name: String,
    /// Stress drop in bars
    pub stress_drop: f64,
    /// Source shear velocity in km/s
    pub beta: f64,
    /// Path slopes (s/km) for R <= r1, r1 < R <= r2, R > r2
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub r1: f64,
    pub r2: f64,
    /// Site scaling with ln(Vs30 / vref), Vs30 capped at v1
    pub c4: f64,
    pub vref: f64,
    pub v1: f64,
    /// Total natural-log standard deviation
    pub sigma: f64,
}

impl Default for DurationModelConfig {
    fn default() -> Self {
        DurationModelConfig {
            name: "source_path".to_string(),
            stress_drop: 100.0,
            beta: 3.2,
            c1: 0.1159,
            c2: 0.1065,
            c3: 0.0682,
            r1: 10.0,
            r2: 50.0,
            c4: -0.2246,
            vref: 368.2,
            v1: 600.0,
            sigma: 0.55,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowChecksConfig {
    pub enabled: bool,
    pub min_noise_duration: f64,
    pub min_signal_duration: f64,
}

impl Default for WindowChecksConfig {
    fn default() -> Self {
        WindowChecksConfig {
            enabled: true,
            min_noise_duration: 1.0,
            min_signal_duration: 5.0,
        }
    }
}

// ==================== PICKERS ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub travel_time: TravelTimeConfig,
    pub sta_lta: StaLtaConfig,
}

/// Flat layer of the P-velocity model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityLayer {
    pub thickness_km: f64,
    /// P velocity in km/s
    pub vp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelTimeConfig {
    /// Layers from the surface down
    pub layers: Vec<VelocityLayer>,
    /// P velocity below the deepest layer
    pub halfspace_vp: f64,
}

impl Default for TravelTimeConfig {
    fn default() -> Self {
        // iasp91 crust over mantle
        TravelTimeConfig {
            layers: vec![
                VelocityLayer {
                    thickness_km: 20.0,
                    vp: 5.8,
                },
                VelocityLayer {
                    thickness_km: 15.0,
                    vp: 6.5,
                },
            ],
            halfspace_vp: 8.04,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaLtaConfig {
    pub sta_seconds: f64,
    pub lta_seconds: f64,
    pub threshold: f64,
}

impl Default for StaLtaConfig {
    fn default() -> Self {
        StaLtaConfig {
            sta_seconds: 1.0,
            lta_seconds: 20.0,
            threshold: 4.0,
        }
    }
}

// ==================== CORNER FREQUENCIES ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerFrequencyConfig {
    pub method: CornerMethod,
    pub constant: ConstantCornerConfig,
    pub magnitude: MagnitudeCornerConfig,
    pub snr: SnrConfig,
}

impl Default for CornerFrequencyConfig {
    fn default() -> Self {
        CornerFrequencyConfig {
            method: CornerMethod::Snr,
            constant: ConstantCornerConfig::default(),
            magnitude: MagnitudeCornerConfig::default(),
            snr: SnrConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantCornerConfig {
    pub highpass: f64,
    pub lowpass: f64,
}

impl Default for ConstantCornerConfig {
    fn default() -> Self {
        ConstantCornerConfig {
            highpass: 0.08,
            lowpass: 20.0,
        }
    }
}

/// Corner lookup by magnitude bin; bin i applies when M > minmag[i]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnitudeCornerConfig {
    pub minmag: Vec<f64>,
    pub highpass: Vec<f64>,
    pub lowpass: Vec<f64>,
}

impl Default for MagnitudeCornerConfig {
    fn default() -> Self {
        MagnitudeCornerConfig {
            minmag: vec![-999.0, 3.5, 5.5],
            highpass: vec![0.5, 0.3, 0.1],
            lowpass: vec![25.0, 35.0, 40.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnrConfig {
    /// Share corners across horizontal components
    pub same_horiz: bool,
    /// Konno-Ohmachi bandwidth
    pub bandwidth: f64,
    pub threshold: f64,
    /// Passing band must start at or below this frequency (Hz)
    pub min_freq: f64,
    /// Passing band must extend above this frequency (Hz)
    pub max_freq: f64,
    /// Points in the log-spaced smoothing grid
    pub smoothing_points: usize,
}

impl Default for SnrConfig {
    fn default() -> Self {
        SnrConfig {
            same_horiz: true,
            bandwidth: 20.0,
            threshold: 3.0,
            min_freq: 0.2,
            max_freq: 5.0,
            smoothing_points: 100,
        }
    }
}

// ==================== PROCESSING STEPS ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub cut: CutConfig,
    pub resample: ResampleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutConfig {
    pub enabled: bool,
    pub sec_before_split: Option<f64>,
}

impl Default for CutConfig {
    fn default() -> Self {
        CutConfig {
            enabled: true,
            sec_before_split: Some(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    pub enabled: bool,
    pub new_sampling_rate: f64,
    pub method: ResampleMethod,
    /// Lanczos window half-width in samples
    pub a: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        ResampleConfig {
            enabled: false,
            new_sampling_rate: 100.0,
            method: ResampleMethod::Lanczos,
            a: 50,
        }
    }
}

// ==================== LOADING ====================

impl Config {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        log::debug!("Loading config from {}", path.display());
        Self::from_json_str(&contents)
    }

    /// Location of the user config file
    pub fn default_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("groundmotion").join("config.json"))
    }

    /// Load the user config if one exists, otherwise use defaults
    pub fn load_or_default() -> ConfigResult<Self> {
        match Self::default_path() {
            Ok(path) if path.is_file() => Self::load(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let checks = &self.windows.window_checks;
        if checks.min_noise_duration < 0.0 || checks.min_signal_duration < 0.0 {
            return Err(ConfigError::Invalid(
                "window check durations must be non-negative".to_string(),
            ));
        }

        let end = &self.windows.signal_end;
        if end.vmin <= 0.0 {
            return Err(ConfigError::Invalid("vmin must be positive".to_string()));
        }
        if end.floor < 0.0 {
            return Err(ConfigError::Invalid("floor must be non-negative".to_string()));
        }

        let tt = &self.pickers.travel_time;
        if tt.halfspace_vp <= 0.0
            || tt
                .layers
                .iter()
                .any(|l| l.vp <= 0.0 || l.thickness_km <= 0.0)
        {
            return Err(ConfigError::Invalid(
                "velocity model layers need positive thickness and velocity".to_string(),
            ));
        }

        let sta_lta = &self.pickers.sta_lta;
        if sta_lta.sta_seconds <= 0.0 || sta_lta.lta_seconds <= sta_lta.sta_seconds {
            return Err(ConfigError::Invalid(
                "STA window must be positive and shorter than the LTA window".to_string(),
            ));
        }

        let mag = &self.corner_frequencies.magnitude;
        if mag.minmag.is_empty()
            || mag.minmag.len() != mag.highpass.len()
            || mag.minmag.len() != mag.lowpass.len()
        {
            return Err(ConfigError::Invalid(
                "magnitude corner tables must be non-empty and the same length".to_string(),
            ));
        }

        let snr = &self.corner_frequencies.snr;
        if snr.threshold <= 0.0 || snr.bandwidth <= 0.0 || snr.smoothing_points < 2 {
            return Err(ConfigError::Invalid(
                "SNR threshold and bandwidth must be positive with at least two grid points"
                    .to_string(),
            ));
        }

        let rate = self.processing.resample.new_sampling_rate;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ConfigError::Invalid(
                "resample rate must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
