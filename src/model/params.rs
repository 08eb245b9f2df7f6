// Typed views over well-known trace parameters
// Window descriptors, corner frequencies and failure records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::value::ParamValue;

pub const SIGNAL_SPLIT: &str = "signal_split";
pub const SIGNAL_END: &str = "signal_end";
pub const CORNER_FREQUENCIES: &str = "corner_frequencies";
pub const FAILURE: &str = "failure";
pub const SNR_CONF: &str = "snr_conf";

/// Errors raised when reading parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Parameter not found: {0}")]
    KeyNotFound(String),

    #[error("Parameter '{0}' does not have the expected structure")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown {kind} method: {value}")]
pub struct MethodParseError {
    pub kind: &'static str,
    pub value: String,
}

/// A parameter with a fixed key and a known structure
pub trait Parameter: Sized {
    const KEY: &'static str;

    fn to_value(&self) -> ParamValue;

    fn from_value(value: &ParamValue) -> Option<Self>;
}

/// How the signal/noise split was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    PArrival,
    FixedOffset,
}

impl SplitMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMethod::PArrival => "p_arrival",
            SplitMethod::FixedOffset => "fixed_offset",
        }
    }
}

impl FromStr for SplitMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p_arrival" => Ok(SplitMethod::PArrival),
            "fixed_offset" => Ok(SplitMethod::FixedOffset),
            _ => Err(MethodParseError {
                kind: "split",
                value: s.to_string(),
            }),
        }
    }
}

/// Phase picker that produced a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerType {
    TravelTime,
    StaLta,
    None,
}

impl PickerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickerType::TravelTime => "travel_time",
            PickerType::StaLta => "sta_lta",
            PickerType::None => "none",
        }
    }
}

impl FromStr for PickerType {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "travel_time" => Ok(PickerType::TravelTime),
            "sta_lta" => Ok(PickerType::StaLta),
            "none" => Ok(PickerType::None),
            _ => Err(MethodParseError {
                kind: "picker",
                value: s.to_string(),
            }),
        }
    }
}

/// Strategy for estimating the end of the signal window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalEndMethod {
    /// Keep the full record
    None,
    /// Linear magnitude-duration regression
    Magnitude,
    /// Epicentral distance over a minimum velocity, with a floor
    Velocity,
    /// Source/path/site significant-duration model
    Model,
}

impl SignalEndMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalEndMethod::None => "none",
            SignalEndMethod::Magnitude => "magnitude",
            SignalEndMethod::Velocity => "velocity",
            SignalEndMethod::Model => "model",
        }
    }
}

impl FromStr for SignalEndMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SignalEndMethod::None),
            "magnitude" => Ok(SignalEndMethod::Magnitude),
            "velocity" => Ok(SignalEndMethod::Velocity),
            "model" => Ok(SignalEndMethod::Model),
            _ => Err(MethodParseError {
                kind: "signal end",
                value: s.to_string(),
            }),
        }
    }
}

/// Corner frequency selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerMethod {
    Snr,
    Magnitude,
    Constant,
}

impl CornerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CornerMethod::Snr => "snr",
            CornerMethod::Magnitude => "magnitude",
            CornerMethod::Constant => "constant",
        }
    }
}

impl FromStr for CornerMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "snr" => Ok(CornerMethod::Snr),
            "magnitude" => Ok(CornerMethod::Magnitude),
            "constant" => Ok(CornerMethod::Constant),
            _ => Err(MethodParseError {
                kind: "corner frequency",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SignalEndMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CornerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary between pre-event noise and signal
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSplit {
    pub split_time: DateTime<Utc>,
    pub method: SplitMethod,
    pub picker_type: PickerType,
}

impl Parameter for SignalSplit {
    const KEY: &'static str = SIGNAL_SPLIT;

    fn to_value(&self) -> ParamValue {
        ParamValue::map([
            ("split_time", ParamValue::from(self.split_time)),
            ("method", ParamValue::from(self.method.as_str())),
            ("picker_type", ParamValue::from(self.picker_type.as_str())),
        ])
    }

    fn from_value(value: &ParamValue) -> Option<Self> {
        Some(SignalSplit {
            split_time: value.get("split_time")?.as_time()?,
            method: value.get("method")?.as_str()?.parse().ok()?,
            picker_type: value.get("picker_type")?.as_str()?.parse().ok()?,
        })
    }
}

/// Estimated end of the signal window
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEnd {
    pub end_time: DateTime<Utc>,
    pub method: SignalEndMethod,
    pub vmin: Option<f64>,
    pub floor: Option<f64>,
    pub model: Option<String>,
    pub epsilon: Option<f64>,
}

impl Parameter for SignalEnd {
    const KEY: &'static str = SIGNAL_END;

    fn to_value(&self) -> ParamValue {
        ParamValue::map([
            ("end_time", ParamValue::from(self.end_time)),
            ("method", ParamValue::from(self.method.as_str())),
            ("vmin", ParamValue::from(self.vmin)),
            ("floor", ParamValue::from(self.floor)),
            ("model", ParamValue::from(self.model.clone())),
            ("epsilon", ParamValue::from(self.epsilon)),
        ])
    }

    fn from_value(value: &ParamValue) -> Option<Self> {
        Some(SignalEnd {
            end_time: value.get("end_time")?.as_time()?,
            method: value.get("method")?.as_str()?.parse().ok()?,
            vmin: value["vmin"].as_f64(),
            floor: value["floor"].as_f64(),
            model: value["model"].as_str().map(str::to_string),
            epsilon: value["epsilon"].as_f64(),
        })
    }
}

/// Filter corners selected for a trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerFrequencies {
    pub kind: CornerMethod,
    pub highpass: f64,
    pub lowpass: f64,
}

impl Parameter for CornerFrequencies {
    const KEY: &'static str = CORNER_FREQUENCIES;

    fn to_value(&self) -> ParamValue {
        ParamValue::map([
            ("type", ParamValue::from(self.kind.as_str())),
            ("highpass", ParamValue::from(self.highpass)),
            ("lowpass", ParamValue::from(self.lowpass)),
        ])
    }

    fn from_value(value: &ParamValue) -> Option<Self> {
        Some(CornerFrequencies {
            kind: value.get("type")?.as_str()?.parse().ok()?,
            highpass: value.get("highpass")?.as_f64()?,
            lowpass: value.get("lowpass")?.as_f64()?,
        })
    }
}

/// Why a trace was rejected, and by which step
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub module: String,
    pub reason: String,
}

impl Parameter for Failure {
    const KEY: &'static str = FAILURE;

    fn to_value(&self) -> ParamValue {
        ParamValue::map([
            ("module", self.module.as_str()),
            ("reason", self.reason.as_str()),
        ])
    }

    fn from_value(value: &ParamValue) -> Option<Self> {
        Some(Failure {
            module: value.get("module")?.as_str()?.to_string(),
            reason: value.get("reason")?.as_str()?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_signal_split_value_layout() {
        let split = SignalSplit {
            split_time: Utc.with_ymd_and_hms(2016, 11, 13, 11, 3, 0).unwrap(),
            method: SplitMethod::PArrival,
            picker_type: PickerType::TravelTime,
        };

        let value = split.to_value();
        assert_eq!(value["method"], "p_arrival");
        assert_eq!(value["picker_type"], "travel_time");
        assert_eq!(SignalSplit::from_value(&value), Some(split));
    }

    #[test]
    fn test_signal_end_optional_fields() {
        let end = SignalEnd {
            end_time: Utc.with_ymd_and_hms(2019, 7, 6, 3, 22, 55).unwrap(),
            method: SignalEndMethod::Magnitude,
            vmin: None,
            floor: None,
            model: None,
            epsilon: None,
        };

        let value = end.to_value();
        assert!(value["vmin"].is_null());
        assert_eq!(SignalEnd::from_value(&value), Some(end));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("velocity".parse::<SignalEndMethod>(), Ok(SignalEndMethod::Velocity));
        assert_eq!("snr".parse::<CornerMethod>(), Ok(CornerMethod::Snr));
        assert!("spline".parse::<CornerMethod>().is_err());
    }

    #[test]
    fn test_malformed_value_rejected() {
        let value = ParamValue::map([("highpass", 0.1)]);
        assert!(CornerFrequencies::from_value(&value).is_none());
    }
}
