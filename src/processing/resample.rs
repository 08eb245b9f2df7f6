// Resampling
// Lanczos-kernel interpolation of traces onto a new sampling rate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::model::stream::StationStream;
use crate::model::value::ParamValue;
use crate::processing::{ProcessingError, ProcessingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    Lanczos,
}

impl ResampleMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResampleMethod::Lanczos => "lanczos",
        }
    }
}

impl FromStr for ResampleMethod {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lanczos" => Ok(ResampleMethod::Lanczos),
            _ => Err(ProcessingError::UnsupportedResampleMethod(s.to_string())),
        }
    }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

/// Lanczos kernel of half-width `a` samples
fn lanczos_kernel(x: f64, a: f64) -> f64 {
    if x.abs() >= a {
        0.0
    } else {
        sinc(x) * sinc(x / a)
    }
}

/// Interpolate `data` sampled at `old_rate` onto `new_rate` over the same
/// time span, starting at the first sample
pub fn lanczos_interpolate(data: &[f64], old_rate: f64, new_rate: f64, a: usize) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }

    let duration = (data.len() - 1) as f64 / old_rate;
    let new_npts = (duration * new_rate + 1e-9).floor() as usize + 1;
    let ratio = old_rate / new_rate;
    let a = a.max(1) as isize;
    let last = data.len() as isize - 1;

    (0..new_npts)
        .map(|j| {
            let x = j as f64 * ratio;
            let base = x.floor() as isize;
            let mut sum = 0.0;
            for i in (base - a + 1)..=(base + a) {
                if i < 0 || i > last {
                    continue;
                }
                sum += data[i as usize] * lanczos_kernel(x - i as f64, a as f64);
            }
            sum
        })
        .collect()
}

/// Resample every trace of a passing stream
pub fn resample(
    st: &mut StationStream,
    new_sampling_rate: f64,
    method: ResampleMethod,
    a: usize,
) -> ProcessingResult<()> {
    if !st.passed() {
        return Ok(());
    }
    if !(new_sampling_rate.is_finite() && new_sampling_rate > 0.0) {
        return Err(ProcessingError::InvalidSamplingRate(new_sampling_rate));
    }

    for trace in st.traces_mut() {
        if !trace.passed() {
            continue;
        }
        let resampled = match method {
            ResampleMethod::Lanczos => {
                lanczos_interpolate(trace.data(), trace.sampling_rate(), new_sampling_rate, a)
            }
        };
        log::debug!(
            "{}: resampled {} -> {} samples",
            trace.id(),
            trace.npts(),
            resampled.len()
        );
        trace.replace_data(resampled, new_sampling_rate)?;

        let mut attrs = BTreeMap::new();
        attrs.insert(
            "new_sampling_rate".to_string(),
            ParamValue::from(new_sampling_rate),
        );
        attrs.insert("method".to_string(), ParamValue::from(method.as_str()));
        attrs.insert("a".to_string(), ParamValue::from(a));
        trace.set_provenance("resample", attrs);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lanczos() {
        assert_eq!("lanczos".parse::<ResampleMethod>().unwrap(), ResampleMethod::Lanczos);
        let err = "linear".parse::<ResampleMethod>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only lanczos interpolation method is supported."
        );
    }

    #[test]
    fn test_identity_rate_keeps_samples() {
        let data: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin()).collect();
        let out = lanczos_interpolate(&data, 100.0, 100.0, 20);
        assert_eq!(out.len(), data.len());
        for (a, b) in out.iter().zip(&data) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_downsample_length_and_values() {
        let data: Vec<f64> = (0..201).map(|i| i as f64).collect();
        let out = lanczos_interpolate(&data, 200.0, 100.0, 20);
        assert_eq!(out.len(), 101);
        // Integer positions hit original samples exactly
        assert!((out[50] - 100.0).abs() < 1e-9);
    }
}
