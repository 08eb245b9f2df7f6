// Corner frequency selection
// Highpass/lowpass corners from SNR bands, magnitude tables or constants

use std::collections::BTreeMap;

use crate::config::{
    ConstantCornerConfig, CornerFrequencyConfig, MagnitudeCornerConfig, SnrConfig,
};
use crate::model::event::ScalarEvent;
use crate::model::params::{CornerFrequencies, CornerMethod, SNR_CONF};
use crate::model::stream::StationStream;
use crate::model::trace::StationTrace;
use crate::model::value::ParamValue;
use crate::processing::snr::compute_snr_trace;

const MODULE: &str = "corner_frequencies";

pub const SNR_THRESHOLD_REASON: &str = "SNR not greater than required threshold.";
pub const SNR_BANDWIDTH_REASON: &str = "SNR not met within the required bandwidth.";
pub const MAGNITUDE_TABLE_REASON: &str =
    "Magnitude corner tables do not cover the event magnitude.";

/// Select corners for every trace of a passing stream
pub fn get_corner_frequencies(
    st: &mut StationStream,
    event: &ScalarEvent,
    config: &CornerFrequencyConfig,
) {
    if !st.passed() {
        log::debug!("Skipping corner frequencies for failed stream {}", st.get_id());
        return;
    }

    match config.method {
        CornerMethod::Snr => snr_corners(st, &config.snr),
        CornerMethod::Magnitude => match magnitude_corners(&config.magnitude, event.magnitude) {
            Some((highpass, lowpass)) => {
                set_all(st, CornerMethod::Magnitude, highpass, lowpass);
            }
            None => st.fail(MODULE, MAGNITUDE_TABLE_REASON),
        },
        CornerMethod::Constant => {
            let ConstantCornerConfig { highpass, lowpass } = config.constant;
            set_all(st, CornerMethod::Constant, highpass, lowpass);
        }
    }
}

fn set_corners(trace: &mut StationTrace, corners: CornerFrequencies) {
    let mut attrs = BTreeMap::new();
    attrs.insert("method".to_string(), ParamValue::from(corners.kind.as_str()));
    attrs.insert("highpass".to_string(), ParamValue::from(corners.highpass));
    attrs.insert("lowpass".to_string(), ParamValue::from(corners.lowpass));
    trace.set_typed(&corners);
    trace.set_provenance(MODULE, attrs);
}

fn set_all(st: &mut StationStream, kind: CornerMethod, highpass: f64, lowpass: f64) {
    for trace in st.traces_mut() {
        set_corners(
            trace,
            CornerFrequencies {
                kind,
                highpass,
                lowpass,
            },
        );
    }
}

// ==================== MAGNITUDE ====================

/// Corners from the last magnitude bin whose lower bound is below `magnitude`.
/// None when the tables are empty or too short for the selected bin.
pub fn magnitude_corners(config: &MagnitudeCornerConfig, magnitude: f64) -> Option<(f64, f64)> {
    let idx = config
        .minmag
        .iter()
        .rposition(|&m| magnitude > m)
        .unwrap_or(0);
    Some((*config.highpass.get(idx)?, *config.lowpass.get(idx)?))
}

// ==================== SNR ====================

/// Pick (highpass, lowpass) from an SNR curve. Bands open at the first
/// frequency meeting the threshold and close at the first one below it; the
/// last band spanning `[min_freq, max_freq]` wins.
pub fn corners_from_snr(
    freq: &[f64],
    snr: &[f64],
    threshold: f64,
    min_freq: f64,
    max_freq: f64,
) -> Result<(f64, f64), &'static str> {
    if !snr.iter().any(|&s| s >= threshold) {
        return Err(SNR_THRESHOLD_REASON);
    }

    let mut bands = Vec::new();
    let mut open: Option<f64> = None;
    for (&f, &s) in freq.iter().zip(snr) {
        match open {
            None if s >= threshold => open = Some(f),
            Some(low) if s < threshold => {
                bands.push((low, f));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(low) = open {
        let fmax = freq.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        bands.push((low, fmax));
    }

    bands
        .into_iter()
        .rev()
        .find(|&(low, high)| low <= min_freq && high > max_freq)
        .ok_or(SNR_BANDWIDTH_REASON)
}

fn snr_corners(st: &mut StationStream, config: &SnrConfig) {
    let snr_conf = ParamValue::map([
        ("threshold", config.threshold),
        ("min_freq", config.min_freq),
        ("max_freq", config.max_freq),
        ("bandwidth", config.bandwidth),
    ]);

    let mut selected: Vec<Option<CornerFrequencies>> = vec![None; st.len()];
    for (i, slot) in selected.iter_mut().enumerate() {
        let outcome = match st.trace_mut(i) {
            Some(trace) => {
                trace.set_parameter(SNR_CONF, snr_conf.clone());
                match compute_snr_trace(trace, config.bandwidth, config.smoothing_points) {
                    Ok(spectra) => corners_from_snr(
                        &spectra.freq,
                        &spectra.snr,
                        config.threshold,
                        config.min_freq,
                        config.max_freq,
                    )
                    .map_err(str::to_string),
                    Err(e) => Err(e.to_string()),
                }
            }
            None => continue,
        };

        match outcome {
            Ok((highpass, lowpass)) => {
                *slot = Some(CornerFrequencies {
                    kind: CornerMethod::Snr,
                    highpass,
                    lowpass,
                });
            }
            Err(reason) => st.fail_trace(i, MODULE, &reason),
        }
    }

    if config.same_horiz && st.passed() && st.num_horizontal() > 1 {
        let horizontal: Vec<bool> = st.iter().map(StationTrace::is_horizontal).collect();
        share_horizontal_corners(&mut selected, &horizontal);
    }

    for (trace, corners) in st.traces_mut().iter_mut().zip(selected) {
        if let Some(corners) = corners {
            set_corners(trace, corners);
        }
    }
}

/// Give every horizontal the most conservative band among them
fn share_horizontal_corners(selected: &mut [Option<CornerFrequencies>], horizontal: &[bool]) {
    let shared = selected
        .iter()
        .zip(horizontal)
        .filter(|(_, h)| **h)
        .filter_map(|(c, _)| c.as_ref())
        .fold(None, |acc: Option<(f64, f64)>, c| match acc {
            None => Some((c.highpass, c.lowpass)),
            Some((hp, lp)) => Some((hp.max(c.highpass), lp.min(c.lowpass))),
        });
    let Some((highpass, lowpass)) = shared else {
        return;
    };

    for (corners, _) in selected
        .iter_mut()
        .zip(horizontal)
        .filter(|(_, h)| **h)
    {
        if let Some(c) = corners {
            c.highpass = highpass;
            c.lowpass = lowpass;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        (1..=10).map(|i| i as f64).collect()
    }

    #[test]
    fn test_single_band_to_end() {
        let snr = vec![1.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0];
        assert_eq!(corners_from_snr(&grid(), &snr, 3.0, 2.0, 5.0), Ok((2.0, 10.0)));
    }

    #[test]
    fn test_band_closes_at_first_drop() {
        let snr = vec![4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 1.0, 4.0, 4.0, 4.0];
        assert_eq!(corners_from_snr(&grid(), &snr, 3.0, 1.0, 5.0), Ok((1.0, 7.0)));
    }

    #[test]
    fn test_band_too_narrow() {
        let snr = vec![4.0, 4.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        assert_eq!(
            corners_from_snr(&grid(), &snr, 3.0, 1.0, 5.0),
            Err(SNR_BANDWIDTH_REASON)
        );
    }

    #[test]
    fn test_below_threshold_everywhere() {
        let snr = vec![1.0; 10];
        assert_eq!(
            corners_from_snr(&grid(), &snr, 3.0, 1.0, 5.0),
            Err(SNR_THRESHOLD_REASON)
        );
    }

    #[test]
    fn test_magnitude_bins() {
        let config = MagnitudeCornerConfig::default();
        assert_eq!(magnitude_corners(&config, 5.0), Some((0.3, 35.0)));
        assert_eq!(magnitude_corners(&config, 2.0), Some((0.5, 25.0)));
        assert_eq!(magnitude_corners(&config, 7.1), Some((0.1, 40.0)));
    }

    #[test]
    fn test_magnitude_tables_too_short() {
        let config = MagnitudeCornerConfig {
            minmag: vec![-999.0, 5.0],
            highpass: vec![0.5],
            lowpass: vec![25.0],
        };
        assert_eq!(magnitude_corners(&config, 7.0), None);
        assert_eq!(magnitude_corners(&config, 4.0), Some((0.5, 25.0)));

        let empty = MagnitudeCornerConfig {
            minmag: vec![],
            highpass: vec![],
            lowpass: vec![],
        };
        assert_eq!(magnitude_corners(&empty, 7.0), None);
    }

    fn snr_corners_of(highpass: f64, lowpass: f64) -> Option<CornerFrequencies> {
        Some(CornerFrequencies {
            kind: CornerMethod::Snr,
            highpass,
            lowpass,
        })
    }

    #[test]
    fn test_share_horizontal_corners() {
        let mut selected = vec![
            snr_corners_of(0.1, 30.0),
            snr_corners_of(0.2, 40.0),
            snr_corners_of(0.5, 10.0),
        ];
        share_horizontal_corners(&mut selected, &[true, true, false]);

        assert_eq!(selected[0], snr_corners_of(0.2, 30.0));
        assert_eq!(selected[1], snr_corners_of(0.2, 30.0));
        assert_eq!(selected[2], snr_corners_of(0.5, 10.0));
    }
}
