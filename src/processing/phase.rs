// P-wave arrival picking
// Travel-time prediction through a flat layered model, and an STA/LTA trigger picker

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{StaLtaConfig, TravelTimeConfig};
use crate::geodetics::epicentral_distance_km;
use crate::model::event::ScalarEvent;
use crate::model::params::{PickerType, SignalSplit, SplitMethod};
use crate::model::time::{add_seconds, seconds_between};
use crate::model::trace::StationTrace;

/// Reasons a picker could not produce an arrival
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PickError {
    #[error("Station coordinates are not available")]
    MissingCoordinates,

    #[error("Event-station geometry is degenerate")]
    DegenerateGeometry,

    #[error("Trace starts after the origin time")]
    StartsAfterOrigin,

    #[error("No arrival predicted by the velocity model")]
    NoArrival,

    #[error("No STA/LTA trigger found")]
    NoTrigger,

    #[error("Pick at {0} lies outside the trace")]
    OutsideTrace(DateTime<Utc>),
}

/// A split time together with the method that actually produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    pub split_time: DateTime<Utc>,
    pub method: SplitMethod,
    pub picker_type: PickerType,
}

impl From<PickResult> for SignalSplit {
    fn from(pick: PickResult) -> Self {
        SignalSplit {
            split_time: pick.split_time,
            method: pick.method,
            picker_type: pick.picker_type,
        }
    }
}

// ==================== TRAVEL TIME ====================

/// Flat-layered P-velocity model
pub struct LayeredModel<'a> {
    config: &'a TravelTimeConfig,
}

impl<'a> LayeredModel<'a> {
    pub fn new(config: &'a TravelTimeConfig) -> Self {
        LayeredModel { config }
    }

    /// (top depth, thickness, vp) for each layer; the half-space is last
    /// with infinite thickness
    fn layers(&self) -> Vec<(f64, f64, f64)> {
        let mut out = Vec::with_capacity(self.config.layers.len() + 1);
        let mut top = 0.0;
        for layer in &self.config.layers {
            out.push((top, layer.thickness_km, layer.vp));
            top += layer.thickness_km;
        }
        out.push((top, f64::INFINITY, self.config.halfspace_vp));
        out
    }

    /// First P arrival in seconds after origin for a source at `depth_km`
    /// and a surface receiver `distance_km` away. Considers the direct wave
    /// and head waves along every deeper interface.
    pub fn first_arrival(&self, distance_km: f64, depth_km: f64) -> Option<f64> {
        if !distance_km.is_finite() || !depth_km.is_finite() || distance_km < 0.0 {
            return None;
        }
        let depth = depth_km.max(0.0);
        let layers = self.layers();

        let source_idx = layers
            .iter()
            .position(|(top, thickness, _)| depth < top + thickness)
            .unwrap_or(layers.len() - 1);
        let source_vp = layers[source_idx].2;

        let mut best = (distance_km.powi(2) + depth.powi(2)).sqrt() / source_vp;

        for n in (source_idx + 1)..layers.len() {
            let vn = layers[n].2;
            if layers[..n].iter().any(|&(_, _, v)| v >= vn) {
                continue;
            }

            let mut delay = 0.0;
            let mut horizontal = 0.0;
            for (i, &(top, thickness, vi)) in layers[..n].iter().enumerate() {
                // Receiver leg crosses every layer; source leg only from the source down
                let source_leg = if i < source_idx {
                    0.0
                } else if i == source_idx {
                    top + thickness - depth
                } else {
                    thickness
                };
                let path = thickness + source_leg;
                let sin_theta = vi / vn;
                let cos_theta = (1.0 - sin_theta * sin_theta).sqrt();
                delay += path * cos_theta / vi;
                horizontal += path * sin_theta / cos_theta;
            }

            if horizontal <= distance_km {
                best = best.min(distance_km / vn + delay);
            }
        }

        Some(best)
    }
}

/// Predicted P arrival at a trace's station
pub fn pick_travel_time(
    trace: &StationTrace,
    event: &ScalarEvent,
    config: &TravelTimeConfig,
) -> Result<DateTime<Utc>, PickError> {
    if trace.starttime() > event.time {
        return Err(PickError::StartsAfterOrigin);
    }

    let coords = trace.coordinates().ok_or(PickError::MissingCoordinates)?;
    let distance = epicentral_distance_km(
        event.latitude,
        event.longitude,
        coords.latitude,
        coords.longitude,
    )
    .ok_or(PickError::DegenerateGeometry)?;

    let travel_time = LayeredModel::new(config)
        .first_arrival(distance, event.depth_km)
        .ok_or(PickError::NoArrival)?;

    log::debug!(
        "{}: distance {:.1} km, P travel time {:.2} s",
        trace.id(),
        distance,
        travel_time
    );
    Ok(add_seconds(event.time, travel_time))
}

// ==================== STA/LTA ====================

/// Short-term / long-term average trigger on squared amplitude
#[derive(Debug, Clone)]
pub struct StaLtaPicker {
    sta_samples: usize,
    lta_samples: usize,
    threshold: f64,
}

impl StaLtaPicker {
    /// The short-term window never exceeds the long-term one
    pub fn new(config: &StaLtaConfig, sampling_rate: f64) -> Self {
        let lta_samples = ((config.lta_seconds * sampling_rate).round() as usize).max(2);
        let sta_samples = ((config.sta_seconds * sampling_rate).round() as usize)
            .max(1)
            .min(lta_samples);
        StaLtaPicker {
            sta_samples,
            lta_samples,
            threshold: config.threshold,
        }
    }

    /// Sample index of the first trigger
    pub fn trigger_index(&self, samples: &[f64]) -> Option<usize> {
        let n = samples.len();
        if n <= self.lta_samples {
            return None;
        }

        let mean = samples.iter().sum::<f64>() / n as f64;
        let mut cumulative = Vec::with_capacity(n + 1);
        cumulative.push(0.0);
        for x in samples {
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + (x - mean).powi(2));
        }

        for i in self.lta_samples..=n {
            let sta = (cumulative[i] - cumulative[i - self.sta_samples]) / self.sta_samples as f64;
            let lta = (cumulative[i] - cumulative[i - self.lta_samples]) / self.lta_samples as f64;

            if lta <= f64::EPSILON {
                continue;
            }

            if sta / lta > self.threshold {
                // Onset is the start of the short-term window
                return Some(i - self.sta_samples);
            }
        }

        None
    }

    pub fn pick(&self, trace: &StationTrace) -> Result<DateTime<Utc>, PickError> {
        let index = self
            .trigger_index(trace.data())
            .ok_or(PickError::NoTrigger)?;
        Ok(add_seconds(
            trace.starttime(),
            index as f64 / trace.sampling_rate(),
        ))
    }
}

/// Reject picks that do not fall inside the record
pub fn check_within_trace(
    trace: &StationTrace,
    time: DateTime<Utc>,
) -> Result<DateTime<Utc>, PickError> {
    if time < trace.starttime() || time > trace.endtime() {
        return Err(PickError::OutsideTrace(time));
    }
    Ok(time)
}

/// Heuristic split a fixed number of seconds into the trace, never past the
/// trace midpoint
pub fn fallback_split(trace: &StationTrace, offset: f64) -> PickResult {
    let offset = offset.max(0.0).min(trace.duration() / 2.0);
    PickResult {
        split_time: add_seconds(trace.starttime(), offset),
        method: SplitMethod::FixedOffset,
        picker_type: PickerType::None,
    }
}

/// Noise-window length implied by a pick, in seconds
pub fn noise_length(trace: &StationTrace, pick: &PickResult) -> f64 {
    seconds_between(pick.split_time, trace.starttime())
}
