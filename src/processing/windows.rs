// Signal windowing
// Signal/noise split, signal end estimation, window duration checks and cutting

use std::collections::BTreeMap;

use crate::config::{PickerConfig, SignalEndConfig, SignalSplitConfig};
use crate::geodetics::epicentral_distance_km;
use crate::model::event::ScalarEvent;
use crate::model::params::{PickerType, SignalEnd, SignalEndMethod, SignalSplit, SplitMethod};
use crate::model::stream::StationStream;
use crate::model::time::{add_seconds, seconds_between};
use crate::model::trace::StationTrace;
use crate::model::value::ParamValue;
use crate::processing::duration::{magnitude_duration, velocity_duration, DurationModel};
use crate::processing::phase::{
    check_within_trace, fallback_split, noise_length, pick_travel_time, PickError, PickResult,
    StaLtaPicker,
};

const MODULE: &str = "windows";
const CUT_MODULE: &str = "cut";

pub const NO_SPLIT_REASON: &str = "Cannot check window because no split time available.";
pub const NO_END_REASON: &str = "Cannot check window because no signal end available.";
pub const NO_COORDINATES_REASON: &str = "Cannot compute signal end without station coordinates.";
pub const NOISE_DURATION_REASON: &str = "Failed noise window duration check.";
pub const SIGNAL_DURATION_REASON: &str = "Failed signal window duration check.";
pub const CUT_REASON: &str =
    "The 'cut' processing step resulted in incompatible start and end times.";
pub const EMPTY_CUT_REASON: &str = "The 'cut' processing step left no samples.";

// ==================== SIGNAL SPLIT ====================

/// Pick the split for one trace, falling back to a fixed offset when the
/// picker fails or lands outside the record
pub fn pick_split(
    trace: &StationTrace,
    event: &ScalarEvent,
    split_config: &SignalSplitConfig,
    pickers: &PickerConfig,
) -> PickResult {
    let picker = split_config.picker;
    let attempt = match picker {
        PickerType::TravelTime => pick_travel_time(trace, event, &pickers.travel_time),
        PickerType::StaLta => StaLtaPicker::new(&pickers.sta_lta, trace.sampling_rate()).pick(trace),
        PickerType::None => Err(PickError::NoArrival),
    }
    .and_then(|time| check_within_trace(trace, time));

    match attempt {
        Ok(split_time) => PickResult {
            split_time,
            method: SplitMethod::PArrival,
            picker_type: picker,
        },
        Err(e) => {
            log::warn!(
                "{}: {} picker failed ({}), using fixed offset split",
                trace.id(),
                picker.as_str(),
                e
            );
            fallback_split(trace, split_config.fallback_offset)
        }
    }
}

/// Annotate every trace with a `signal_split` parameter. Never fails: an
/// unusable pick is replaced by the fallback split.
pub fn signal_split(
    st: &mut StationStream,
    event: &ScalarEvent,
    split_config: &SignalSplitConfig,
    pickers: &PickerConfig,
) {
    for trace in st.traces_mut() {
        let pick = pick_split(trace, event, split_config, pickers);
        log::debug!(
            "{}: split at {} ({} s of noise, {})",
            trace.id(),
            pick.split_time,
            noise_length(trace, &pick),
            pick.method.as_str()
        );

        let mut attrs = BTreeMap::new();
        attrs.insert("method".to_string(), ParamValue::from(pick.method.as_str()));
        attrs.insert(
            "picker_type".to_string(),
            ParamValue::from(pick.picker_type.as_str()),
        );
        trace.set_typed(&SignalSplit::from(pick));
        trace.set_provenance("signal_split", attrs);
    }
}

// ==================== SIGNAL END ====================

fn station_distance(trace: &StationTrace, event: &ScalarEvent) -> Option<f64> {
    let coords = trace.coordinates()?;
    epicentral_distance_km(
        event.latitude,
        event.longitude,
        coords.latitude,
        coords.longitude,
    )
}

/// Signal end for one trace; the error is the failure reason
pub fn estimate_signal_end(
    trace: &StationTrace,
    event: &ScalarEvent,
    method: SignalEndMethod,
    config: &SignalEndConfig,
) -> Result<SignalEnd, &'static str> {
    let split = trace
        .get_typed::<SignalSplit>()
        .map_err(|_| NO_SPLIT_REASON)?;

    let mut end = SignalEnd {
        end_time: trace.endtime(),
        method,
        vmin: None,
        floor: None,
        model: None,
        epsilon: None,
    };

    match method {
        SignalEndMethod::None => {}
        SignalEndMethod::Magnitude => {
            let duration = magnitude_duration(&config.magnitude, event.magnitude);
            end.end_time = add_seconds(event.time, duration);
        }
        SignalEndMethod::Velocity => {
            let distance = station_distance(trace, event).ok_or(NO_COORDINATES_REASON)?;
            let duration = velocity_duration(distance, config.vmin, config.floor);
            end.end_time = add_seconds(event.time, duration);
            end.vmin = Some(config.vmin);
            end.floor = Some(config.floor);
        }
        SignalEndMethod::Model => {
            let distance = station_distance(trace, event).ok_or(NO_COORDINATES_REASON)?;
            let duration = DurationModel::new(&config.model).duration(
                event.magnitude,
                distance,
                config.vs30,
                config.epsilon,
            );
            end.end_time = add_seconds(split.split_time, duration);
            end.model = Some(config.model.name.clone());
            end.epsilon = Some(config.epsilon);
        }
    }

    if end.end_time > trace.endtime() {
        end.end_time = trace.endtime();
    }
    Ok(end)
}

/// Annotate every trace with a `signal_end` parameter. Traces without a
/// split are failed. Streams that have already failed are left alone.
pub fn signal_end(
    st: &mut StationStream,
    event: &ScalarEvent,
    method: SignalEndMethod,
    config: &SignalEndConfig,
) {
    if !st.passed() {
        return;
    }

    for i in 0..st.len() {
        match estimate_signal_end(&st[i], event, method, config) {
            Ok(end) => {
                if let Some(trace) = st.trace_mut(i) {
                    let mut attrs = BTreeMap::new();
                    attrs.insert("method".to_string(), ParamValue::from(method.as_str()));
                    attrs.insert("end_time".to_string(), ParamValue::from(end.end_time));
                    trace.set_typed(&end);
                    trace.set_provenance("signal_end", attrs);
                }
            }
            Err(reason) => st.fail_trace(i, MODULE, reason),
        }
    }
}

// ==================== WINDOW CHECKS ====================

/// First failed window condition for a trace, if any
pub fn check_trace_windows(
    trace: &StationTrace,
    min_noise_duration: f64,
    min_signal_duration: f64,
) -> Result<(), &'static str> {
    let split = trace
        .get_typed::<SignalSplit>()
        .map_err(|_| NO_SPLIT_REASON)?;

    let noise_duration = seconds_between(split.split_time, trace.starttime());
    if noise_duration < min_noise_duration {
        return Err(NOISE_DURATION_REASON);
    }

    let end = trace.get_typed::<SignalEnd>().map_err(|_| NO_END_REASON)?;
    let signal_duration = seconds_between(end.end_time, split.split_time);
    if signal_duration < min_signal_duration {
        return Err(SIGNAL_DURATION_REASON);
    }

    Ok(())
}

/// Fail traces whose noise or signal windows are too short
pub fn window_checks(st: &mut StationStream, min_noise_duration: f64, min_signal_duration: f64) {
    if !st.passed() {
        return;
    }

    for i in 0..st.len() {
        if let Err(reason) = check_trace_windows(&st[i], min_noise_duration, min_signal_duration) {
            st.fail_trace(i, MODULE, reason);
        }
    }
}

// ==================== CUT ====================

fn cut_trace(trace: &mut StationTrace, sec_before_split: Option<f64>) -> Result<(), &'static str> {
    let end_time = trace
        .get_typed::<SignalEnd>()
        .map_err(|_| NO_END_REASON)?
        .end_time;

    log::debug!("Before cut end time: {}", trace.endtime());
    trace.trim(None, Some(end_time)).map_err(|_| CUT_REASON)?;
    log::debug!("After cut end time: {}", trace.endtime());

    if let Some(sec) = sec_before_split {
        let split_time = trace
            .get_typed::<SignalSplit>()
            .map_err(|_| NO_SPLIT_REASON)?
            .split_time;
        let start_time = add_seconds(split_time, -sec);

        log::debug!("Before cut start time: {}", trace.starttime());
        if start_time >= end_time {
            return Err(CUT_REASON);
        }
        trace.trim(Some(start_time), None).map_err(|_| CUT_REASON)?;
        log::debug!("After cut start time: {}", trace.starttime());
    }

    if trace.npts() == 0 {
        return Err(EMPTY_CUT_REASON);
    }

    let mut attrs = BTreeMap::new();
    attrs.insert(
        "new_start_time".to_string(),
        ParamValue::from(trace.starttime()),
    );
    attrs.insert("new_end_time".to_string(), ParamValue::from(trace.endtime()));
    trace.set_provenance("cut", attrs);
    Ok(())
}

/// Trim traces to `[split - sec_before_split, signal end]`. Degenerate
/// windows fail the trace; failed streams are not touched.
pub fn cut(st: &mut StationStream, sec_before_split: Option<f64>) {
    if !st.passed() {
        log::debug!("Skipping cut for failed stream {}", st.get_id());
        return;
    }

    for i in 0..st.len() {
        let outcome = match st.trace_mut(i) {
            Some(trace) => cut_trace(trace, sec_before_split),
            None => Ok(()),
        };
        if let Err(reason) = outcome {
            st.fail_trace(i, CUT_MODULE, reason);
        }
    }
}
