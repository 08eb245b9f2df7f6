// Shared fixtures for integration tests
// Deterministic three-component records around a synthetic M7.1 event

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use groundmotion::model::{
    add_seconds, Coordinates, ScalarEvent, StandardMetadata, StationStream, StationTrace,
    TraceStats,
};

pub const SAMPLING_RATE: f64 = 200.0;
pub const PRE_EVENT_SECONDS: f64 = 30.0;

pub fn origin_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 7, 6, 3, 19, 53).unwrap()
}

pub fn event() -> ScalarEvent {
    ScalarEvent::new("ci38457511", origin_time(), 35.770, -117.599, 8.0, 7.1)
}

pub fn station_coordinates() -> Coordinates {
    Coordinates {
        latitude: 35.8157,
        longitude: -117.5975,
        elevation: 775.0,
    }
}

/// Uniform pseudo-random values in [-1, 1)
pub fn lcg_samples(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        })
        .collect()
}

pub fn stats(channel: &str, coordinates: Option<Coordinates>) -> TraceStats {
    TraceStats {
        network: "CI".to_string(),
        station: "CLC".to_string(),
        location: "--".to_string(),
        channel: channel.to_string(),
        sampling_rate: SAMPLING_RATE,
        starttime: add_seconds(origin_time(), -PRE_EVENT_SECONDS),
        coordinates,
        standard: StandardMetadata::default(),
    }
}

/// Noise for the pre-event part, 100x louder shaking after the origin
pub fn record(channel: &str, seconds: f64, seed: u64, coordinates: Option<Coordinates>) -> StationTrace {
    let npts = (seconds * SAMPLING_RATE) as usize + 1;
    let noise_npts = (PRE_EVENT_SECONDS * SAMPLING_RATE) as usize;
    let mut data = lcg_samples(npts, seed);
    for x in data[noise_npts..].iter_mut() {
        *x *= 100.0;
    }
    StationTrace::new(stats(channel, coordinates), data).unwrap()
}

/// 300 s three-component stream with station coordinates
pub fn stream() -> StationStream {
    stream_with_coordinates(Some(station_coordinates()))
}

pub fn stream_with_coordinates(coordinates: Option<Coordinates>) -> StationStream {
    StationStream::new(vec![
        record("HNE", 300.0, 1, coordinates),
        record("HNN", 300.0, 2, coordinates),
        record("HNZ", 300.0, 3, coordinates),
    ])
}

/// Three identical traces whose signal window is exactly 100x the noise
/// window, split at the origin
pub fn snr_stream() -> StationStream {
    let n = (PRE_EVENT_SECONDS * SAMPLING_RATE) as usize;
    let noise = lcg_samples(n, 42);
    let mut data = noise.clone();
    data.extend(noise.iter().map(|x| x * 100.0));

    let traces = ["HNE", "HNN", "HNZ"]
        .iter()
        .map(|channel| {
            StationTrace::new(stats(channel, Some(station_coordinates())), data.clone()).unwrap()
        })
        .collect();
    StationStream::new(traces)
}
