mod common;

use groundmotion::config::{CornerFrequencyConfig, MagnitudeCornerConfig};
use groundmotion::model::{
    add_seconds, CornerFrequencies, CornerMethod, PickerType, ScalarEvent, SignalSplit,
    SplitMethod, StationStream,
};
use groundmotion::processing::corner_frequencies::{MAGNITUDE_TABLE_REASON, SNR_THRESHOLD_REASON};
use groundmotion::processing::get_corner_frequencies;
use groundmotion::processing::snr::SNR;

fn split_at_origin(st: &mut StationStream) {
    for tr in st.traces_mut() {
        tr.set_typed(&SignalSplit {
            split_time: common::origin_time(),
            method: SplitMethod::PArrival,
            picker_type: PickerType::TravelTime,
        });
    }
}

fn corners(st: &StationStream) -> Vec<CornerFrequencies> {
    st.iter()
        .map(|tr| tr.get_typed::<CornerFrequencies>().unwrap())
        .collect()
}

#[test]
fn test_snr_corners_on_identical_traces() {
    let mut st = common::snr_stream();
    split_at_origin(&mut st);

    get_corner_frequencies(&mut st, &common::event(), &CornerFrequencyConfig::default());
    assert!(st.passed());

    let corners = corners(&st);
    for c in &corners {
        assert_eq!(c.kind, CornerMethod::Snr);
        assert_eq!(c.highpass, corners[0].highpass);
        assert_eq!(c.lowpass, 100.0);
    }
    assert!(corners[0].highpass <= 0.2);

    for tr in &st {
        let snr = tr.get_cached(SNR).unwrap();
        assert_eq!(snr["freq"].len(), snr["snr"].len());
        assert!(snr["snr"].iter().all(|&s| (s - 100.0).abs() < 1e-6));
        assert_eq!(tr.get_parameter("snr_conf").unwrap()["threshold"], 3.0);
        assert_eq!(tr.get_provenance("corner_frequencies").len(), 1);
    }
}

#[test]
fn test_corner_provenance_matches_stored_corners() {
    let mut st = common::snr_stream();
    split_at_origin(&mut st);

    get_corner_frequencies(&mut st, &common::event(), &CornerFrequencyConfig::default());
    assert!(st.passed());

    let stored = corners(&st);
    assert_eq!(stored[0].highpass, stored[1].highpass);
    assert_eq!(stored[0].lowpass, stored[1].lowpass);
    for (tr, c) in st.iter().zip(&stored) {
        let records = tr.get_provenance("corner_frequencies");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attributes["highpass"].as_f64(), Some(c.highpass));
        assert_eq!(records[0].attributes["lowpass"].as_f64(), Some(c.lowpass));
    }
}

#[test]
fn test_snr_fails_when_signal_is_not_louder() {
    let mut st = common::snr_stream();
    for tr in st.traces_mut() {
        let n = tr.npts() / 2;
        let data = tr.data_mut();
        for i in 0..n {
            data[n + i] = data[i];
        }
    }
    split_at_origin(&mut st);

    get_corner_frequencies(&mut st, &common::event(), &CornerFrequencyConfig::default());
    assert!(!st.passed());
    assert_eq!(st[0].failure_reason(), Some(SNR_THRESHOLD_REASON));
}

#[test]
fn test_snr_needs_noise_window() {
    let mut st = common::snr_stream();
    for tr in st.traces_mut() {
        let split_time = add_seconds(tr.starttime(), 0.02);
        tr.set_typed(&SignalSplit {
            split_time,
            method: SplitMethod::FixedOffset,
            picker_type: PickerType::None,
        });
    }

    get_corner_frequencies(&mut st, &common::event(), &CornerFrequencyConfig::default());
    assert!(!st.passed());
    assert_eq!(
        st[0].failure_reason(),
        Some("Not enough points in noise window to compute SNR.")
    );
}

#[test]
fn test_snr_without_split() {
    let mut st = common::snr_stream();
    get_corner_frequencies(&mut st, &common::event(), &CornerFrequencyConfig::default());
    assert!(!st.passed());
    assert_eq!(
        st[0].failure_reason(),
        Some("Cannot compute SNR; no signal split method available.")
    );
}

#[test]
fn test_magnitude_corners() {
    let event = ScalarEvent::new("m5", common::origin_time(), 35.77, -117.599, 8.0, 5.0);
    let mut config = CornerFrequencyConfig::default();
    config.method = CornerMethod::Magnitude;

    let mut st = common::stream();
    get_corner_frequencies(&mut st, &event, &config);
    assert!(st.passed());
    for c in corners(&st) {
        assert_eq!(c.kind, CornerMethod::Magnitude);
        assert_eq!(c.highpass, 0.3);
        assert_eq!(c.lowpass, 35.0);
    }
}

#[test]
fn test_constant_corners() {
    let mut config = CornerFrequencyConfig::default();
    config.method = CornerMethod::Constant;

    let mut st = common::stream();
    get_corner_frequencies(&mut st, &common::event(), &config);
    for c in corners(&st) {
        assert_eq!(c.highpass, 0.08);
        assert_eq!(c.lowpass, 20.0);
    }
}

#[test]
fn test_failed_stream_is_skipped() {
    let mut config = CornerFrequencyConfig::default();
    config.method = CornerMethod::Constant;

    let mut st = common::stream();
    st.fail("test", "rejected upstream");
    get_corner_frequencies(&mut st, &common::event(), &config);
    assert!(!st[0].has_parameter("corner_frequencies"));
}

#[test]
fn test_short_magnitude_tables_fail_stream() {
    let mut config = CornerFrequencyConfig::default();
    config.method = CornerMethod::Magnitude;
    config.magnitude = MagnitudeCornerConfig {
        minmag: vec![-999.0, 5.0],
        highpass: vec![0.5],
        lowpass: vec![25.0],
    };

    let mut st = common::stream();
    get_corner_frequencies(&mut st, &common::event(), &config);
    assert!(!st.passed());
    for tr in &st {
        assert_eq!(tr.failure_reason(), Some(MAGNITUDE_TABLE_REASON));
        assert!(tr.get_provenance("corner_frequencies").is_empty());
    }
}
