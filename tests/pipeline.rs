mod common;

use tempfile::TempDir;

use groundmotion::config::Config;
use groundmotion::model::{CornerFrequencies, PickerType, SignalEndMethod, SignalSplit};
use groundmotion::pipeline::{
    process_stream, process_streams, read_provenance_file, ProvenanceWriter,
};
use groundmotion::processing::resample::{resample, ResampleMethod};
use groundmotion::processing::snr::SNR;
use groundmotion::processing::{signal_split, ProcessingError};

#[test]
fn test_full_pipeline_on_fixture() {
    let mut config = Config::default();
    config.windows.signal_end.method = SignalEndMethod::Magnitude;
    config.processing.resample.enabled = true;

    let mut streams = vec![common::stream(), common::stream_with_coordinates(None)];
    let summary = process_streams(&mut streams, &common::event(), &config).unwrap();

    assert_eq!(summary.streams, 2);
    assert_eq!(summary.traces, 6);
    assert_eq!(summary.passed_streams + summary.failed_streams(), 2);

    let st = &streams[0];
    assert!(st.passed(), "{:?}", st[0].failure_reason());
    for tr in st {
        assert!(tr.get_typed::<CornerFrequencies>().is_ok());
        assert_eq!(tr.sampling_rate(), 100.0);
        assert!(tr.get_cached(SNR).is_none());
        let ops = tr.provenance().operations();
        assert_eq!(
            ops,
            vec!["signal_split", "signal_end", "corner_frequencies", "cut", "resample"]
        );
    }
}

#[test]
fn test_provenance_export() {
    let config = Config::default();
    let mut streams = vec![common::stream()];
    process_streams(&mut streams, &common::event(), &config).unwrap();

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("provenance.jsonl");
    let writer = ProvenanceWriter::new(path.clone());
    let written = writer.write_stream(&streams[0]).unwrap();

    let entries = read_provenance_file(&path).unwrap();
    assert_eq!(entries.len(), written);
    assert_eq!(entries[0].trace_id, "CI.CLC.--.HNE");
    assert_eq!(entries[0].operation, "signal_split");
}

#[test]
fn test_resample_skips_failed_stream() {
    let mut st = common::stream();
    st.fail("test", "rejected upstream");
    resample(&mut st, 50.0, ResampleMethod::Lanczos, 20).unwrap();
    assert_eq!(st[0].sampling_rate(), common::SAMPLING_RATE);
    assert!(st[0].get_provenance("resample").is_empty());
}

#[test]
fn test_resample_rejects_bad_rate() {
    let mut st = common::stream();
    assert!(resample(&mut st, 0.0, ResampleMethod::Lanczos, 20).is_err());
}

#[test]
fn test_invalid_config_is_rejected_before_processing() {
    let mut config = Config::default();
    config.windows.signal_split.picker = PickerType::StaLta;
    config.pickers.sta_lta.sta_seconds = 30.0;
    config.pickers.sta_lta.lta_seconds = 20.0;

    let mut streams = vec![common::stream(), common::stream()];
    let result = process_streams(&mut streams, &common::event(), &config);
    assert!(matches!(result, Err(ProcessingError::Config(_))));
    for st in &streams {
        assert!(st.passed());
        for tr in st {
            assert!(tr.get_typed::<SignalSplit>().is_err());
            assert!(tr.provenance().operations().is_empty());
        }
    }

    assert!(matches!(
        process_stream(&mut streams[0], &common::event(), &config),
        Err(ProcessingError::Config(_))
    ));
}

#[test]
fn test_bad_resample_rate_leaves_batch_untouched() {
    let mut config = Config::default();
    config.processing.resample.enabled = true;
    config.processing.resample.new_sampling_rate = 0.0;

    let mut streams = vec![common::stream()];
    assert!(process_streams(&mut streams, &common::event(), &config).is_err());
    assert!(streams[0][0].provenance().operations().is_empty());
}

#[test]
fn test_sta_lta_split_with_long_sta_window() {
    let mut config = Config::default();
    config.windows.signal_split.picker = PickerType::StaLta;
    config.pickers.sta_lta.sta_seconds = 30.0;
    config.pickers.sta_lta.lta_seconds = 20.0;

    let mut st = common::stream();
    signal_split(
        &mut st,
        &common::event(),
        &config.windows.signal_split,
        &config.pickers,
    );
    for tr in &st {
        assert!(tr.get_typed::<SignalSplit>().is_ok());
    }
}
