// Pipeline driver
// Runs the windowing and characterization steps over a batch of streams

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::model::event::ScalarEvent;
use crate::model::stream::StationStream;
use crate::processing::{
    cut, get_corner_frequencies, resample, signal_end, signal_split, window_checks,
    ProcessingResult,
};

/// Outcome counts for a processed batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub streams: usize,
    pub passed_streams: usize,
    pub traces: usize,
    pub passed_traces: usize,
}

impl PipelineSummary {
    pub fn from_streams(streams: &[StationStream]) -> Self {
        let mut summary = PipelineSummary::default();
        for st in streams {
            summary.streams += 1;
            if st.passed() {
                summary.passed_streams += 1;
            }
            summary.traces += st.len();
            summary.passed_traces += st.iter().filter(|tr| tr.passed()).count();
        }
        summary
    }

    pub fn failed_streams(&self) -> usize {
        self.streams - self.passed_streams
    }
}

/// Run every configured step on one stream
pub fn process_stream(
    st: &mut StationStream,
    event: &ScalarEvent,
    config: &Config,
) -> ProcessingResult<()> {
    config.validate()?;
    run_steps(st, event, config)
}

fn run_steps(st: &mut StationStream, event: &ScalarEvent, config: &Config) -> ProcessingResult<()> {
    let windows = &config.windows;

    signal_split(st, event, &windows.signal_split, &config.pickers);
    signal_end(st, event, windows.signal_end.method, &windows.signal_end);

    if windows.window_checks.enabled {
        window_checks(
            st,
            windows.window_checks.min_noise_duration,
            windows.window_checks.min_signal_duration,
        );
    }

    get_corner_frequencies(st, event, &config.corner_frequencies);

    let processing = &config.processing;
    if processing.cut.enabled {
        cut(st, processing.cut.sec_before_split);
    }

    if processing.resample.enabled {
        resample(
            st,
            processing.resample.new_sampling_rate,
            processing.resample.method,
            processing.resample.a,
        )?;
    }

    log::debug!(
        "{}: {}",
        st.get_id(),
        if st.passed() { "passed" } else { "failed" }
    );
    Ok(())
}

/// Process a batch of streams recorded for one event. The config is
/// validated before any stream is touched.
pub fn process_streams(
    streams: &mut [StationStream],
    event: &ScalarEvent,
    config: &Config,
) -> ProcessingResult<PipelineSummary> {
    config.validate()?;

    log::info!(
        "Processing {} streams for event {} (M{:.1})",
        streams.len(),
        event.id,
        event.magnitude
    );

    for st in streams.iter_mut() {
        run_steps(st, event, config)?;
    }

    let summary = PipelineSummary::from_streams(streams);
    log::info!(
        "Event {}: {}/{} streams passed, {}/{} traces passed",
        event.id,
        summary.passed_streams,
        summary.streams,
        summary.passed_traces,
        summary.traces
    );
    Ok(summary)
}
