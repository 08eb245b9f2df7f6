// Station stream
// Ordered traces from one station deployment with an aggregate pass/fail flag

use std::collections::BTreeMap;
use std::ops::Index;

use crate::model::params::ParameterError;
use crate::model::trace::StationTrace;
use crate::model::value::ParamValue;

/// Traces from one station/instrument with pipeline state.
///
/// `passed` is updated eagerly by `fail` and `fail_trace`. Code that fails
/// traces through `traces_mut` must call `update_passed` afterwards.
#[derive(Debug, Clone)]
pub struct StationStream {
    traces: Vec<StationTrace>,
    passed: bool,
    parameters: BTreeMap<String, ParamValue>,
}

impl StationStream {
    pub fn new(traces: Vec<StationTrace>) -> Self {
        let passed = traces.iter().all(StationTrace::passed);
        StationStream {
            traces,
            passed,
            parameters: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, trace: StationTrace) {
        if !trace.passed() {
            self.passed = false;
        }
        self.traces.push(trace);
    }

    /// Stream id: NET.STA.INST where INST is the channel band + instrument code
    pub fn get_id(&self) -> String {
        match self.traces.first() {
            Some(tr) => {
                let stats = tr.stats();
                let inst: String = stats.channel.chars().take(2).collect();
                format!("{}.{}.{}", stats.network, stats.station, inst)
            }
            None => String::new(),
        }
    }

    pub fn station(&self) -> Option<&str> {
        self.traces.first().map(|tr| tr.stats().station.as_str())
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn traces(&self) -> &[StationTrace] {
        &self.traces
    }

    pub fn traces_mut(&mut self) -> &mut [StationTrace] {
        &mut self.traces
    }

    pub fn trace(&self, index: usize) -> Option<&StationTrace> {
        self.traces.get(index)
    }

    pub fn trace_mut(&mut self, index: usize) -> Option<&mut StationTrace> {
        self.traces.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StationTrace> {
        self.traces.iter()
    }

    pub fn num_horizontal(&self) -> usize {
        self.traces.iter().filter(|tr| tr.is_horizontal()).count()
    }

    // ==================== PASS / FAIL ====================

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Fail every trace in the stream
    pub fn fail(&mut self, module: &str, reason: &str) {
        for tr in self.traces.iter_mut() {
            tr.fail(module, reason);
        }
        self.passed = false;
    }

    /// Fail one trace and the stream with it
    pub fn fail_trace(&mut self, index: usize, module: &str, reason: &str) {
        if let Some(tr) = self.traces.get_mut(index) {
            tr.fail(module, reason);
            self.passed = false;
        }
    }

    /// Re-derive the flag from trace failures. Never resets a failed stream.
    pub fn update_passed(&mut self) -> bool {
        if self.traces.iter().any(|tr| !tr.passed()) {
            self.passed = false;
        }
        self.passed
    }

    // ==================== STREAM PARAMETERS ====================

    pub fn set_stream_param(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn get_stream_param(&self, key: &str) -> Result<&ParamValue, ParameterError> {
        self.parameters
            .get(key)
            .ok_or_else(|| ParameterError::KeyNotFound(key.to_string()))
    }

    pub fn has_stream_param(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    pub fn stream_params(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    /// Trace parameter, falling back to the stream-level value
    pub fn get_inherited_parameter(
        &self,
        index: usize,
        key: &str,
    ) -> Result<&ParamValue, ParameterError> {
        let from_trace = self
            .traces
            .get(index)
            .and_then(|tr| tr.get_parameter(key).ok());
        match from_trace {
            Some(value) => Ok(value),
            None => self.get_stream_param(key),
        }
    }

    pub(crate) fn from_parts(
        traces: Vec<StationTrace>,
        passed: bool,
        parameters: BTreeMap<String, ParamValue>,
    ) -> Self {
        let mut stream = StationStream {
            traces,
            passed,
            parameters,
        };
        stream.update_passed();
        stream
    }
}

impl Default for StationStream {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Index<usize> for StationStream {
    type Output = StationTrace;

    fn index(&self, index: usize) -> &StationTrace {
        &self.traces[index]
    }
}

impl<'a> IntoIterator for &'a StationStream {
    type Item = &'a StationTrace;
    type IntoIter = std::slice::Iter<'a, StationTrace>;

    fn into_iter(self) -> Self::IntoIter {
        self.traces.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trace::{StandardMetadata, TraceStats};
    use chrono::{TimeZone, Utc};

    fn trace(channel: &str) -> StationTrace {
        let stats = TraceStats {
            network: "CI".to_string(),
            station: "CLC".to_string(),
            location: "--".to_string(),
            channel: channel.to_string(),
            sampling_rate: 100.0,
            starttime: Utc.with_ymd_and_hms(2019, 7, 6, 3, 19, 23).unwrap(),
            coordinates: None,
            standard: StandardMetadata::default(),
        };
        StationTrace::new(stats, vec![0.0; 10]).unwrap()
    }

    fn stream() -> StationStream {
        StationStream::new(vec![trace("HNE"), trace("HNN"), trace("HNZ")])
    }

    #[test]
    fn test_new_stream_passes() {
        let st = stream();
        assert!(st.passed());
        assert_eq!(st.get_id(), "CI.CLC.HN");
        assert_eq!(st.num_horizontal(), 2);
    }

    #[test]
    fn test_fail_trace_propagates() {
        let mut st = stream();
        st.fail_trace(1, "test", "bad");
        assert!(!st.passed());
        assert!(st[0].passed());
        assert!(!st[1].passed());
    }

    #[test]
    fn test_update_passed_after_direct_failure() {
        let mut st = stream();
        st.traces_mut()[2].fail("test", "bad");
        assert!(st.passed());
        assert!(!st.update_passed());
    }

    #[test]
    fn test_push_failed_trace() {
        let mut st = stream();
        let mut bad = trace("HNZ");
        bad.fail("test", "bad");
        st.push(bad);
        assert!(!st.passed());
    }

    #[test]
    fn test_inherited_parameter() {
        let mut st = stream();
        st.set_stream_param("review", "accepted");
        st.traces_mut()[0].set_parameter("review", "rejected");

        assert_eq!(st.get_inherited_parameter(0, "review").unwrap(), "rejected");
        assert_eq!(st.get_inherited_parameter(1, "review").unwrap(), "accepted");
        assert!(st.get_inherited_parameter(1, "other").is_err());
    }

    #[test]
    fn test_copy_does_not_alias() {
        let st = stream();
        let mut copy = st.clone();
        copy.fail("test", "bad");
        assert!(st.passed());
        assert!(st[0].passed());
        assert!(!copy.passed());
    }
}
