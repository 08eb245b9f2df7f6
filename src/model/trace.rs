// Station trace
// Single-channel waveform with acquisition metadata, parameters and provenance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::params::{Failure, Parameter, ParameterError, FAILURE};
use crate::model::provenance::{Provenance, ProvenanceRecord};
use crate::model::time::{add_seconds, seconds_between};
use crate::model::value::ParamValue;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),

    #[error("Trim start {start} is after trim end {end}")]
    InvertedTrimWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Station location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level
    pub elevation: f64,
}

/// Processing level of the recorded data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessLevel {
    RawCounts,
    UncorrectedPhysicalUnits,
    CorrectedPhysicalUnits,
    DerivedTimeSeries,
}

impl ProcessLevel {
    /// Descriptive name used in metadata
    pub fn name(&self) -> &'static str {
        match self {
            ProcessLevel::RawCounts => "raw counts",
            ProcessLevel::UncorrectedPhysicalUnits => "uncorrected physical units",
            ProcessLevel::CorrectedPhysicalUnits => "corrected physical units",
            ProcessLevel::DerivedTimeSeries => "derived time series",
        }
    }

    /// Short V0..V3 code
    pub fn code(&self) -> &'static str {
        match self {
            ProcessLevel::RawCounts => "V0",
            ProcessLevel::UncorrectedPhysicalUnits => "V1",
            ProcessLevel::CorrectedPhysicalUnits => "V2",
            ProcessLevel::DerivedTimeSeries => "V3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "raw counts" => Some(ProcessLevel::RawCounts),
            "uncorrected physical units" => Some(ProcessLevel::UncorrectedPhysicalUnits),
            "corrected physical units" => Some(ProcessLevel::CorrectedPhysicalUnits),
            "derived time series" => Some(ProcessLevel::DerivedTimeSeries),
            _ => None,
        }
    }
}

/// Provenance of the recording itself (format, agency, units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardMetadata {
    /// Vendor format the data was read from (e.g., "cosmos", "dmg")
    pub source_format: String,
    pub process_level: ProcessLevel,
    /// Agency or network operator
    pub source: String,
    /// Physical units of the samples (e.g., "cm/s^2")
    pub units: String,
}

impl Default for StandardMetadata {
    fn default() -> Self {
        StandardMetadata {
            source_format: "unknown".to_string(),
            process_level: ProcessLevel::UncorrectedPhysicalUnits,
            source: "unknown".to_string(),
            units: "cm/s^2".to_string(),
        }
    }
}

/// Acquisition metadata of a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStats {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    /// Samples per second
    pub sampling_rate: f64,
    pub starttime: DateTime<Utc>,
    pub coordinates: Option<Coordinates>,
    pub standard: StandardMetadata,
}

impl TraceStats {
    pub fn delta(&self) -> f64 {
        1.0 / self.sampling_rate
    }
}

/// A single-channel time series with mutable processing state
#[derive(Debug, Clone)]
pub struct StationTrace {
    stats: TraceStats,
    data: Vec<f64>,
    parameters: BTreeMap<String, ParamValue>,
    provenance: Provenance,
    cache: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl StationTrace {
    pub fn new(stats: TraceStats, data: Vec<f64>) -> Result<Self, TraceError> {
        if !(stats.sampling_rate.is_finite() && stats.sampling_rate > 0.0) {
            return Err(TraceError::InvalidSamplingRate(stats.sampling_rate));
        }

        Ok(StationTrace {
            stats,
            data,
            parameters: BTreeMap::new(),
            provenance: Provenance::new(),
            cache: BTreeMap::new(),
        })
    }

    /// Rebuild a trace with existing processing state (used when loading)
    pub(crate) fn from_parts(
        stats: TraceStats,
        data: Vec<f64>,
        parameters: BTreeMap<String, ParamValue>,
        provenance: Provenance,
    ) -> Result<Self, TraceError> {
        let mut trace = Self::new(stats, data)?;
        trace.parameters = parameters;
        trace.provenance = provenance;
        Ok(trace)
    }

    /// SEED-style id: NET.STA.LOC.CHA
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.stats.network, self.stats.station, self.stats.location, self.stats.channel
        )
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut TraceStats {
        &mut self.stats
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Vec<f64> {
        &mut self.data
    }

    pub fn npts(&self) -> usize {
        self.data.len()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.stats.sampling_rate
    }

    pub fn delta(&self) -> f64 {
        self.stats.delta()
    }

    pub fn starttime(&self) -> DateTime<Utc> {
        self.stats.starttime
    }

    /// Time of the last sample
    pub fn endtime(&self) -> DateTime<Utc> {
        if self.data.is_empty() {
            return self.stats.starttime;
        }
        add_seconds(
            self.stats.starttime,
            (self.data.len() - 1) as f64 * self.delta(),
        )
    }

    /// Seconds between first and last sample
    pub fn duration(&self) -> f64 {
        seconds_between(self.endtime(), self.starttime())
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.stats.coordinates
    }

    /// Horizontal components carry E/N/1/2 orientation codes
    pub fn is_horizontal(&self) -> bool {
        matches!(
            self.stats.channel.chars().last(),
            Some('E' | 'N' | '1' | '2')
        )
    }

    /// Peak absolute amplitude
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc: f64, x| acc.max(x.abs()))
    }

    /// Replace samples and sampling rate together (e.g., after resampling).
    /// Cached arrays are dropped.
    pub fn replace_data(&mut self, data: Vec<f64>, sampling_rate: f64) -> Result<(), TraceError> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(TraceError::InvalidSamplingRate(sampling_rate));
        }
        self.data = data;
        self.stats.sampling_rate = sampling_rate;
        self.cache.clear();
        Ok(())
    }

    // ==================== PARAMETERS ====================

    /// Insert or overwrite a parameter
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn get_parameter(&self, key: &str) -> Result<&ParamValue, ParameterError> {
        self.parameters
            .get(key)
            .ok_or_else(|| ParameterError::KeyNotFound(key.to_string()))
    }

    pub fn has_parameter(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    pub fn remove_parameter(&mut self, key: &str) -> Option<ParamValue> {
        self.parameters.remove(key)
    }

    pub fn parameter_keys(&self) -> Vec<&str> {
        self.parameters.keys().map(String::as_str).collect()
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    /// Store a typed parameter under its key
    pub fn set_typed<P: Parameter>(&mut self, param: &P) {
        self.parameters.insert(P::KEY.to_string(), param.to_value());
    }

    /// Read a typed parameter
    pub fn get_typed<P: Parameter>(&self) -> Result<P, ParameterError> {
        let value = self.get_parameter(P::KEY)?;
        P::from_value(value).ok_or_else(|| ParameterError::Malformed(P::KEY.to_string()))
    }

    // ==================== PROVENANCE ====================

    /// Append a provenance record
    pub fn set_provenance(
        &mut self,
        operation: impl Into<String>,
        attributes: BTreeMap<String, ParamValue>,
    ) {
        self.provenance
            .append(ProvenanceRecord::new(operation, attributes));
    }

    pub fn get_provenance(&self, operation: &str) -> Vec<&ProvenanceRecord> {
        self.provenance.get(operation)
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn clear_provenance(&mut self) {
        self.provenance.clear();
    }

    // ==================== PASS / FAIL ====================

    /// Record a failure. Use `StationStream::fail_trace` for traces held in a
    /// stream so the stream flag follows.
    pub fn fail(&mut self, module: &str, reason: &str) {
        log::warn!("{} failed in {}: {}", self.id(), module, reason);
        self.set_typed(&Failure {
            module: module.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn passed(&self) -> bool {
        !self.has_parameter(FAILURE)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.parameters.get(FAILURE).and_then(|f| f["reason"].as_str())
    }

    // ==================== CACHE ====================

    pub fn set_cached(&mut self, key: impl Into<String>, arrays: BTreeMap<String, Vec<f64>>) {
        self.cache.insert(key.into(), arrays);
    }

    pub fn get_cached(&self, key: &str) -> Option<&BTreeMap<String, Vec<f64>>> {
        self.cache.get(key)
    }

    pub fn has_cached(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    // ==================== TRIM ====================

    /// Cut the trace to `[start, end]`, snapping to the nearest samples.
    /// Bounds outside the record are ignored (no padding). A start past the
    /// last sample leaves an empty trace. Cached arrays are dropped when
    /// samples are removed.
    pub fn trim(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<(), TraceError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(TraceError::InvertedTrimWindow { start: s, end: e });
            }
        }

        let t0 = self.stats.starttime;
        let sr = self.stats.sampling_rate;
        let npts = self.data.len();

        if let Some(e) = end {
            let offset = (seconds_between(e, t0) * sr).round();
            if offset < 0.0 {
                self.data.clear();
            } else if (offset as usize) + 1 < self.data.len() {
                self.data.truncate(offset as usize + 1);
            }
        }

        if let Some(s) = start {
            let offset = (seconds_between(s, t0) * sr).round();
            if offset > 0.0 {
                let skip = (offset as usize).min(self.data.len());
                self.data.drain(..skip);
                self.stats.starttime = add_seconds(t0, skip as f64 / sr);
            }
        }

        if self.data.len() != npts {
            self.cache.clear();
        }

        log::debug!(
            "Trimmed {} to {} samples starting {}",
            self.id(),
            self.data.len(),
            self.stats.starttime
        );
        Ok(())
    }
}
