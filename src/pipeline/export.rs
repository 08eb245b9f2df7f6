// Provenance export
// Append-only JSONL file with one line per provenance record of every trace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::stream::StationStream;
use crate::model::value::ParamValue;

/// Errors that can occur while exporting provenance
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A single exported provenance line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    /// When the operation was recorded on the trace
    pub timestamp: DateTime<Utc>,

    /// NET.STA.LOC.CHA of the trace
    pub trace_id: String,

    /// Operation name (e.g., "cut", "signal_split")
    pub operation: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, ParamValue>,
}

impl ProvenanceEntry {
    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Flatten the provenance of every trace in a stream, in trace order
pub fn stream_entries(st: &StationStream) -> Vec<ProvenanceEntry> {
    st.iter()
        .flat_map(|tr| {
            let trace_id = tr.id();
            tr.provenance()
                .iter()
                .map(move |record| ProvenanceEntry {
                    timestamp: record.recorded_at,
                    trace_id: trace_id.clone(),
                    operation: record.operation.clone(),
                    attributes: record.attributes.clone(),
                })
        })
        .collect()
}

/// Provenance writer
/// Manages an append-only JSONL provenance file
pub struct ProvenanceWriter {
    file_path: PathBuf,
}

impl ProvenanceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        ProvenanceWriter { file_path }
    }

    /// Append entries to the file, creating it if needed
    pub fn write_batch(&self, entries: &[ProvenanceEntry]) -> Result<(), ExportError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        for entry in entries {
            let json_line = entry.to_json_line()?;
            file.write_all(json_line.as_bytes())?;
        }

        file.flush()?;
        Ok(())
    }

    /// Append the provenance of every trace in the stream
    pub fn write_stream(&self, st: &StationStream) -> Result<usize, ExportError> {
        let entries = stream_entries(st);
        self.write_batch(&entries)?;
        Ok(entries.len())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read provenance entries from a JSONL file
pub fn read_provenance_file(path: &Path) -> Result<Vec<ProvenanceEntry>, ExportError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: ProvenanceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trace::{StandardMetadata, StationTrace, TraceStats};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn stream() -> StationStream {
        let stats = TraceStats {
            network: "NZ".to_string(),
            station: "HSES".to_string(),
            location: "20".to_string(),
            channel: "HN1".to_string(),
            sampling_rate: 200.0,
            starttime: Utc.with_ymd_and_hms(2016, 11, 13, 11, 2, 0).unwrap(),
            coordinates: None,
            standard: StandardMetadata::default(),
        };
        let mut tr = StationTrace::new(stats, vec![0.0; 10]).unwrap();
        let mut attrs = BTreeMap::new();
        attrs.insert("new_sampling_rate".to_string(), ParamValue::from(100.0));
        tr.set_provenance("resample", attrs);
        tr.set_provenance("cut", BTreeMap::new());
        StationStream::new(vec![tr])
    }

    #[test]
    fn test_stream_entries_keep_order() {
        let entries = stream_entries(&stream());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].trace_id, "NZ.HSES.20.HN1");
        assert_eq!(entries[0].operation, "resample");
        assert_eq!(entries[1].operation, "cut");
    }

    #[test]
    fn test_writer_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("provenance.jsonl");
        let writer = ProvenanceWriter::new(path.clone());

        assert_eq!(writer.write_stream(&stream()).unwrap(), 2);
        writer.write_stream(&stream()).unwrap();

        let entries = read_provenance_file(&path).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].attributes["new_sampling_rate"], 100.0);
        assert!(entries[1].attributes.is_empty());
    }

    #[test]
    fn test_json_line_format() {
        let entry = &stream_entries(&stream())[0];
        let json_line = entry.to_json_line().unwrap();
        assert!(json_line.ends_with('\n'));

        let parsed: ProvenanceEntry = serde_json::from_str(json_line.trim()).unwrap();
        assert_eq!(&parsed, entry);
    }
}
