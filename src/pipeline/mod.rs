// Pipeline execution and export
// Runs the processing steps over station streams and exports their provenance

pub mod export;
pub mod runner;

pub use export::{read_provenance_file, ExportError, ProvenanceEntry, ProvenanceWriter};
pub use runner::{process_stream, process_streams, PipelineSummary};
