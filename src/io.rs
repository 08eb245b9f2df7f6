// Waveform file reading
// Format detection and loading of station streams from disk

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::stream::StationStream;
use crate::workspace::{is_workspace, read_workspace, WorkspaceError};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("No format reader found for {0}")]
    UnknownFormat(PathBuf),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

pub type ReadResult<T> = Result<T, ReadError>;

/// Name of the format a file is stored in, if any reader recognizes it
pub fn get_format(path: &Path) -> Option<&'static str> {
    if is_workspace(path) {
        Some("workspace")
    } else {
        None
    }
}

/// Read all streams stored in a file
pub fn read_data(path: &Path) -> ReadResult<Vec<StationStream>> {
    match get_format(path) {
        Some("workspace") => {
            log::debug!("Reading workspace {}", path.display());
            Ok(read_workspace(path)?)
        }
        _ => Err(ReadError::UnknownFormat(path.to_path_buf())),
    }
}
