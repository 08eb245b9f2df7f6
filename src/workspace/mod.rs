// Workspace persistence
// SQLite-backed store of events and labelled station streams

pub mod db;
pub mod queries;
pub mod storage;

pub use db::{is_workspace, StreamWorkspace, WorkspaceError, WorkspaceResult};
pub use queries::{
    add_event, add_streams, get_event, get_event_ids, get_labels, get_streams, read_workspace,
    write_workspace,
};
pub use storage::{calculate_sha256, StorageError};
