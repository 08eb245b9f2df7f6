// SQLite workspace file and migrations
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::storage::StorageError;
use crate::model::trace::TraceError;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid trace: {0}")]
    Trace(#[from] TraceError),
    #[error("Invalid timestamp in workspace: {0}")]
    InvalidTime(String),
    #[error("Workspace already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("Not a workspace file: {0}")]
    NotAWorkspace(PathBuf),
    #[error("Event not found in workspace: {0}")]
    EventNotFound(String),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Handle on a workspace database holding events and their streams
pub struct StreamWorkspace {
    conn: Connection,
    path: Option<PathBuf>,
}

impl StreamWorkspace {
    /// Create a new workspace file. Fails if the file already exists.
    pub fn create(path: &Path) -> WorkspaceResult<Self> {
        if path.exists() {
            return Err(WorkspaceError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open an existing workspace file
    pub fn open(path: &Path) -> WorkspaceResult<Self> {
        if !is_workspace(path) {
            return Err(WorkspaceError::NotAWorkspace(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Workspace that lives only as long as the handle
    pub fn open_in_memory() -> WorkspaceResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> WorkspaceResult<Self> {
        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        // Run migrations
        run_migrations(&conn)?;

        Ok(StreamWorkspace { conn, path })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// True when `path` is a SQLite file carrying the workspace schema
pub fn is_workspace(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let conn = match Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
        Ok(conn) => conn,
        Err(_) => return false,
    };
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('schema_migrations', 'events', 'streams', 'traces')",
        [],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count == 4)
    .unwrap_or(false)
}

fn run_migrations(conn: &Connection) -> WorkspaceResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Apply migrations
    if current_version < 1 {
        migration_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [1])?;
    }

    Ok(())
}

fn migration_v1(conn: &Connection) -> WorkspaceResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            time TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            depth_km REAL NOT NULL,
            magnitude REAL NOT NULL,
            magnitude_type TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS streams (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            label TEXT NOT NULL,
            stream_id TEXT NOT NULL,
            station TEXT NOT NULL,
            passed INTEGER NOT NULL,
            parameters TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_streams_event_label ON streams(event_id, label)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS traces (
            id TEXT PRIMARY KEY,
            stream_row TEXT NOT NULL,
            position INTEGER NOT NULL,
            trace_id TEXT NOT NULL,
            stats TEXT NOT NULL,
            npts INTEGER NOT NULL,
            data BLOB NOT NULL,
            sha256 TEXT NOT NULL,
            parameters TEXT NOT NULL,
            FOREIGN KEY (stream_row) REFERENCES streams(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_traces_stream_row ON traces(stream_row, position)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS provenance (
            trace_row TEXT NOT NULL,
            seq INTEGER NOT NULL,
            operation TEXT NOT NULL,
            attributes TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            PRIMARY KEY (trace_row, seq),
            FOREIGN KEY (trace_row) REFERENCES traces(id) ON DELETE CASCADE
        )",
        [],
    )?;

    Ok(())
}
