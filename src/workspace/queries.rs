// Workspace read/write operations
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use super::db::{StreamWorkspace, WorkspaceError, WorkspaceResult};
use super::storage::{calculate_sha256, encode_samples, verify_and_decode};
use crate::model::event::ScalarEvent;
use crate::model::provenance::{Provenance, ProvenanceRecord};
use crate::model::stream::StationStream;
use crate::model::trace::{StationTrace, TraceStats};
use crate::model::value::ParamValue;

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_time(text: &str) -> WorkspaceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| WorkspaceError::InvalidTime(text.to_string()))
}

// ==================== EVENT QUERIES ====================

/// Insert or replace an event
pub fn add_event(db: &StreamWorkspace, event: &ScalarEvent) -> WorkspaceResult<()> {
    db.conn().execute(
        "INSERT OR REPLACE INTO events (id, time, latitude, longitude, depth_km, magnitude, magnitude_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.id,
            format_time(&event.time),
            event.latitude,
            event.longitude,
            event.depth_km,
            event.magnitude,
            event.magnitude_type,
        ],
    )?;
    Ok(())
}

/// Get an event by ID
pub fn get_event(db: &StreamWorkspace, id: &str) -> WorkspaceResult<Option<ScalarEvent>> {
    let result = db.conn().query_row(
        "SELECT id, time, latitude, longitude, depth_km, magnitude, magnitude_type
         FROM events WHERE id = ?1",
        [id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, String>(6)?,
            ))
        },
    );

    match result {
        Ok((id, time, latitude, longitude, depth_km, magnitude, magnitude_type)) => Ok(Some(
            ScalarEvent::new(id, parse_time(&time)?, latitude, longitude, depth_km, magnitude)
                .with_magnitude_type(magnitude_type),
        )),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All event ids, sorted
pub fn get_event_ids(db: &StreamWorkspace) -> WorkspaceResult<Vec<String>> {
    let mut stmt = db.conn().prepare("SELECT id FROM events ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

// ==================== STREAM QUERIES ====================

/// Store streams for an event under a processing label. The event is added
/// if the workspace does not have it yet. Returns the number of traces written.
pub fn add_streams(
    db: &StreamWorkspace,
    event: &ScalarEvent,
    streams: &[StationStream],
    label: &str,
) -> WorkspaceResult<usize> {
    if get_event(db, &event.id)?.is_none() {
        add_event(db, event)?;
    }

    let tx = db.conn().unchecked_transaction()?;
    let mut trace_count = 0;

    for st in streams {
        let stream_row = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO streams (id, event_id, label, stream_id, station, passed, parameters, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                stream_row,
                event.id,
                label,
                st.get_id(),
                st.station().unwrap_or(""),
                st.passed(),
                serde_json::to_string(st.stream_params())?,
                format_time(&Utc::now()),
            ],
        )?;

        for (position, tr) in st.iter().enumerate() {
            let trace_row = Uuid::new_v4().to_string();
            let blob = encode_samples(tr.data());
            let sha256 = calculate_sha256(&blob);
            tx.execute(
                "INSERT INTO traces (id, stream_row, position, trace_id, stats, npts, data, sha256, parameters)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    trace_row,
                    stream_row,
                    position as i64,
                    tr.id(),
                    serde_json::to_string(tr.stats())?,
                    tr.npts() as i64,
                    blob,
                    sha256,
                    serde_json::to_string(tr.parameters())?,
                ],
            )?;

            for (seq, record) in tr.provenance().iter().enumerate() {
                tx.execute(
                    "INSERT INTO provenance (trace_row, seq, operation, attributes, recorded_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        trace_row,
                        seq as i64,
                        record.operation,
                        serde_json::to_string(&record.attributes)?,
                        format_time(&record.recorded_at),
                    ],
                )?;
            }
            trace_count += 1;
        }
    }

    tx.commit()?;
    log::info!(
        "Stored {} streams ({} traces) for event {} as '{}'",
        streams.len(),
        trace_count,
        event.id,
        label
    );
    Ok(trace_count)
}

/// Distinct processing labels, sorted
pub fn get_labels(db: &StreamWorkspace) -> WorkspaceResult<Vec<String>> {
    let mut stmt = db
        .conn()
        .prepare("SELECT DISTINCT label FROM streams ORDER BY label")?;
    let labels = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(labels)
}

fn load_provenance(db: &StreamWorkspace, trace_row: &str) -> WorkspaceResult<Provenance> {
    let mut stmt = db.conn().prepare(
        "SELECT operation, attributes, recorded_at FROM provenance
         WHERE trace_row = ?1 ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([trace_row], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(rows.len());
    for (operation, attributes, recorded_at) in rows {
        records.push(ProvenanceRecord {
            operation,
            attributes: serde_json::from_str(&attributes)?,
            recorded_at: parse_time(&recorded_at)?,
        });
    }
    Ok(Provenance::from_records(records))
}

fn load_traces(db: &StreamWorkspace, stream_row: &str) -> WorkspaceResult<Vec<StationTrace>> {
    let mut stmt = db.conn().prepare(
        "SELECT id, trace_id, stats, data, sha256, parameters FROM traces
         WHERE stream_row = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map([stream_row], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut traces = Vec::with_capacity(rows.len());
    for (trace_row, trace_id, stats, blob, sha256, parameters) in rows {
        let stats: TraceStats = serde_json::from_str(&stats)?;
        let data = verify_and_decode(&trace_id, &blob, &sha256)?;
        let parameters: BTreeMap<String, ParamValue> = serde_json::from_str(&parameters)?;
        let provenance = load_provenance(db, &trace_row)?;
        traces.push(StationTrace::from_parts(stats, data, parameters, provenance)?);
    }
    Ok(traces)
}

/// Streams stored for an event, optionally restricted to some stations and
/// labels (empty slices mean no restriction), in insertion order
pub fn get_streams(
    db: &StreamWorkspace,
    event_id: &str,
    stations: &[&str],
    labels: &[&str],
) -> WorkspaceResult<Vec<StationStream>> {
    if get_event(db, event_id)?.is_none() {
        return Err(WorkspaceError::EventNotFound(event_id.to_string()));
    }

    let mut stmt = db.conn().prepare(
        "SELECT id, label, station, passed, parameters FROM streams
         WHERE event_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([event_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut streams = Vec::new();
    for (stream_row, label, station, passed, parameters) in rows {
        if !stations.is_empty() && !stations.contains(&station.as_str()) {
            continue;
        }
        if !labels.is_empty() && !labels.contains(&label.as_str()) {
            continue;
        }
        let parameters: BTreeMap<String, ParamValue> = serde_json::from_str(&parameters)?;
        let traces = load_traces(db, &stream_row)?;
        streams.push(StationStream::from_parts(traces, passed, parameters));
    }

    log::debug!("Loaded {} streams for event {}", streams.len(), event_id);
    Ok(streams)
}

// ==================== FILE HELPERS ====================

/// Write an event and its streams to a new workspace file
pub fn write_workspace(
    path: &Path,
    event: &ScalarEvent,
    streams: &[StationStream],
    label: &str,
) -> WorkspaceResult<StreamWorkspace> {
    let db = StreamWorkspace::create(path)?;
    add_event(&db, event)?;
    add_streams(&db, event, streams, label)?;
    Ok(db)
}

/// Read every stream of every event in a workspace file
pub fn read_workspace(path: &Path) -> WorkspaceResult<Vec<StationStream>> {
    let db = StreamWorkspace::open(path)?;
    let mut streams = Vec::new();
    for event_id in get_event_ids(&db)? {
        streams.extend(get_streams(&db, &event_id, &[], &[])?);
    }
    Ok(streams)
}
