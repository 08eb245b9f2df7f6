mod common;

use std::collections::BTreeMap;
use tempfile::TempDir;

use groundmotion::io::{get_format, read_data};
use groundmotion::model::ParamValue;
use groundmotion::workspace::{
    add_streams, get_event, get_event_ids, get_labels, get_streams, write_workspace,
    StreamWorkspace, WorkspaceError,
};

#[test]
fn test_round_trip_preserves_everything() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("event.db");

    let event = common::event();
    let mut st = common::stream();
    st.set_stream_param("review", "accepted");
    let mut attrs = BTreeMap::new();
    attrs.insert("new_sampling_rate".to_string(), ParamValue::from(100.0));
    st.traces_mut()[0].set_provenance("resample", attrs);
    st.traces_mut()[0].set_parameter("flag", true);
    st.fail_trace(2, "windows", "Failed noise window duration check.");

    write_workspace(&path, &event, &[st.clone()], "unprocessed").unwrap();

    let db = StreamWorkspace::open(&path).unwrap();
    assert_eq!(get_event(&db, &event.id).unwrap(), Some(event.clone()));
    let loaded = get_streams(&db, &event.id, &[], &[]).unwrap();
    assert_eq!(loaded.len(), 1);

    let back = &loaded[0];
    assert_eq!(back.len(), 3);
    assert!(!back.passed());
    assert_eq!(back.get_stream_param("review").unwrap(), "accepted");
    for (a, b) in st.iter().zip(back) {
        assert_eq!(a.stats(), b.stats());
        assert_eq!(a.data(), b.data());
        assert_eq!(a.parameters(), b.parameters());
        assert_eq!(a.provenance(), b.provenance());
    }
    assert_eq!(
        back[2].failure_reason(),
        Some("Failed noise window duration check.")
    );
}

#[test]
fn test_labels_and_filters() {
    let db = StreamWorkspace::open_in_memory().unwrap();
    let event = common::event();

    add_streams(&db, &event, &[common::stream()], "unprocessed").unwrap();
    add_streams(&db, &event, &[common::stream()], "default").unwrap();

    assert_eq!(get_event_ids(&db).unwrap(), vec![event.id.clone()]);
    assert_eq!(get_labels(&db).unwrap(), vec!["default", "unprocessed"]);
    assert_eq!(get_streams(&db, &event.id, &[], &[]).unwrap().len(), 2);
    assert_eq!(
        get_streams(&db, &event.id, &["CLC"], &["default"])
            .unwrap()
            .len(),
        1
    );
    assert!(get_streams(&db, &event.id, &["XYZ"], &[])
        .unwrap()
        .is_empty());
    assert!(matches!(
        get_streams(&db, "missing", &[], &[]),
        Err(WorkspaceError::EventNotFound(_))
    ));
}

#[test]
fn test_corrupted_samples_are_rejected() {
    let db = StreamWorkspace::open_in_memory().unwrap();
    let event = common::event();
    add_streams(&db, &event, &[common::stream()], "unprocessed").unwrap();

    db.conn()
        .execute("UPDATE traces SET data = zeroblob(16)", [])
        .unwrap();

    assert!(matches!(
        get_streams(&db, &event.id, &[], &[]),
        Err(WorkspaceError::Storage(_))
    ));
}

#[test]
fn test_read_data_detects_workspace() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("event.db");
    write_workspace(&path, &common::event(), &[common::stream()], "unprocessed").unwrap();

    assert_eq!(get_format(&path), Some("workspace"));
    let streams = read_data(&path).unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].get_id(), "CI.CLC.HN");
}
