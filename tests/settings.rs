//! Tests for trend settings documents and the settings store.

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use tallybeam::settings::{DEFAULT_FLATNESS_THRESHOLD, DEFAULT_SLOPE_DEGREES};
use tallybeam::*;
use tempfile::NamedTempFile;

#[test]
fn load_from_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, r#"{{"trend": {{"slope": 30.0, "threshold": 0.25}}}}"#)?;

    let settings = TrendSettings::from_json_file(file.path())?;

    assert_eq!(settings, TrendSettings::new(30.0, 0.25));
    Ok(())
}

#[test]
fn long_field_names_are_accepted() -> Result<()> {
    let settings = TrendSettings::from_document(
        r#"{"trend": {"slope_threshold_degrees": 40, "flatness_threshold": 0.2}}"#,
    )?;
    assert_eq!(settings, TrendSettings::new(40.0, 0.2));
    Ok(())
}

#[test]
fn missing_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let err = TrendSettings::from_json_file(dir.path().join("trend.json")).unwrap_err();
    assert!(format!("{err:#}").contains("reading trend settings from"));
    Ok(())
}

#[test]
fn malformed_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{{\"trend\": ")?;
    let err = TrendSettings::from_json_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("parsing trend settings document"));
    Ok(())
}

#[test]
fn defaults() {
    let settings = TrendSettings::default();
    assert_eq!(settings.slope_threshold_degrees, DEFAULT_SLOPE_DEGREES);
    assert_eq!(settings.flatness_threshold, DEFAULT_FLATNESS_THRESHOLD);
}

#[test]
fn follow_applies_every_document() -> Result<()> {
    let store = TrendSettingsStore::new();
    let updates: Vec<std::result::Result<String, String>> = vec![
        Ok(r#"{"trend": {"slope": 10}}"#.to_string()),
        Ok(r#"{"trend": {"slope": 15, "threshold": 0.3}}"#.to_string()),
    ];

    store.follow(updates)?;

    let snap = store.snapshot();
    assert_eq!(snap.version, 2);
    assert_eq!(snap.settings, TrendSettings::new(15.0, 0.3));
    Ok(())
}

#[test]
fn stream_failure_restores_defaults() {
    let store = TrendSettingsStore::new();
    let updates: Vec<std::result::Result<String, &str>> = vec![
        Ok(r#"{"trend": {"slope": 10}}"#.to_string()),
        Err("watch closed"),
        Ok(r#"{"trend": {"slope": 50}}"#.to_string()),
    ];

    let err = store.follow(updates).unwrap_err();

    assert!(err.to_string().contains("watch closed"));
    let snap = store.snapshot();
    assert_eq!(snap.version, 2);
    assert_eq!(snap.settings, TrendSettings::default());
}

#[test]
fn bad_document_stops_following() {
    let store = TrendSettingsStore::new();
    let updates: Vec<std::result::Result<String, &str>> = vec![
        Ok("{not json".to_string()),
        Ok(r#"{"trend": {"slope": 50}}"#.to_string()),
    ];

    assert!(store.follow(updates).is_err());

    let snap = store.snapshot();
    assert_eq!(snap.version, 1);
    assert_eq!(snap.settings, TrendSettings::default());
}

#[test]
fn snapshots_are_shared_across_threads() -> Result<()> {
    let store = Arc::new(TrendSettingsStore::new());
    let before = store.snapshot();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.apply_document(r#"{"trend": {"slope": 5}}"#).map(|s| s.version))
    };
    let version = writer.join().expect("writer thread panicked")?;

    assert_eq!(version, 1);
    assert_eq!(before.version, 0);
    assert_eq!(before.settings, TrendSettings::default());
    assert_eq!(store.snapshot().settings.slope_threshold_degrees, 5.0);
    Ok(())
}

#[test]
fn reset_bumps_the_version() {
    let store = TrendSettingsStore::default();
    let snap = store.reset();
    assert_eq!(snap.version, 1);
    assert_eq!(*store.snapshot(), *snap);
}
