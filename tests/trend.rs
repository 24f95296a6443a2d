//! Tests for trend detection.

use anyhow::Result;
use tallybeam::trend::{detect, detect_with, ExecMode};
use tallybeam::testing::*;
use tallybeam::*;

fn rising(n: u32) -> Vec<f64> {
    (1..=n).map(|i| 10.0 * f64::from(i)).collect()
}

fn labels_of(rows: &[Row], project: &str, index: usize) -> Vec<Cell> {
    rows.iter()
        .filter(|r| r[0] == Cell::from(project))
        .map(|r| r[index].clone())
        .collect()
}

#[test]
fn monthly_increase_and_decrease() -> Result<()> {
    let up = rising(12);
    let down: Vec<f64> = up.iter().rev().copied().collect();
    let rows = monthly_costs(&[("p1", &up[..]), ("p2", &down[..])]);

    let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::default())?;

    assert_eq!(out.len(), 24);
    assert_all(&out, |r| r.len() == 4);
    assert_all(&labels_of(&out, "p1", 3), |c| *c == Cell::from("increasing"));
    assert_all(&labels_of(&out, "p2", 3), |c| *c == Cell::from("decreasing"));
    Ok(())
}

#[test]
fn flat_series_has_no_trend() -> Result<()> {
    let rows = monthly_costs(&[("p1", &[5.0; 12][..])]);
    let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::default())?;
    assert_trailing_labels(&out, &["none"]);
    Ok(())
}

#[test]
fn almost_flat_series_has_no_trend() -> Result<()> {
    let values: Vec<f64> = (0..12).map(|i| 100.0 + f64::from(i) * 0.5).collect();
    let rows = monthly_costs(&[("p1", &values[..])]);
    let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::default())?;
    assert_trailing_labels(&out, &["none"]);
    Ok(())
}

#[test]
fn short_series_has_no_trend() -> Result<()> {
    // the last point is dropped, leaving two
    let rows = monthly_costs(&[("p1", &[1.0, 50.0, 100.0][..])]);
    let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::default())?;
    assert_trailing_labels(&out, &["none"]);
    Ok(())
}

#[test]
fn null_value_excludes_the_series() -> Result<()> {
    let mut rows = monthly_costs(&[("p1", &rising(12)[..]), ("p2", &rising(12)[..])]);
    rows[3][2] = Cell::Null;

    let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::default())?;

    assert_all(&labels_of(&out, "p1", 3), |c| *c == Cell::from("none"));
    assert_all(&labels_of(&out, "p2", 3), |c| *c == Cell::from("increasing"));
    Ok(())
}

#[test]
fn series_much_shorter_than_the_longest_are_skipped() -> Result<()> {
    let rows = monthly_costs(&[("p1", &rising(12)[..]), ("p2", &rising(6)[..])]);
    let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::default())?;
    assert_all(&labels_of(&out, "p1", 3), |c| *c == Cell::from("increasing"));
    assert_all(&labels_of(&out, "p2", 3), |c| *c == Cell::from("none"));
    Ok(())
}

#[test]
fn one_label_per_metric() -> Result<()> {
    let rows: RowSet = (0..12_u32)
        .map(|m| {
            let cost = 10.0 * f64::from(m + 1);
            let usage = 10.0 * f64::from(12 - m);
            row!["p1", format!("2024-{:02}", m + 1), cost, usage]
        })
        .collect();

    let out = detect(1, 1, rows, TimeInterval::Month, 2, &TrendSettings::default())?;

    assert_trailing_labels(&out, &["increasing", "decreasing"]);
    Ok(())
}

#[test]
fn integer_metrics_are_series_values() -> Result<()> {
    let rows: RowSet = (1..=12_i64)
        .map(|m| row!["p1", format!("2024-{m:02}"), m * 10])
        .collect();
    let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::default())?;
    assert_trailing_labels(&out, &["increasing"]);
    Ok(())
}

#[test]
fn steep_threshold_silences_trends() -> Result<()> {
    let rows = monthly_costs(&[("p1", &rising(12)[..])]);
    let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::new(89.0, 0.1))?;
    assert_trailing_labels(&out, &["none"]);
    Ok(())
}

#[test]
fn daily_series_with_weekly_season() -> Result<()> {
    let values: Vec<f64> = (0..30)
        .map(|i| 100.0 + 10.0 * f64::from(i) + if i % 7 == 5 { 15.0 } else { 0.0 })
        .collect();
    let rows = RowSetBuilder::new().add_series(&["p1"], &values).build();

    let out = detect(1, 1, rows, TimeInterval::Day, 1, &TrendSettings::default())?;

    assert_trailing_labels(&out, &["increasing"]);
    Ok(())
}

#[test]
fn execution_modes_agree() -> Result<()> {
    let up = rising(12);
    let down: Vec<f64> = up.iter().rev().copied().collect();
    let rows = monthly_costs(&[
        ("p1", &up[..]),
        ("p2", &down[..]),
        ("p3", &[5.0; 12][..]),
        ("p4", &up[..9]),
    ]);
    let settings = TrendSettings::default();

    let sequential = detect_with(
        ExecMode::Sequential,
        1,
        1,
        rows.clone(),
        TimeInterval::Month,
        1,
        &settings,
    )?;
    let parallel = detect_with(
        ExecMode::Parallel { threads: Some(2) },
        1,
        1,
        rows.clone(),
        TimeInterval::Month,
        1,
        &settings,
    )?;
    let default = detect(1, 1, rows, TimeInterval::Month, 1, &settings)?;

    assert_eq!(sequential, parallel);
    assert_eq!(sequential, default);
    Ok(())
}

#[test]
fn empty_input() -> Result<()> {
    let out = detect(1, 1, Vec::new(), TimeInterval::Month, 1, &TrendSettings::default())?;
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn malformed_rows() {
    let settings = TrendSettings::default();

    let err = detect(1, 1, vec![row!["p1", "2024-01", "n/a"]], TimeInterval::Month, 1, &settings)
        .unwrap_err();
    assert_eq!(err, Error::InvalidType { index: 2, found: "string" });

    let err = detect(1, 1, vec![row![1.5, "2024-01", 2.0]], TimeInterval::Month, 1, &settings)
        .unwrap_err();
    assert_eq!(err, Error::InvalidType { index: 0, found: "float" });

    let err = detect(1, 1, vec![row!["p1", "2024-01", 2.0]], TimeInterval::Month, 2, &settings)
        .unwrap_err();
    assert_eq!(err, Error::IndexOutOfBounds { index: 3, len: 3 });
}
