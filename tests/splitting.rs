//! Tests for metric splitting.

use anyhow::Result;
use tallybeam::splitting::{split, AttributionRef, UNALLOCATED};
use tallybeam::testing::*;
use tallybeam::*;

fn request(fixture: &ReportFixture, splits: Vec<Split>) -> SplitRequest {
    SplitRequest {
        splits,
        dimensions: fixture.all_dimensions(),
        row_count: fixture.row_dimensions.len(),
        col_count: fixture.col_dimensions.len(),
        metric_count: fixture.metric_count,
        attributions: Vec::new(),
    }
}

fn assert_conserved(before: &[Row], after: &[Row], fixture: &ReportFixture) {
    for m in 0..fixture.metric_count {
        let index = fixture.metric_index(m);
        let expected: f64 = before.iter().map(|r| metric_at(r, index).unwrap()).sum();
        assert_metric_total(after, index, expected);
    }
}

#[test]
fn even_split_moves_unallocated_into_teams() -> Result<()> {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let req = request(&f, vec![team_split(UNALLOCATED, &["team-a", "team-b"], SplitMode::Even)]);

    split(&mut rows, &req)?;

    assert_rows_unordered_equal(
        &rows,
        &[
            row!["project-1", "team-a", "2024-01", 80.0, 8.0],
            row!["project-1", "team-b", "2024-01", 60.0, 6.0],
            row!["project-1", "team-a", "2024-02", 40.0, 4.0],
            row!["project-1", "team-b", "2024-02", 20.0, 2.0],
            row!["project-2", "team-a", "2024-01", 4.0, 0.4],
            row!["project-2", "team-b", "2024-01", 4.0, 0.4],
        ],
    );
    assert_conserved(&f.rows, &rows, &f);
    Ok(())
}

#[test]
fn custom_split_uses_declared_shares() -> Result<()> {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let mut s = team_split(UNALLOCATED, &["team-a", "team-b"], SplitMode::Custom);
    s.targets[0].value = 0.75;
    s.targets[1].value = 0.25;

    split(&mut rows, &request(&f, vec![s]))?;

    assert_conserved(&f.rows, &rows, &f);
    let by_team = metric_totals_by(&rows, 1, 3);
    assert!((by_team["team-a"] - (30.0 + 20.0 + 0.75 * 148.0)).abs() < 1e-9);
    assert!((by_team["team-b"] - (10.0 + 0.25 * 148.0)).abs() < 1e-9);
    assert_none(&rows, |r| r[1] == Cell::from(UNALLOCATED) || r[1].is_null());
    Ok(())
}

#[test]
fn proportional_split_follows_observed_shares_per_month() -> Result<()> {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let req = request(
        &f,
        vec![team_split(UNALLOCATED, &["team-a", "team-b"], SplitMode::Proportional)],
    );

    split(&mut rows, &req)?;

    assert_conserved(&f.rows, &rows, &f);
    // January: team-a 30 of 40; February: team-a only
    let by_team = metric_totals_by(&rows, 1, 3);
    assert!((by_team["team-a"] - (30.0 + 75.0 + 20.0 + 40.0 + 6.0)).abs() < 1e-9);
    assert!((by_team["team-b"] - (10.0 + 25.0 + 2.0)).abs() < 1e-9);

    let jan_a = rows
        .iter()
        .find(|r| r[0] == Cell::from("project-1") && r[1] == Cell::from("team-a") && r[2] == Cell::from("2024-01"))
        .expect("team-a january row");
    assert_eq!(jan_a[4], Cell::Float(10.5));
    Ok(())
}

#[test]
fn include_origin_keeps_a_tagged_sibling() -> Result<()> {
    let dims = vec![
        Dimension::new("fixed:project_id", "project_id"),
        attribution_group("attribution_group:teams", "Teams"),
        Dimension::new("fixed:origin", "origin"),
    ];
    let mut rows = vec![
        row!["p1", UNALLOCATED, None::<&str>, 100.0],
        row!["p1", "team-a", None::<&str>, 10.0],
    ];
    let mut s = team_split(UNALLOCATED, &["team-a", "team-b"], SplitMode::Even);
    s.include_origin = true;
    let req = SplitRequest {
        splits: vec![s],
        dimensions: dims,
        row_count: 3,
        col_count: 0,
        metric_count: 1,
        attributions: Vec::new(),
    };

    split(&mut rows, &req)?;

    assert_rows_equal(
        &rows,
        &[
            row!["p1", "team-a", None::<&str>, 10.0],
            row!["p1", "team-a", UNALLOCATED, 50.0],
            row!["p1", "team-b", None::<&str>, 50.0],
        ],
    );
    Ok(())
}

#[test]
fn include_origin_needs_a_dimension_cell_for_the_tag() {
    let dims = vec![
        Dimension::new("fixed:project_id", "project_id"),
        attribution_group("attribution_group:teams", "Teams"),
    ];
    let mut rows = vec![row!["p1", UNALLOCATED, 100.0], row!["p1", "team-a", 10.0]];
    let mut s = team_split(UNALLOCATED, &["team-a"], SplitMode::Even);
    s.include_origin = true;
    let req = SplitRequest {
        splits: vec![s],
        dimensions: dims,
        row_count: 2,
        col_count: 0,
        metric_count: 1,
        attributions: Vec::new(),
    };

    let err = split(&mut rows, &req).unwrap_err();
    assert_eq!(err, Error::IndexOutOfBounds { index: 2, len: 2 });
}

#[test]
fn absent_targets_are_dropped() -> Result<()> {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let req = request(&f, vec![team_split(UNALLOCATED, &["team-a", "team-z"], SplitMode::Even)]);

    split(&mut rows, &req)?;

    assert_conserved(&f.rows, &rows, &f);
    let by_team = metric_totals_by(&rows, 1, 3);
    assert_eq!(by_team["team-a"], 198.0);
    assert!(!by_team.contains_key("team-z"));
    Ok(())
}

#[test]
fn absent_origin_is_a_no_op() -> Result<()> {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let req = request(&f, vec![team_split("team-q", &["team-a"], SplitMode::Even)]);
    split(&mut rows, &req)?;
    assert_eq!(rows, f.rows);
    Ok(())
}

#[test]
fn attribution_ids_resolve_to_row_keys() -> Result<()> {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let mut req = request(&f, vec![team_split(UNALLOCATED, &["attr-a", "attr-b"], SplitMode::Even)]);
    req.attributions = vec![
        AttributionRef {
            id: "attr-a".into(),
            key: "team-a".into(),
        },
        AttributionRef {
            id: "attr-b".into(),
            key: "team-b".into(),
        },
    ];

    split(&mut rows, &req)?;

    let by_team = metric_totals_by(&rows, 1, 3);
    assert_eq!(by_team["team-a"], 124.0);
    assert_eq!(by_team["team-b"], 84.0);
    Ok(())
}

#[test]
fn leftover_value_keeps_the_origin_row() -> Result<()> {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let mut s = team_split(UNALLOCATED, &["team-a"], SplitMode::Custom);
    s.targets[0].value = 0.5;

    split(&mut rows, &request(&f, vec![s]))?;

    assert_conserved(&f.rows, &rows, &f);
    let by_team = metric_totals_by(&rows, 1, 3);
    assert_eq!(by_team[UNALLOCATED], 70.0);
    // the null cell of project-2 still reads as null
    assert!(rows.iter().any(|r| r[0] == Cell::from("project-2") && r[1].is_null()));
    Ok(())
}

#[test]
fn no_splits_is_an_error() {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let err = split(&mut rows, &request(&f, Vec::new())).unwrap_err();
    assert_eq!(err, Error::NoSplitsDefined);
}

#[test]
fn unknown_split_dimension() {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let mut s = team_split(UNALLOCATED, &["team-a"], SplitMode::Even);
    s.id = "attribution_group:missing".into();
    let err = split(&mut rows, &request(&f, vec![s])).unwrap_err();
    assert_eq!(err, Error::InvalidIndex("attribution_group:missing".into()));
}

#[test]
fn unsupported_mode_from_json() -> Result<()> {
    let s: Split = serde_json::from_str(
        r#"{
            "id": "attribution_group:teams",
            "origin": "Unallocated",
            "type": "attribution_group",
            "mode": "weighted",
            "includeOrigin": false,
            "targets": [{"id": "team-a", "value": 0}]
        }"#,
    )?;
    assert_eq!(s.mode, SplitMode::Unsupported);

    let f = team_costs();
    let mut rows = f.rows.clone();
    let err = split(&mut rows, &request(&f, vec![s])).unwrap_err();
    assert_eq!(err, Error::InvalidMode);
    Ok(())
}

#[test]
fn string_metric_in_origin_row() {
    let f = team_costs();
    let mut rows = f.rows.clone();
    rows[0][3] = Cell::from("n/a");
    let req = request(&f, vec![team_split(UNALLOCATED, &["team-a"], SplitMode::Even)]);
    let err = split(&mut rows, &req).unwrap_err();
    assert_eq!(err, Error::InvalidType { index: 3, found: "string" });
}

#[test]
fn splits_apply_in_sequence() -> Result<()> {
    let f = team_costs();
    let mut rows = f.rows.clone();
    let req = request(
        &f,
        vec![
            team_split(UNALLOCATED, &["team-a"], SplitMode::Even),
            team_split("team-a", &["team-b"], SplitMode::Even),
        ],
    );

    split(&mut rows, &req)?;

    assert_conserved(&f.rows, &rows, &f);
    assert_all(&rows, |r| r[1] == Cell::from("team-b"));
    Ok(())
}

#[test]
fn row_narrower_than_the_layout() {
    let f = team_costs();
    let req = request(&f, vec![team_split(UNALLOCATED, &["team-a"], SplitMode::Even)]);

    let mut rows = f.rows.clone();
    rows.push(row!["project-3"]);
    let err = split(&mut rows, &req).unwrap_err();
    assert_eq!(err, Error::IndexOutOfBounds { index: 1, len: 1 });

    // split cell present, month missing
    let mut rows = f.rows.clone();
    rows.push(row!["project-3", "team-a"]);
    let err = split(&mut rows, &req).unwrap_err();
    assert_eq!(err, Error::IndexOutOfBounds { index: 3, len: 2 });
}

#[test]
fn narrow_row_in_a_proportional_split() {
    let f = team_costs();
    let req = request(
        &f,
        vec![team_split(UNALLOCATED, &["team-a", "team-b"], SplitMode::Proportional)],
    );
    let mut rows = f.rows.clone();
    rows.push(row!["project-3"]);
    let err = split(&mut rows, &req).unwrap_err();
    assert_eq!(err, Error::IndexOutOfBounds { index: 1, len: 1 });
}
