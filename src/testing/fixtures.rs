//! Pre-built report datasets.

use crate::cell::RowSet;
use crate::dimension::{Dimension, FieldType};
use crate::row;
use crate::splitting::{Split, SplitMode, SplitTarget};
use crate::testing::builders::{attribution_group, dimensions};

/// Rows together with the layout they follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFixture {
    pub row_dimensions: Vec<Dimension>,
    pub col_dimensions: Vec<Dimension>,
    pub metric_count: usize,
    pub rows: RowSet,
}

impl ReportFixture {
    /// Cell position of metric number `metric`.
    #[must_use]
    pub fn metric_index(&self, metric: usize) -> usize {
        self.row_dimensions.len() + self.col_dimensions.len() + metric
    }

    /// Row dimensions followed by column dimensions.
    #[must_use]
    pub fn all_dimensions(&self) -> Vec<Dimension> {
        self.row_dimensions
            .iter()
            .chain(&self.col_dimensions)
            .cloned()
            .collect()
    }
}

/// Cost per country and service: US 100, FR 10, DE 2.
///
/// # Example
///
/// ```
/// use tallybeam::testing::country_service_costs;
///
/// let fixture = country_service_costs();
/// assert_eq!(fixture.rows.len(), 6);
/// ```
#[must_use]
pub fn country_service_costs() -> ReportFixture {
    ReportFixture {
        row_dimensions: dimensions(&[
            ("fixed:country", "country"),
            ("fixed:service_description", "service_description"),
        ]),
        col_dimensions: Vec::new(),
        metric_count: 1,
        rows: vec![
            row!["US", "Compute Engine", 70.0],
            row!["US", "Cloud Storage", 30.0],
            row!["FR", "Compute Engine", 6.0],
            row!["FR", "Cloud Storage", 4.0],
            row!["DE", "Compute Engine", 1.5],
            row!["DE", "Cloud Storage", 0.5],
        ],
    }
}

/// Monthly cost and usage per project and team, with unallocated spend.
///
/// Layout: `[project, team | month | cost, usage]`.
#[must_use]
pub fn team_costs() -> ReportFixture {
    ReportFixture {
        row_dimensions: vec![
            Dimension::new("fixed:project_id", "project_id"),
            attribution_group("attribution_group:teams", "Teams"),
        ],
        col_dimensions: dimensions(&[("datetime:month", "month")]),
        metric_count: 2,
        rows: vec![
            row!["project-1", "Unallocated", "2024-01", 100.0, 10.0],
            row!["project-1", "team-a", "2024-01", 30.0, 3.0],
            row!["project-1", "team-b", "2024-01", 10.0, 1.0],
            row!["project-1", "Unallocated", "2024-02", 40.0, 4.0],
            row!["project-1", "team-a", "2024-02", 20.0, 2.0],
            row!["project-2", None::<&str>, "2024-01", 8.0, 0.8],
        ],
    }
}

/// An attribution-group split of `origin` between `targets`.
#[must_use]
pub fn team_split(origin: &str, targets: &[&str], mode: SplitMode) -> Split {
    Split {
        id: "attribution_group:teams".to_string(),
        origin: origin.to_string(),
        field_type: FieldType::AttributionGroup,
        mode,
        include_origin: false,
        targets: targets.iter().map(|t| SplitTarget::new(*t, 0.0)).collect(),
    }
}

/// `[project, month, cost]` rows of one series per `(project, values)` pair.
///
/// # Example
///
/// ```
/// use tallybeam::testing::monthly_costs;
///
/// let rows = monthly_costs(&[("p1", &[1.0, 2.0][..]), ("p2", &[3.0][..])]);
/// assert_eq!(rows.len(), 3);
/// ```
#[must_use]
pub fn monthly_costs(series: &[(&str, &[f64])]) -> RowSet {
    let mut rows = RowSet::new();
    for (project, values) in series {
        for (i, v) in values.iter().enumerate() {
            rows.push(row![*project, format!("2024-{:02}", i % 12 + 1), *v]);
        }
    }
    rows
}
