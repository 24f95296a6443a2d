//! Builders for row sets and dimension lists.

use crate::cell::{Cell, Row, RowSet};
use crate::dimension::{Dimension, FieldType};

/// A fluent builder for row sets.
///
/// # Example
///
/// ```
/// use tallybeam::row;
/// use tallybeam::testing::RowSetBuilder;
///
/// let rows = RowSetBuilder::new()
///     .add_row(row!["US", 1.0])
///     .add_repeated(row!["FR", 2.0], 2)
///     .add_series(&["project-1"], &[1.0, 2.0, 3.0])
///     .build();
///
/// assert_eq!(rows.len(), 6);
/// assert_eq!(rows[5], row!["project-1", "p2", 3.0]);
/// ```
#[derive(Debug, Default)]
pub struct RowSetBuilder {
    rows: RowSet,
}

impl RowSetBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    #[must_use]
    pub fn add_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    #[must_use]
    pub fn add_rows(mut self, rows: RowSet) -> Self {
        self.rows.extend(rows);
        self
    }

    #[must_use]
    pub fn add_repeated(mut self, row: Row, count: usize) -> Self {
        for _ in 0..count {
            self.rows.push(row.clone());
        }
        self
    }

    /// Add one row per value: `[key..., "p<i>", value]`.
    ///
    /// The `p<i>` cell stands for the time dimension of the point.
    #[must_use]
    pub fn add_series(mut self, key: &[&str], values: &[f64]) -> Self {
        for (i, v) in values.iter().enumerate() {
            let mut row: Row = key.iter().map(|k| Cell::from(*k)).collect();
            row.push(Cell::from(format!("p{i}")));
            row.push(Cell::Float(*v));
            self.rows.push(row);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> RowSet {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fixed dimensions from `(id, key)` pairs.
///
/// ```
/// use tallybeam::testing::dimensions;
///
/// let dims = dimensions(&[("fixed:country", "country")]);
/// assert_eq!(dims[0].plural_caption(), "countries");
/// ```
#[must_use]
pub fn dimensions(pairs: &[(&str, &str)]) -> Vec<Dimension> {
    pairs.iter().map(|(id, key)| Dimension::new(*id, *key)).collect()
}

/// An attribution-group dimension captioned `label`.
#[must_use]
pub fn attribution_group(id: &str, label: &str) -> Dimension {
    Dimension::new(id, id)
        .with_type(FieldType::AttributionGroup)
        .with_label(label)
}
