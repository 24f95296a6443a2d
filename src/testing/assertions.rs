//! Assertion functions for row sets.

use super::EPSILON;
use crate::cell::{Cell, Row, metric_at};
use crate::row_key::cell_key;
use std::collections::HashMap;
use std::fmt::Debug;

fn cells_match(a: &Cell, b: &Cell) -> bool {
    match (a.as_metric(), b.as_metric()) {
        (Some(x), Some(y)) if !a.is_null() && !b.is_null() => (x - y).abs() <= EPSILON,
        _ => a == b,
    }
}

fn rows_match(a: &[Cell], b: &[Cell]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| cells_match(x, y))
}

/// Assert that two row sets are equal in order, comparing numbers with
/// [`EPSILON`](super::EPSILON) tolerance.
///
/// # Panics
///
/// Panics if the row sets differ in length or content.
///
/// # Example
///
/// ```
/// use tallybeam::row;
/// use tallybeam::testing::assert_rows_equal;
///
/// assert_rows_equal(&[row!["US", 0.1 + 0.2]], &[row!["US", 0.3]]);
/// ```
pub fn assert_rows_equal(actual: &[Row], expected: &[Row]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Row count mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            rows_match(a, e),
            "Row mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that two row sets contain the same rows, ignoring order.
///
/// # Panics
///
/// Panics if a row of one set has no counterpart in the other.
///
/// # Example
///
/// ```
/// use tallybeam::row;
/// use tallybeam::testing::assert_rows_unordered_equal;
///
/// assert_rows_unordered_equal(
///     &[row!["FR", 1.0], row!["US", 2.0]],
///     &[row!["US", 2.0], row!["FR", 1.0]],
/// );
/// ```
pub fn assert_rows_unordered_equal(actual: &[Row], expected: &[Row]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Row count mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
    let mut unmatched: Vec<&Row> = actual.iter().collect();
    for e in expected {
        let Some(pos) = unmatched.iter().position(|a| rows_match(a, e)) else {
            panic!("Missing row: {e:?}\n  Expected: {expected:?}\n  Actual: {actual:?}");
        };
        unmatched.swap_remove(pos);
    }
}

/// Assert that the metric at `metric_index` sums to `expected` over `rows`.
///
/// # Panics
///
/// Panics if a metric cell is not numeric or the total differs.
pub fn assert_metric_total(rows: &[Row], metric_index: usize, expected: f64) {
    let total: f64 = rows
        .iter()
        .map(|r| metric_at(r, metric_index).unwrap_or_else(|e| panic!("{e}: {r:?}")))
        .sum();
    assert!(
        (total - expected).abs() <= 1e-6,
        "Metric total mismatch at index {metric_index}:\n  Expected: {expected}\n  Actual: {total}"
    );
}

/// Sum of the metric at `metric_index` per value of the cell at `key_index`.
///
/// # Panics
///
/// Panics on a cell that is not a key or not a metric.
#[must_use]
pub fn metric_totals_by(rows: &[Row], key_index: usize, metric_index: usize) -> HashMap<String, f64> {
    let mut totals = HashMap::new();
    for r in rows {
        let key = cell_key(r, key_index).unwrap_or_else(|e| panic!("{e}: {r:?}"));
        let value = metric_at(r, metric_index).unwrap_or_else(|e| panic!("{e}: {r:?}"));
        *totals.entry(key).or_insert(0.0) += value;
    }
    totals
}

/// Assert that every row ends with `labels`, in order.
///
/// # Panics
///
/// Panics if a row is shorter than `labels` or ends differently.
pub fn assert_trailing_labels(rows: &[Row], labels: &[&str]) {
    for (i, r) in rows.iter().enumerate() {
        assert!(r.len() >= labels.len(), "Row {i} too short: {r:?}");
        let tail = &r[r.len() - labels.len()..];
        let expected: Vec<Cell> = labels.iter().map(|l| Cell::from(*l)).collect();
        assert_eq!(tail, expected.as_slice(), "Label mismatch at row {i}: {r:?}");
    }
}

/// Assert that all elements in a collection satisfy a predicate.
///
/// # Panics
///
/// Panics if any element does not satisfy the predicate.
///
/// # Example
///
/// ```
/// use tallybeam::row;
/// use tallybeam::testing::assert_all;
///
/// let rows = vec![row!["US", 2.0], row!["FR", 1.0]];
/// assert_all(&rows, |r| r.len() == 2);
/// ```
pub fn assert_all<T: Debug>(collection: &[T], predicate: impl Fn(&T) -> bool) {
    for (i, item) in collection.iter().enumerate() {
        assert!(
            predicate(item),
            "Predicate failed for element at index {i}:\n  Element: {item:?}\n  Collection: {collection:?}"
        );
    }
}

/// Assert that no elements in a collection satisfy a predicate.
///
/// # Panics
///
/// Panics if any element satisfies the predicate.
pub fn assert_none<T: Debug>(collection: &[T], predicate: impl Fn(&T) -> bool) {
    for (i, item) in collection.iter().enumerate() {
        assert!(
            !predicate(item),
            "Predicate unexpectedly succeeded for element at index {i}:\n  Element: {item:?}\n  Collection: {collection:?}"
        );
    }
}
