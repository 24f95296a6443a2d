//! Share computation for the split modes.

use super::{Layout, SplitTarget, UNALLOCATED};
use crate::cell::{Row, metric_at};
use crate::error::Result;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Ratios for even and custom splits, one per target.
///
/// Declared values are used as-is unless none of them is positive or they sum to
/// more than 1, in which case every target gets `1 / n`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn flat_ratios(targets: &[SplitTarget]) -> Vec<f64> {
    if targets.is_empty() {
        return Vec::new();
    }
    let even = 1.0 / targets.len() as f64;
    let any_positive = targets.iter().any(|t| t.value > 0.0);
    let total: f64 = targets.iter().map(|t| t.value).sum();
    if !any_positive || total > 1.0 {
        return vec![even; targets.len()];
    }
    targets.iter().map(|t| t.value).collect()
}

/// Observed shares of each target, per column combination and metric.
///
/// A target that has no row in some column combination gets a share of zero
/// there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProportionalRatios {
    by_target: HashMap<String, HashMap<String, Vec<f64>>>,
}

impl ProportionalRatios {
    /// Ratios of `target` in the column combination `column_key`.
    #[must_use]
    pub fn get(&self, target: &str, column_key: &str, metrics: usize) -> Vec<f64> {
        self.by_target
            .get(target)
            .and_then(|columns| columns.get(column_key))
            .cloned()
            .unwrap_or_else(|| vec![0.0; metrics])
    }
}

/// Compute proportional shares from the rows of the split targets.
///
/// For every column combination and metric, a target's share is its own total
/// divided by the total of all targets. Shares that are not finite (all targets
/// summing to zero) become zero.
///
/// # Errors
///
/// Fails if a target row is narrower than the layout or one of its metric
/// cells is not numeric.
pub(crate) fn proportional_ratios(
    rows: &[Row],
    targets: &[SplitTarget],
    layout: &Layout,
) -> Result<ProportionalRatios> {
    let offset = layout.metric_offset();
    let mut totals: IndexMap<String, Vec<f64>> = IndexMap::new();
    let mut values: HashMap<(String, String), Vec<f64>> = HashMap::new();

    for row in rows {
        let value = layout.split_cell(row)?.as_str().unwrap_or(UNALLOCATED);
        if !targets.iter().any(|t| t.id == value) {
            continue;
        }
        let column_key = layout.column_key(row)?;
        let total = totals
            .entry(column_key.clone())
            .or_insert_with(|| vec![0.0; layout.metric_count]);
        let own = values
            .entry((value.to_string(), column_key))
            .or_insert_with(|| vec![0.0; layout.metric_count]);
        for m in 0..layout.metric_count {
            let v = metric_at(row, offset + m)?;
            total[m] += v;
            own[m] += v;
        }
    }

    let mut ratios = ProportionalRatios::default();
    for target in targets {
        let columns = ratios.by_target.entry(target.id.clone()).or_default();
        for (column_key, total) in &totals {
            let Some(own) = values.get(&(target.id.clone(), column_key.clone())) else {
                continue;
            };
            let shares = own
                .iter()
                .zip(total)
                .map(|(v, t)| {
                    let share = v / t;
                    if share.is_finite() { share } else { 0.0 }
                })
                .collect();
            columns.insert(column_key.clone(), shares);
        }
    }
    Ok(ratios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::row;

    fn targets(values: &[(&str, f64)]) -> Vec<SplitTarget> {
        values.iter().map(|(id, v)| SplitTarget::new(*id, *v)).collect()
    }

    #[test]
    fn declared_values_are_kept() {
        let ratios = flat_ratios(&targets(&[("a", 0.2), ("b", 0.5), ("c", 0.3)]));
        assert_eq!(ratios, vec![0.2, 0.5, 0.3]);
    }

    #[test]
    fn zero_values_fall_back_to_even() {
        let ratios = flat_ratios(&targets(&[("a", 0.0), ("b", 0.0), ("c", 0.0), ("d", 0.0)]));
        assert_eq!(ratios, vec![0.25; 4]);
    }

    #[test]
    fn oversubscribed_values_fall_back_to_even() {
        let ratios = flat_ratios(&targets(&[("a", 0.7), ("b", 0.6)]));
        assert_eq!(ratios, vec![0.5, 0.5]);
    }

    #[test]
    fn no_targets_no_ratios() {
        assert!(flat_ratios(&[]).is_empty());
    }

    #[test]
    fn proportional_shares_are_per_column() {
        let layout = Layout {
            row_count: 2,
            col_count: 1,
            metric_count: 1,
            split_index: 1,
        };
        let rows = vec![
            row!["p1", "team-a", "2024-01", 30.0],
            row!["p1", "team-b", "2024-01", 10.0],
            row!["p1", "team-a", "2024-02", 10.0],
            row!["p1", "team-b", "2024-02", 10.0],
            row!["p1", "other", "2024-02", 999.0],
        ];
        let ratios =
            proportional_ratios(&rows, &targets(&[("team-a", 0.0), ("team-b", 0.0)]), &layout)
                .unwrap();

        let jan = layout.column_key(&rows[0]).unwrap();
        let feb = layout.column_key(&rows[2]).unwrap();
        assert_eq!(ratios.get("team-a", &jan, 1), vec![0.75]);
        assert_eq!(ratios.get("team-b", &jan, 1), vec![0.25]);
        assert_eq!(ratios.get("team-a", &feb, 1), vec![0.5]);
        assert_eq!(ratios.get("team-c", &feb, 1), vec![0.0]);
    }

    #[test]
    fn zero_totals_give_zero_shares() {
        let layout = Layout {
            row_count: 1,
            col_count: 0,
            metric_count: 1,
            split_index: 0,
        };
        let rows = vec![row!["team-a", 0.0], row!["team-b", 0.0]];
        let ratios =
            proportional_ratios(&rows, &targets(&[("team-a", 0.0), ("team-b", 0.0)]), &layout)
                .unwrap();
        assert_eq!(ratios.get("team-a", "", 1), vec![0.0]);
    }

    #[test]
    fn narrow_rows_are_rejected() {
        let layout = Layout {
            row_count: 2,
            col_count: 1,
            metric_count: 1,
            split_index: 1,
        };
        let rows = vec![row!["p1", "team-a", "2024-01", 30.0], row!["p1", "team-b"]];
        let err = proportional_ratios(&rows, &targets(&[("team-a", 0.0), ("team-b", 0.0)]), &layout)
            .unwrap_err();
        assert_eq!(err, Error::IndexOutOfBounds { index: 3, len: 2 });

        let err = layout.split_cell(&row!["p1"]).unwrap_err();
        assert_eq!(err, Error::IndexOutOfBounds { index: 1, len: 1 });
    }
}
