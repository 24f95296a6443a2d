//! Hierarchical Top-N limiting with "Other" aggregation.
//!
//! Each constrained row dimension becomes a [`LevelLimit`]. Rows are grouped by
//! the level's dimension cell, groups are ranked by the sum of a metric, the top
//! `limit` groups are kept, and (depending on [`LimitAggregation`]) the rest is
//! folded into one group captioned `∑ Other <plural>`. Inner levels are applied
//! inside every kept group, the Other group included:
//!
//! ```text
//! | Country          | Service            |
//! +------------------+--------------------+
//! | Canada           | Service A          |
//! |                  | Service B          |
//! |                  | ∑ Other services   |
//! +------------------+--------------------+
//! | ∑ Other countries| Service H          |
//! |                  | Service I          |
//! |                  | ∑ Other services   |
//! ```
//!
//! ## Example
//! ```
//! use tallybeam::limits::{apply_limits, LimitAggregation, LimitConstraint, LimitOrder};
//! use tallybeam::{row, Dimension};
//! # fn main() -> tallybeam::Result<()> {
//! let rows = vec![
//!     row!["US", 90.0],
//!     row!["FR", 10.0],
//!     row!["DE", 2.0],
//! ];
//! let dims = vec![Dimension::new("fixed:country", "country")];
//! let limits = vec![LimitConstraint::new("fixed:country", 1, LimitOrder::Desc)];
//!
//! let out = apply_limits(rows, &limits, &dims, LimitAggregation::All, 1)?;
//! assert_eq!(out.len(), 3);
//! assert_eq!(out[1][0], "∑ Other countries".into());
//! # Ok(())
//! # }
//! ```

use crate::cell::{Cell, Row, RowSet, metric_at};
use crate::dimension::Dimension;
use crate::error::Result;
use crate::row_key::cell_key;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

/// Prefix of every "Other" caption.
pub const OTHER_LABEL_PREFIX: &str = "\u{2211} Other ";

/// What happens to the groups that fall outside a level's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitAggregation {
    /// Excluded groups are dropped.
    #[default]
    None,
    /// Excluded groups are folded into an Other group, and Other captions of
    /// outer levels are carried into inner levels.
    Top,
    /// Excluded groups are folded into an Other group per level.
    All,
}

/// Ranking direction of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitOrder {
    Asc,
    #[default]
    Desc,
}

/// A Top-N constraint on one row dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConstraint {
    /// Id of the constrained [`Dimension`].
    pub dimension_id: String,
    /// Number of groups to keep; `0` keeps every group.
    pub limit: usize,
    #[serde(default)]
    pub order: LimitOrder,
}

impl LimitConstraint {
    pub fn new<S: Into<String>>(dimension_id: S, limit: usize, order: LimitOrder) -> Self {
        Self {
            dimension_id: dimension_id.into(),
            limit,
            order,
        }
    }
}

/// One level of the limit hierarchy, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelLimit {
    /// Position of this level in the level list.
    pub level: usize,
    pub limit: usize,
    /// Cell position of the level's dimension.
    pub dimension_index: usize,
    /// Cell position of the ranking metric.
    pub metric_index: usize,
    pub order: LimitOrder,
    /// Plural caption of the dimension, e.g. `countries`.
    pub plural: String,
    /// Index of the enclosing level in the level list.
    pub parent: Option<usize>,
}

/// Caption of the Other group for a dimension plural.
#[must_use]
pub fn other_caption(plural: &str) -> String {
    format!("{OTHER_LABEL_PREFIX}{plural}")
}

/// Build the level list for `constraints` over `dimensions`.
///
/// Dimensions are walked outer to inner. A constrained dimension whose outer
/// neighbour is unconstrained gets that neighbour inserted as an unlimited level
/// in front of it, so its groups stay partitioned by their parent.
#[must_use]
pub fn build_levels(
    constraints: &[LimitConstraint],
    dimensions: &[Dimension],
    metric_index: usize,
) -> Vec<LevelLimit> {
    let constraint_for =
        |dim: &Dimension| constraints.iter().find(|c| c.dimension_id == dim.id);

    let mut levels: Vec<LevelLimit> = Vec::new();
    let mut push = |index: usize, limit: usize, order: LimitOrder| {
        let level = levels.len();
        levels.push(LevelLimit {
            level,
            limit,
            dimension_index: index,
            metric_index,
            order,
            plural: dimensions[index].plural_caption(),
            parent: level.checked_sub(1),
        });
    };

    for (index, dim) in dimensions.iter().enumerate() {
        let Some(constraint) = constraint_for(dim) else {
            continue;
        };
        if index > 0 && constraint_for(&dimensions[index - 1]).is_none() {
            push(index - 1, 0, LimitOrder::Desc);
        }
        push(index, constraint.limit, constraint.order);
    }

    levels
}

/// Apply Top-N `constraints` to `rows`.
///
/// `dimensions` are the row dimensions in layout order and `metric_index` is the
/// cell position of the metric the groups are ranked by. Without any constrained
/// dimension the rows are returned unchanged.
///
/// # Errors
///
/// Fails if a dimension cell is not a key type, if the ranking metric is not
/// numeric, or if either position lies outside a row.
pub fn apply_limits(
    rows: RowSet,
    constraints: &[LimitConstraint],
    dimensions: &[Dimension],
    aggregation: LimitAggregation,
    metric_index: usize,
) -> Result<RowSet> {
    let levels = build_levels(constraints, dimensions, metric_index);
    if levels.is_empty() {
        return Ok(rows);
    }
    debug!(
        levels = levels.len(),
        rows = rows.len(),
        ?aggregation,
        "applying limits"
    );
    apply_levels(rows, &levels, aggregation)
}

/// Apply an explicit level list to `rows`.
///
/// # Errors
///
/// Same as [`apply_limits`].
pub fn apply_levels(
    rows: RowSet,
    levels: &[LevelLimit],
    aggregation: LimitAggregation,
) -> Result<RowSet> {
    if levels.is_empty() {
        return Ok(rows);
    }
    apply_level(rows, levels, 0, aggregation)
}

fn apply_level(
    rows: RowSet,
    levels: &[LevelLimit],
    pos: usize,
    aggregation: LimitAggregation,
) -> Result<RowSet> {
    let level = &levels[pos];
    let groups = group_rows(rows, level.dimension_index, level.metric_index)?;
    let ranked = rank_groups(groups, levels, pos, aggregation);

    if pos + 1 == levels.len() {
        return Ok(ranked.into_iter().flat_map(|g| g.rows).collect());
    }

    let mut out = RowSet::new();
    for group in ranked {
        out.extend(apply_level(group.rows, levels, pos + 1, aggregation)?);
    }
    Ok(out)
}

/// Rows sharing one value of a level's dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitGroup {
    pub key: String,
    pub metric_sum: f64,
    pub rows: RowSet,
}

/// Group `rows` by the cell at `dimension_index`, in first-seen order.
///
/// # Errors
///
/// Fails on a non-key dimension cell or a non-numeric metric cell.
pub fn group_rows(
    rows: RowSet,
    dimension_index: usize,
    metric_index: usize,
) -> Result<Vec<LimitGroup>> {
    let mut groups: IndexMap<String, LimitGroup> = IndexMap::new();
    for row in rows {
        let key = cell_key(&row, dimension_index)?;
        let value = metric_at(&row, metric_index)?;
        let group = groups.entry(key).or_insert_with_key(|k| LimitGroup {
            key: k.clone(),
            metric_sum: 0.0,
            rows: RowSet::new(),
        });
        group.metric_sum += value;
        group.rows.push(row);
    }
    Ok(groups.into_values().collect())
}

/// Sort, cut and (optionally) fold the groups of one level.
fn rank_groups(
    mut groups: Vec<LimitGroup>,
    levels: &[LevelLimit],
    pos: usize,
    aggregation: LimitAggregation,
) -> Vec<LimitGroup> {
    let level = &levels[pos];

    // Stable: ties keep first-seen order.
    match level.order {
        LimitOrder::Desc => groups.sort_by_key(|g| Reverse(OrderedFloat(g.metric_sum))),
        LimitOrder::Asc => groups.sort_by_key(|g| OrderedFloat(g.metric_sum)),
    }

    let limit = level.limit.min(groups.len());
    // A zero limit is a pass-through level, in every aggregation.
    if limit == 0 {
        return groups;
    }

    let mut kept = groups;
    let excluded = kept.split_off(limit);
    let total = kept.len() + excluded.len();

    if aggregation == LimitAggregation::None {
        debug!(level = level.level, groups = total, kept = kept.len(), "limit level ranked");
        return kept;
    }

    let caption = other_caption(&level.plural);

    if aggregation == LimitAggregation::Top {
        if let Some(parent) = level.parent {
            carry_parent_caption(&mut kept, level, &levels[parent], &caption);
        }
    }

    if !excluded.is_empty() {
        let ancestors = ancestor_captions(levels, pos);
        let mut other = LimitGroup {
            key: caption.clone(),
            metric_sum: 0.0,
            rows: RowSet::new(),
        };
        for group in excluded {
            other.metric_sum += group.metric_sum;
            for mut row in group.rows {
                row[level.dimension_index] = Cell::from(caption.as_str());
                if aggregation == LimitAggregation::Top {
                    for (index, ancestor_caption) in &ancestors {
                        row[*index] = Cell::from(ancestor_caption.as_str());
                    }
                }
                other.rows.push(row);
            }
        }
        kept.push(other);
    }

    debug!(level = level.level, groups = total, kept = limit, "limit level ranked");
    kept
}

/// Rows already inside the parent's Other group are captioned as this level's
/// Other group too, so nested Other groups collapse into one.
fn carry_parent_caption(
    kept: &mut [LimitGroup],
    level: &LevelLimit,
    parent: &LevelLimit,
    caption: &str,
) {
    let parent_caption = Cell::from(other_caption(&parent.plural));
    let rows = kept.iter_mut().flat_map(|g| g.rows.iter_mut());
    for row in rows {
        if row[parent.dimension_index] == parent_caption {
            row[level.dimension_index] = Cell::from(caption);
        }
    }
}

/// `(dimension index, Other caption)` of every enclosing level with a plural.
fn ancestor_captions(levels: &[LevelLimit], pos: usize) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current = levels[pos].parent;
    while let Some(index) = current {
        let ancestor = &levels[index];
        if !ancestor.plural.is_empty() {
            out.push((ancestor.dimension_index, other_caption(&ancestor.plural)));
        }
        current = ancestor.parent;
    }
    out
}

/// Sum of the metric at `metric_index` over `rows`.
///
/// # Errors
///
/// Fails if a metric cell is not numeric or out of bounds.
pub fn metric_total(rows: &[Row], metric_index: usize) -> Result<f64> {
    rows.iter().map(|r| metric_at(r, metric_index)).sum()
}
