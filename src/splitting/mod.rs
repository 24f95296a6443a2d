//! Metric splitting: redistribute the value of one dimension value (the origin)
//! into sibling values (the targets).
//!
//! For every origin row, each target receives `origin metric × ratio`:
//! - if the target already has a row that agrees with the origin on every other
//!   dimension, the amount is added to that row;
//! - otherwise a row is synthesized from the origin (metrics zeroed, split cell
//!   set to the target).
//!
//! The same amount is subtracted from the origin row, and origin rows that end up
//! at zero on every metric are removed. Value only moves between rows; per
//! metric and per non-split key, totals are unchanged.
//!
//! ## Example
//! ```
//! use tallybeam::splitting::{split, Split, SplitMode, SplitRequest, SplitTarget};
//! use tallybeam::{row, Dimension, FieldType};
//! # fn main() -> tallybeam::Result<()> {
//! let mut rows = vec![
//!     row!["project-1", "Unallocated", 100.0],
//!     row!["project-1", "team-a", 10.0],
//! ];
//! let request = SplitRequest {
//!     splits: vec![Split {
//!         id: "attribution_group:teams".into(),
//!         origin: "Unallocated".into(),
//!         field_type: FieldType::AttributionGroup,
//!         mode: SplitMode::Even,
//!         include_origin: false,
//!         targets: vec![SplitTarget::new("team-a", 0.0), SplitTarget::new("team-b", 0.0)],
//!     }],
//!     dimensions: vec![
//!         Dimension::new("fixed:project_id", "project_id"),
//!         Dimension::new("attribution_group:teams", "teams").with_type(FieldType::AttributionGroup),
//!     ],
//!     row_count: 2,
//!     col_count: 0,
//!     metric_count: 1,
//!     attributions: vec![],
//! };
//!
//! split(&mut rows, &request)?;
//! // team-a: 10 + 50, team-b: 50 (new row), Unallocated removed
//! assert_eq!(rows.len(), 2);
//! # Ok(())
//! # }
//! ```

mod ratios;
pub mod validation;

pub use ratios::{ProportionalRatios, flat_ratios};
use ratios::proportional_ratios;
pub use validation::{check_splits, validate_splits, ValidationResult};

use crate::cell::{Cell, Row, RowSet, metric_at};
use crate::dimension::{Dimension, FieldType, position_of};
use crate::error::{Error, Result};
use crate::row_key::{KEY_SEPARATOR, row_key_without};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Split value standing for rows whose attribution-group cell is null.
pub const UNALLOCATED: &str = "Unallocated";

/// An origin row whose every metric is within this distance of zero is removed.
pub const EMPTY_EPSILON: f64 = 0.01;

/// How a split distributes the origin between its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Equal shares.
    #[default]
    Even,
    /// Declared shares (target values), falling back to equal shares when the
    /// declared values are all zero or sum to more than 1.
    Custom,
    /// Shares proportional to each target's own observed value.
    Proportional,
    #[serde(other)]
    Unsupported,
}

/// One receiver of a split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitTarget {
    pub id: String,
    /// Declared share, used by [`SplitMode::Custom`].
    #[serde(default)]
    pub value: f64,
}

impl SplitTarget {
    pub fn new<S: Into<String>>(id: S, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// A declarative split of one origin value between targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    /// Id of the split dimension (an attribution group).
    pub id: String,
    pub origin: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub mode: SplitMode,
    /// Keep the pre-split value visible as a sibling row tagged with the origin.
    #[serde(default)]
    pub include_origin: bool,
    pub targets: Vec<SplitTarget>,
}

/// Maps an attribution id to the key the query layer writes into rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionRef {
    pub id: String,
    pub key: String,
}

/// Everything the split engine needs besides the rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
    pub splits: Vec<Split>,
    /// Row dimensions followed by column dimensions, in layout order.
    pub dimensions: Vec<Dimension>,
    pub row_count: usize,
    pub col_count: usize,
    pub metric_count: usize,
    #[serde(default)]
    pub attributions: Vec<AttributionRef>,
}

/// Positions used while applying one split.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub row_count: usize,
    pub col_count: usize,
    pub metric_count: usize,
    pub split_index: usize,
}

impl Layout {
    pub const fn metric_offset(&self) -> usize {
        self.row_count + self.col_count
    }

    /// Concatenated string cells of the column dimensions.
    pub fn column_key(&self, row: &[Cell]) -> Result<String> {
        let columns = row
            .get(self.row_count..self.metric_offset())
            .ok_or(Error::IndexOutOfBounds {
                index: self.metric_offset(),
                len: row.len(),
            })?;
        let mut key = String::new();
        for cell in columns {
            if let Some(s) = cell.as_str() {
                key.push_str(s);
                key.push(KEY_SEPARATOR);
            }
        }
        Ok(key)
    }

    /// The split cell of `row`.
    pub fn split_cell<'a>(&self, row: &'a [Cell]) -> Result<&'a Cell> {
        row.get(self.split_index).ok_or(Error::IndexOutOfBounds {
            index: self.split_index,
            len: row.len(),
        })
    }

    fn metrics(&self, row: &[Cell]) -> Result<Vec<f64>> {
        (self.metric_offset()..self.metric_offset() + self.metric_count)
            .map(|i| metric_at(row, i))
            .collect()
    }
}

/// Split value → (key of the other dimensions → row index).
type SplitIndex = IndexMap<String, IndexMap<String, usize>>;

/// Apply every split of `request` to `rows`, in order.
///
/// # Errors
///
/// - [`Error::NoSplitsDefined`] when the request carries no split
/// - [`Error::InvalidIndex`] when a split dimension is not part of the layout
/// - [`Error::InvalidMode`] for an unsupported mode
/// - [`Error::IndexOutOfBounds`] for a row narrower than the layout
/// - key and metric errors from malformed rows
pub fn split(rows: &mut RowSet, request: &SplitRequest) -> Result<()> {
    if request.splits.is_empty() {
        return Err(Error::NoSplitsDefined);
    }

    for declared in &request.splits {
        let mut split = declared.clone();
        let attribution_group = split.field_type == FieldType::AttributionGroup;
        if attribution_group {
            resolve_attribution_keys(&request.attributions, &mut split);
        }

        let layout = Layout {
            row_count: request.row_count,
            col_count: request.col_count,
            metric_count: request.metric_count,
            split_index: position_of(&request.dimensions, &split.id)
                .filter(|i| *i < request.row_count + request.col_count)
                .ok_or_else(|| Error::InvalidIndex(split.id.clone()))?,
        };

        let index = index_split_values(rows, &mut split, &layout, attribution_group)?;

        let shares = match split.mode {
            SplitMode::Even | SplitMode::Custom => Shares::Flat(flat_ratios(&split.targets)),
            SplitMode::Proportional => {
                Shares::Proportional(proportional_ratios(rows, &split.targets, &layout)?)
            }
            SplitMode::Unsupported => return Err(Error::InvalidMode),
        };

        debug!(
            split = %split.id,
            origin = %split.origin,
            targets = split.targets.len(),
            mode = ?split.mode,
            "applying split"
        );
        distribute(rows, &split, &index, &shares, &layout)?;
    }

    Ok(())
}

/// Replace attribution ids in `split` with the keys the rows carry.
fn resolve_attribution_keys(attributions: &[AttributionRef], split: &mut Split) {
    for attribution in attributions {
        if attribution.id == split.origin {
            split.origin.clone_from(&attribution.key);
        }
        for target in &mut split.targets {
            if attribution.id == target.id {
                target.id.clone_from(&attribution.key);
            }
        }
    }
}

/// Index the rows holding the origin or a target, and drop split values that
/// do not occur in `rows` (from the index and from the split's targets).
fn index_split_values(
    rows: &[Row],
    split: &mut Split,
    layout: &Layout,
    attribution_group: bool,
) -> Result<SplitIndex> {
    let mut index: SplitIndex = IndexMap::new();
    index.insert(split.origin.clone(), IndexMap::new());
    for target in &split.targets {
        index.insert(target.id.clone(), IndexMap::new());
    }

    for (row_index, row) in rows.iter().enumerate() {
        let value = match layout.split_cell(row)? {
            Cell::String(s) => s.as_str(),
            Cell::Null if attribution_group => UNALLOCATED,
            _ => continue,
        };
        let Some(entries) = index.get_mut(value) else {
            continue;
        };
        let key = row_key_without(row, layout.metric_offset(), layout.split_index)?;
        entries.insert(key, row_index);
    }

    index.retain(|value, entries| {
        if entries.is_empty() {
            debug!(split = %split.id, value = %value, "split value not present in rows");
            false
        } else {
            true
        }
    });
    split.targets.retain(|t| index.contains_key(&t.id));

    Ok(index)
}

/// Per-target shares of one split.
enum Shares {
    /// One ratio per target, applied to every metric.
    Flat(Vec<f64>),
    /// Ratios per target, column combination and metric.
    Proportional(ProportionalRatios),
}

impl Shares {
    fn for_target(&self, position: usize, target: &str, column_key: &str, metrics: usize) -> Vec<f64> {
        match self {
            Self::Flat(ratios) => vec![ratios[position]; metrics],
            Self::Proportional(ratios) => ratios.get(target, column_key, metrics),
        }
    }
}

fn distribute(
    rows: &mut RowSet,
    split: &Split,
    index: &SplitIndex,
    shares: &Shares,
    layout: &Layout,
) -> Result<()> {
    let Some(origin_rows) = index.get(&split.origin) else {
        return Ok(());
    };
    let mut origin_rows: Vec<(&String, usize)> = origin_rows.iter().map(|(k, i)| (k, *i)).collect();
    origin_rows.sort_by_key(|(_, i)| *i);

    let offset = layout.metric_offset();
    let mut removed = vec![false; rows.len()];
    let mut synthesized = RowSet::new();

    for (key, origin_index) in origin_rows {
        let initial = layout.metrics(&rows[origin_index])?;
        let column_key = layout.column_key(&rows[origin_index])?;

        for (position, target) in split.targets.iter().enumerate() {
            let ratios = shares.for_target(position, &target.id, &column_key, layout.metric_count);
            let amounts: Vec<f64> = initial.iter().zip(&ratios).map(|(v, r)| v * r).collect();
            let existing = index.get(&target.id).and_then(|entries| entries.get(key)).copied();

            match existing {
                Some(target_index) if !split.include_origin => {
                    for (m, amount) in amounts.iter().enumerate() {
                        add_metric(&mut rows[target_index], offset + m, *amount)?;
                        add_metric(&mut rows[origin_index], offset + m, -amount)?;
                    }
                }
                existing => {
                    let tag = existing.map(|_| split.origin.as_str());
                    let mut row = synthesize_row(&rows[origin_index], layout, &target.id, tag)?;
                    for (m, amount) in amounts.iter().enumerate() {
                        add_metric(&mut row, offset + m, *amount)?;
                        add_metric(&mut rows[origin_index], offset + m, -amount)?;
                    }
                    synthesized.push(row);
                }
            }
        }

        let remaining = layout.metrics(&rows[origin_index])?;
        if remaining.iter().all(|v| v.abs() <= EMPTY_EPSILON) {
            removed[origin_index] = true;
        }
    }

    let dropped = removed.iter().filter(|r| **r).count();
    debug!(
        split = %split.id,
        synthesized = synthesized.len(),
        dropped,
        "split distributed"
    );

    let kept = std::mem::take(rows)
        .into_iter()
        .zip(removed)
        .filter_map(|(row, removed)| (!removed).then_some(row));
    *rows = kept.chain(synthesized).collect();
    Ok(())
}

fn add_metric(row: &mut Row, index: usize, amount: f64) -> Result<()> {
    let current = metric_at(row, index)?;
    row[index] = Cell::Float(current + amount);
    Ok(())
}

/// A new row for `target` shaped after `origin`.
///
/// Dimension cells are copied, metrics start at zero and trailing cells are
/// null. With `origin_tag`, the cell after the split cell records the origin.
///
/// # Errors
///
/// [`Error::IndexOutOfBounds`] if `origin` is narrower than the dimension cells
/// or the origin tag would land outside them.
pub(crate) fn synthesize_row(
    origin: &[Cell],
    layout: &Layout,
    target: &str,
    origin_tag: Option<&str>,
) -> Result<Row> {
    let offset = layout.metric_offset();
    if origin.len() < offset {
        return Err(Error::IndexOutOfBounds {
            index: offset,
            len: origin.len(),
        });
    }
    let mut row: Row = origin.to_vec();
    for (i, cell) in row.iter_mut().enumerate().skip(offset) {
        *cell = if i < offset + layout.metric_count {
            Cell::Float(0.0)
        } else {
            Cell::Null
        };
    }
    row[layout.split_index] = Cell::from(target);
    if let Some(tag) = origin_tag {
        let tag_index = layout.split_index + 1;
        if tag_index >= offset {
            return Err(Error::IndexOutOfBounds {
                index: tag_index,
                len: offset,
            });
        }
        row[tag_index] = Cell::from(tag);
    }
    Ok(row)
}
