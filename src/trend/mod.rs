//! Trend detection over per-key time series.
//!
//! Rows are grouped by their leading row-dimension cells; the metric values of a
//! group, in row order, form its time series. Every series is classified as
//! [`TrendLabel::Increasing`], [`TrendLabel::Decreasing`] or [`TrendLabel::None`]
//! and the label is appended to each row of the group, one label per metric.
//!
//! Classification of one series ([`classify`]):
//! 1. fewer than 3 points, or a range too flat to matter → `none`
//! 2. STL decomposition (multiplicative) when the series spans two full cycles
//! 3. Mann-Kendall test on the trend component, or on the raw series when the
//!    decomposition is not usable
//! 4. the verdict must agree with a least-squares slope at least as steep as
//!    the configured angle
//!
//! ## Example
//! ```
//! use tallybeam::trend::{detect, TimeInterval};
//! use tallybeam::{row, Cell, TrendSettings};
//! # fn main() -> tallybeam::Result<()> {
//! let rows: Vec<_> = (0..12)
//!     .map(|m| row!["project-1", format!("2024-{:02}", m + 1), 10.0 * f64::from(m + 1)])
//!     .collect();
//!
//! let out = detect(1, 1, rows, TimeInterval::Month, 1, &TrendSettings::default())?;
//! assert_eq!(out[0][3], Cell::from("increasing"));
//! # Ok(())
//! # }
//! ```

pub mod mann_kendall;
pub mod regression;
mod runner;
pub mod stl;

pub use mann_kendall::{mann_kendall, MannKendall};
pub use regression::slope_degrees;
pub use runner::ExecMode;
pub use stl::{decompose, Decomposition, Model, StlParams};

use crate::cell::{Cell, Row, RowSet};
use crate::error::{Error, Result};
use crate::row_key::row_key;
use crate::settings::TrendSettings;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Fewest points a series needs to be classified.
pub const MIN_POINTS: usize = 3;

/// Direction of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Increasing,
    Decreasing,
    #[default]
    None,
}

impl TrendLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::None => "none",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TrendLabel> for Cell {
    fn from(label: TrendLabel) -> Self {
        Self::from(label.as_str())
    }
}

/// Granularity of the time dimension of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInterval {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    /// No time interval; the whole series is one cycle.
    #[default]
    #[serde(other)]
    None,
}

impl TimeInterval {
    /// Observations per seasonal cycle, if the interval has a natural cycle.
    #[must_use]
    pub const fn period(self) -> Option<usize> {
        match self {
            Self::Hour => Some(24),
            Self::Day => Some(7),
            Self::Week => Some(52),
            Self::Month => Some(12),
            Self::Quarter => Some(4),
            Self::Year | Self::None => None,
        }
    }

    /// Period used for a series of `len` points, never longer than the series.
    #[must_use]
    pub fn period_for(self, len: usize) -> usize {
        self.period().unwrap_or(len).min(len)
    }
}

impl From<&str> for TimeInterval {
    /// Unknown interval names mean "no interval".
    fn from(s: &str) -> Self {
        match s {
            "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "quarter" => Self::Quarter,
            "year" => Self::Year,
            _ => Self::None,
        }
    }
}

/// Minimum and maximum of `values`, floored to one decimal.
fn floored_range(values: &[f64]) -> (f64, f64) {
    let (mut min, mut max) = (values[0], values[0]);
    for v in values {
        if *v < min {
            min = *v;
        }
        if *v > max {
            max = *v;
        }
    }
    ((min * 10.0).floor() / 10.0, (max * 10.0).floor() / 10.0)
}

/// Whether the range of a series is too narrow to carry a trend.
fn is_flat(values: &[f64], threshold: f64) -> bool {
    let (min, max) = floored_range(values);
    if min.is_nan() || max.is_nan() {
        return true;
    }
    if min > 0.0 && max > 0.0 {
        return max / min - 1.0 < threshold;
    }
    if min < 0.0 && max < 0.0 {
        return min / max - 1.0 < threshold;
    }
    min == 0.0 && max == 0.0
}

/// Classify one time series.
#[must_use]
pub fn classify(values: &[f64], interval: TimeInterval, settings: &TrendSettings) -> TrendLabel {
    if values.len() < MIN_POINTS || is_flat(values, settings.flatness_threshold) {
        return TrendLabel::None;
    }

    let period = interval.period_for(values.len());
    let label = if values.len() >= 2 * period {
        let params = StlParams::new(period, values.len() - 1)
            .inner_iterations(2)
            .robust_iterations(2)
            .model(Model::Multiplicative);
        match decompose(values, &params) {
            Ok(d) if d.trend.iter().all(|v| v.is_finite()) => mann_kendall(&d.trend),
            Ok(_) => mann_kendall(values),
            Err(e) => {
                debug!(error = %e, "decomposition skipped");
                mann_kendall(values)
            }
        }
    } else {
        mann_kendall(values)
    };

    if label == TrendLabel::None {
        return label;
    }
    let angle = slope_degrees(values);
    let disagrees = match label {
        TrendLabel::Increasing => angle < 0.0,
        TrendLabel::Decreasing => angle > 0.0,
        TrendLabel::None => false,
    };
    if angle.abs() < settings.slope_threshold_degrees || disagrees {
        TrendLabel::None
    } else {
        label
    }
}

/// Per-key series of one metric, in first-seen key order.
///
/// A key with a null value anywhere gets an empty series. Series shorter than
/// three quarters of the longest one are emptied too, and the last point of
/// every remaining series is dropped since the latest period is incomplete.
fn collect_series(rows: &[Row], row_count: usize, value_index: usize) -> Result<IndexMap<String, Vec<f64>>> {
    let mut series: IndexMap<String, Vec<f64>> = IndexMap::new();
    let mut blacklist: HashSet<String> = HashSet::new();

    for row in rows {
        let key = row_key(row, row_count)?;
        let cell = row.get(value_index).ok_or(Error::IndexOutOfBounds {
            index: value_index,
            len: row.len(),
        })?;
        let values = series.entry(key.clone()).or_default();
        match cell {
            Cell::Null => {
                blacklist.insert(key);
            }
            #[allow(clippy::cast_precision_loss)]
            Cell::Int(v) => values.push(*v as f64),
            Cell::Float(v) => values.push(*v),
            other => {
                return Err(Error::InvalidType {
                    index: value_index,
                    found: other.type_name(),
                });
            }
        }
    }

    let longest = series.values().map(Vec::len).max().unwrap_or(0);
    let min_len = (longest / 4) * 3;

    for (key, values) in &mut series {
        if blacklist.contains(key) || values.is_empty() || values.len() < min_len {
            values.clear();
        } else {
            values.pop();
        }
    }
    Ok(series)
}

/// Append one trend label per metric to every row.
///
/// `row_count` leading cells identify a series and the following `col_count`
/// cells are its time dimensions. Series are classified on the default
/// [`ExecMode`].
///
/// # Errors
///
/// Fails if a key cell is numeric, a metric cell is not numeric, a position is
/// out of bounds, or the worker pool cannot be started.
pub fn detect(
    row_count: usize,
    col_count: usize,
    rows: RowSet,
    interval: TimeInterval,
    metric_count: usize,
    settings: &TrendSettings,
) -> Result<RowSet> {
    detect_with(
        ExecMode::default(),
        row_count,
        col_count,
        rows,
        interval,
        metric_count,
        settings,
    )
}

/// [`detect`] on an explicit [`ExecMode`].
///
/// # Errors
///
/// Same as [`detect`].
pub fn detect_with(
    mode: ExecMode,
    row_count: usize,
    col_count: usize,
    mut rows: RowSet,
    interval: TimeInterval,
    metric_count: usize,
    settings: &TrendSettings,
) -> Result<RowSet> {
    let mut labels: Vec<HashMap<String, TrendLabel>> = Vec::with_capacity(metric_count);
    for m in 0..metric_count {
        let series = collect_series(&rows, row_count, row_count + col_count + m)?;
        debug!(metric = m, series = series.len(), ?interval, "classifying trends");
        labels.push(mode.classify_all(series, interval, settings)?);
    }

    for row in &mut rows {
        let key = row_key(row, row_count)?;
        for metric_labels in &labels {
            let label = metric_labels.get(&key).copied().unwrap_or_default();
            row.push(label.into());
        }
    }
    Ok(rows)
}
