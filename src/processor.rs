//! Limit → split → trend on one row set.
//!
//! [`PostProcessor`] wires the engines in the only supported order. Every stage
//! is optional; a processor without stages returns its input.
//!
//! ```
//! use tallybeam::{row, Dimension, LimitAggregation, LimitConstraint, LimitOrder};
//! use tallybeam::processor::{PostProcessor, ReportLayout};
//! # fn main() -> tallybeam::Result<()> {
//! let layout = ReportLayout::new(vec![Dimension::new("fixed:country", "country")], vec![], 1);
//! let out = PostProcessor::new(layout)
//!     .limits(
//!         vec![LimitConstraint::new("fixed:country", 1, LimitOrder::Desc)],
//!         LimitAggregation::All,
//!         0,
//!     )
//!     .run(vec![row!["US", 5.0], row!["FR", 1.0]])?;
//! assert_eq!(out[1][0], "∑ Other countries".into());
//! # Ok(())
//! # }
//! ```

use crate::cell::RowSet;
use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::limits::{apply_limits, LimitAggregation, LimitConstraint};
use crate::settings::TrendSettings;
use crate::splitting::{check_splits, split, AttributionRef, Split, SplitRequest};
use crate::trend::{detect_with, ExecMode, TimeInterval};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Positional layout of the rows handed to a [`PostProcessor`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportLayout {
    pub row_dimensions: Vec<Dimension>,
    pub col_dimensions: Vec<Dimension>,
    pub metric_count: usize,
}

impl ReportLayout {
    #[must_use]
    pub const fn new(
        row_dimensions: Vec<Dimension>,
        col_dimensions: Vec<Dimension>,
        metric_count: usize,
    ) -> Self {
        Self {
            row_dimensions,
            col_dimensions,
            metric_count,
        }
    }

    /// Cell position of the first metric.
    #[must_use]
    pub fn metric_offset(&self) -> usize {
        self.row_dimensions.len() + self.col_dimensions.len()
    }
}

#[derive(Debug, Clone)]
struct LimitStage {
    constraints: Vec<LimitConstraint>,
    aggregation: LimitAggregation,
    metric: usize,
}

#[derive(Debug, Clone)]
struct SplitStage {
    splits: Vec<Split>,
    attributions: Vec<AttributionRef>,
}

#[derive(Debug, Clone)]
struct TrendStage {
    interval: TimeInterval,
    settings: TrendSettings,
}

/// Runs the configured stages over a row set.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    layout: ReportLayout,
    limits: Option<LimitStage>,
    splits: Option<SplitStage>,
    trend: Option<TrendStage>,
    /// `None` runs the trend stage on [`ExecMode::default`].
    trend_mode: Option<ExecMode>,
}

impl PostProcessor {
    #[must_use]
    pub const fn new(layout: ReportLayout) -> Self {
        Self {
            layout,
            limits: None,
            splits: None,
            trend: None,
            trend_mode: None,
        }
    }

    /// Limit row dimensions, ranking groups by metric number `metric`.
    #[must_use]
    pub fn limits(
        mut self,
        constraints: Vec<LimitConstraint>,
        aggregation: LimitAggregation,
        metric: usize,
    ) -> Self {
        self.limits = Some(LimitStage {
            constraints,
            aggregation,
            metric,
        });
        self
    }

    /// Apply `splits`, resolving attribution ids through `attributions`.
    #[must_use]
    pub fn splits(mut self, splits: Vec<Split>, attributions: Vec<AttributionRef>) -> Self {
        self.splits = Some(SplitStage {
            splits,
            attributions,
        });
        self
    }

    /// Append trend labels with the given thresholds.
    #[must_use]
    pub fn trend(mut self, interval: TimeInterval, settings: TrendSettings) -> Self {
        self.trend = Some(TrendStage { interval, settings });
        self
    }

    /// Classify trends on `mode` instead of the default. May be called before
    /// or after [`trend`](Self::trend).
    #[must_use]
    pub fn trend_mode(mut self, mode: ExecMode) -> Self {
        self.trend_mode = Some(mode);
        self
    }

    /// Run the configured stages.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSplits`] with every validation error when the splits are
    /// inconsistent; otherwise the first error of a stage.
    pub fn run(&self, mut rows: RowSet) -> Result<RowSet> {
        let row_count = self.layout.row_dimensions.len();
        let col_count = self.layout.col_dimensions.len();

        if let Some(stage) = &self.limits {
            debug!(rows = rows.len(), "limit stage");
            rows = apply_limits(
                rows,
                &stage.constraints,
                &self.layout.row_dimensions,
                stage.aggregation,
                self.layout.metric_offset() + stage.metric,
            )?;
        }

        if let Some(stage) = &self.splits {
            check_splits(&stage.splits).map_err(Error::InvalidSplits)?;
            debug!(rows = rows.len(), splits = stage.splits.len(), "split stage");
            let request = SplitRequest {
                splits: stage.splits.clone(),
                dimensions: self
                    .layout
                    .row_dimensions
                    .iter()
                    .chain(&self.layout.col_dimensions)
                    .cloned()
                    .collect(),
                row_count,
                col_count,
                metric_count: self.layout.metric_count,
                attributions: stage.attributions.clone(),
            };
            split(&mut rows, &request)?;
        }

        if let Some(stage) = &self.trend {
            debug!(rows = rows.len(), "trend stage");
            rows = detect_with(
                self.trend_mode.unwrap_or_default(),
                row_count,
                col_count,
                rows,
                stage.interval,
                self.layout.metric_count,
                &stage.settings,
            )?;
        }

        Ok(rows)
    }
}
