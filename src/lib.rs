//! # Tallybeam
//!
//! A **report post-processing engine** for tabular analytics results. Tallybeam
//! takes the row set a query layer produced and reshapes it before it is shown:
//! it limits dimensions to their top groups, redistributes metric values between
//! dimension values, and labels every time series with its trend.
//!
//! ## Key Features
//!
//! - **Hierarchical Top-N limits** - keep the top groups per dimension level and
//!   fold the rest into `∑ Other <plural>` groups
//! - **Metric splitting** - move an origin's value into targets (even, custom or
//!   proportional shares) while conserving totals
//! - **Split validation** - report duplicated origins, self-targets and cycles
//!   before any row is touched
//! - **Trend detection** - STL decomposition, Mann-Kendall test and a regression
//!   slope check, classified in parallel with Rayon
//! - **Live trend settings** - versioned threshold snapshots fed by a settings
//!   document stream
//!
//! ## Quick Start
//!
//! ```
//! use tallybeam::*;
//! use tallybeam::processor::{PostProcessor, ReportLayout};
//!
//! # fn main() -> tallybeam::Result<()> {
//! let layout = ReportLayout::new(
//!     vec![
//!         Dimension::new("fixed:country", "country"),
//!         Dimension::new("fixed:service_description", "service_description"),
//!     ],
//!     vec![],
//!     1,
//! );
//!
//! let rows = vec![
//!     row!["US", "Compute Engine", 70.0],
//!     row!["US", "Cloud Storage", 30.0],
//!     row!["FR", "Compute Engine", 10.0],
//!     row!["DE", "Compute Engine", 2.0],
//! ];
//!
//! let out = PostProcessor::new(layout)
//!     .limits(
//!         vec![LimitConstraint::new("fixed:country", 2, LimitOrder::Desc)],
//!         LimitAggregation::Top,
//!         0,
//!     )
//!     .run(rows)?;
//!
//! assert_eq!(out[3][0], Cell::from("∑ Other countries"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Rows
//!
//! A [`Row`] is a positional vector of [`Cell`]s laid out as
//! `[ row dimensions | column dimensions | metrics | trailing labels ]`. Engines
//! never reorder cells within a row; synthesized rows keep the width of their
//! siblings. A [`RowKey`](row_key) built from the leading dimension cells
//! identifies a row across engines.
//!
//! ### Engines
//!
//! - [`limits`] - [`apply_limits`] ranks and cuts groups level by level
//! - [`splitting`] - [`split`](splitting::split) moves metric value between
//!   dimension values; [`validate_splits`](splitting::validate_splits) checks a
//!   request first
//! - [`trend`] - [`detect`](trend::detect) appends one trend label per metric
//!
//! Engines can be used one by one. [`processor::PostProcessor`] runs them in the
//! supported order (limit, then split, then trend).
//!
//! ### Execution Modes
//!
//! Trend classification runs on a bounded Rayon pool when the `parallel-trend`
//! feature is enabled (the default) and sequentially otherwise; see
//! [`trend::ExecMode`]. Limits and splits are single-threaded and deterministic.
//!
//! ## Errors
//!
//! Every engine returns [`Result`] with the crate [`Error`]. Split validation
//! collects all problems of a request; see [`ValidationError`].
//!
//! ## Testing
//!
//! The [`testing`] module provides row builders, fixtures and row set
//! assertions used by the crate's own test suite.

pub mod cell;
pub mod dimension;
pub mod error;
pub mod limits;
pub mod processor;
pub mod row_key;
pub mod settings;
pub mod splitting;
pub mod testing;
pub mod trend;

pub use cell::{metric_at, Cell, Row, RowSet};
pub use dimension::{Dimension, FieldType};
pub use error::{Error, Result, ValidationError, ValidationErrorKind};
pub use limits::{apply_limits, LimitAggregation, LimitConstraint, LimitOrder};
pub use row_key::{cell_key, row_key};
pub use settings::{TrendSettings, TrendSettingsStore, TrendSnapshot};
pub use splitting::{Split, SplitMode, SplitRequest, SplitTarget};
pub use trend::{TimeInterval, TrendLabel};
