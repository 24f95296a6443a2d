//! Testing utilities for post-processing code.
//!
//! - **Assertions**: compare row sets (ordered or not, with float tolerance),
//!   check metric totals and trend labels
//! - **Builders**: assemble rows and time series fluently
//! - **Fixtures**: small report-shaped datasets used across the test suite
//!
//! # Quick Start
//!
//! ```
//! use tallybeam::testing::*;
//! use tallybeam::limits::{apply_limits, LimitAggregation, LimitConstraint, LimitOrder};
//!
//! # fn main() -> anyhow::Result<()> {
//! let fixture = country_service_costs();
//! let limits = vec![LimitConstraint::new("fixed:country", 2, LimitOrder::Desc)];
//! let out = apply_limits(
//!     fixture.rows.clone(),
//!     &limits,
//!     &fixture.row_dimensions,
//!     LimitAggregation::Top,
//!     fixture.metric_index(0),
//! )?;
//!
//! assert_metric_total(&out, fixture.metric_index(0), 112.0);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;

/// Tolerance used by the float-aware assertions.
pub const EPSILON: f64 = 1e-9;
