//! Error taxonomy shared by the limit, split and trend engines.
//!
//! Every engine returns [`Result`]; nothing is logged-and-swallowed. The split
//! graph rules produce structured [`ValidationError`]s so a caller can report
//! every configuration problem of a request at once.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while post-processing a row set.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A key or metric position lies outside the row.
    #[error("index {index} out of bounds for row of width {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A cell could not be used where it was read (key or metric).
    #[error("invalid cell type at index {index}: {found}")]
    InvalidType { index: usize, found: &'static str },

    /// A split declared a dimension kind that does not take part in splitting.
    #[error("invalid split type")]
    InvalidSplitType,

    /// A split declared a distribution mode that is not supported.
    #[error("invalid split mode")]
    InvalidMode,

    /// The split dimension is not part of the row layout.
    #[error("split dimension {0:?} is not part of the row layout")]
    InvalidIndex(String),

    /// `split` was called without any split.
    #[error("no splitting defined")]
    NoSplitsDefined,

    /// One rule of the split graph was violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Split validation failed before execution; carries every collected error.
    #[error("{} invalid split(s): {}", .0.len(), join_errors(.0))]
    InvalidSplits(Vec<Error>),

    /// A series could not be decomposed into seasonal and trend components.
    #[error("decomposition failed: {0}")]
    Decomposition(String),

    /// The trend worker pool could not be started.
    #[error("failed to start trend worker pool: {0}")]
    WorkerPool(String),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which rule of the split graph a [`ValidationError`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// The same id is the origin of more than one split.
    OriginDuplicated,
    /// A split lists its own origin among its targets.
    OriginIsTarget,
    /// Two splits route value into each other's origin.
    CircularDependency,
}

impl ValidationErrorKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::OriginDuplicated => "origin_duplicated",
            Self::OriginIsTarget => "origin_is_target",
            Self::CircularDependency => "circular_dependency",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violated split graph rule.
///
/// `group_id` is the split (attribution group) the problem belongs to and
/// `member_id` the attribution that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("{kind} in {group_id}: {member_id}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub group_id: String,
    pub member_id: String,
}

impl ValidationError {
    pub fn new<G: Into<String>, M: Into<String>>(
        kind: ValidationErrorKind,
        group_id: G,
        member_id: M,
    ) -> Self {
        Self {
            kind,
            group_id: group_id.into(),
            member_id: member_id.into(),
        }
    }
}
