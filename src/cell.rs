//! The positional row model shared by every engine.
//!
//! A [`Row`] is `[ row dimensions | column dimensions | metrics | trailing labels ]`.
//! Cells do not carry names; a cell's meaning is its position, so every engine
//! that rewrites or synthesizes a row keeps its width and layout.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar value in a result row.
///
/// Serialized untagged, so a row reads and writes as a plain JSON array such as
/// `["US", "compute", null, 12.5]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// One result row.
pub type Row = Vec<Cell>;

/// An ordered set of result rows.
pub type RowSet = Vec<Row>;

impl Cell {
    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string payload, if this is a string cell.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of a metric cell.
    ///
    /// Floats and integers convert, null reads as `0.0`. Strings and booleans are
    /// not metrics and yield `None`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_metric(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Null => Some(0.0),
            Self::Bool(_) | Self::String(_) => None,
        }
    }
}

/// Read the metric at `index` of `row`.
///
/// # Errors
///
/// [`Error::IndexOutOfBounds`] if the row is too short, [`Error::InvalidType`]
/// if the cell is not numeric.
pub fn metric_at(row: &[Cell], index: usize) -> Result<f64> {
    let cell = row.get(index).ok_or(Error::IndexOutOfBounds {
        index,
        len: row.len(),
    })?;
    cell.as_metric().ok_or(Error::InvalidType {
        index,
        found: cell.type_name(),
    })
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Build a [`Row`] from heterogeneous values.
///
/// ```
/// use tallybeam::{row, Cell};
///
/// let r = row!["US", "compute", 12.5];
/// assert_eq!(r[2], Cell::Float(12.5));
/// ```
#[macro_export]
macro_rules! row {
    () => { ::std::vec::Vec::<$crate::Cell>::new() };
    ($($cell:expr),+ $(,)?) => {
        ::std::vec![$($crate::Cell::from($cell)),+]
    };
}
