//! Row identity used to group and match rows in every engine.
//!
//! Only string, bool and null cells are key components. A null cell renders as
//! [`NULL_KEY`] so it never collides with an empty string, and components are
//! separated by [`KEY_SEPARATOR`] so `("ab", "c")` and `("a", "bc")` differ.

use crate::cell::Cell;
use crate::error::{Error, Result};

/// Token a null cell contributes to a key.
pub const NULL_KEY: &str = "<nil>";

/// Separator placed between key components.
pub const KEY_SEPARATOR: char = '\u{1f}';

fn push_component(key: &mut String, cell: &Cell, index: usize) -> Result<()> {
    match cell {
        Cell::String(s) => key.push_str(s),
        Cell::Bool(true) => key.push_str("true"),
        Cell::Bool(false) => key.push_str("false"),
        Cell::Null => key.push_str(NULL_KEY),
        other => {
            return Err(Error::InvalidType {
                index,
                found: other.type_name(),
            });
        }
    }
    Ok(())
}

/// Key of the first `n` cells of `row`.
///
/// # Errors
///
/// [`Error::IndexOutOfBounds`] if `n` exceeds the row width,
/// [`Error::InvalidType`] if one of the cells is numeric.
pub fn row_key(row: &[Cell], n: usize) -> Result<String> {
    if n > row.len() {
        return Err(Error::IndexOutOfBounds {
            index: n,
            len: row.len(),
        });
    }
    let mut key = String::new();
    for (index, cell) in row[..n].iter().enumerate() {
        if index > 0 {
            key.push(KEY_SEPARATOR);
        }
        push_component(&mut key, cell, index)?;
    }
    Ok(key)
}

/// Key of the single cell at `index`.
///
/// # Errors
///
/// Same as [`row_key`].
pub fn cell_key(row: &[Cell], index: usize) -> Result<String> {
    let cell = row.get(index).ok_or(Error::IndexOutOfBounds {
        index,
        len: row.len(),
    })?;
    let mut key = String::new();
    push_component(&mut key, cell, index)?;
    Ok(key)
}

/// Key of the first `n` cells of `row`, leaving out the cell at `skip`.
///
/// Used by the split engine to match an origin row with its target rows: they
/// agree on every dimension except the split dimension.
///
/// # Errors
///
/// Same as [`row_key`].
pub fn row_key_without(row: &[Cell], n: usize, skip: usize) -> Result<String> {
    if n > row.len() {
        return Err(Error::IndexOutOfBounds {
            index: n,
            len: row.len(),
        });
    }
    let mut key = String::new();
    let mut first = true;
    for (index, cell) in row[..n].iter().enumerate() {
        if index == skip {
            continue;
        }
        if !first {
            key.push(KEY_SEPARATOR);
        }
        first = false;
        push_component(&mut key, cell, index)?;
    }
    Ok(key)
}
