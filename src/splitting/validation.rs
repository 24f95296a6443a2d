//! Consistency rules of a split request.
//!
//! Splits are checked as a graph of `origin → targets` edges before any row is
//! touched. Every violated rule is collected, so a caller can report all of
//! them at once:
//!
//! - every split must be an attribution-group split (checked first; an invalid
//!   type stops validation)
//! - an id may be the origin of at most one split
//! - a split may not list its origin among its targets
//! - two splits may not feed each other's origin
//!
//! # Example
//!
//! ```
//! use tallybeam::splitting::{validate_splits, Split, SplitMode, SplitTarget};
//! use tallybeam::FieldType;
//!
//! let split = Split {
//!     id: "attribution_group:teams".into(),
//!     origin: "a".into(),
//!     field_type: FieldType::AttributionGroup,
//!     mode: SplitMode::Even,
//!     include_origin: false,
//!     targets: vec![SplitTarget::new("a", 0.0)],
//! };
//! assert_eq!(validate_splits(&[split]).len(), 1);
//! ```

use super::Split;
use crate::dimension::FieldType;
use crate::error::{Error, ValidationError, ValidationErrorKind};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Result type for split validation.
pub type ValidationResult = Result<(), Vec<Error>>;

/// Types whose configuration can be checked before use.
pub trait Validate {
    /// Validate this instance and return every problem found.
    fn validate(&self) -> ValidationResult;
}

impl Validate for [Split] {
    fn validate(&self) -> ValidationResult {
        check_splits(self)
    }
}

impl Validate for Split {
    fn validate(&self) -> ValidationResult {
        check_splits(std::slice::from_ref(self))
    }
}

/// Every rule violated by `splits`, in discovery order.
#[must_use]
pub fn validate_splits(splits: &[Split]) -> Vec<Error> {
    let mut errors = Vec::new();
    let mut targets_by_origin: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    // origin → id of the first split that declared it
    let mut group_of: HashMap<&str, &str> = HashMap::new();

    for split in splits {
        if split.field_type != FieldType::AttributionGroup {
            errors.push(Error::InvalidSplitType);
            return errors;
        }

        let origin = split.origin.as_str();
        if targets_by_origin.contains_key(origin) {
            errors.push(
                ValidationError::new(ValidationErrorKind::OriginDuplicated, &split.id, origin)
                    .into(),
            );
        }
        let group = *group_of.entry(origin).or_insert(split.id.as_str());

        let mut targets = IndexSet::new();
        for target in &split.targets {
            if target.id == origin {
                errors.push(
                    ValidationError::new(ValidationErrorKind::OriginIsTarget, group, origin)
                        .into(),
                );
            }
            targets.insert(target.id.as_str());
        }
        targets_by_origin.insert(origin, targets);
    }

    for (origin, targets) in &targets_by_origin {
        for target in targets {
            if target == origin {
                continue;
            }
            let feeds_back = targets_by_origin
                .get(target)
                .is_some_and(|back| back.contains(origin));
            if feeds_back {
                errors.push(
                    ValidationError::new(
                        ValidationErrorKind::CircularDependency,
                        group_of[origin],
                        *target,
                    )
                    .into(),
                );
            }
        }
    }

    errors
}

/// [`validate_splits`] as a result.
///
/// # Errors
///
/// Every violated rule, if any.
pub fn check_splits(splits: &[Split]) -> ValidationResult {
    let errors = validate_splits(splits);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
