//! Validation utilities for prediction inputs

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

/// Collapse internal whitespace runs to a single space and trim the ends
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build a validation error with a human-readable message
pub fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Record a range error when `value` is outside `[min, max]` or not a number
pub fn check_range(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !(min..=max).contains(&value) {
        let mut err = ValidationError::new("range");
        err.message = Some(Cow::Owned(format!("Must be between {} and {}", min, max)));
        err.add_param(Cow::Borrowed("value"), &value);
        errors.add(field, err);
    }
}
