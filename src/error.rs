//! Error types for field mutation and model validation.
//!
//! Recoverable failures (malformed text commands, unsupported commands,
//! bad configuration, cyclic wiring) are represented by the `FieldError`
//! enum. Range rejections are not errors; they surface as
//! [`Outcome::Rejected`](crate::Outcome). Wiring bugs panic.

use crate::field_id::FieldId;
use thiserror::Error;

/// Format a cycle path as a readable string.
pub(crate) fn format_cycle_path(path: &[FieldId]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur while mutating or validating a cost model.
///
/// # Examples
///
/// ```rust
/// use sfxcost::{FieldError, FieldId};
///
/// let err = FieldError::Parse {
///     field: FieldId::from_str("Effect"),
///     input: "three".to_string(),
///     reason: "expected an integer".to_string(),
/// };
/// assert!(err.to_string().contains("Effect"));
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    /// Text input did not match the field's command grammar.
    ///
    /// The field is left untouched.
    #[error("Cannot parse {input:?} for field {field}: {reason}")]
    Parse {
        field: FieldId,
        input: String,
        reason: String,
    },

    /// A well-formed command was sent to a field that has no use for it.
    #[error("Field {field} does not accept command {command}")]
    UnsupportedCommand { field: FieldId, command: String },

    /// A dependency cycle was detected in the field graph.
    ///
    /// Contains the path of fields involved in the cycle, closed so that
    /// the first and last entries are the same field.
    #[error("Cycle detected: {}", format_cycle_path(.path))]
    Cycle { path: Vec<FieldId> },

    /// Model configuration could not be loaded.
    #[error("Invalid model configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = FieldError::Parse {
            field: FieldId::from_str("Charges"),
            input: "ten yes".to_string(),
            reason: "expected a number".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("Charges"));
        assert!(display.contains("ten yes"));
    }

    #[test]
    fn test_cycle_error_display() {
        let a = FieldId::from_str("A");
        let b = FieldId::from_str("B");
        let err = FieldError::Cycle {
            path: vec![a.clone(), b.clone(), a.clone()],
        };
        let display = err.to_string();
        assert!(display.contains("Cycle detected"));
        assert!(display.contains("A -> B -> A"));
    }

    #[test]
    fn test_empty_cycle_path() {
        assert_eq!(format_cycle_path(&[]), "(empty cycle)");
    }
}
