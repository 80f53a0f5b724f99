//! Error types for attrdoc operations.
//!
//! These are internal, typed failures. Facades never return them directly:
//! they are wrapped into [`Diagnostic`](crate::Diagnostic)s before reaching
//! the caller.

use crate::{Path, Step};
use thiserror::Error;

/// Result type alias for attrdoc operations.
pub type AttrResult<T> = Result<T, AttrError>;

/// Errors that can occur while walking, transforming or converting values.
#[derive(Debug, Error)]
pub enum AttrError {
    /// A path step could not be applied to the node it was aimed at.
    #[error("cannot apply {} step {step} at {path}: {reason} ({remaining} step(s) still remain in the path)", .step.kind())]
    StepFailed {
        /// The path consumed before the failing step.
        path: Path,
        /// The step that failed.
        step: Step,
        /// How many steps, including the failing one, were not consumed.
        remaining: usize,
        /// Why the step failed.
        reason: String,
    },

    /// A value's type does not match the type expected at a path.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path where the mismatch occurred.
        path: Path,
        /// The expected type.
        expected: String,
        /// The actual type found.
        found: String,
    },

    /// A payload disagrees with its declared wire type.
    #[error("invalid value at {path}: {message}")]
    InvalidValue {
        /// Path of the offending node, relative to the value being built.
        path: Path,
        /// Description of what went wrong.
        message: String,
    },

    /// Conversion between wire and host representations failed.
    #[error("{message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// The execution context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// JSON encoding/decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AttrError {
    /// Create a step failure error.
    #[inline]
    pub fn step_failed(path: Path, step: Step, remaining: usize, reason: impl Into<String>) -> Self {
        AttrError::StepFailed {
            path,
            step,
            remaining,
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(path: Path, expected: impl ToString, found: impl ToString) -> Self {
        AttrError::TypeMismatch {
            path,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create an invalid value error.
    #[inline]
    pub fn invalid_value(path: Path, message: impl Into<String>) -> Self {
        AttrError::InvalidValue {
            path,
            message: message.into(),
        }
    }

    /// Create a conversion error.
    #[inline]
    pub fn conversion(message: impl Into<String>) -> Self {
        AttrError::Conversion {
            message: message.into(),
        }
    }

    /// Number of trailing path steps that could not be consumed, if known.
    pub fn remaining(&self) -> Option<usize> {
        match self {
            AttrError::StepFailed { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }

    /// Add a path prefix to this error.
    ///
    /// Used when a nested value is built or checked in isolation and the
    /// error must be attributed to its location in the enclosing tree.
    pub fn with_prefix(self, prefix: &Path) -> Self {
        match self {
            AttrError::StepFailed {
                path,
                step,
                remaining,
                reason,
            } => AttrError::StepFailed {
                path: prefix.join(&path),
                step,
                remaining,
                reason,
            },
            AttrError::TypeMismatch {
                path,
                expected,
                found,
            } => AttrError::TypeMismatch {
                path: prefix.join(&path),
                expected,
                found,
            },
            AttrError::InvalidValue { path, message } => AttrError::InvalidValue {
                path: prefix.join(&path),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn test_error_display() {
        let err = AttrError::step_failed(path!("users"), Step::index(3), 2, "index out of range");
        let text = err.to_string();
        assert!(text.contains("list index step [3] at $.users"));
        assert!(text.contains("2 step(s) still remain"));
        assert_eq!(err.remaining(), Some(2));
    }

    #[test]
    fn test_with_prefix() {
        let err = AttrError::type_mismatch(path!("city"), "String", "Bool");
        match err.with_prefix(&path!("address")) {
            AttrError::TypeMismatch { path, .. } => assert_eq!(path, path!("address", "city")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_with_prefix_leaves_pathless_errors() {
        let err = AttrError::conversion("boom").with_prefix(&path!("a"));
        assert!(matches!(err, AttrError::Conversion { .. }));
        assert_eq!(err.remaining(), None);
    }
}
