//! Error taxonomy of the configuration loader.
//!
//! Loading either yields a fully valid [`Config`](crate::Config) or fails
//! with one of the variants below before any training or inference code
//! observes the value. Nothing is retried.

use crate::common::*;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not well-formed JSONC.
    #[error("malformed configuration document: {0}")]
    Parse(#[from] json5::Error),

    /// A single value violates the schema: missing required key, wrong
    /// type, unknown keyword or a value outside its documented range.
    #[error("invalid value at `{path}`: {reason}")]
    Validation {
        path: String,
        reason: ValidationReason,
    },

    /// Two or more fields contradict each other, e.g. `resnet_model`
    /// selecting a parameter block that is absent from the document.
    #[error("inconsistent configuration at `{path}`: {message}")]
    Consistency { path: String, message: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationReason {
    #[error("required key is missing")]
    MissingKey,

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} violates constraint: {constraint}")]
    OutOfRange { constraint: String, value: String },

    #[error("unknown keyword \"{value}\", allowed values: {}", .allowed.join(", "))]
    UnknownKeyword {
        allowed: &'static [&'static str],
        value: String,
    },
}

impl ConfigError {
    /// Dot-separated path of the offending key, when the error points at one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Validation { path, .. } | Self::Consistency { path, .. } => Some(path),
            Self::Io(_) | Self::Parse(_) => None,
        }
    }

    pub(crate) fn missing(path: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            reason: ValidationReason::MissingKey,
        }
    }

    pub(crate) fn type_mismatch(
        path: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::Validation {
            path: path.into(),
            reason: ValidationReason::TypeMismatch { expected, found },
        }
    }

    pub(crate) fn out_of_range(
        path: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Display,
    ) -> Self {
        Self::Validation {
            path: path.into(),
            reason: ValidationReason::OutOfRange {
                constraint: constraint.into(),
                value: value.to_string(),
            },
        }
    }

    pub(crate) fn unknown_keyword(
        path: impl Into<String>,
        allowed: &'static [&'static str],
        value: impl Into<String>,
    ) -> Self {
        Self::Validation {
            path: path.into(),
            reason: ValidationReason::UnknownKeyword {
                allowed,
                value: value.into(),
            },
        }
    }

    pub(crate) fn inconsistent(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Consistency {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_names_the_key_path() {
        let err = ConfigError::missing("training.model.name");
        assert_eq!(err.path(), Some("training.model.name"));
        assert!(err.to_string().contains("training.model.name"));
        assert!(err.to_string().contains("required key is missing"));
    }

    #[test]
    fn type_mismatch_reports_expected_and_actual() {
        let err = ConfigError::type_mismatch("training.general.batch_size", "a positive integer", "a string");
        let text = err.to_string();
        assert!(text.contains("expected a positive integer"));
        assert!(text.contains("found a string"));
    }

    #[test]
    fn unknown_keyword_lists_allowed_values() {
        let err = ConfigError::unknown_keyword("training.optimizer.name", &["adam", "sgd"], "adamax");
        let text = err.to_string();
        assert!(text.contains("adamax"));
        assert!(text.contains("adam, sgd"));
    }

    #[test]
    fn consistency_carries_path_and_message() {
        let err = ConfigError::inconsistent("training.model.resnet50_params", "selected but absent");
        assert_eq!(err.path(), Some("training.model.resnet50_params"));
        assert!(err.to_string().contains("selected but absent"));
    }
}
