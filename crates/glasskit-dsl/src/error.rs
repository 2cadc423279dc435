//! Error type of document loading.

use crate::validation::ValidationError;
use glasskit_flow::FlowError;
use std::fmt;
use thiserror::Error;

/// All possible errors that can occur while loading a flow document
#[derive(Error, Debug)]
pub enum DslError {
    /// Errors that occur during YAML parsing
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Errors that occur during JSON parsing
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A single validation error
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// Multiple validation errors
    #[error("{}", MultipleErrorsFormat(.0))]
    MultipleValidationErrors(Vec<ValidationError>),

    /// Unsupported DSL version
    #[error("Unsupported DSL version: {0}")]
    UnsupportedVersion(String),

    /// The compiled flow was rejected by the engine's own checks
    #[error("Invalid flow: {0}")]
    Flow(#[from] FlowError),
}

struct MultipleErrorsFormat<'a>(&'a [ValidationError]);

impl fmt::Display for MultipleErrorsFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multiple validation errors ({} issues):", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, err)?;
        }
        Ok(())
    }
}

impl DslError {
    /// Wrap collected validation errors. Returns `None` when there are none.
    pub fn from_validation_errors(mut errors: Vec<ValidationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop().map(DslError::ValidationError),
            _ => Some(DslError::MultipleValidationErrors(errors)),
        }
    }

    /// Stable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            DslError::YamlError(_) => "ERR_DSL_YAML_PARSE",
            DslError::JsonError(_) => "ERR_DSL_JSON_PARSE",
            DslError::ValidationError(err) => err.code,
            DslError::MultipleValidationErrors(_) => "ERR_DSL_VALIDATION_MULTIPLE",
            DslError::UnsupportedVersion(_) => "ERR_DSL_UNSUPPORTED_VERSION",
            DslError::Flow(_) => "ERR_DSL_INVALID_FLOW",
        }
    }

    /// Every validation error carried by this error
    pub fn validation_errors(&self) -> Vec<&ValidationError> {
        match self {
            DslError::ValidationError(err) => vec![err],
            DslError::MultipleValidationErrors(errs) => errs.iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::error_codes;

    fn err(code: &'static str, message: &str) -> ValidationError {
        ValidationError {
            code,
            message: message.to_string(),
            path: None,
        }
    }

    #[test]
    fn test_from_validation_errors() {
        assert!(DslError::from_validation_errors(Vec::new()).is_none());

        let single = DslError::from_validation_errors(vec![err(error_codes::DUPLICATE_ID, "dup")]).unwrap();
        assert_eq!(single.error_code(), error_codes::DUPLICATE_ID);

        let multiple = DslError::from_validation_errors(vec![
            err(error_codes::DUPLICATE_ID, "dup"),
            err(error_codes::INVALID_REFERENCE, "dangling"),
        ])
        .unwrap();
        assert_eq!(multiple.error_code(), "ERR_DSL_VALIDATION_MULTIPLE");
        assert_eq!(multiple.validation_errors().len(), 2);
        assert!(multiple.to_string().starts_with("Multiple validation errors (2 issues):"));
    }
}
