//! Error type of the flow engine.

use thiserror::Error;

/// Errors raised by the flow engine and flow definitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A step id that is not part of the active flow
    #[error("Step not found: {0}")]
    StepNotFound(String),

    /// An operation that needs a flow in progress was called without one
    #[error("No active flow")]
    NoActiveFlow,

    /// The same step id appears more than once in a flow
    #[error("Duplicate step ID: {0}")]
    DuplicateStep(String),

    /// A flow definition failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),
}
