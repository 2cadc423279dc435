//! Structural checks on a flow document.
//!
//! Every problem is collected so authors can fix a document in one pass.

use crate::document::{FlowDocument, NextSpec};
use crate::error::DslError;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

/// A single problem found in a flow document
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error code (one of [`error_codes`])
    pub code: &'static str,

    /// Human-readable error message
    pub message: String,

    /// Location of the problem (e.g., "flow.steps[2].next")
    pub path: Option<String>,
}

impl ValidationError {
    fn at(code: &'static str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl Error for ValidationError {}

/// Validation error codes
pub mod error_codes {
    /// A step id referenced but not declared
    pub const INVALID_REFERENCE: &str = "ERR_DSL_VALIDATION_INVALID_REFERENCE";

    /// The same step id declared twice
    pub const DUPLICATE_ID: &str = "ERR_DSL_VALIDATION_DUPLICATE_ID";

    /// A required value is empty
    pub const MISSING_REQUIRED_FIELD: &str = "ERR_DSL_VALIDATION_MISSING_REQUIRED_FIELD";

    /// A branch condition without any predicate
    pub const EMPTY_CONDITION: &str = "ERR_DSL_VALIDATION_EMPTY_CONDITION";
}

/// Validate a parsed flow document
pub fn validate_document(document: &FlowDocument) -> Result<(), DslError> {
    match DslError::from_validation_errors(collect_errors(document)) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every problem in the document, in document order
pub fn collect_errors(document: &FlowDocument) -> Vec<ValidationError> {
    let flow = &document.flow;
    let mut errors = Vec::new();

    if flow.id.trim().is_empty() {
        errors.push(ValidationError::at(
            error_codes::MISSING_REQUIRED_FIELD,
            "Flow id must not be empty",
            "flow.id",
        ));
    }
    if flow.steps.is_empty() {
        errors.push(ValidationError::at(
            error_codes::MISSING_REQUIRED_FIELD,
            "Flow must have at least one step",
            "flow.steps",
        ));
    }

    let mut declared = HashSet::new();
    for (i, step) in flow.steps.iter().enumerate() {
        if step.id.trim().is_empty() {
            errors.push(ValidationError::at(
                error_codes::MISSING_REQUIRED_FIELD,
                "Step id must not be empty",
                format!("flow.steps[{}].id", i),
            ));
        } else if !declared.insert(step.id.as_str()) {
            errors.push(ValidationError::at(
                error_codes::DUPLICATE_ID,
                format!("Duplicate step ID: {}", step.id),
                format!("flow.steps[{}].id", i),
            ));
        }
    }

    if !flow.steps.is_empty() && !declared.contains(flow.initial_step.as_str()) {
        errors.push(ValidationError::at(
            error_codes::INVALID_REFERENCE,
            format!("Initial step {} is not declared", flow.initial_step),
            "flow.initial_step",
        ));
    }

    let check_target = |target: &str, path: String, errors: &mut Vec<ValidationError>| {
        if !declared.contains(target) {
            errors.push(ValidationError::at(
                error_codes::INVALID_REFERENCE,
                format!("Step {} is not declared", target),
                path,
            ));
        }
    };

    for (i, step) in flow.steps.iter().enumerate() {
        match &step.next {
            None => {}
            Some(NextSpec::Step(target)) => {
                check_target(target, format!("flow.steps[{}].next", i), &mut errors);
            }
            Some(NextSpec::Branching { branches, otherwise }) => {
                for (b, branch) in branches.iter().enumerate() {
                    let path = format!("flow.steps[{}].next.branches[{}]", i, b);
                    if branch.when.key.trim().is_empty() {
                        errors.push(ValidationError::at(
                            error_codes::MISSING_REQUIRED_FIELD,
                            "Branch condition key must not be empty",
                            format!("{}.when.key", path),
                        ));
                    }
                    if branch.when.is_empty() {
                        errors.push(ValidationError::at(
                            error_codes::EMPTY_CONDITION,
                            "Branch condition needs one of equals, not_equals, one_of or exists",
                            format!("{}.when", path),
                        ));
                    }
                    check_target(&branch.goto, format!("{}.goto", path), &mut errors);
                }
                check_target(otherwise, format!("flow.steps[{}].next.otherwise", i), &mut errors);
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BranchSpec, ConditionSpec, FlowSpec, StepSpec};

    fn step(id: &str, next: Option<NextSpec>) -> StepSpec {
        StepSpec {
            id: id.to_string(),
            component: "C".to_string(),
            props: None,
            next,
        }
    }

    fn document(steps: Vec<StepSpec>) -> FlowDocument {
        FlowDocument {
            dsl_version: "1.0".to_string(),
            flow: FlowSpec {
                id: "f".to_string(),
                name: "F".to_string(),
                initial_step: "a".to_string(),
                steps,
            },
        }
    }

    #[test]
    fn test_valid_document() {
        let doc = document(vec![
            step("a", Some(NextSpec::Step("b".into()))),
            step("b", None),
        ]);
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let doc = document(vec![
            step("a", Some(NextSpec::Step("ghost".into()))),
            step("a", None),
            step(
                "c",
                Some(NextSpec::Branching {
                    branches: vec![BranchSpec {
                        when: ConditionSpec {
                            key: "k".into(),
                            ..Default::default()
                        },
                        goto: "nowhere".into(),
                    }],
                    otherwise: "a".into(),
                }),
            ),
        ]);

        let codes: Vec<&str> = collect_errors(&doc).iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![
                error_codes::DUPLICATE_ID,
                error_codes::INVALID_REFERENCE,
                error_codes::EMPTY_CONDITION,
                error_codes::INVALID_REFERENCE,
            ]
        );
        assert!(matches!(
            validate_document(&doc),
            Err(DslError::MultipleValidationErrors(errs)) if errs.len() == 4
        ));
    }

    #[test]
    fn test_missing_initial_step() {
        let mut doc = document(vec![step("b", None)]);
        doc.flow.initial_step = "a".into();
        let errors = collect_errors(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.as_deref(), Some("flow.initial_step"));
        assert_eq!(
            errors[0].to_string(),
            "ERR_DSL_VALIDATION_INVALID_REFERENCE: Initial step a is not declared (at flow.initial_step)"
        );
    }

    #[test]
    fn test_empty_flow() {
        let errors = collect_errors(&document(Vec::new()));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, error_codes::MISSING_REQUIRED_FIELD);
    }
}
