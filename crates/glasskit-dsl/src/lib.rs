//! Glasskit DSL
//!
//! Declarative flow definitions in YAML or JSON. A document is parsed,
//! validated (reporting every problem at once) and compiled into a
//! [`glasskit_flow::Flow`], with `branches` turned into dynamic edges.
//!
//! ```yaml
//! dsl_version: "1.0"
//! flow:
//!   id: onboarding
//!   name: Onboarding
//!   initial_step: welcome
//!   steps:
//!     - id: welcome
//!       component: WelcomeCard
//!       next: plan
//!     - id: plan
//!       component: PlanPicker
//!       next:
//!         branches:
//!           - when: { key: plan, equals: pro }
//!             goto: billing
//!         otherwise: done
//!     - id: billing
//!       component: BillingForm
//!       next: done
//!     - id: done
//!       component: Finished
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod compile;
pub mod document;
pub mod error;
pub mod parser;
pub mod validation;

pub use compile::compile_flow;
pub use document::{BranchSpec, ConditionSpec, FlowDocument, FlowSpec, NextSpec, StepSpec};
pub use error::DslError;
pub use parser::{parse_flow_document, parse_flow_document_json, SUPPORTED_DSL_VERSION};
pub use validation::{collect_errors, validate_document, ValidationError};

use glasskit_flow::Flow;

/// Parse, validate and compile a YAML flow document
pub fn load_flow(yaml_str: &str) -> Result<Flow, DslError> {
    build(parse_flow_document(yaml_str)?)
}

/// Parse, validate and compile a JSON flow document
pub fn load_flow_json(json_str: &str) -> Result<Flow, DslError> {
    build(parse_flow_document_json(json_str)?)
}

fn build(document: FlowDocument) -> Result<Flow, DslError> {
    validate_document(&document)?;
    let flow = compile_flow(&document);
    flow.validate()?;
    Ok(flow)
}

/// Version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
