//! YAML and JSON entry points.

use crate::document::FlowDocument;
use crate::error::DslError;

/// Format version understood by this crate
pub const SUPPORTED_DSL_VERSION: &str = "1.0";

/// Parse a YAML flow document.
///
/// Only the document shape and version are checked here; references are
/// checked by [`crate::validation`].
pub fn parse_flow_document(yaml_str: &str) -> Result<FlowDocument, DslError> {
    let document: FlowDocument = serde_yaml::from_str(yaml_str)?;
    check_version(document)
}

/// Parse a JSON flow document
pub fn parse_flow_document_json(json_str: &str) -> Result<FlowDocument, DslError> {
    let document: FlowDocument = serde_json::from_str(json_str)?;
    check_version(document)
}

fn check_version(document: FlowDocument) -> Result<FlowDocument, DslError> {
    if document.dsl_version != SUPPORTED_DSL_VERSION {
        return Err(DslError::UnsupportedVersion(document.dsl_version));
    }
    Ok(document)
}
