//! Serde model of a flow document.

use glasskit_flow::FlowData;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level flow document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    /// Document format version, currently "1.0"
    pub dsl_version: String,
    /// The flow definition
    pub flow: FlowSpec,
}

/// Flow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSpec {
    /// Flow id
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Step entered on start
    pub initial_step: String,
    /// Steps, in declaration order
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// Step definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    /// Step id
    pub id: String,
    /// Component the host renders
    pub component: String,
    /// Renderer props
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
    /// Outgoing edge; absent for terminal steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NextSpec>,
}

/// Outgoing edge of a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextSpec {
    /// Fixed target step
    Step(String),
    /// Data-dependent target
    Branching {
        /// Checked in order; the first match wins
        branches: Vec<BranchSpec>,
        /// Target when no branch matches
        otherwise: String,
    },
}

/// One conditional branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchSpec {
    /// Condition on the flow data
    pub when: ConditionSpec,
    /// Target step when the condition holds
    pub goto: String,
}

/// Condition on a single flow data key.
///
/// Every predicate that is set must hold. A JSON `null` predicate value is
/// treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    /// Flow data key
    pub key: String,
    /// Value must equal this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
    /// Value must differ from this (a missing key differs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_equals: Option<Value>,
    /// Value must be one of these
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    /// Whether the key must be present with a non-null value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

impl ConditionSpec {
    /// Whether no predicate is set
    pub fn is_empty(&self) -> bool {
        self.equals.is_none() && self.not_equals.is_none() && self.one_of.is_none() && self.exists.is_none()
    }

    /// Evaluate against flow data
    pub fn matches(&self, data: &FlowData) -> bool {
        let value = data.get(&self.key).filter(|v| !v.is_null());

        if let Some(expected) = &self.equals {
            if value != Some(expected) {
                return false;
            }
        }
        if let Some(unexpected) = &self.not_equals {
            if value == Some(unexpected) {
                return false;
            }
        }
        if let Some(allowed) = &self.one_of {
            if !value.map_or(false, |v| allowed.contains(v)) {
                return false;
            }
        }
        if let Some(exists) = self.exists {
            if value.is_some() != exists {
                return false;
            }
        }
        true
    }
}
