//! Flow data model.

/// Identifier value objects
pub mod ids;

/// Flow and step definitions
pub mod flow_definition;

/// Accumulated flow data
pub type FlowData = serde_json::Map<String, serde_json::Value>;

/// Shallow-merge `incoming` into `target`. Existing keys are overwritten,
/// nothing is removed.
pub fn merge_data(target: &mut FlowData, incoming: FlowData) {
    for (key, value) in incoming {
        target.insert(key, value);
    }
}
