//! Flow fixtures.

use glasskit_flow::{Flow, FlowData, FlowStep, StepId};
use serde_json::{json, Value};
use std::sync::Arc;

/// `a -> b -> c`, with `c` terminal
pub fn linear_flow() -> Arc<Flow> {
    Arc::new(
        Flow::new("linear", "Linear flow", "a")
            .with_step(FlowStep::new("a", "StepA").then("b"))
            .with_step(FlowStep::new("b", "StepB").then("c"))
            .with_step(FlowStep::new("c", "StepC")),
    )
}

/// `q` branches to `y` when `answer == "yes"`, otherwise to `n`
pub fn conditional_flow() -> Arc<Flow> {
    Arc::new(
        Flow::new("conditional", "Conditional flow", "q")
            .with_step(FlowStep::new("q", "Question").then_with(|data| {
                if data.get("answer") == Some(&json!("yes")) {
                    StepId::from("y")
                } else {
                    StepId::from("n")
                }
            }))
            .with_step(FlowStep::new("y", "Yes"))
            .with_step(FlowStep::new("n", "No")),
    )
}

/// Flow data from a JSON object literal; anything else yields empty data
pub fn payload(value: Value) -> FlowData {
    match value {
        Value::Object(map) => map,
        _ => FlowData::new(),
    }
}
