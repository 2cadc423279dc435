//! Turns a validated document into an engine [`Flow`].

use crate::document::{BranchSpec, FlowDocument, NextSpec, StepSpec};
use glasskit_flow::{Flow, FlowStep, StepEdge, StepId};
use tracing::debug;

/// Build a [`Flow`] from a document. Branching edges become dynamic edges
/// evaluated against the flow data when `next()` is called.
pub fn compile_flow(document: &FlowDocument) -> Flow {
    let spec = &document.flow;
    let mut flow = Flow::new(spec.id.as_str(), spec.name.as_str(), spec.initial_step.as_str());

    for step in &spec.steps {
        flow = flow.with_step(compile_step(step));
    }

    debug!(flow_id = %flow.id, steps = flow.steps.len(), "Compiled flow document");
    flow
}

fn compile_step(spec: &StepSpec) -> FlowStep {
    let mut step = FlowStep::new(spec.id.as_str(), spec.component.as_str());
    step.props = spec.props.clone();
    step.next = spec.next.as_ref().map(compile_edge);
    step
}

fn compile_edge(next: &NextSpec) -> StepEdge {
    match next {
        NextSpec::Step(target) => StepEdge::Literal(StepId::from(target.as_str())),
        NextSpec::Branching { branches, otherwise } => {
            let branches: Vec<BranchSpec> = branches.clone();
            let otherwise = StepId::from(otherwise.as_str());
            StepEdge::dynamic(move |data| {
                branches
                    .iter()
                    .find(|branch| branch.when.matches(data))
                    .map(|branch| StepId::from(branch.goto.as_str()))
                    .unwrap_or_else(|| otherwise.clone())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ConditionSpec, FlowSpec};
    use glasskit_flow::FlowData;
    use serde_json::json;

    #[test]
    fn test_first_matching_branch_wins() {
        let edge = compile_edge(&NextSpec::Branching {
            branches: vec![
                BranchSpec {
                    when: ConditionSpec {
                        key: "plan".into(),
                        one_of: Some(vec![json!("pro"), json!("team")]),
                        ..Default::default()
                    },
                    goto: "billing".into(),
                },
                BranchSpec {
                    when: ConditionSpec {
                        key: "plan".into(),
                        equals: Some(json!("team")),
                        ..Default::default()
                    },
                    goto: "invite".into(),
                },
            ],
            otherwise: "done".into(),
        });

        let mut data = FlowData::new();
        assert_eq!(edge.resolve(&data), "done");
        data.insert("plan".into(), json!("team"));
        assert_eq!(edge.resolve(&data), "billing");
    }

    #[test]
    fn test_compile_keeps_order_and_props() {
        let document = FlowDocument {
            dsl_version: "1.0".into(),
            flow: FlowSpec {
                id: "f".into(),
                name: "F".into(),
                initial_step: "a".into(),
                steps: vec![
                    StepSpec {
                        id: "a".into(),
                        component: "A".into(),
                        props: Some(json!({"title": "Hi"})),
                        next: Some(NextSpec::Step("b".into())),
                    },
                    StepSpec {
                        id: "b".into(),
                        component: "B".into(),
                        props: None,
                        next: None,
                    },
                ],
            },
        };

        let flow = compile_flow(&document);
        assert_eq!(flow.position("b"), Some(1));
        assert_eq!(flow.steps[0].props, Some(json!({"title": "Hi"})));
        assert!(flow.steps[1].is_terminal());
        assert!(flow.validate().is_ok());
    }
}
