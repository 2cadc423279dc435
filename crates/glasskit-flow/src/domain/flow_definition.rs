use crate::domain::ids::{FlowId, StepId};
use crate::domain::FlowData;
use crate::FlowError;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Resolver for a data-dependent edge
pub type StepResolver = Arc<dyn Fn(&FlowData) -> StepId + Send + Sync>;

/// Outgoing edge of a step
#[derive(Clone)]
pub enum StepEdge {
    /// Always continue to the given step
    Literal(StepId),
    /// Pick the next step from the accumulated flow data
    Dynamic(StepResolver),
}

impl StepEdge {
    /// Build a dynamic edge from a closure
    pub fn dynamic<F>(resolver: F) -> Self
    where
        F: Fn(&FlowData) -> StepId + Send + Sync + 'static,
    {
        StepEdge::Dynamic(Arc::new(resolver))
    }

    /// Resolve the target step id against the current flow data
    pub fn resolve(&self, data: &FlowData) -> StepId {
        match self {
            StepEdge::Literal(target) => target.clone(),
            StepEdge::Dynamic(resolver) => resolver(data),
        }
    }
}

impl fmt::Debug for StepEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepEdge::Literal(target) => f.debug_tuple("Literal").field(target).finish(),
            StepEdge::Dynamic(_) => f.write_str("Dynamic(<resolver>)"),
        }
    }
}

/// A single node of a flow
#[derive(Debug, Clone)]
pub struct FlowStep {
    /// Step id, unique within its flow
    pub id: StepId,

    /// Name of what the host renders for this step
    pub component: String,

    /// Opaque data for the host's renderer
    pub props: Option<Value>,

    /// Outgoing edge; `None` marks a terminal step
    pub next: Option<StepEdge>,
}

impl FlowStep {
    /// Create a terminal step
    pub fn new(id: impl Into<StepId>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component: component.into(),
            props: None,
            next: None,
        }
    }

    /// Attach renderer props
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = Some(props);
        self
    }

    /// Continue to a fixed step
    pub fn then(mut self, target: impl Into<StepId>) -> Self {
        self.next = Some(StepEdge::Literal(target.into()));
        self
    }

    /// Continue to a step chosen from the flow data
    pub fn then_with<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&FlowData) -> StepId + Send + Sync + 'static,
    {
        self.next = Some(StepEdge::dynamic(resolver));
        self
    }

    /// Whether calling `next()` on this step completes the flow
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }
}

/// Static definition of a multi-step process
#[derive(Debug, Clone)]
pub struct Flow {
    /// ID of the flow
    pub id: FlowId,

    /// Human-readable name of the flow
    pub name: String,

    /// Step entered on start
    pub initial_step: StepId,

    /// The steps in this flow, in declaration order
    pub steps: Vec<FlowStep>,
}

impl Flow {
    /// Create a flow without steps
    pub fn new(
        id: impl Into<FlowId>,
        name: impl Into<String>,
        initial_step: impl Into<StepId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            initial_step: initial_step.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn with_step(mut self, step: FlowStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Look up a step by id
    pub fn step(&self, id: &str) -> Option<&FlowStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Index of a step within `steps`
    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }

    /// Whether the flow declares a step with this id
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Validate the flow definition.
    ///
    /// Dynamic edges can only be checked when they are resolved, so only
    /// literal targets are verified here.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.steps.is_empty() {
            return Err(FlowError::ValidationError(format!(
                "Flow {} must have at least one step",
                self.id
            )));
        }

        let mut step_ids = HashSet::new();
        for step in &self.steps {
            if !step_ids.insert(step.id.as_str()) {
                return Err(FlowError::DuplicateStep(step.id.to_string()));
            }
        }

        if !step_ids.contains(self.initial_step.as_str()) {
            return Err(FlowError::StepNotFound(self.initial_step.to_string()));
        }

        for step in &self.steps {
            if let Some(StepEdge::Literal(target)) = &step.next {
                if !step_ids.contains(target.as_str()) {
                    return Err(FlowError::ValidationError(format!(
                        "Step {} points to non-existent step: {}",
                        step.id, target
                    )));
                }
            }
        }

        Ok(())
    }
}
