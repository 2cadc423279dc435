//! Flow traversal state machine.

use crate::domain::flow_definition::{Flow, FlowStep};
use crate::domain::ids::StepId;
use crate::domain::{merge_data, FlowData};
use crate::observer::{FlowListener, FlowTransition, ListenerRegistry, Subscription, TransitionKind};
use crate::FlowError;
use glasskit_monitoring::FlowMetrics;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Walks a [`Flow`] one step at a time.
///
/// All operations are synchronous. Listeners are notified after a
/// transition has been fully applied, so they never observe a half-updated
/// engine.
#[derive(Default)]
pub struct FlowEngine {
    flow: Option<Arc<Flow>>,
    current_step: Option<StepId>,
    history: Vec<StepId>,
    data: FlowData,
    listeners: ListenerRegistry,
}

impl FlowEngine {
    /// Create an idle engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Start traversing `flow` from its initial step.
    ///
    /// Replaces any traversal in progress. Listeners stay registered.
    pub fn start(&mut self, flow: Arc<Flow>, initial_data: Option<FlowData>) -> Result<(), FlowError> {
        if !flow.contains(flow.initial_step.as_str()) {
            return Err(FlowError::StepNotFound(flow.initial_step.to_string()));
        }

        info!(flow_id = %flow.id, initial_step = %flow.initial_step, "Starting flow");

        self.current_step = Some(flow.initial_step.clone());
        self.history = vec![flow.initial_step.clone()];
        self.data = initial_data.unwrap_or_default();
        self.flow = Some(flow);

        self.notify(TransitionKind::Started);
        Ok(())
    }

    /// Merge `data` and advance along the current step's edge.
    ///
    /// A terminal step completes the flow. Dynamic edges see the merged data,
    /// including what was passed in this call.
    pub fn next(&mut self, data: Option<FlowData>) -> Result<(), FlowError> {
        let (flow, current) = self.active()?;

        if let Some(incoming) = data {
            merge_data(&mut self.data, incoming);
        }

        let step = flow
            .step(current.as_str())
            .ok_or_else(|| FlowError::StepNotFound(current.to_string()))?;

        let Some(edge) = &step.next else {
            debug!(flow_id = %flow.id, step_id = %current, "Terminal step reached");
            self.complete();
            return Ok(());
        };

        let target = edge.resolve(&self.data);
        if !flow.contains(target.as_str()) {
            return Err(FlowError::StepNotFound(target.to_string()));
        }

        debug!(flow_id = %flow.id, from = %current, to = %target, "Advancing flow");
        self.history.push(target.clone());
        self.current_step = Some(target);

        self.notify(TransitionKind::Advanced);
        Ok(())
    }

    /// Return to the previous step in history.
    ///
    /// Data merged since that step was left is kept.
    pub fn back(&mut self) {
        if self.current_step.is_none() || self.history.len() <= 1 {
            warn!(history_len = self.history.len(), "Cannot go back: already at the first step");
            return;
        }

        self.history.pop();
        self.current_step = self.history.last().cloned();

        self.notify(TransitionKind::Back);
    }

    /// Move to an arbitrary step of the active flow
    pub fn jump_to(&mut self, step_id: impl Into<StepId>, clear_history: bool) -> Result<(), FlowError> {
        let (flow, _) = self.active()?;
        let target = step_id.into();

        if !flow.contains(target.as_str()) {
            return Err(FlowError::StepNotFound(target.to_string()));
        }

        debug!(flow_id = %flow.id, to = %target, clear_history, "Jumping to step");
        if clear_history {
            self.history = vec![target.clone()];
        } else {
            self.history.push(target.clone());
        }
        self.current_step = Some(target);

        self.notify(TransitionKind::Jumped);
        Ok(())
    }

    /// Finish the traversal. Flow, data and history are kept for inspection.
    pub fn complete(&mut self) {
        self.current_step = None;

        if let Some(flow) = &self.flow {
            info!(flow_id = %flow.id, steps_visited = self.history.len(), "Flow completed");
            FlowMetrics::record_completion(flow.id.as_str(), self.history.len());
        }

        self.notify(TransitionKind::Completed);
    }

    /// Reset to the state before `start()`.
    ///
    /// Listeners receive the interrupted flow, if a step was active, so the
    /// end of an abandoned traversal can still be observed.
    pub fn cancel(&mut self) {
        let interrupted = if self.current_step.is_some() { self.flow.take() } else { None };
        let visited = if interrupted.is_some() { self.history.len() } else { 0 };
        if let Some(flow) = &interrupted {
            info!(flow_id = %flow.id, steps_visited = visited, "Flow cancelled");
        }

        self.flow = None;
        self.current_step = None;
        self.history.clear();
        self.data.clear();

        self.emit(FlowTransition {
            kind: TransitionKind::Cancelled,
            step: None,
            flow: interrupted.as_deref(),
            progress: 0,
            history_len: visited,
        });
    }

    /// Merge data without moving. Listeners are not notified.
    pub fn set_data(&mut self, data: FlowData) {
        merge_data(&mut self.data, data);
    }

    /// Percentage of the flow's declared steps up to and including the
    /// current one, rounded. `0` without a current step.
    pub fn progress(&self) -> u8 {
        let (Some(flow), Some(current)) = (&self.flow, &self.current_step) else {
            return 0;
        };
        match flow.position(current.as_str()) {
            Some(index) => {
                let percent = 100.0 * (index + 1) as f64 / flow.steps.len() as f64;
                percent.round() as u8
            }
            None => 0,
        }
    }

    /// Whether `back()` would move. Always `false` once completed, even
    /// though the history is kept.
    pub fn can_go_back(&self) -> bool {
        self.current_step.is_some() && self.history.len() > 1
    }

    /// The step being shown, if any
    pub fn current_step(&self) -> Option<&FlowStep> {
        let current = self.current_step.as_ref()?;
        self.flow.as_ref()?.step(current.as_str())
    }

    /// Accumulated flow data
    pub fn data(&self) -> &FlowData {
        &self.data
    }

    /// Visited step ids, oldest first
    pub fn history(&self) -> &[StepId] {
        &self.history
    }

    /// The flow being traversed (kept after completion, cleared on cancel)
    pub fn flow(&self) -> Option<&Flow> {
        self.flow.as_deref()
    }

    /// Whether a step is currently shown
    pub fn is_active(&self) -> bool {
        self.current_step.is_some()
    }

    /// Register a listener called after every transition
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&FlowTransition<'_>) + Send + Sync + 'static,
    {
        let listener: FlowListener = Arc::new(listener);
        self.listeners.subscribe(listener)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn active(&self) -> Result<(Arc<Flow>, StepId), FlowError> {
        match (&self.flow, &self.current_step) {
            (Some(flow), Some(current)) => Ok((flow.clone(), current.clone())),
            _ => Err(FlowError::NoActiveFlow),
        }
    }

    fn notify(&self, kind: TransitionKind) {
        self.emit(FlowTransition {
            kind,
            step: self.current_step(),
            flow: self.flow.as_deref(),
            progress: self.progress(),
            history_len: self.history.len(),
        });
    }

    fn emit(&self, transition: FlowTransition<'_>) {
        if let Some(flow) = transition.flow {
            FlowMetrics::record_transition(flow.id.as_str(), transition.kind.as_str());
        }
        self.listeners.notify(&transition);
    }
}

impl std::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine")
            .field("flow", &self.flow.as_ref().map(|flow| flow.id.as_str()))
            .field("current_step", &self.current_step)
            .field("history", &self.history)
            .field("data", &self.data)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn linear() -> Arc<Flow> {
        Arc::new(
            Flow::new("signup", "Sign up", "a")
                .with_step(FlowStep::new("a", "Intro").then("b"))
                .with_step(FlowStep::new("b", "Form").then("c"))
                .with_step(FlowStep::new("c", "Done")),
        )
    }

    fn data(value: serde_json::Value) -> FlowData {
        value.as_object().cloned().unwrap_or_default()
    }

    fn current_id(engine: &FlowEngine) -> Option<String> {
        engine.current_step().map(|step| step.id.to_string())
    }

    #[test]
    fn test_start_sets_initial_state() {
        let mut engine = FlowEngine::new();
        engine.start(linear(), Some(data(json!({"ref": "email"})))).unwrap();

        assert_eq!(current_id(&engine).as_deref(), Some("a"));
        assert_eq!(engine.history(), &[StepId::from("a")]);
        assert_eq!(engine.data()["ref"], json!("email"));
        assert!(!engine.can_go_back());
        assert!(engine.is_active());
    }

    #[test]
    fn test_start_with_missing_initial_step_fails() {
        let mut engine = FlowEngine::new();
        let flow = Arc::new(Flow::new("f", "F", "ghost").with_step(FlowStep::new("a", "A")));

        assert_eq!(engine.start(flow, None), Err(FlowError::StepNotFound("ghost".into())));
        assert!(engine.flow().is_none());
    }

    #[test]
    fn test_next_without_flow_fails() {
        let mut engine = FlowEngine::new();
        assert_eq!(engine.next(None), Err(FlowError::NoActiveFlow));
        assert_eq!(engine.jump_to("a", false), Err(FlowError::NoActiveFlow));
    }

    #[test]
    fn test_next_to_unknown_step_fails_without_moving() {
        let mut engine = FlowEngine::new();
        let flow = Arc::new(Flow::new("f", "F", "a").with_step(FlowStep::new("a", "A").then("missing")));
        engine.start(flow, None).unwrap();

        assert_eq!(engine.next(None), Err(FlowError::StepNotFound("missing".into())));
        assert_eq!(current_id(&engine).as_deref(), Some("a"));
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_back_at_start_is_noop() {
        let mut engine = FlowEngine::new();
        engine.back();
        engine.start(linear(), None).unwrap();
        engine.back();
        assert_eq!(current_id(&engine).as_deref(), Some("a"));
    }

    #[test]
    fn test_back_keeps_data() {
        let mut engine = FlowEngine::new();
        engine.start(linear(), None).unwrap();
        engine.next(Some(data(json!({"email": "ada@example.com"})))).unwrap();
        engine.back();

        assert_eq!(current_id(&engine).as_deref(), Some("a"));
        assert_eq!(engine.data()["email"], json!("ada@example.com"));
    }

    #[test]
    fn test_jump_to_appends_or_clears_history() {
        let mut engine = FlowEngine::new();
        engine.start(linear(), None).unwrap();

        engine.jump_to("c", false).unwrap();
        assert_eq!(engine.history().len(), 2);
        assert_eq!(engine.progress(), 100);

        engine.jump_to("b", true).unwrap();
        assert_eq!(engine.history(), &[StepId::from("b")]);
        assert!(!engine.can_go_back());

        assert_eq!(engine.jump_to("z", false), Err(FlowError::StepNotFound("z".into())));
    }

    #[test]
    fn test_complete_keeps_flow_data_and_history() {
        let mut engine = FlowEngine::new();
        engine.start(linear(), Some(data(json!({"k": 1})))).unwrap();
        engine.next(None).unwrap();
        engine.complete();

        assert!(engine.current_step().is_none());
        assert!(engine.flow().is_some());
        assert_eq!(engine.history().len(), 2);
        assert_eq!(engine.data()["k"], json!(1));
        assert_eq!(engine.progress(), 0);
        assert_eq!(engine.next(None), Err(FlowError::NoActiveFlow));
    }

    #[test]
    fn test_cannot_go_back_after_completion() {
        let mut engine = FlowEngine::new();
        engine.start(linear(), None).unwrap();
        engine.next(None).unwrap();
        assert!(engine.can_go_back());

        engine.complete();
        assert!(!engine.can_go_back());
        engine.back();
        assert!(engine.current_step().is_none());
        assert_eq!(engine.history().len(), 2);
    }

    #[test]
    fn test_cancel_reports_interrupted_flow_once() {
        let mut engine = FlowEngine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let _sub = engine.subscribe(move |t| {
            if t.kind == TransitionKind::Cancelled {
                log.lock().push((t.flow.map(|f| f.id.to_string()), t.history_len));
            }
        });

        engine.start(linear(), None).unwrap();
        engine.next(None).unwrap();
        engine.cancel();
        engine.cancel();

        assert_eq!(*seen.lock(), vec![(Some("signup".to_string()), 2), (None, 0)]);
    }

    #[test]
    fn test_set_data_merges_without_notifying() {
        let mut engine = FlowEngine::new();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let _sub = engine.subscribe(move |_| *counter.lock() += 1);

        engine.start(linear(), None).unwrap();
        engine.set_data(data(json!({"plan": "pro"})));

        assert_eq!(*calls.lock(), 1);
        assert_eq!(engine.data()["plan"], json!("pro"));
    }

    #[test]
    fn test_listeners_receive_transition_kinds() {
        let mut engine = FlowEngine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let _sub = engine.subscribe(move |t| {
            log.lock().push((t.kind, t.step.map(|s| s.id.to_string()), t.progress));
        });

        engine.start(linear(), None).unwrap();
        engine.next(None).unwrap();
        engine.back();
        engine.jump_to("c", false).unwrap();
        engine.next(None).unwrap();
        engine.cancel();

        let seen = seen.lock();
        assert_eq!(
            *seen,
            vec![
                (TransitionKind::Started, Some("a".to_string()), 33),
                (TransitionKind::Advanced, Some("b".to_string()), 67),
                (TransitionKind::Back, Some("a".to_string()), 33),
                (TransitionKind::Jumped, Some("c".to_string()), 100),
                (TransitionKind::Completed, None, 0),
                (TransitionKind::Cancelled, None, 0),
            ]
        );
    }

    #[test]
    fn test_debug_does_not_expose_resolvers() {
        let mut engine = FlowEngine::new();
        engine.start(linear(), None).unwrap();
        let rendered = format!("{:?}", engine);
        assert!(rendered.contains("signup"));
    }
}
