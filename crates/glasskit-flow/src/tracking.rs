//! Adapter that turns flow transitions into analytics callbacks.
//!
//! The engine knows nothing about event delivery; hosts pass a callback
//! (typically forwarding into an event tracker) and the adapter calls it with
//! an event name and properties.

use crate::domain::FlowData;
use crate::engine::FlowEngine;
use crate::observer::{FlowTransition, Subscription, TransitionKind};
use serde_json::json;

/// Emitted whenever a step becomes current
pub const FLOW_STEP_VIEWED: &str = "flow_step_viewed";

/// Emitted when a flow finishes
pub const FLOW_COMPLETED: &str = "flow_completed";

/// Flow tracking adapter
pub struct FlowTracking;

impl FlowTracking {
    /// Subscribe `track_event` to every transition of `engine`
    pub fn attach<F>(engine: &FlowEngine, track_event: F) -> Subscription
    where
        F: Fn(&str, FlowData) + Send + Sync + 'static,
    {
        engine.subscribe(move |transition| {
            if let Some((name, properties)) = Self::event_for(transition) {
                track_event(name, properties);
            }
        })
    }

    /// Same as [`FlowTracking::attach`], doing nothing without a callback
    pub fn attach_optional<F>(engine: &FlowEngine, track_event: Option<F>) -> Option<Subscription>
    where
        F: Fn(&str, FlowData) + Send + Sync + 'static,
    {
        track_event.map(|callback| Self::attach(engine, callback))
    }

    /// Map a transition to the analytics event it produces, if any.
    ///
    /// Cancelling an active traversal also ends it: `flow_completed` is sent
    /// with `cancelled: true`. Cancelling an idle or completed engine produces
    /// nothing.
    pub fn event_for(transition: &FlowTransition<'_>) -> Option<(&'static str, FlowData)> {
        let flow = transition.flow?;
        let mut properties = FlowData::new();
        properties.insert("flowId".to_string(), json!(flow.id));

        match transition.step {
            Some(step) => {
                properties.insert("stepId".to_string(), json!(step.id));
                properties.insert("component".to_string(), json!(step.component));
                properties.insert("progress".to_string(), json!(transition.progress));
                Some((FLOW_STEP_VIEWED, properties))
            }
            None => {
                properties.insert("stepCount".to_string(), json!(transition.history_len));
                if transition.kind == TransitionKind::Cancelled {
                    properties.insert("cancelled".to_string(), json!(true));
                }
                Some((FLOW_COMPLETED, properties))
            }
        }
    }
}
