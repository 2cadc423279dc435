//! Glasskit
//!
//! The stateful core behind the Glasskit component library: a step-graph
//! [`flow`] engine for multi-step UI processes, declarative flow documents
//! ([`dsl`]), and a durable, batched telemetry queue ([`events`]). The two
//! halves meet only through [`flow::FlowTracking`], which forwards flow
//! transitions to a host-supplied callback.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use glasskit_dsl as dsl;
pub use glasskit_events as events;
pub use glasskit_flow as flow;
pub use glasskit_monitoring as monitoring;

pub use glasskit_dsl::load_flow;
pub use glasskit_events::{Event, EventQueue, EventTracker, QueueConfig};
pub use glasskit_flow::{Flow, FlowEngine, FlowStep, FlowTracking};

use std::sync::Arc;
use tracing::info;

/// Build a tracker over a queue persisted in `storage`, configured from
/// the `GLASSKIT_EVENTS_*` environment variables.
pub fn tracker_from_env(
    storage: Arc<dyn glasskit_events::KeyValueStorage>,
) -> anyhow::Result<EventTracker> {
    let config = QueueConfig::from_env();
    info!(
        endpoint = config.endpoint.as_deref().unwrap_or("<none>"),
        batch_size = config.batch_size,
        "Creating event tracker"
    );
    let queue = EventQueue::new(config, storage)?;
    Ok(EventTracker::new(queue))
}
