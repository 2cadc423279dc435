//! Listener registry for flow transitions.
//!
//! Listeners run synchronously, in subscription order, after a transition
//! has been fully applied. A panicking listener is logged and skipped.

use crate::domain::flow_definition::{Flow, FlowStep};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::error;

/// What caused a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// `start()` entered the initial step
    Started,
    /// `next()` moved to another step
    Advanced,
    /// `back()` returned to the previous step
    Back,
    /// `jump_to()` moved to an arbitrary step
    Jumped,
    /// The flow completed, explicitly or from a terminal step
    Completed,
    /// The traversal was cancelled and reset
    Cancelled,
}

impl TransitionKind {
    /// Stable lowercase name, used for logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Started => "started",
            TransitionKind::Advanced => "advanced",
            TransitionKind::Back => "back",
            TransitionKind::Jumped => "jumped",
            TransitionKind::Completed => "completed",
            TransitionKind::Cancelled => "cancelled",
        }
    }
}

/// Snapshot handed to listeners after a transition
#[derive(Debug, Clone, Copy)]
pub struct FlowTransition<'a> {
    /// What caused the transition
    pub kind: TransitionKind,
    /// The new current step, `None` once completed or cancelled
    pub step: Option<&'a FlowStep>,
    /// The flow being traversed. On `Cancelled` this is the flow that was
    /// interrupted mid-traversal, or `None` if no step was active.
    pub flow: Option<&'a Flow>,
    /// Progress percentage after the transition
    pub progress: u8,
    /// Number of entries in the step history. On `Cancelled` this is the
    /// length before the reset.
    pub history_len: usize,
}

/// Observer callback
pub type FlowListener = Arc<dyn Fn(&FlowTransition<'_>) + Send + Sync>;

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    listeners: Vec<(u64, FlowListener)>,
}

/// Ordered set of listeners with explicit removal
#[derive(Default, Clone)]
pub(crate) struct ListenerRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl ListenerRegistry {
    pub(crate) fn subscribe(&self, listener: FlowListener) -> Subscription {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.listeners.push((id, listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.state),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Call every listener registered at the time of the call. The lock is
    /// released first so listeners may unsubscribe themselves.
    pub(crate) fn notify(&self, transition: &FlowTransition<'_>) {
        let snapshot: Vec<(u64, FlowListener)> = self.state.lock().listeners.clone();

        for (id, listener) in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(transition))) {
                error!(
                    listener_id = id,
                    transition = transition.kind.as_str(),
                    "Flow listener panicked: {}",
                    panic_message(&panic)
                );
            }
        }
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Handle returned by `subscribe`. Dropping it keeps the listener
/// registered; call [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<RegistryState>>,
}

impl Subscription {
    /// Registry-local id of the listener
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener. Returns `false` if it was already gone or the
    /// engine has been dropped.
    pub fn unsubscribe(self) -> bool {
        let Some(state) = self.registry.upgrade() else {
            return false;
        };
        let mut state = state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(id, _)| *id != self.id);
        state.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn transition() -> FlowTransition<'static> {
        FlowTransition {
            kind: TransitionKind::Cancelled,
            step: None,
            flow: None,
            progress: 0,
            history_len: 0,
        }
    }

    fn counting(counter: &Arc<AtomicUsize>) -> FlowListener {
        let counter = counter.clone();
        Arc::new(move |_t: &FlowTransition<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let registry = ListenerRegistry::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let sub = registry.subscribe(counting(&calls));
        registry.notify(&transition());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(sub.unsubscribe());
        registry.notify(&transition());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let registry = ListenerRegistry::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let _faulty = registry.subscribe(Arc::new(|_t: &FlowTransition<'_>| panic!("listener failure")));
        let _healthy = registry.subscribe(counting(&calls));

        registry.notify(&transition());
        registry.notify(&transition());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = ListenerRegistry::default();
        let sub = registry.subscribe(Arc::new(|_t: &FlowTransition<'_>| {}));
        drop(registry);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(&payload), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&payload), "owned message");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&payload), "unknown panic payload");
    }
}
