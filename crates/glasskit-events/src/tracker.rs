//! Session-aware front end of the event queue.

use crate::error::EventQueueError;
use crate::event::{Event, Properties};
use crate::queue::EventQueue;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Storage key of the persisted session id
pub const SESSION_STORAGE_KEY: &str = "glasskit:session_id";

#[derive(Debug, Default)]
struct Identity {
    session_id: Option<String>,
    user_id: Option<String>,
}

/// Builds events for the current session and user and queues them
#[derive(Debug, Clone)]
pub struct EventTracker {
    queue: EventQueue,
    identity: Arc<Mutex<Identity>>,
}

impl EventTracker {
    /// Track into `queue`
    pub fn new(queue: EventQueue) -> Self {
        Self {
            queue,
            identity: Arc::new(Mutex::new(Identity::default())),
        }
    }

    /// Underlying queue
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Queue a named event with optional properties
    pub async fn track(&self, name: &str, properties: Option<Properties>) -> Result<Event, EventQueueError> {
        self.record(None, name, properties).await
    }

    /// Queue a named event attributed to a component
    pub async fn track_component(
        &self,
        component: &str,
        name: &str,
        properties: Option<Properties>,
    ) -> Result<Event, EventQueueError> {
        self.record(Some(component), name, properties).await
    }

    async fn record(
        &self,
        component: Option<&str>,
        name: &str,
        properties: Option<Properties>,
    ) -> Result<Event, EventQueueError> {
        let (session_id, user_id) = {
            let mut identity = self.identity.lock().await;
            let session_id = self.ensure_session(&mut identity).await?;
            (session_id, identity.user_id.clone())
        };

        let mut event = Event::new(session_id)
            .named(name)
            .with_user(user_id)
            .with_properties(properties.unwrap_or_default());
        if let Some(component) = component {
            event = event.with_component(component);
        }

        debug!(event = name, event_id = %event.id, "Tracking event");
        self.queue.add(event.clone()).await?;
        Ok(event)
    }

    /// Current session id, loading it from storage or creating one on first
    /// use
    pub async fn session_id(&self) -> Result<String, EventQueueError> {
        let mut identity = self.identity.lock().await;
        self.ensure_session(&mut identity).await
    }

    /// Rotate the session id
    pub async fn start_new_session(&self) -> Result<String, EventQueueError> {
        let mut identity = self.identity.lock().await;
        self.rotate_session(&mut identity).await
    }

    /// Attach a user id to subsequent events, optionally in a fresh session
    pub async fn identify(&self, user_id: impl Into<String>, new_session: bool) -> Result<(), EventQueueError> {
        let user_id = user_id.into();
        let mut identity = self.identity.lock().await;
        if new_session {
            self.rotate_session(&mut identity).await?;
        }
        info!(user_id = %user_id, new_session, "User identified");
        identity.user_id = Some(user_id);
        Ok(())
    }

    /// Forget the user and start a new session. Queued events are kept.
    pub async fn reset(&self) -> Result<(), EventQueueError> {
        let mut identity = self.identity.lock().await;
        identity.user_id = None;
        self.rotate_session(&mut identity).await?;
        Ok(())
    }

    /// Currently identified user
    pub async fn user_id(&self) -> Option<String> {
        self.identity.lock().await.user_id.clone()
    }

    async fn ensure_session(&self, identity: &mut Identity) -> Result<String, EventQueueError> {
        if let Some(session_id) = &identity.session_id {
            return Ok(session_id.clone());
        }

        if let Some(stored) = self.queue.storage().get(SESSION_STORAGE_KEY).await? {
            debug!(session_id = %stored, "Restored session");
            identity.session_id = Some(stored.clone());
            return Ok(stored);
        }

        self.rotate_session(identity).await
    }

    async fn rotate_session(&self, identity: &mut Identity) -> Result<String, EventQueueError> {
        let session_id = Uuid::new_v4().to_string();
        self.queue
            .storage()
            .set(SESSION_STORAGE_KEY, session_id.clone())
            .await?;
        info!(session_id = %session_id, "Started new session");
        identity.session_id = Some(session_id.clone());
        Ok(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::storage::InMemoryStorage;
    use serde_json::json;

    fn tracker_on(storage: Arc<InMemoryStorage>) -> EventTracker {
        EventTracker::new(EventQueue::with_sink(QueueConfig::default(), storage, None).unwrap())
    }

    #[tokio::test]
    async fn test_track_builds_and_queues_event() {
        let tracker = tracker_on(Arc::new(InMemoryStorage::new()));
        let mut props = Properties::new();
        props.insert("plan".to_string(), json!("pro"));

        let event = tracker.track("upgrade_clicked", Some(props)).await.unwrap();

        assert_eq!(event.event.as_deref(), Some("upgrade_clicked"));
        assert_eq!(event.properties["plan"], json!("pro"));
        assert_eq!(event.session_id, tracker.session_id().await.unwrap());
        assert_eq!(tracker.queue().get().await.unwrap(), vec![event]);
    }

    #[tokio::test]
    async fn test_session_is_stable_and_persisted() {
        let storage = Arc::new(InMemoryStorage::new());
        let tracker = tracker_on(storage.clone());

        let first = tracker.session_id().await.unwrap();
        assert_eq!(tracker.session_id().await.unwrap(), first);

        let restarted = tracker_on(storage);
        assert_eq!(restarted.session_id().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_identify_and_reset() {
        let tracker = tracker_on(Arc::new(InMemoryStorage::new()));
        let original = tracker.session_id().await.unwrap();

        tracker.identify("user-1", false).await.unwrap();
        assert_eq!(tracker.session_id().await.unwrap(), original);
        let event = tracker.track_component("GlassCard", "opened", None).await.unwrap();
        assert_eq!(event.user_id.as_deref(), Some("user-1"));
        assert_eq!(event.component.as_deref(), Some("GlassCard"));

        tracker.identify("user-2", true).await.unwrap();
        let rotated = tracker.session_id().await.unwrap();
        assert_ne!(rotated, original);

        tracker.reset().await.unwrap();
        assert_eq!(tracker.user_id().await, None);
        assert_ne!(tracker.session_id().await.unwrap(), rotated);
        assert_eq!(tracker.queue().size().await.unwrap(), 1);
    }
}
