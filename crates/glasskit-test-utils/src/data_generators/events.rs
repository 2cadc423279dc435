//! Event fixtures.

use glasskit_events::Event;
use serde_json::json;

/// An event with a predictable id and timestamp
pub fn sample_event(n: usize) -> Event {
    let mut event = Event::new("test-session")
        .named(format!("test_event_{}", n))
        .with_component("TestComponent")
        .with_property("index", json!(n));
    event.id = format!("event-{}", n);
    event.timestamp = 1_700_000_000_000 + n as i64;
    event
}

/// `count` sample events numbered from 1
pub fn events(count: usize) -> Vec<Event> {
    (1..=count).map(sample_event).collect()
}
