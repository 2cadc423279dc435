//! Metric recorders for the flow engine and the event queue.
//!
//! Everything goes through the `metrics` facade, so nothing is exported until
//! the host installs a recorder.

use metrics::{counter, gauge, histogram, increment_counter};
use tracing::debug;

/// Event queue specific metrics
pub struct EventQueueMetrics;

impl EventQueueMetrics {
    /// Record an event appended to the queue
    pub fn record_enqueued(depth: usize) {
        increment_counter!("glasskit_events_enqueued_total");
        gauge!("glasskit_event_queue_depth", depth as f64);
    }

    /// Record events dropped because the queue hit its cap
    pub fn record_evicted(count: usize) {
        counter!("glasskit_events_evicted_total", count as u64);
    }

    /// Record a successful flush
    pub fn record_flush(sent: usize, remaining: usize, attempts: u32, duration_ms: f64) {
        counter!("glasskit_events_flushed_total", sent as u64);
        histogram!("glasskit_event_flush_duration_ms", duration_ms);
        gauge!("glasskit_event_queue_depth", remaining as f64);
        debug!(
            "Event flush: sent={}, remaining={}, attempts={}, duration={}ms",
            sent, remaining, attempts, duration_ms
        );
    }

    /// Record a failed send attempt that will be retried
    pub fn record_flush_retry(attempt: u32) {
        increment_counter!("glasskit_event_flush_retries_total");
        debug!("Event flush retry scheduled after attempt {}", attempt);
    }

    /// Record a flush that exhausted its attempts
    pub fn record_flush_failure(attempts: u32) {
        increment_counter!("glasskit_event_flush_failures_total");
        debug!("Event flush failed after {} attempts", attempts);
    }

    /// Record a persisted queue that failed to parse and was set aside
    pub fn record_corrupt() {
        increment_counter!("glasskit_event_queue_corrupt_total");
    }

    /// Record the current queue depth
    pub fn record_depth(depth: usize) {
        gauge!("glasskit_event_queue_depth", depth as f64);
    }
}

/// Flow engine specific metrics
pub struct FlowMetrics;

impl FlowMetrics {
    /// Record a flow state transition
    pub fn record_transition(flow_id: &str, kind: &'static str) {
        increment_counter!(
            "glasskit_flow_transitions_total",
            "flow_id" => flow_id.to_string(),
            "kind" => kind
        );
    }

    /// Record a flow reaching completion
    pub fn record_completion(flow_id: &str, steps_visited: usize) {
        increment_counter!("glasskit_flow_completions_total", "flow_id" => flow_id.to_string());
        histogram!("glasskit_flow_steps_visited", steps_visited as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_are_noops_without_a_recorder() {
        EventQueueMetrics::record_enqueued(3);
        EventQueueMetrics::record_evicted(1);
        EventQueueMetrics::record_flush(3, 0, 1, 12.5);
        EventQueueMetrics::record_flush_retry(1);
        EventQueueMetrics::record_flush_failure(3);
        EventQueueMetrics::record_depth(0);
        FlowMetrics::record_transition("onboarding", "advanced");
        FlowMetrics::record_completion("onboarding", 3);
    }
}
