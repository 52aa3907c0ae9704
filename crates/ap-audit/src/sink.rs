// sink.rs — Audit emission seam.
//
// The core emits events through an injected sink; where they go (JSONL
// file, message bus, SIEM) is the collaborator's concern. Emission is
// infallible by contract: a sink that can fail must buffer or drop
// internally rather than block the authorization path.

use std::sync::Mutex;

use tracing::{info, warn};

use crate::event::AuditEvent;

/// Receives audit events. Implementations must be cheap and non-blocking.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &AuditEvent);
}

/// Sink that logs events through `tracing`.
///
/// Allowed outcomes log at `info`, everything else at `warn`.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn emit(&self, event: &AuditEvent) {
        if event.allow {
            info!(
                agent_id = %event.agent_id,
                policy_id = %event.policy_id,
                decision_id = event.decision_id.as_deref().unwrap_or("-"),
                outcome = ?event.outcome,
                "authorization allowed"
            );
        } else {
            warn!(
                agent_id = %event.agent_id,
                policy_id = %event.policy_id,
                decision_id = event.decision_id.as_deref().unwrap_or("-"),
                outcome = ?event.outcome,
                reason_count = event.reasons.len(),
                "authorization blocked"
            );
        }
    }
}

/// Sink that records events in memory. Intended for tests.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in order.
    pub fn recorded(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink poisoned").clone()
    }
}

impl AuditSink for MemorySink {
    fn emit(&self, event: &AuditEvent) {
        self.events
            .lock()
            .expect("audit sink poisoned")
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AuditOutcome;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(&AuditEvent::new("ap_a", "p1", AuditOutcome::Allowed));
        sink.emit(&AuditEvent::new("ap_a", "p2", AuditOutcome::DeniedPolicy));

        let events = sink.recorded();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].policy_id, "p1");
        assert_eq!(events[1].outcome, AuditOutcome::DeniedPolicy);
    }

    #[test]
    fn sinks_are_object_safe() {
        // The guard holds `Arc<dyn AuditSink>`; keep the trait object-safe.
        let sink: Box<dyn AuditSink> = Box::new(MemorySink::new());
        sink.emit(&AuditEvent::new("ap_a", "p", AuditOutcome::DeniedLocal));
    }
}
