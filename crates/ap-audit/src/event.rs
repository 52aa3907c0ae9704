// event.rs — Audit event data model.
//
// One event per authorization attempt. The `decision_id` links the event to
// the authority's decision record; infrastructure failures carry none. The
// outcome distinguishes a policy denial from an infrastructure failure —
// both block the action, but they mean very different things to an operator
// reading the trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ap_passport::Reason;

/// How an authorization attempt concluded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The remote authority allowed and the action executed.
    Allowed,
    /// The remote authority issued a definitive deny.
    DeniedPolicy,
    /// A local fast-fail check denied before any network call.
    DeniedLocal,
    /// Verification could not complete; the action was blocked fail-closed.
    VerificationFailed,
}

impl AuditOutcome {
    /// Whether this outcome authorized execution.
    pub fn allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// A single audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event.
    pub event_id: Uuid,

    /// When this event occurred (UTC).
    pub timestamp: DateTime<Utc>,

    /// Which agent requested the action.
    pub agent_id: String,

    /// Which policy the action was verified against.
    pub policy_id: String,

    /// The decision this event records, when one exists. Locally synthesized
    /// denials carry their `local_` tagged id; verification failures carry
    /// none.
    pub decision_id: Option<String>,

    /// Whether the action was authorized.
    pub allow: bool,

    /// How the attempt concluded.
    pub outcome: AuditOutcome,

    /// Reasons attached to the decision, if any.
    #[serde(default)]
    pub reasons: Vec<Reason>,

    /// Arbitrary additional data.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl AuditEvent {
    /// Create a new audit event with the current timestamp and a random UUID.
    pub fn new(
        agent_id: impl Into<String>,
        policy_id: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent_id: agent_id.into(),
            policy_id: policy_id.into(),
            decision_id: None,
            allow: outcome.allowed(),
            outcome,
            reasons: Vec::new(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Set the decision id and return self (builder pattern).
    pub fn with_decision_id(mut self, decision_id: impl Into<String>) -> Self {
        self.decision_id = Some(decision_id.into());
        self
    }

    /// Attach decision reasons and return self.
    pub fn with_reasons(mut self, reasons: Vec<Reason>) -> Self {
        self.reasons = reasons;
        self
    }

    /// Set arbitrary metadata and return self.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_round_trip() {
        let event = AuditEvent::new("ap_test", "finance.payment.refund.v1", AuditOutcome::Allowed)
            .with_decision_id("dec_1")
            .with_metadata(serde_json::json!({"amount": 5000}));

        let json = serde_json::to_string(&event).expect("serialize");
        let restored: AuditEvent = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(event.event_id, restored.event_id);
        assert_eq!(restored.policy_id, "finance.payment.refund.v1");
        assert_eq!(restored.decision_id.as_deref(), Some("dec_1"));
        assert!(restored.allow);
    }

    #[test]
    fn event_ids_are_unique() {
        let e1 = AuditEvent::new("ap_a", "p", AuditOutcome::Allowed);
        let e2 = AuditEvent::new("ap_a", "p", AuditOutcome::Allowed);
        assert_ne!(e1.event_id, e2.event_id);
    }

    #[test]
    fn outcome_serializes_as_snake_case() {
        let json = serde_json::to_string(&AuditOutcome::DeniedPolicy).unwrap();
        assert_eq!(json, "\"denied_policy\"");
    }

    #[test]
    fn only_allowed_outcome_sets_allow() {
        assert!(AuditEvent::new("a", "p", AuditOutcome::Allowed).allow);
        assert!(!AuditEvent::new("a", "p", AuditOutcome::DeniedPolicy).allow);
        assert!(!AuditEvent::new("a", "p", AuditOutcome::DeniedLocal).allow);
        assert!(!AuditEvent::new("a", "p", AuditOutcome::VerificationFailed).allow);
    }
}
