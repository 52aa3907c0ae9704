// decision.rs — The outcome of a policy verification.
//
// A Decision is immutable once constructed. Its `decision_id` is opaque and
// stable: retried calls with the same idempotency key return the *same*
// decision_id, not merely an equivalent decision. Decisions synthesized for
// local fast-fail rejections carry a locally tagged id so audit records can
// still be correlated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assurance::AssuranceLevel;

/// Reason codes used by the local checks. The remote authority uses the same
/// vocabulary where behaviors overlap.
pub mod codes {
    /// Passport is suspended or revoked.
    pub const PASSPORT_NOT_ACTIVE: &str = "passport_not_active";
    /// The passport does not grant the required capability.
    pub const CAPABILITY_MISSING: &str = "capability_missing";
    /// Identity assurance below the policy's required tier.
    pub const ASSURANCE_INSUFFICIENT: &str = "assurance_insufficient";
    /// A numeric limit would be exceeded.
    pub const LIMIT_EXCEEDED: &str = "limit_exceeded";
    /// A requested limit is not granted on the passport at all.
    pub const LIMIT_NOT_GRANTED: &str = "limit_not_granted";
    /// A requested MCP server is outside the passport allowlist.
    pub const MCP_SERVER_NOT_ALLOWED: &str = "mcp_server_not_allowed";
    /// A requested MCP tool is outside the passport allowlist.
    pub const MCP_TOOL_NOT_ALLOWED: &str = "mcp_tool_not_allowed";
}

/// Reserved id prefix for decisions synthesized without the authority.
/// Remote responses must never use it; the wire layer rejects those.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// One machine-readable reason attached to a decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reason {
    /// Stable reason code (e.g., `limit_exceeded`).
    pub code: String,
    /// Human-readable explanation.
    pub message: String,
}

impl Reason {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The allow/deny outcome of a policy verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    /// Opaque decision identifier, unique per verification and stable across
    /// idempotent replays. Locally synthesized decisions use a `local_` tag.
    pub decision_id: String,

    /// Whether the action is permitted. `false` never authorizes execution,
    /// under any configuration.
    pub allow: bool,

    /// Ordered reasons, most significant first. Usually empty on allow.
    #[serde(default)]
    pub reasons: Vec<Reason>,

    /// The assurance tier the authority evaluated the request at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assurance_level: Option<AssuranceLevel>,

    /// Remaining headroom per limit, as computed server-side. Values are
    /// clamped to zero; a negative remainder surfaces as a `limit_exceeded`
    /// reason instead. Opaque pass-through data for cumulative caps.
    #[serde(default)]
    pub remaining_limits: BTreeMap<String, f64>,

    /// Seconds this decision remains valid for idempotent reuse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl Decision {
    /// Synthesize a local fast-fail denial.
    ///
    /// The id is tagged `local_` so audit consumers can tell an
    /// infrastructure-free local rejection from an authority decision.
    pub fn local_deny(reasons: Vec<Reason>) -> Self {
        Self {
            decision_id: format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4().simple()),
            allow: false,
            reasons,
            assurance_level: None,
            remaining_limits: BTreeMap::new(),
            expires_in: None,
        }
    }

    /// Whether this decision was synthesized locally rather than issued by
    /// the remote authority.
    ///
    /// The `local_` prefix is reserved: the wire layer rejects authority
    /// responses carrying it, so the classification cannot be spoofed by a
    /// remote id. `DecisionSource` on a denial remains the authoritative
    /// signal; this is a convenience for audit consumers holding only the
    /// decision.
    pub fn is_local(&self) -> bool {
        self.decision_id.starts_with(LOCAL_ID_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authority_response_shape() {
        let json = serde_json::json!({
            "decision_id": "dec_1",
            "allow": true,
            "reasons": [],
            "assurance_level": "L2",
            "remaining_limits": {"refund_daily_cap": 45000.0},
            "expires_in": 300
        });
        let decision: Decision = serde_json::from_value(json).unwrap();
        assert!(decision.allow);
        assert_eq!(decision.decision_id, "dec_1");
        assert_eq!(decision.remaining_limits["refund_daily_cap"], 45000.0);
        assert_eq!(decision.expires_in, Some(300));
    }

    #[test]
    fn optional_fields_default() {
        let json = serde_json::json!({"decision_id": "dec_2", "allow": false});
        let decision: Decision = serde_json::from_value(json).unwrap();
        assert!(!decision.allow);
        assert!(decision.reasons.is_empty());
        assert!(decision.remaining_limits.is_empty());
        assert!(decision.expires_in.is_none());
    }

    #[test]
    fn local_denials_are_tagged_and_never_allow() {
        let decision = Decision::local_deny(vec![Reason::new(
            codes::CAPABILITY_MISSING,
            "no payments.refund capability",
        )]);
        assert!(!decision.allow);
        assert!(decision.is_local());
        assert_eq!(decision.reasons[0].code, codes::CAPABILITY_MISSING);
    }

    #[test]
    fn local_decision_ids_are_unique() {
        let a = Decision::local_deny(vec![]);
        let b = Decision::local_deny(vec![]);
        assert_ne!(a.decision_id, b.decision_id);
    }
}
