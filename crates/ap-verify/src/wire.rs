// wire.rs — Request/response DTOs for the authority API.
//
// The authority speaks JSON. Responses are decoded in two steps: the HTTP
// layer produces a raw `serde_json::Value`, and this module enforces the
// contract (required fields, non-empty decision id). Any contract violation
// is an InvalidResponse — never retried.

use ap_passport::{Decision, Passport, PolicyContext};
use serde::Serialize;

use crate::error::{VerifyError, VerifyResult};

/// Body of `POST /api/verify/policy/{policy_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest {
    /// The agent passport id.
    pub agent_id: String,
    /// Policy-specific context, including any MCP fields.
    pub context: PolicyContext,
    /// Caller's idempotency key, forwarded so the authority can dedupe too.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Decode and validate a verification response.
pub fn decode_decision(value: serde_json::Value) -> VerifyResult<Decision> {
    let decision: Decision =
        serde_json::from_value(value).map_err(|e| VerifyError::InvalidResponse {
            message: format!("malformed decision: {e}"),
        })?;
    if decision.decision_id.is_empty() {
        return Err(VerifyError::InvalidResponse {
            message: "decision_id is empty".to_string(),
        });
    }
    // The local prefix is reserved for decisions synthesized without the
    // authority; a remote id wearing it would corrupt audit correlation.
    if decision.decision_id.starts_with(ap_passport::LOCAL_ID_PREFIX) {
        return Err(VerifyError::InvalidResponse {
            message: format!(
                "decision_id '{}' uses the reserved local prefix",
                decision.decision_id
            ),
        });
    }
    Ok(decision)
}

/// Decode and validate a passport view response.
pub fn decode_passport(value: serde_json::Value) -> VerifyResult<Passport> {
    let passport: Passport =
        serde_json::from_value(value).map_err(|e| VerifyError::InvalidResponse {
            message: format!("malformed passport: {e}"),
        })?;
    if passport.agent_id.is_empty() {
        return Err(VerifyError::InvalidResponse {
            message: "passport agent_id is empty".to_string(),
        });
    }
    Ok(passport)
}
