// local.rs — The combined local fast-fail runner.
//
// Composes the individual checks against a passport snapshot, in a fixed
// order: status, capability, assurance, limits, MCP. All checks run and all
// reasons are gathered so a denied caller sees every problem at once, not
// just the first.
//
// This path is advisory: it can deny early to save a network round-trip,
// but it can never authorize. A pass here still requires the remote
// verification to allow.

use std::collections::BTreeMap;

use ap_passport::{codes, AssuranceLevel, Passport, Reason};
use tracing::debug;

use crate::headers::McpHeaders;
use crate::limits::{check_limits, LimitRequest};
use crate::mcp::validate_mcp;

/// What to check a passport snapshot against before the remote call.
///
/// Every field is optional; an empty request checks only passport status.
#[derive(Debug, Clone, Default)]
pub struct LocalCheckRequest {
    /// Capability the action requires (e.g., `payments.refund`).
    pub capability_id: Option<String>,
    /// Minimum assurance tier the action requires.
    pub min_assurance: Option<AssuranceLevel>,
    /// Requested values per limit name.
    pub limits: BTreeMap<String, LimitRequest>,
    /// Requested MCP servers/tools.
    pub mcp: McpHeaders,
}

impl LocalCheckRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a capability (builder pattern).
    pub fn with_capability(mut self, capability_id: impl Into<String>) -> Self {
        self.capability_id = Some(capability_id.into());
        self
    }

    /// Require a minimum assurance tier.
    pub fn with_min_assurance(mut self, level: AssuranceLevel) -> Self {
        self.min_assurance = Some(level);
        self
    }

    /// Test a value against a named limit.
    pub fn with_limit(mut self, name: impl Into<String>, request: LimitRequest) -> Self {
        self.limits.insert(name.into(), request);
        self
    }

    /// Validate MCP context against the passport allowlist.
    pub fn with_mcp(mut self, mcp: McpHeaders) -> Self {
        self.mcp = mcp;
        self
    }
}

/// A local denial: the ordered reasons the passport snapshot failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDenial {
    pub reasons: Vec<Reason>,
}

/// Run every requested check against the passport snapshot.
///
/// `Ok(())` means no local objection — it does NOT mean the action is
/// authorized; only the remote verification can allow.
pub fn run_local_checks(
    passport: &Passport,
    request: &LocalCheckRequest,
) -> Result<(), LocalDenial> {
    let mut reasons = Vec::new();

    if !passport.is_active() {
        reasons.push(Reason::new(
            codes::PASSPORT_NOT_ACTIVE,
            format!("passport '{}' is not active", passport.agent_id),
        ));
    }

    if let Some(capability_id) = &request.capability_id {
        if passport.find_capability(capability_id).is_none() {
            reasons.push(Reason::new(
                codes::CAPABILITY_MISSING,
                format!("passport does not grant capability '{capability_id}'"),
            ));
        }
    }

    if let Some(required) = request.min_assurance {
        if !passport.assurance_level.satisfies(required) {
            reasons.push(Reason::new(
                codes::ASSURANCE_INSUFFICIENT,
                format!(
                    "assurance {} does not satisfy required {}",
                    passport.assurance_level, required
                ),
            ));
        }
    }

    if !request.limits.is_empty() {
        let report = check_limits(&passport.limits, &request.limits);
        reasons.extend(report.reasons());
    }

    if !request.mcp.is_empty() {
        let validation = validate_mcp(&passport.mcp, &request.mcp.servers, &request.mcp.tools);
        reasons.extend(validation.reasons());
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        debug!(
            agent_id = %passport.agent_id,
            reason_count = reasons.len(),
            "local checks denied before remote verification"
        );
        Err(LocalDenial { reasons })
    }
}
