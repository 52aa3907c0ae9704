// mcp.rs — MCP allowlist validation.
//
// Validates the set of requested tool-protocol servers and tools against a
// passport's allowlists. Validation is conjunctive: one unauthorized entry
// denies the whole request — there is no partial allow. An empty request
// trivially passes, since MCP context is optional per request.

use std::collections::BTreeSet;

use ap_passport::{codes, McpAllowlist, Reason};

/// Result of validating requested MCP servers/tools against an allowlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McpValidation {
    /// Requested servers outside the allowlist.
    pub unauthorized_servers: Vec<String>,
    /// Requested tools outside the allowlist.
    pub unauthorized_tools: Vec<String>,
}

impl McpValidation {
    /// Whether every requested server and tool is allowlisted.
    pub fn is_allowed(&self) -> bool {
        self.unauthorized_servers.is_empty() && self.unauthorized_tools.is_empty()
    }

    /// Denial reasons for the unauthorized entries, servers first.
    pub fn reasons(&self) -> Vec<Reason> {
        let mut reasons = Vec::new();
        if !self.unauthorized_servers.is_empty() {
            reasons.push(Reason::new(
                codes::MCP_SERVER_NOT_ALLOWED,
                format!(
                    "MCP server(s) not in passport allowlist: {}",
                    self.unauthorized_servers.join(", ")
                ),
            ));
        }
        if !self.unauthorized_tools.is_empty() {
            reasons.push(Reason::new(
                codes::MCP_TOOL_NOT_ALLOWED,
                format!(
                    "MCP tool(s) not in passport allowlist: {}",
                    self.unauthorized_tools.join(", ")
                ),
            ));
        }
        reasons
    }
}

/// Validate requested servers and tools against a passport's MCP allowlist.
///
/// Callers with single-valued inputs normalize to one-element sets first
/// (see [`crate::headers::McpHeaders`] and `PolicyContext::mcp_servers`),
/// so single- and multi-valued requests share this code path.
pub fn validate_mcp(
    allowlist: &McpAllowlist,
    requested_servers: &BTreeSet<String>,
    requested_tools: &BTreeSet<String>,
) -> McpValidation {
    McpValidation {
        unauthorized_servers: requested_servers
            .difference(&allowlist.servers)
            .cloned()
            .collect(),
        unauthorized_tools: requested_tools
            .difference(&allowlist.tools)
            .cloned()
            .collect(),
    }
}
