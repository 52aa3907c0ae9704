// headers.rs — Transport header normalization for MCP context.
//
// Adapters extract MCP context from whatever transport headers they use
// (X-MCP-Servers / X-MCP-Server, X-MCP-Tools / X-MCP-Tool, X-MCP-Session,
// single or comma-joined multi-value). The core is transport-agnostic and
// only ever consumes the normalized form produced here.

use std::collections::BTreeSet;

use ap_passport::PolicyContext;

/// Normalized MCP context extracted from request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McpHeaders {
    /// Requested MCP server URIs.
    pub servers: BTreeSet<String>,
    /// Requested MCP tool names.
    pub tools: BTreeSet<String>,
    /// Session identifier, if the transport carried one.
    pub session: Option<String>,
}

impl McpHeaders {
    /// Normalize raw header values.
    ///
    /// Each value may be a single entry or a comma-joined list; entries are
    /// trimmed and empties dropped, so `"a, b,"` yields `{a, b}`.
    pub fn from_values(
        servers: Option<&str>,
        tools: Option<&str>,
        session: Option<&str>,
    ) -> Self {
        Self {
            servers: split_values(servers),
            tools: split_values(tools),
            session: session
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// Build the same normalized form from context fields instead of
    /// transport headers (callers that already carry `mcp_servers` /
    /// `mcp_tools` in their [`PolicyContext`]).
    pub fn from_context(context: &PolicyContext) -> Self {
        Self {
            servers: context.mcp_servers(),
            tools: context.mcp_tools(),
            session: context.mcp_session().map(str::to_string),
        }
    }

    /// Whether any MCP context was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty() && self.tools.is_empty()
    }
}

fn split_values(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
