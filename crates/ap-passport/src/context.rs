// context.rs — The caller-supplied policy context.
//
// The context is an untyped JSON object at the core boundary: the remote
// authority validates it per-policy. The core only cares about three things:
// the idempotency key (when dedup is requested), and the shapes of the
// `mcp_servers` / `mcp_tools` fields (which accept both a single string and
// an array of strings — single-valued callers share the array code path).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known context field names.
const IDEMPOTENCY_KEY: &str = "idempotency_key";
const MCP_SERVERS: &str = "mcp_servers";
const MCP_TOOLS: &str = "mcp_tools";
const MCP_SESSION: &str = "mcp_session";

/// Action-specific fields submitted with a verification request
/// (amount, currency, customer_id, table_name, mcp_servers, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PolicyContext(Map<String, Value>);

impl PolicyContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field and return self (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set a field in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Read a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The caller's idempotency key, if one was supplied.
    ///
    /// No key means deduplication is skipped for the call — that is the
    /// caller's choice, not a defect.
    pub fn idempotency_key(&self) -> Option<&str> {
        self.0.get(IDEMPOTENCY_KEY).and_then(Value::as_str)
    }

    /// Requested MCP servers, normalized: a single string becomes a
    /// one-element set, an array of strings becomes a set.
    pub fn mcp_servers(&self) -> BTreeSet<String> {
        string_set(self.0.get(MCP_SERVERS))
    }

    /// Requested MCP tools, normalized the same way as [`mcp_servers`].
    ///
    /// [`mcp_servers`]: Self::mcp_servers
    pub fn mcp_tools(&self) -> BTreeSet<String> {
        string_set(self.0.get(MCP_TOOLS))
    }

    /// The MCP session id, if present.
    pub fn mcp_session(&self) -> Option<&str> {
        self.0.get(MCP_SESSION).and_then(Value::as_str)
    }

    /// Attach normalized MCP fields (arrays on the wire).
    pub fn with_mcp(
        mut self,
        servers: impl IntoIterator<Item = String>,
        tools: impl IntoIterator<Item = String>,
        session: Option<String>,
    ) -> Self {
        let servers: Vec<Value> = servers.into_iter().map(Value::String).collect();
        let tools: Vec<Value> = tools.into_iter().map(Value::String).collect();
        if !servers.is_empty() {
            self.0.insert(MCP_SERVERS.to_string(), Value::Array(servers));
        }
        if !tools.is_empty() {
            self.0.insert(MCP_TOOLS.to_string(), Value::Array(tools));
        }
        if let Some(session) = session {
            self.0.insert(MCP_SESSION.to_string(), Value::String(session));
        }
        self
    }

    /// The raw JSON object, as sent to the remote authority.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for PolicyContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Normalize a string-or-array JSON value into a set of strings.
/// Non-string array elements are ignored rather than rejected — the remote
/// authority is the final validator of context shape.
fn string_set(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        Some(Value::String(s)) => BTreeSet::from([s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}
