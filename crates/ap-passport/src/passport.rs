// passport.rs — The agent passport: identity, capabilities, limits, allowlists.
//
// A passport is owned and mutated exclusively by the remote authority. The
// core reads it (possibly from a short-TTL cache) and never writes it back.
// Every field here mirrors the authority's passport view response.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::assurance::AssuranceLevel;

/// Lifecycle status of a passport. Anything but `Active` denies all actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassportStatus {
    Active,
    Suspended,
    Revoked,
}

/// A named permission grant with structured parameters.
///
/// Capability ids use a dotted namespace (e.g., `finance.payment.refund`,
/// `data.export`). The `params` document carries policy-specific settings —
/// allowed channels, allowed repos, required review counts — which the core
/// passes through without interpreting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capability {
    /// Dotted capability id.
    pub id: String,
    /// Schema-less parameter document. Interpretation belongs to the policy,
    /// not to this crate.
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Capability {
    /// Create a capability with no parameters.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: serde_json::Map::new(),
        }
    }

    /// Set a parameter and return self (builder pattern).
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// A limit on a passport: either a numeric ceiling/cap or a boolean gate.
///
/// `#[serde(untagged)]` accepts both `5000` and `true` on the wire, matching
/// the authority's mixed-value limits map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LimitValue {
    Number(f64),
    Bool(bool),
}

impl LimitValue {
    /// Numeric value, if this limit is numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(_) => None,
        }
    }

    /// Boolean value, if this limit is a gate.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(_) => None,
        }
    }
}

impl From<f64> for LimitValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for LimitValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// The tool-protocol servers and tools a passport permits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct McpAllowlist {
    /// Allowed MCP server URIs.
    #[serde(default)]
    pub servers: BTreeSet<String>,
    /// Allowed MCP tool names.
    #[serde(default)]
    pub tools: BTreeSet<String>,
}

/// An agent's identity and entitlement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passport {
    /// Opaque stable agent identifier (e.g., `ap_a2d10232c6534523812423ee`).
    pub agent_id: String,

    /// Lifecycle status — only `Active` passports authorize anything.
    pub status: PassportStatus,

    /// Ordered capability grants. Ids need not be unique; lookup uses the
    /// first occurrence.
    #[serde(default)]
    pub capabilities: Vec<Capability>,

    /// Numeric and boolean limits keyed by limit name
    /// (e.g., `refund_amount_max_per_tx`, `allow_pii`).
    #[serde(default)]
    pub limits: BTreeMap<String, LimitValue>,

    /// How strongly this agent's identity has been verified.
    pub assurance_level: AssuranceLevel,

    /// MCP server/tool allowlists.
    #[serde(default)]
    pub mcp: McpAllowlist,
}

impl Passport {
    /// Find a capability by exact id match.
    ///
    /// First occurrence wins when duplicate ids exist — duplicates are a
    /// passport-authoring defect this lookup tolerates rather than rejects.
    /// Absence is a value, not an error; callers decide whether it is fatal.
    pub fn find_capability(&self, capability_id: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.id == capability_id)
    }

    /// Whether this passport is in a state that can authorize anything.
    pub fn is_active(&self) -> bool {
        self.status == PassportStatus::Active
    }
}
