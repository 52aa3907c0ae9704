//! # ap-passport
//!
//! Data model for agent passport authorization.
//!
//! A [`Passport`] is an agent's identity and entitlement record: its status,
//! granted [`Capability`] entries, numeric and boolean limits, an
//! [`AssuranceLevel`] describing how strongly the identity was verified, and
//! an [`McpAllowlist`] of tool-protocol servers and tools it may invoke.
//!
//! A [`Decision`] is the authoritative allow/deny outcome of a policy
//! verification, with a stable `decision_id` for audit correlation.
//!
//! ## Key invariants
//!
//! - **Passports are read-only here**: only the remote authority mutates them.
//! - **First match wins**: duplicate capability ids are a passport-authoring
//!   defect the core tolerates; lookup returns the first occurrence.
//! - **Unknown tiers fail closed**: an unrecognized assurance level never
//!   satisfies any requirement.

pub mod assurance;
pub mod context;
pub mod decision;
pub mod passport;

pub use assurance::AssuranceLevel;
pub use context::PolicyContext;
pub use decision::{codes, Decision, Reason, LOCAL_ID_PREFIX};
pub use passport::{Capability, LimitValue, McpAllowlist, Passport, PassportStatus};
