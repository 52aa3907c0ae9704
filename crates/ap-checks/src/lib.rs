//! # ap-checks
//!
//! Local fast-fail authorization checks for agent passports.
//!
//! These checks replicate just enough of the remote authority's logic to
//! reject obviously-denied requests before (or instead of) a network call:
//! capability lookup, numeric/boolean limit enforcement, MCP allowlist
//! validation, and assurance-level comparison.
//!
//! ## Key invariants
//!
//! - **Advisory only**: the local path can deny early but can never itself
//!   authorize. A final allow always comes from the remote verification.
//! - **Fail closed**: unknown limits requested against a passport, unknown
//!   assurance tiers, and inactive passports all deny.
//! - **Conjunctive MCP**: any single unauthorized server or tool denies the
//!   whole request.
//!
//! All checks are pure, synchronous computations — no I/O, no suspension.

pub mod headers;
pub mod limits;
pub mod local;
pub mod mcp;

pub use headers::McpHeaders;
pub use limits::{check_limits, LimitReport, LimitRequest, LimitViolation};
pub use local::{run_local_checks, LocalCheckRequest, LocalDenial};
pub use mcp::{validate_mcp, McpValidation};
