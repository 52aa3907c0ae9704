//! # ap-audit
//!
//! Audit events for authorization decisions.
//!
//! Every authorization attempt — allowed, denied locally, denied by the
//! remote authority, or blocked by a verification failure — is recorded as
//! an [`AuditEvent`] and handed to an injected [`AuditSink`]. Three sinks
//! ship here: [`TracingSink`] for structured logs, [`JsonlSink`] for an
//! append-only JSONL trail on disk, and [`MemorySink`] for tests. Anything
//! else (message bus, SIEM) is an implementor's sink.
//!
//! ## Quick Example
//!
//! ```rust
//! use ap_audit::{AuditEvent, AuditOutcome, AuditSink, TracingSink};
//!
//! let sink = TracingSink;
//! let event = AuditEvent::new("ap_test", "finance.payment.refund.v1", AuditOutcome::Allowed)
//!     .with_decision_id("dec_1");
//! sink.emit(&event);
//! ```

pub mod event;
pub mod log;
pub mod sink;

pub use event::{AuditEvent, AuditOutcome};
pub use log::{AuditLog, AuditLogError, JsonlSink};
pub use sink::{AuditSink, MemorySink, TracingSink};
