//! # ap-verify
//!
//! Client for the remote passport/policy authority.
//!
//! [`PolicyVerificationClient`] submits a verification request (agent id,
//! policy id, context, optional idempotency key) and normalizes the outcome
//! into a [`Decision`](ap_passport::Decision) or a [`VerifyError`]. It never
//! half-throttles: if it cannot obtain a definitive allow/deny it reports an
//! error, and the caller's fail-closed policy blocks the action.
//!
//! ## Key invariants
//!
//! - **At-most-one in-flight verification per idempotency key**: concurrent
//!   callers sharing a previously-unseen key produce exactly one remote call
//!   and all receive the identical decision.
//! - **Replay without network**: while a decision is live, repeated calls
//!   with its key return it directly — same `decision_id`, zero requests.
//! - **Retries only for transient failures**: timeouts, connection failures,
//!   and 5xx responses retry with jittered exponential backoff; a malformed
//!   response never retries, since no backoff budget can fix it.

pub mod client;
pub mod config;
pub mod dedup;
pub mod error;
pub mod wire;

mod http;

pub use client::PolicyVerificationClient;
pub use config::VerifyConfig;
pub use dedup::IdempotencyCache;
pub use error::{VerifyError, VerifyResult};
pub use wire::VerifyRequest;
