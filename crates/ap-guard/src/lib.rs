//! # ap-guard
//!
//! Pre-action authorization facade for agent frameworks.
//!
//! [`PreActionAuthorizer`] sits between an agent and its side-effecting
//! tools. Before a guarded action runs, the authorizer optionally applies
//! local fast-fail checks against a passport snapshot, then obtains a
//! decision from the remote authority, and emits an audit event for the
//! outcome. The action executes only on a definitive allow.
//!
//! ## Key invariants
//!
//! - **Fail closed**: a deny, a timeout, an unreachable authority, or a
//!   malformed response all block the action. There is no code path that
//!   executes a guarded action without an allow decision.
//! - **Local checks never authorize**: the local path can only deny early;
//!   an allow always comes from the remote verification.
//! - **Everything is audited**: allowed, denied (local or policy), and
//!   verification failure each produce exactly one audit event.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use ap_guard::{AuthorizeRequest, PreActionAuthorizer};
//! use ap_passport::PolicyContext;
//! use ap_verify::{PolicyVerificationClient, VerifyConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PolicyVerificationClient::new(VerifyConfig::from_env())?;
//! let authorizer = PreActionAuthorizer::new(client);
//!
//! let request = AuthorizeRequest::new("ap_test", "finance.payment.refund.v1")
//!     .with_context(PolicyContext::new().with("amount", 5000))
//!     .with_idempotency_key("refund-order-1234");
//!
//! let refund_id = authorizer
//!     .authorize_and_run(&request, |decision| async move {
//!         // issue the refund here; runs only after an allow
//!         decision.decision_id
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod authorizer;
pub mod error;

pub use authorizer::{AuthorizeRequest, PreActionAuthorizer, Verifier};
pub use error::{AuthorizeError, DecisionSource};
