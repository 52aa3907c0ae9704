// authorizer.rs — The pre-action authorization facade.
//
// Ties the layers together: optional local fast-fail against a passport
// snapshot, remote policy verification through a Verifier, and audit
// emission for every outcome. The guarded action runs only after a
// definitive remote allow; everything else is an error and the action
// never executes.

use std::sync::Arc;

use ap_audit::{AuditEvent, AuditOutcome, AuditSink, TracingSink};
use ap_checks::{run_local_checks, LocalCheckRequest};
use ap_passport::{Decision, Passport, PolicyContext};
use ap_verify::{PolicyVerificationClient, VerifyResult};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{AuthorizeError, DecisionSource};

/// The remote verification seam.
///
/// The facade depends on this trait rather than the concrete client so
/// callers can substitute a stub in tests or wrap the client with their
/// own instrumentation.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        agent_id: &str,
        policy_id: &str,
        context: &PolicyContext,
        idempotency_key: Option<&str>,
    ) -> VerifyResult<Decision>;
}

#[async_trait]
impl Verifier for PolicyVerificationClient {
    async fn verify(
        &self,
        agent_id: &str,
        policy_id: &str,
        context: &PolicyContext,
        idempotency_key: Option<&str>,
    ) -> VerifyResult<Decision> {
        PolicyVerificationClient::verify(self, agent_id, policy_id, context, idempotency_key).await
    }
}

// Lets callers share one verifier between the authorizer and other users.
#[async_trait]
impl<V: Verifier + ?Sized> Verifier for Arc<V> {
    async fn verify(
        &self,
        agent_id: &str,
        policy_id: &str,
        context: &PolicyContext,
        idempotency_key: Option<&str>,
    ) -> VerifyResult<Decision> {
        V::verify(self, agent_id, policy_id, context, idempotency_key).await
    }
}

/// One authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    /// The acting agent's passport id.
    pub agent_id: String,
    /// Policy to verify against (e.g., `finance.payment.refund.v1`).
    pub policy_id: String,
    /// Policy-specific context forwarded to the authority.
    pub context: PolicyContext,
    /// Idempotency key; falls back to `context.idempotency_key()`.
    pub idempotency_key: Option<String>,
    /// Passport snapshot and checks for the local fast-fail path.
    pub local_checks: Option<(Passport, LocalCheckRequest)>,
}

impl AuthorizeRequest {
    pub fn new(agent_id: impl Into<String>, policy_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            policy_id: policy_id.into(),
            context: PolicyContext::new(),
            idempotency_key: None,
            local_checks: None,
        }
    }

    /// Attach the policy context (builder pattern).
    pub fn with_context(mut self, context: PolicyContext) -> Self {
        self.context = context;
        self
    }

    /// Set an explicit idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Run local fast-fail checks against a passport snapshot before any
    /// network call.
    pub fn with_local_checks(mut self, passport: Passport, checks: LocalCheckRequest) -> Self {
        self.local_checks = Some((passport, checks));
        self
    }
}

/// Guards side-effecting actions behind policy verification.
pub struct PreActionAuthorizer<V: Verifier> {
    verifier: V,
    sink: Arc<dyn AuditSink>,
}

impl<V: Verifier> PreActionAuthorizer<V> {
    /// Build an authorizer that audits through the tracing sink.
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the audit sink.
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Authorize without executing anything.
    ///
    /// Returns the allow decision, or an error describing why the action
    /// must not run. Every outcome is audited.
    pub async fn authorize(&self, request: &AuthorizeRequest) -> Result<Decision, AuthorizeError> {
        let decision = self.evaluate(request).await?;
        self.emit_allowed(request, &decision);
        Ok(decision)
    }

    /// Authorize, then run `action` exactly once on an allow.
    ///
    /// On any deny or verification failure the action is never invoked.
    /// The allowed event is emitted after the action completes so the
    /// trail reflects actual execution.
    pub async fn authorize_and_run<F, Fut, T>(
        &self,
        request: &AuthorizeRequest,
        action: F,
    ) -> Result<T, AuthorizeError>
    where
        F: FnOnce(Decision) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let decision = self.evaluate(request).await?;
        debug!(
            agent_id = %request.agent_id,
            policy_id = %request.policy_id,
            decision_id = %decision.decision_id,
            "authorized, executing action"
        );
        let output = action(decision.clone()).await;
        self.emit_allowed(request, &decision);
        Ok(output)
    }

    /// Shared evaluation path: local checks, then remote verification.
    /// Audits every non-allow outcome; the allow event is the caller's.
    async fn evaluate(&self, request: &AuthorizeRequest) -> Result<Decision, AuthorizeError> {
        if request.agent_id.is_empty() {
            return Err(AuthorizeError::MissingIdentity);
        }

        if let Some((passport, checks)) = &request.local_checks {
            if let Err(denial) = run_local_checks(passport, checks) {
                let decision = Decision::local_deny(denial.reasons);
                self.sink.emit(
                    &AuditEvent::new(
                        &request.agent_id,
                        &request.policy_id,
                        AuditOutcome::DeniedLocal,
                    )
                    .with_decision_id(&decision.decision_id)
                    .with_reasons(decision.reasons.clone()),
                );
                return Err(AuthorizeError::Denied {
                    decision,
                    source: DecisionSource::Local,
                });
            }
        }

        let decision = match self
            .verifier
            .verify(
                &request.agent_id,
                &request.policy_id,
                &request.context,
                request.idempotency_key.as_deref(),
            )
            .await
        {
            Ok(decision) => decision,
            Err(e) => {
                self.sink.emit(
                    &AuditEvent::new(
                        &request.agent_id,
                        &request.policy_id,
                        AuditOutcome::VerificationFailed,
                    )
                    .with_metadata(serde_json::json!({"error": e.to_string()})),
                );
                return Err(e.into());
            }
        };

        if !decision.allow {
            self.sink.emit(
                &AuditEvent::new(
                    &request.agent_id,
                    &request.policy_id,
                    AuditOutcome::DeniedPolicy,
                )
                .with_decision_id(&decision.decision_id)
                .with_reasons(decision.reasons.clone()),
            );
            return Err(AuthorizeError::Denied {
                decision,
                source: DecisionSource::Remote,
            });
        }

        Ok(decision)
    }

    fn emit_allowed(&self, request: &AuthorizeRequest, decision: &Decision) {
        info!(
            agent_id = %request.agent_id,
            policy_id = %request.policy_id,
            decision_id = %decision.decision_id,
            "action authorized"
        );
        self.sink.emit(
            &AuditEvent::new(&request.agent_id, &request.policy_id, AuditOutcome::Allowed)
                .with_decision_id(&decision.decision_id),
        );
    }
}
