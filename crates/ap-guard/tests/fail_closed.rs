//! Fail-closed behavior of the authorization facade.
//!
//! Uses a scripted stub verifier and the in-memory audit sink to assert
//! the core contract: the guarded action runs exactly once on an allow
//! and zero times on every other outcome, and each outcome leaves the
//! expected audit event behind.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ap_audit::{AuditOutcome, MemorySink};
use ap_checks::{LimitRequest, LocalCheckRequest};
use ap_guard::{AuthorizeError, AuthorizeRequest, DecisionSource, PreActionAuthorizer, Verifier};
use ap_passport::{
    AssuranceLevel, Capability, Decision, LimitValue, Passport, PassportStatus, PolicyContext,
    Reason,
};
use ap_verify::{VerifyError, VerifyResult};
use async_trait::async_trait;

const POLICY: &str = "finance.payment.refund.v1";

/// Verifier that replays scripted results and counts invocations.
struct StubVerifier {
    results: Mutex<Vec<VerifyResult<Decision>>>,
    calls: AtomicUsize,
}

impl StubVerifier {
    fn scripted(results: Vec<VerifyResult<Decision>>) -> Self {
        Self {
            results: Mutex::new(results),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Verifier for StubVerifier {
    async fn verify(
        &self,
        _agent_id: &str,
        _policy_id: &str,
        _context: &PolicyContext,
        _idempotency_key: Option<&str>,
    ) -> VerifyResult<Decision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .remove(0)
    }
}

fn allow_decision(id: &str) -> Decision {
    Decision {
        decision_id: id.to_string(),
        allow: true,
        reasons: vec![],
        assurance_level: Some(AssuranceLevel::L2),
        remaining_limits: Default::default(),
        expires_in: Some(300),
    }
}

fn deny_decision(id: &str) -> Decision {
    Decision {
        decision_id: id.to_string(),
        allow: false,
        reasons: vec![Reason::new("limit_exceeded", "over daily cap")],
        assurance_level: None,
        remaining_limits: Default::default(),
        expires_in: None,
    }
}

fn refund_passport() -> Passport {
    Passport {
        agent_id: "ap_test".to_string(),
        status: PassportStatus::Active,
        capabilities: vec![Capability::new("payments.refund")],
        limits: [(
            "refund_amount_max_per_tx".to_string(),
            LimitValue::Number(5000.0),
        )]
        .into_iter()
        .collect(),
        assurance_level: AssuranceLevel::L2,
        mcp: Default::default(),
    }
}

fn guarded(
    results: Vec<VerifyResult<Decision>>,
) -> (PreActionAuthorizer<Arc<StubVerifier>>, Arc<StubVerifier>, Arc<MemorySink>) {
    let verifier = Arc::new(StubVerifier::scripted(results));
    let sink = Arc::new(MemorySink::new());
    let authorizer = PreActionAuthorizer::new(Arc::clone(&verifier)).with_sink(sink.clone());
    (authorizer, verifier, sink)
}

#[tokio::test]
async fn allow_executes_the_action_exactly_once() {
    let (authorizer, verifier, sink) = guarded(vec![Ok(allow_decision("dec_1"))]);
    let request = AuthorizeRequest::new("ap_test", POLICY)
        .with_context(PolicyContext::new().with("amount", 5000));

    let ran = AtomicUsize::new(0);
    let output = authorizer
        .authorize_and_run(&request, |decision| {
            ran.fetch_add(1, Ordering::SeqCst);
            async move { decision.decision_id }
        })
        .await
        .expect("allow should execute");

    assert_eq!(output, "dec_1");
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(verifier.calls(), 1);

    let events = sink.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::Allowed);
    assert_eq!(events[0].decision_id.as_deref(), Some("dec_1"));
}

#[tokio::test]
async fn policy_deny_blocks_the_action() {
    let (authorizer, _verifier, sink) = guarded(vec![Ok(deny_decision("dec_no"))]);
    let request = AuthorizeRequest::new("ap_test", POLICY);

    let ran = AtomicUsize::new(0);
    let err = authorizer
        .authorize_and_run(&request, |_| async {
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap_err();

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    match err {
        AuthorizeError::Denied { decision, source } => {
            assert_eq!(source, DecisionSource::Remote);
            assert_eq!(decision.decision_id, "dec_no");
            assert_eq!(decision.reasons[0].code, "limit_exceeded");
        }
        other => panic!("expected Denied, got {other:?}"),
    }

    let events = sink.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::DeniedPolicy);
    assert!(!events[0].allow);
}

#[tokio::test]
async fn every_verification_failure_blocks_the_action() {
    let failures = vec![
        VerifyError::Unavailable {
            message: "HTTP 503".into(),
        },
        VerifyError::InvalidResponse {
            message: "not json".into(),
        },
        VerifyError::Unauthorized {
            message: "bad key".into(),
        },
        VerifyError::NotFound {
            message: "no such policy".into(),
        },
        VerifyError::RateLimited { retry_after: None },
    ];

    for failure in failures {
        let (authorizer, _verifier, sink) = guarded(vec![Err(failure)]);
        let request = AuthorizeRequest::new("ap_test", POLICY);

        let ran = AtomicUsize::new(0);
        let err = authorizer
            .authorize_and_run(&request, |_| async {
                ran.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap_err();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(matches!(err, AuthorizeError::Verification(_)));

        let events = sink.recorded();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, AuditOutcome::VerificationFailed);
        assert!(events[0].decision_id.is_none());
    }
}

#[tokio::test]
async fn local_denial_never_reaches_the_verifier() {
    let (authorizer, verifier, sink) = guarded(vec![Ok(allow_decision("dec_unused"))]);
    let checks = LocalCheckRequest::new()
        .with_capability("payments.refund")
        .with_limit("refund_amount_max_per_tx", LimitRequest::Amount(5001.0));
    let request = AuthorizeRequest::new("ap_test", POLICY)
        .with_local_checks(refund_passport(), checks);

    let ran = AtomicUsize::new(0);
    let err = authorizer
        .authorize_and_run(&request, |_| async {
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap_err();

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(verifier.calls(), 0);
    match err {
        AuthorizeError::Denied { decision, source } => {
            assert_eq!(source, DecisionSource::Local);
            assert!(decision.is_local());
            assert_eq!(decision.reasons[0].code, "limit_exceeded");
        }
        other => panic!("expected local Denied, got {other:?}"),
    }

    let events = sink.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::DeniedLocal);
}

#[tokio::test]
async fn local_pass_still_requires_the_remote_allow() {
    let (authorizer, verifier, _sink) = guarded(vec![Ok(deny_decision("dec_no"))]);
    let checks = LocalCheckRequest::new()
        .with_capability("payments.refund")
        .with_limit("refund_amount_max_per_tx", LimitRequest::Amount(5000.0));
    let request = AuthorizeRequest::new("ap_test", POLICY)
        .with_local_checks(refund_passport(), checks);

    let err = authorizer.authorize(&request).await.unwrap_err();
    assert_eq!(verifier.calls(), 1);
    assert!(matches!(
        err,
        AuthorizeError::Denied {
            source: DecisionSource::Remote,
            ..
        }
    ));
}

#[tokio::test]
async fn missing_identity_is_rejected_before_anything_happens() {
    let (authorizer, verifier, sink) = guarded(vec![Ok(allow_decision("dec_unused"))]);
    let request = AuthorizeRequest::new("", POLICY);

    let err = authorizer.authorize(&request).await.unwrap_err();
    assert!(matches!(err, AuthorizeError::MissingIdentity));
    assert_eq!(verifier.calls(), 0);
    assert!(sink.recorded().is_empty());
}

#[tokio::test]
async fn authorize_emits_the_allowed_event() {
    let (authorizer, _verifier, sink) = guarded(vec![Ok(allow_decision("dec_1"))]);
    let request = AuthorizeRequest::new("ap_test", POLICY);

    let decision = authorizer.authorize(&request).await.unwrap();
    assert!(decision.allow);

    let events = sink.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::Allowed);
    assert_eq!(events[0].agent_id, "ap_test");
    assert_eq!(events[0].policy_id, POLICY);
}
