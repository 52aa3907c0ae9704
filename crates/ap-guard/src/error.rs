// error.rs — Authorization error types.
//
// Every non-allow outcome is an error at this layer, because the facade's
// contract is that the guarded action runs only after a definitive allow.
// The variants preserve the distinction between a policy deny (the system
// worked and said no) and a verification failure (the system could not
// answer, so the action is blocked fail-closed).

use std::fmt;

use ap_passport::Decision;
use ap_verify::VerifyError;

/// Which layer produced a deny decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    /// A local fast-fail check denied before any network call.
    Local,
    /// The remote authority issued the deny.
    Remote,
}

/// Why a guarded action did not execute.
//
// Display/Error/From are written by hand rather than derived: thiserror
// treats any field named `source` as the std::error::Error source, but the
// `source` on `Denied` is plain data (which layer denied), not an error.
#[derive(Debug)]
pub enum AuthorizeError {
    /// The request carried no agent id. Nothing was verified or audited.
    MissingIdentity,

    /// A definitive deny. The decision carries the reasons.
    Denied {
        decision: Decision,
        source: DecisionSource,
    },

    /// Verification could not complete. No decision exists; the action was
    /// blocked fail-closed.
    Verification(VerifyError),
}

impl fmt::Display for AuthorizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "authorization request has no agent id"),
            Self::Denied { decision, source } => {
                write!(f, "action denied ({source:?}): {}", summarize(decision))
            }
            Self::Verification(err) => {
                write!(f, "verification failed, action blocked: {err}")
            }
        }
    }
}

impl std::error::Error for AuthorizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Verification(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VerifyError> for AuthorizeError {
    fn from(err: VerifyError) -> Self {
        Self::Verification(err)
    }
}

impl AuthorizeError {
    /// The decision behind a deny, when one exists.
    pub fn decision(&self) -> Option<&Decision> {
        match self {
            Self::Denied { decision, .. } => Some(decision),
            _ => None,
        }
    }
}

fn summarize(decision: &Decision) -> String {
    if decision.reasons.is_empty() {
        decision.decision_id.clone()
    } else {
        decision
            .reasons
            .iter()
            .map(|r| r.code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
