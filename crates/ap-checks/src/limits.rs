// limits.rs — Numeric and boolean limit enforcement.
//
// Three limit kinds exist, distinguished by name and value type:
//
// 1. Per-transaction ceilings (`refund_amount_max_per_tx`, `max_export_rows`):
//    fail when the requested value exceeds the limit; equality passes.
// 2. Cumulative/daily caps (`msgs_per_day`, `*_daily_cap`): the core does not
//    track usage — that is server-side state. It only validates
//    already_used + requested <= cap when the caller reports a usage figure;
//    otherwise the check defers entirely to the remote decision.
// 3. Boolean gates (`allow_pii`): fail when the caller requests the gated
//    behavior but the limit is false or absent.
//
// A limit present on the passport but not requested imposes nothing. A limit
// requested but absent from the passport fails closed: an unlisted limit can
// mean the passport never granted the underlying capability at all.

use std::collections::BTreeMap;

use ap_passport::{codes, LimitValue, Reason};

/// The value a caller wants tested against one named limit.
#[derive(Debug, Clone, PartialEq)]
pub enum LimitRequest {
    /// A per-transaction quantity (amount, row count, size).
    Amount(f64),
    /// A requested boolean behavior (e.g., include PII).
    Flag(bool),
    /// A quantity counted against a cumulative cap, with the usage figure
    /// reported by the caller's context when it has one.
    Cumulative {
        amount: f64,
        already_used: Option<f64>,
    },
}

/// One violated limit.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitViolation {
    /// The limit name that failed.
    pub limit: String,
    /// Why, as a decision reason.
    pub reason: Reason,
}

/// Result of checking requested values against a passport's limits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitReport {
    /// Violations in request order; empty means pass.
    pub violations: Vec<LimitViolation>,
    /// Remaining headroom per numeric limit checked, clamped to zero.
    pub remaining: BTreeMap<String, f64>,
}

impl LimitReport {
    /// Whether every requested limit passed.
    pub fn is_pass(&self) -> bool {
        self.violations.is_empty()
    }

    /// The violation reasons, in order.
    pub fn reasons(&self) -> Vec<Reason> {
        self.violations.iter().map(|v| v.reason.clone()).collect()
    }
}

/// Check requested values against a passport's limits map.
pub fn check_limits(
    limits: &BTreeMap<String, LimitValue>,
    requested: &BTreeMap<String, LimitRequest>,
) -> LimitReport {
    let mut report = LimitReport::default();

    for (name, request) in requested {
        let Some(limit) = limits.get(name) else {
            // Requested but never granted — fail closed.
            report.violations.push(LimitViolation {
                limit: name.clone(),
                reason: Reason::new(
                    codes::LIMIT_NOT_GRANTED,
                    format!("limit '{name}' is not granted on this passport"),
                ),
            });
            continue;
        };

        match (request, limit) {
            (LimitRequest::Amount(amount), LimitValue::Number(ceiling)) => {
                if amount > ceiling {
                    report.violations.push(exceeded(name, *amount, *ceiling));
                }
                report
                    .remaining
                    .insert(name.clone(), (ceiling - amount).max(0.0));
            }

            (
                LimitRequest::Cumulative {
                    amount,
                    already_used,
                },
                LimitValue::Number(cap),
            ) => match already_used {
                Some(used) => {
                    let total = used + amount;
                    if total > *cap {
                        report.violations.push(exceeded(name, total, *cap));
                    }
                    report
                        .remaining
                        .insert(name.clone(), (cap - total).max(0.0));
                }
                // No usage figure reported — the remote authority owns the
                // cumulative state, so the local check defers.
                None => {}
            },

            (LimitRequest::Flag(requested_flag), LimitValue::Bool(allowed)) => {
                if *requested_flag && !allowed {
                    report.violations.push(LimitViolation {
                        limit: name.clone(),
                        reason: Reason::new(
                            codes::LIMIT_EXCEEDED,
                            format!("'{name}' is not permitted for this passport"),
                        ),
                    });
                }
            }

            // Kind mismatch between the request and the granted limit value.
            // Treat like an ungranted limit: fail closed.
            _ => {
                report.violations.push(LimitViolation {
                    limit: name.clone(),
                    reason: Reason::new(
                        codes::LIMIT_NOT_GRANTED,
                        format!("limit '{name}' has a different kind than requested"),
                    ),
                });
            }
        }
    }

    report
}

fn exceeded(name: &str, requested: f64, limit: f64) -> LimitViolation {
    LimitViolation {
        limit: name.to_string(),
        reason: Reason::new(
            codes::LIMIT_EXCEEDED,
            format!("'{name}': requested {requested} exceeds limit {limit}"),
        ),
    }
}
