// client.rs — The policy verification client.
//
// Orchestrates the remote check: consult the idempotency cache, reserve the
// key, issue the HTTP request with the retry policy, decode the decision,
// and commit it for replay. Also serves passport snapshots for the local
// fast-fail path, behind a short TTL.
//
// A deny is a successful verification with allow=false. An error means no
// definitive answer was obtained — the caller must fail closed.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use ap_passport::{Decision, Passport, PolicyContext};
use tokio::time::Instant;
use tracing::debug;

use crate::config::VerifyConfig;
use crate::dedup::IdempotencyCache;
use crate::error::VerifyResult;
use crate::http::HttpBackend;
use crate::wire::{self, VerifyRequest};

/// Client for the remote passport/policy authority.
pub struct PolicyVerificationClient {
    http: HttpBackend,
    dedup: IdempotencyCache,
    passports: PassportCache,
}

impl PolicyVerificationClient {
    /// Build a client from config. Fails only on client-side setup problems.
    pub fn new(config: VerifyConfig) -> VerifyResult<Self> {
        let dedup = IdempotencyCache::new(config.dedup_ttl);
        let passports = PassportCache::new(config.passport_ttl);
        let http = HttpBackend::new(config)?;
        Ok(Self {
            http,
            dedup,
            passports,
        })
    }

    /// Verify an action against a named policy.
    ///
    /// With an idempotency key (explicit, or found in the context), repeated
    /// and concurrent calls within the decision's validity window share one
    /// remote verification and receive the identical decision.
    pub async fn verify(
        &self,
        agent_id: &str,
        policy_id: &str,
        context: &PolicyContext,
        idempotency_key: Option<&str>,
    ) -> VerifyResult<Decision> {
        let key = idempotency_key.or_else(|| context.idempotency_key());
        let path = format!("/api/verify/policy/{policy_id}");
        let request = VerifyRequest {
            agent_id: agent_id.to_string(),
            context: context.clone(),
            idempotency_key: key.map(str::to_string),
        };

        match key {
            Some(key) => {
                self.dedup
                    .get_or_verify(key, || self.post_decision(&path, &request))
                    .await
            }
            // No key: every call is independently verified, by caller choice.
            None => self.post_decision(&path, &request).await,
        }
    }

    /// Fetch an agent's passport view, serving from the snapshot cache
    /// while it is fresh.
    ///
    /// Passports are read-only reference data here, so a racing duplicate
    /// fetch is harmless — the cache avoids the common repeat, it does not
    /// guard a side effect the way the idempotency cache does.
    pub async fn fetch_passport(&self, agent_id: &str) -> VerifyResult<Passport> {
        if let Some(passport) = self.passports.get(agent_id) {
            debug!(agent_id, "passport served from snapshot cache");
            return Ok(passport);
        }

        let value = self
            .http
            .get_json(&format!("/api/passports/{agent_id}"))
            .await?;
        let passport = wire::decode_passport(value)?;
        self.passports.put(passport.clone());
        Ok(passport)
    }

    async fn post_decision(&self, path: &str, request: &VerifyRequest) -> VerifyResult<Decision> {
        let value = self.http.post_json(path, request).await?;
        wire::decode_decision(value)
    }
}

/// Short-TTL cache of passport snapshots keyed by agent id.
#[derive(Debug)]
struct PassportCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Passport, Instant)>>,
}

impl PassportCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, agent_id: &str) -> Option<Passport> {
        let entries = self.entries.lock().expect("passport cache poisoned");
        entries.get(agent_id).and_then(|(passport, fetched_at)| {
            (fetched_at.elapsed() < self.ttl).then(|| passport.clone())
        })
    }

    /// Insert a snapshot, sweeping stale entries while the lock is held so
    /// agents that are never fetched again do not accumulate.
    fn put(&self, passport: Passport) {
        let mut entries = self.entries.lock().expect("passport cache poisoned");
        entries.retain(|_, entry| entry.1.elapsed() < self.ttl);
        entries.insert(passport.agent_id.clone(), (passport, Instant::now()));
    }
}
