// dedup.rs — Idempotency-keyed decision cache.
//
// The cache guarantees at-most-one in-flight remote verification per
// idempotency key: a second caller presenting the same key while the first
// is still pending waits for the first's outcome instead of issuing a
// duplicate remote call. This is the property protecting against
// double-spend style bugs when an agent framework retries a tool call.
//
// Each key maps to a slot holding a `tokio::sync::OnceCell`. The cell's
// init serializes racing initializers per key; the map mutex is held only
// for slot lookup, never across I/O, so unrelated keys never serialize on
// each other. If an initializer fails or is cancelled, the cell stays
// empty and the next caller (or a waiting one) performs the verification —
// the reservation is effectively released.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ap_passport::Decision;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::debug;

use crate::error::VerifyResult;

#[derive(Debug, Clone)]
struct CachedDecision {
    decision: Decision,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Slot {
    cell: OnceCell<CachedDecision>,
}

/// Maps idempotency keys to live decisions, deduplicating verification.
#[derive(Debug)]
pub struct IdempotencyCache {
    default_ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl IdempotencyCache {
    /// Create a cache whose entries live at most `default_ttl`
    /// (shortened further by each decision's own `expires_in`).
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The live decision for a key, if one is cached and unexpired.
    pub fn get(&self, key: &str) -> Option<Decision> {
        self.live_slot(key)
            .cell
            .get()
            .map(|cached| cached.decision.clone())
    }

    /// Return the cached decision for `key`, or run `verify` to produce one.
    ///
    /// Racing callers on the same key converge on a single `verify` run and
    /// all receive clones of the identical decision. A failed run caches
    /// nothing; the error propagates to the caller that ran it, and other
    /// waiters proceed to try their own run.
    pub async fn get_or_verify<F, Fut>(&self, key: &str, verify: F) -> VerifyResult<Decision>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VerifyResult<Decision>>,
    {
        let slot = self.live_slot(key);
        let default_ttl = self.default_ttl;

        if slot.cell.initialized() {
            debug!(key, "idempotent replay served from cache");
        }

        let cached = slot
            .cell
            .get_or_try_init(|| async move {
                let decision = verify().await?;
                let ttl = decision
                    .expires_in
                    .map(Duration::from_secs)
                    .map(|expires_in| expires_in.min(default_ttl))
                    .unwrap_or(default_ttl);
                Ok::<_, crate::error::VerifyError>(CachedDecision {
                    decision,
                    expires_at: Instant::now() + ttl,
                })
            })
            .await?;

        Ok(cached.decision.clone())
    }

    /// Drop a key's entry outright (tests and administrative resets).
    pub fn evict(&self, key: &str) {
        self.slots
            .lock()
            .expect("idempotency cache poisoned")
            .remove(key);
    }

    /// Fetch the slot for a key, sweeping expired entries first. The map
    /// lock is held only for this lookup.
    ///
    /// Keys are fresh per logical action, so most are never requested again
    /// after their entry expires; without the sweep the map would only ever
    /// grow. In-flight slots (empty cell) are never swept.
    fn live_slot(&self, key: &str) -> Arc<Slot> {
        let mut slots = self.slots.lock().expect("idempotency cache poisoned");

        let now = Instant::now();
        slots.retain(|_, slot| {
            slot.cell
                .get()
                .map_or(true, |cached| cached.expires_at > now)
        });

        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }

        let fresh = Arc::new(Slot::default());
        slots.insert(key.to_string(), Arc::clone(&fresh));
        fresh
    }
}
