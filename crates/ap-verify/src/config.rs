// config.rs — Verification client configuration.
//
// Defaults suit a synchronous authorization path: short per-attempt timeout,
// a small retry cap, and conservative cache TTLs. Every field has a `with_*`
// builder so callers override only what they need.

use std::time::Duration;

/// Configuration for [`PolicyVerificationClient`](crate::PolicyVerificationClient).
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Base URL of the passport/policy authority.
    pub base_url: String,

    /// API key sent as a bearer token. Optional for public endpoints.
    pub api_key: Option<String>,

    /// Timeout per request attempt — retries each get a fresh budget,
    /// bounded by `max_retries`.
    pub timeout: Duration,

    /// Additional attempts after the first for transient failures.
    pub max_retries: u32,

    /// Ceiling on how long a decision is reusable under its idempotency
    /// key. The effective TTL is `min(dedup_ttl, decision.expires_in)`.
    pub dedup_ttl: Duration,

    /// How long a fetched passport snapshot may serve local checks.
    pub passport_ttl: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.agentpassport.dev".to_string(),
            api_key: None,
            timeout: Duration::from_secs(2),
            max_retries: 2,
            dedup_ttl: Duration::from_secs(60),
            passport_ttl: Duration::from_secs(30),
        }
    }
}

impl VerifyConfig {
    /// Read `AP_API_URL` and `AP_API_KEY` from the environment, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("AP_API_URL") {
            config.base_url = url;
        }
        if let Ok(key) = std::env::var("AP_API_KEY") {
            config.api_key = Some(key);
        }
        config
    }

    /// Set the authority base URL.
    pub fn with_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the bearer API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the transient-failure retry cap.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the idempotency cache TTL ceiling.
    pub fn with_dedup_ttl(mut self, ttl: Duration) -> Self {
        self.dedup_ttl = ttl;
        self
    }

    /// Set the passport snapshot TTL.
    pub fn with_passport_ttl(mut self, ttl: Duration) -> Self {
        self.passport_ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fit_a_synchronous_path() {
        let config = VerifyConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.max_retries, 2);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn builders_override_fields() {
        let config = VerifyConfig::default()
            .with_url("http://localhost:8787")
            .with_api_key("test-key")
            .with_timeout(Duration::from_millis(250))
            .with_max_retries(0);
        assert_eq!(config.base_url, "http://localhost:8787");
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.max_retries, 0);
    }
}
