//! Auth configuration.

use std::time::Duration;

use chatline_core::tokens::{RandomTokenIssuer, DEFAULT_TOKEN_BYTES};

/// Default access token lifetime in minutes.
const DEFAULT_ACCESS_TTL_MINS: u64 = 30;
/// Default refresh window in days.
const DEFAULT_REFRESH_TTL_DAYS: u32 = 30;
/// Default deadline for the authorize cache lookup in milliseconds.
const DEFAULT_AUTHORIZE_TIMEOUT_MS: u64 = 300;
/// Default minimum password length for registration.
const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;

/// Token lifetimes and limits for the auth layer.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Random bytes per access token and refresh-token secret.
    pub token_bytes: usize,
    /// Access token lifetime; also the cache TTL of the token.
    pub access_token_ttl: Duration,
    /// Refresh window. Every rotation restarts it from the current time.
    pub refresh_token_ttl: chrono::Duration,
    /// Upper bound on a single authorize lookup.
    pub authorize_timeout: Duration,
    pub password_min_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_bytes: DEFAULT_TOKEN_BYTES,
            access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_MINS * 60),
            refresh_token_ttl: chrono::Duration::days(i64::from(DEFAULT_REFRESH_TTL_DAYS)),
            authorize_timeout: Duration::from_millis(DEFAULT_AUTHORIZE_TIMEOUT_MS),
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
        }
    }
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `TOKEN_BYTES`            | `20`    |
    /// | `ACCESS_TOKEN_TTL_MINS`  | `30`    |
    /// | `REFRESH_TOKEN_TTL_DAYS` | `30`    |
    /// | `AUTHORIZE_TIMEOUT_MS`   | `300`   |
    /// | `PASSWORD_MIN_LENGTH`    | `8`     |
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but does not parse, if `TOKEN_BYTES` is
    /// below 16, or if either token lifetime is zero.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let token_bytes: usize = lookup("TOKEN_BYTES")
            .unwrap_or_else(|| DEFAULT_TOKEN_BYTES.to_string())
            .parse()
            .expect("TOKEN_BYTES must be a valid usize");
        assert!(token_bytes >= 16, "TOKEN_BYTES must be at least 16");

        let access_ttl_mins: u64 = lookup("ACCESS_TOKEN_TTL_MINS")
            .unwrap_or_else(|| DEFAULT_ACCESS_TTL_MINS.to_string())
            .parse()
            .expect("ACCESS_TOKEN_TTL_MINS must be a valid u64");
        assert!(access_ttl_mins > 0, "ACCESS_TOKEN_TTL_MINS must be positive");

        let refresh_ttl_days: u32 = lookup("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| DEFAULT_REFRESH_TTL_DAYS.to_string())
            .parse()
            .expect("REFRESH_TOKEN_TTL_DAYS must be a valid u32");
        assert!(refresh_ttl_days > 0, "REFRESH_TOKEN_TTL_DAYS must be positive");

        let authorize_timeout_ms: u64 = lookup("AUTHORIZE_TIMEOUT_MS")
            .unwrap_or_else(|| DEFAULT_AUTHORIZE_TIMEOUT_MS.to_string())
            .parse()
            .expect("AUTHORIZE_TIMEOUT_MS must be a valid u64");

        let password_min_length: usize = lookup("PASSWORD_MIN_LENGTH")
            .unwrap_or_else(|| DEFAULT_PASSWORD_MIN_LENGTH.to_string())
            .parse()
            .expect("PASSWORD_MIN_LENGTH must be a valid usize");

        Self {
            token_bytes,
            access_token_ttl: Duration::from_secs(access_ttl_mins * 60),
            refresh_token_ttl: chrono::Duration::days(i64::from(refresh_ttl_days)),
            authorize_timeout: Duration::from_millis(authorize_timeout_ms),
            password_min_length,
        }
    }

    /// Build the OS-entropy token issuer for these lifetimes.
    pub fn token_issuer(&self) -> RandomTokenIssuer {
        RandomTokenIssuer::new(
            self.token_bytes,
            self.access_token_ttl,
            self.refresh_token_ttl.to_std().unwrap_or_default(),
        )
    }
}
