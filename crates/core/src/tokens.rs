//! Opaque access / refresh token generation.
//!
//! Both token kinds are `token_bytes` bytes from the OS entropy source,
//! encoded as unpadded URL-safe base64. A refresh token is prefixed with the
//! id of the session that owns it: `{session_id}.{secret}`.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// Random bytes per token when not configured otherwise.
pub const DEFAULT_TOKEN_BYTES: usize = 20;

/// Separator between the session id and the secret of a refresh token.
pub const REFRESH_TOKEN_SEPARATOR: char = '.';

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("malformed refresh token")]
    MalformedRefreshToken,
}

/// A freshly minted token together with the lifetime it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub ttl: Duration,
}

/// The pair handed to a client by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints access and refresh tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue_access_token(&self) -> Result<IssuedToken, TokenError>;
    fn issue_refresh_token(&self, session_id: SessionId) -> Result<IssuedToken, TokenError>;
}

/// [`TokenIssuer`] backed by the operating system RNG.
#[derive(Debug, Clone)]
pub struct RandomTokenIssuer {
    token_bytes: usize,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl RandomTokenIssuer {
    pub fn new(token_bytes: usize, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            token_bytes,
            access_ttl,
            refresh_ttl,
        }
    }

    fn random_secret(&self) -> Result<String, TokenError> {
        let mut bytes = vec![0u8; self.token_bytes];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| TokenError::Entropy(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl TokenIssuer for RandomTokenIssuer {
    fn issue_access_token(&self) -> Result<IssuedToken, TokenError> {
        Ok(IssuedToken {
            token: self.random_secret()?,
            ttl: self.access_ttl,
        })
    }

    fn issue_refresh_token(&self, session_id: SessionId) -> Result<IssuedToken, TokenError> {
        let secret = self.random_secret()?;
        Ok(IssuedToken {
            token: format!("{session_id}{REFRESH_TOKEN_SEPARATOR}{secret}"),
            ttl: self.refresh_ttl,
        })
    }
}

/// Extract the owning session id from a refresh token.
///
/// Only the id prefix is interpreted; the secret is compared by hash against
/// the stored session and never inspected here.
pub fn parse_refresh_token(token: &str) -> Result<SessionId, TokenError> {
    let (id, secret) = token
        .split_once(REFRESH_TOKEN_SEPARATOR)
        .ok_or(TokenError::MalformedRefreshToken)?;
    if secret.is_empty() {
        return Err(TokenError::MalformedRefreshToken);
    }
    SessionId::parse_str(id).map_err(|_| TokenError::MalformedRefreshToken)
}
