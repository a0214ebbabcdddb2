//! Login, authorize, refresh and logout.
//!
//! Access tokens exist only in the [`SessionCache`]; a token is valid exactly
//! as long as its cache entry is live. Refresh tokens are backed by a durable
//! [`Session`] holding the token's digest, and every refresh rotates the
//! session: the presented session is revoked by compare-and-swap and a
//! successor is created in the same transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chatline_core::account::{CredentialCheck, Credentials, LoginMeta};
use chatline_core::hashing::{digests_match, TokenHasher};
use chatline_core::session::{LoginRecord, Session};
use chatline_core::store::{
    LoginHistoryStore, SessionCache, SessionStore, StoreError, StoreResult, Transaction,
    TransactionCoordinator,
};
use chatline_core::tokens::{parse_refresh_token, IssuedToken, TokenIssuer, TokenPair};
use chatline_core::types::{SessionId, Timestamp};
use chrono::Utc;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Resolves login credentials to a user.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_credentials(&self, credentials: &Credentials) -> AuthResult<CredentialCheck>;
}

/// The four operations exposed to the HTTP layer.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify credentials, open a session and return a fresh token pair.
    async fn login(&self, credentials: &Credentials, meta: &LoginMeta) -> AuthResult<TokenPair>;

    /// Succeeds iff the access token is live in the cache.
    async fn authorize(&self, access_token: &str) -> AuthResult<()>;

    /// Exchange a refresh token for a new pair, retiring the old session.
    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair>;

    /// Drop the access token and revoke the session behind the refresh token.
    async fn logout(&self, tokens: &TokenPair) -> AuthResult<()>;
}

/// Collaborators of [`AuthService`].
///
/// The session and login-history stores must write through the
/// coordinator's transaction handle.
pub struct AuthComponents<T, S, L> {
    pub coordinator: T,
    pub sessions: S,
    pub history: L,
    pub cache: Arc<dyn SessionCache>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub issuer: Arc<dyn TokenIssuer>,
    pub hasher: Arc<dyn TokenHasher>,
}

pub struct AuthService<T, S, L> {
    coordinator: T,
    sessions: S,
    history: L,
    cache: Arc<dyn SessionCache>,
    verifier: Arc<dyn CredentialVerifier>,
    issuer: Arc<dyn TokenIssuer>,
    hasher: Arc<dyn TokenHasher>,
    config: AuthConfig,
}

impl<T, S, L> AuthService<T, S, L>
where
    T: TransactionCoordinator,
    S: SessionStore<Tx = T::Tx>,
    L: LoginHistoryStore<Tx = T::Tx>,
{
    pub fn new(components: AuthComponents<T, S, L>, config: AuthConfig) -> Self {
        Self {
            coordinator: components.coordinator,
            sessions: components.sessions,
            history: components.history,
            cache: components.cache,
            verifier: components.verifier,
            issuer: components.issuer,
            hasher: components.hasher,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Transactional steps
    // -----------------------------------------------------------------------

    async fn write_login(
        &self,
        tx: &mut T::Tx,
        session: &Session,
        record: &LoginRecord,
    ) -> StoreResult<()> {
        self.sessions.create(tx, session).await?;
        self.history.create(tx, record).await?;
        Ok(())
    }

    /// Claim `current` for rotation, then insert its successor. `false`
    /// means another writer already retired `current`.
    async fn write_rotation(
        &self,
        tx: &mut T::Tx,
        current: &Session,
        presented_hash: &str,
        successor: &Session,
        now: Timestamp,
    ) -> StoreResult<bool> {
        let claimed = self
            .sessions
            .revoke_if_current(tx, current.id, presented_hash, now)
            .await?;
        if !claimed {
            return Ok(false);
        }
        self.sessions.create(tx, successor).await?;
        Ok(true)
    }

    async fn abort(tx: T::Tx) {
        if let Err(e) = tx.rollback().await {
            tracing::warn!(error = %e, "Transaction rollback failed");
        }
    }

    // -----------------------------------------------------------------------
    // Cache writes
    // -----------------------------------------------------------------------

    /// The access token write is mandatory: the cache is its only record.
    /// The refresh token write is an optimization over the durable session.
    async fn cache_pair(
        &self,
        access: &IssuedToken,
        refresh: &IssuedToken,
        session_id: SessionId,
    ) -> AuthResult<()> {
        self.cache.save_token(&access.token, access.ttl).await?;
        if let Err(e) = self.cache.save_token(&refresh.token, refresh.ttl).await {
            tracing::warn!(%session_id, error = %e, "Failed to cache refresh token");
        }
        Ok(())
    }
}

#[async_trait]
impl<T, S, L> Authenticator for AuthService<T, S, L>
where
    T: TransactionCoordinator,
    S: SessionStore<Tx = T::Tx>,
    L: LoginHistoryStore<Tx = T::Tx>,
{
    async fn login(&self, credentials: &Credentials, meta: &LoginMeta) -> AuthResult<TokenPair> {
        let user_id = match self.verifier.verify_credentials(credentials).await? {
            CredentialCheck::Verified(user_id) => user_id,
            CredentialCheck::NoAccount => {
                tracing::debug!("Login rejected: no matching account");
                return Err(AuthError::InvalidCredentials);
            }
            CredentialCheck::PasswordMismatch => {
                tracing::debug!("Login rejected: password mismatch");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let now = Utc::now();
        let session_id = Uuid::new_v4();
        let access = self.issuer.issue_access_token()?;
        let refresh = self.issuer.issue_refresh_token(session_id)?;

        let session = Session::new_login(
            session_id,
            user_id,
            self.hasher.hash_token(&refresh.token),
            now,
            self.config.refresh_token_ttl,
        );
        let record = LoginRecord {
            id: Uuid::new_v4(),
            user_id,
            login_time: now,
            user_agent: meta.user_agent.clone(),
            ip_address: meta.ip_address.map(|ip| ip.to_string()),
            success: true,
        };

        let mut tx = self.coordinator.begin().await?;
        let written = self.write_login(&mut tx, &session, &record).await;
        if let Err(e) = written {
            Self::abort(tx).await;
            return Err(e.into());
        }
        tx.commit().await?;

        self.cache_pair(&access, &refresh, session_id).await?;

        tracing::info!(%user_id, %session_id, "User logged in");
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    async fn authorize(&self, access_token: &str) -> AuthResult<()> {
        let lookup = self.cache.check_token(access_token);
        match tokio::time::timeout(self.config.authorize_timeout, lookup).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(AuthError::AccessTokenInvalid),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Access token lookup failed");
                Err(AuthError::AccessTokenInvalid)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.authorize_timeout.as_millis() as u64,
                    "Access token lookup timed out"
                );
                Err(AuthError::AccessTokenInvalid)
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let session_id =
            parse_refresh_token(refresh_token).map_err(|_| AuthError::InvalidSessionId)?;
        let presented_hash = self.hasher.hash_token(refresh_token);

        // The cache may vouch for the token, but the record is always loaded:
        // revocation, expiry and the successor's fields all come from it.
        let cached = self.cache.check_token(refresh_token).await?;
        let session = self
            .sessions
            .read_by_id(session_id)
            .await?
            .ok_or(AuthError::InvalidSessionId)?;

        if !cached && !digests_match(&session.refresh_token_hash, &presented_hash) {
            return Err(AuthError::InvalidRefreshToken);
        }
        if session.revoked {
            tracing::warn!(%session_id, "Refresh with a revoked session");
            return Err(AuthError::InvalidRefreshToken);
        }
        let now = Utc::now();
        if session.is_expired(now) {
            return Err(AuthError::SessionExpired);
        }

        let successor_id = Uuid::new_v4();
        let access = self.issuer.issue_access_token()?;
        let refresh = self.issuer.issue_refresh_token(successor_id)?;
        let successor = session.successor(
            successor_id,
            self.hasher.hash_token(&refresh.token),
            now,
            self.config.refresh_token_ttl,
        );

        let mut tx = self.coordinator.begin().await?;
        let rotated = self
            .write_rotation(&mut tx, &session, &presented_hash, &successor, now)
            .await;
        match rotated {
            Ok(true) => tx.commit().await?,
            Ok(false) | Err(StoreError::Conflict(_)) => {
                Self::abort(tx).await;
                tracing::warn!(%session_id, "Refresh token already rotated");
                return Err(AuthError::InvalidRefreshToken);
            }
            Err(e) => {
                Self::abort(tx).await;
                return Err(e.into());
            }
        }

        self.cache_pair(&access, &refresh, successor_id).await?;

        tracing::info!(
            user_id = %session.user_id,
            from_session_id = %session_id,
            %successor_id,
            "Session rotated"
        );
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    async fn logout(&self, tokens: &TokenPair) -> AuthResult<()> {
        self.cache.revoke_token(&tokens.access_token).await?;

        let session_id =
            parse_refresh_token(&tokens.refresh_token).map_err(|_| AuthError::InvalidSessionId)?;
        let session = self
            .sessions
            .read_by_id(session_id)
            .await?
            .ok_or(AuthError::SessionExpired)?;

        let updated = self.sessions.update(&session.revoked_at(Utc::now())).await?;
        if !updated {
            return Err(AuthError::SessionExpired);
        }

        tracing::info!(user_id = %session.user_id, %session_id, "User logged out");
        Ok(())
    }
}
