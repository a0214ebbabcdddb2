//! Request extractors for authenticated routes and login metadata.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use chatline_core::account::LoginMeta;

use crate::error::AppError;
use crate::state::AppState;

/// A request carrying a live access token in `Authorization: Bearer <token>`.
///
/// Extraction runs `authorize` against the token cache, bounded by the
/// configured deadline.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        state.auth.authorize(token).await?;

        Ok(AuthSession {
            access_token: token.to_string(),
        })
    }
}

/// Client user agent and address, recorded in the login history.
///
/// The address is the first `X-Forwarded-For` hop when present, otherwise
/// the peer address if the server was started with connect info.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub LoginMeta);

impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientMeta(LoginMeta {
            user_agent,
            ip_address: forwarded.or(peer),
        }))
    }
}
