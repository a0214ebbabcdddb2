//! Handlers for the `/auth` resource (login, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chatline_auth::AuthError;
use chatline_core::account::Credentials;
use chatline_core::tokens::TokenPair;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthSession, ClientMeta};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email, phone or tag plus password.
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    Json(input): Json<Credentials>,
) -> AppResult<Json<TokenPair>> {
    input
        .validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;
    if !input.has_identifier() {
        return Err(AuthError::Validation("One of email, phone or tag is required".into()).into());
    }

    let pair = state.auth.login(&input, &meta).await?;
    Ok(Json(pair))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new pair. The presented token is retired.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state.auth.refresh(&input.refresh_token).await?;
    Ok(Json(pair))
}

/// POST /api/v1/auth/logout
///
/// Drop the access token and revoke the session. The pair must carry the
/// bearer token of the request. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
    Json(input): Json<TokenPair>,
) -> AppResult<StatusCode> {
    if input.access_token != session.access_token {
        return Err(AppError::BadRequest(
            "access_token does not match the bearer token".into(),
        ));
    }
    state.auth.logout(&input).await?;
    Ok(StatusCode::NO_CONTENT)
}
