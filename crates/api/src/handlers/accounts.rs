//! Handlers for the `/user` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chatline_auth::Registration;
use chatline_core::account::Account;
use chatline_core::types::{Timestamp, UserId};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthSession;
use crate::state::AppState;

/// Response body for `POST /user/register`.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: UserId,
}

/// What other users may see of an account. Contact details are omitted.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: UserId,
    pub tag: String,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
}

impl From<Account> for PublicProfile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            tag: account.tag,
            name: account.name,
            description: account.description,
            created_at: account.created_at,
        }
    }
}

/// POST /api/v1/user/register
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<Registration>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let account = state.accounts.register(&input).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { id: account.id })))
}

/// GET /api/v1/user/{tag}
pub async fn get_by_tag(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(tag): Path<String>,
) -> AppResult<Json<PublicProfile>> {
    let account = state.accounts.find_by_tag(&tag).await?;
    Ok(Json(account.into()))
}
