//! Handlers for the `/chat` resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chatline_chat::{ChatUpdate, NewChat, Participation};
use chatline_core::chat::{Chat, ChatOverview};
use chatline_core::types::{ChatId, UserId};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthSession;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatIdParams {
    pub id: ChatId,
}

#[derive(Debug, Deserialize)]
pub struct ChatTagParams {
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberParams {
    pub user_id: UserId,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/chat
pub async fn create(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(input): Json<NewChat>,
) -> AppResult<(StatusCode, Json<Chat>)> {
    let chat = state.chats.create(&input).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// GET /api/v1/chat?user_id=
///
/// Chats the user takes part in, most recently active first, each with its
/// latest message.
pub async fn list(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(params): Query<MemberParams>,
) -> AppResult<Json<Vec<ChatOverview>>> {
    let chats = state.chats.list_for_user(params.user_id).await?;
    Ok(Json(chats))
}

/// GET /api/v1/chat/id?id=
pub async fn get_by_id(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(params): Query<ChatIdParams>,
) -> AppResult<Json<Chat>> {
    let chat = state.chats.find_by_id(params.id).await?;
    Ok(Json(chat))
}

/// GET /api/v1/chat/tag?tag=
pub async fn get_by_tag(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(params): Query<ChatTagParams>,
) -> AppResult<Json<Chat>> {
    if params.tag.is_empty() {
        return Err(AppError::BadRequest("tag is required".into()));
    }
    let chat = state.chats.find_by_tag(&params.tag).await?;
    Ok(Json(chat))
}

/// PUT /api/v1/chat
pub async fn update(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(input): Json<ChatUpdate>,
) -> AppResult<Json<Chat>> {
    let chat = state.chats.rename(&input).await?;
    Ok(Json(chat))
}

/// DELETE /api/v1/chat?id=
pub async fn delete(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(params): Query<ChatIdParams>,
) -> AppResult<StatusCode> {
    state.chats.delete(params.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/chat/participant
pub async fn add_participant(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(input): Json<Participation>,
) -> AppResult<StatusCode> {
    state.chats.add_participant(&input).await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/v1/chat/participant?chat_id=&user_id=
pub async fn remove_participant(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(params): Query<Participation>,
) -> AppResult<StatusCode> {
    state.chats.remove_participant(&params).await?;
    Ok(StatusCode::NO_CONTENT)
}
