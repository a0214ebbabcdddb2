//! Handlers for the `/message` resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chatline_chat::{MessageEdit, NewMessage};
use chatline_core::chat::Message;
use chatline_core::types::MessageId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageIdParams {
    pub id: MessageId,
}

#[derive(Debug, Deserialize)]
pub struct LastMessageParams {
    #[serde(default)]
    pub chat_tag: String,
}

/// POST /api/v1/message
pub async fn create(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(input): Json<NewMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let message = state.messages.post(&input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/v1/message?id=
pub async fn get(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(params): Query<MessageIdParams>,
) -> AppResult<Json<Message>> {
    let message = state.messages.find_by_id(params.id).await?;
    Ok(Json(message))
}

/// GET /api/v1/message/last?chat_tag=
pub async fn last(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(params): Query<LastMessageParams>,
) -> AppResult<Json<Message>> {
    if params.chat_tag.is_empty() {
        return Err(AppError::BadRequest("chat_tag is required".into()));
    }
    let message = state.messages.last_in_chat(&params.chat_tag).await?;
    Ok(Json(message))
}

/// PUT /api/v1/message
pub async fn update(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(input): Json<MessageEdit>,
) -> AppResult<Json<Message>> {
    let message = state.messages.edit(&input).await?;
    Ok(Json(message))
}

/// DELETE /api/v1/message?id=
pub async fn delete(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(params): Query<MessageIdParams>,
) -> AppResult<StatusCode> {
    state.messages.delete(params.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
