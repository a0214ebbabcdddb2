pub mod accounts;
pub mod auth;
pub mod chats;
pub mod health;
pub mod messages;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /user/register        register (public)
/// /user/{tag}           public profile (requires auth)
///
/// /auth/login           login (public)
/// /auth/refresh         refresh (public)
/// /auth/logout          logout (requires auth)
///
/// /chat/...             chats and participants (requires auth)
/// /message/...          messages (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/user", accounts::router())
        .nest("/auth", auth::router())
        .nest("/chat", chats::router())
        .nest("/message", messages::router())
}
