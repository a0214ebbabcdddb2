use axum::routing::{get, post};
use axum::Router;

use crate::handlers::chats;
use crate::state::AppState;

/// Routes mounted at `/chat`. All require a bearer access token.
///
/// ```text
/// POST   /               -> create
/// GET    /?user_id=      -> list
/// PUT    /               -> update
/// DELETE /?id=           -> delete
/// GET    /id?id=         -> get_by_id
/// GET    /tag?tag=       -> get_by_tag
/// POST   /participant    -> add_participant
/// DELETE /participant    -> remove_participant
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(chats::create)
                .get(chats::list)
                .put(chats::update)
                .delete(chats::delete),
        )
        .route("/id", get(chats::get_by_id))
        .route("/tag", get(chats::get_by_tag))
        .route(
            "/participant",
            post(chats::add_participant).delete(chats::remove_participant),
        )
}
