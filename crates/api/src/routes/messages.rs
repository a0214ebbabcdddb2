use axum::routing::{get, post};
use axum::Router;

use crate::handlers::messages;
use crate::state::AppState;

/// Routes mounted at `/message`. All require a bearer access token.
///
/// ```text
/// POST   /               -> create
/// GET    /?id=           -> get
/// PUT    /               -> update
/// DELETE /?id=           -> delete
/// GET    /last?chat_tag= -> last
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(messages::create)
                .get(messages::get)
                .put(messages::update)
                .delete(messages::delete),
        )
        .route("/last", get(messages::last))
}
