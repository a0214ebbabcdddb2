use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chatline_auth::AuthError;
use chatline_chat::ChatError;
use chatline_core::store::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the service errors and adds HTTP-specific variants. Renders as
/// `{"error": ..., "code": ...}` JSON.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    /// Missing or malformed `Authorization` header.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Auth(err) => classify_auth_error(err),
            AppError::Chat(err) => classify_chat_error(err),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map an auth failure to an HTTP status, error code and client message.
///
/// Infrastructure failures are logged and reported with a sanitized message.
fn classify_auth_error(err: &AuthError) -> (StatusCode, &'static str, String) {
    match err {
        AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", err.to_string())
        }
        AuthError::AccessTokenInvalid => {
            (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", err.to_string())
        }
        AuthError::InvalidSessionId => {
            (StatusCode::UNAUTHORIZED, "INVALID_SESSION", err.to_string())
        }
        AuthError::InvalidRefreshToken => {
            (StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN", err.to_string())
        }
        AuthError::SessionExpired => {
            (StatusCode::UNAUTHORIZED, "SESSION_EXPIRED", err.to_string())
        }
        AuthError::NoAccountFound => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        AuthError::AccountExists(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        AuthError::Infrastructure(StoreError::Conflict(msg)) => {
            (StatusCode::CONFLICT, "CONFLICT", msg.clone())
        }
        AuthError::Password(_) | AuthError::Token(_) | AuthError::Infrastructure(_) => {
            internal_error(err)
        }
    }
}

/// Map a chat or message failure to an HTTP status, error code and client
/// message.
fn classify_chat_error(err: &ChatError) -> (StatusCode, &'static str, String) {
    match err {
        ChatError::ChatNotFound | ChatError::MessageNotFound | ChatError::NoAccountFound => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
        }
        ChatError::NotParticipant => (StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string()),
        ChatError::Conflict(msg) | ChatError::Infrastructure(StoreError::Conflict(msg)) => {
            (StatusCode::CONFLICT, "CONFLICT", msg.clone())
        }
        ChatError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        ChatError::Infrastructure(_) => internal_error(err),
    }
}

fn internal_error(err: &dyn std::error::Error) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_failures_are_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::AccessTokenInvalid,
            AuthError::InvalidSessionId,
            AuthError::InvalidRefreshToken,
            AuthError::SessionExpired,
        ] {
            assert_eq!(classify_auth_error(&err).0, StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn infrastructure_details_are_not_leaked() {
        let err = AuthError::Infrastructure(StoreError::cache("connection refused"));
        let (status, code, message) = classify_auth_error(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("connection refused"));
    }

    #[test]
    fn chat_failures_map_to_statuses() {
        assert_eq!(classify_chat_error(&ChatError::ChatNotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(classify_chat_error(&ChatError::MessageNotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(classify_chat_error(&ChatError::NotParticipant).0, StatusCode::FORBIDDEN);
        assert_eq!(
            classify_chat_error(&ChatError::Conflict("tag taken".into())).0,
            StatusCode::CONFLICT
        );

        let (status, _, message) =
            classify_chat_error(&ChatError::Infrastructure(StoreError::database("disk full")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("disk full"));
    }

    #[test]
    fn duplicates_are_conflicts() {
        let err = AuthError::AccountExists("tag 'alice' is already taken".into());
        assert_eq!(classify_auth_error(&err).0, StatusCode::CONFLICT);
    }
}
