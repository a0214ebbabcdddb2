use chatline_core::store::StoreError;
use chatline_core::tokens::TokenError;

/// Failures reported by the auth operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No account found")]
    NoAccountFound,

    #[error("Access token is invalid or expired")]
    AccessTokenInvalid,

    #[error("Invalid session id")]
    InvalidSessionId,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Session expired")]
    SessionExpired,

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    Password(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Infrastructure(#[from] StoreError),
}

pub type AuthResult<T> = Result<T, AuthError>;
