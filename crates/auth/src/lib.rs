//! Session authentication for Chatline.
//!
//! - [`service`] -- login, authorize, refresh-with-rotation and logout.
//! - [`accounts`] -- registration and credential verification.
//! - [`password`] -- Argon2id password hashing.
//! - [`config`] -- token lifetimes and limits loaded from the environment.

pub mod accounts;
pub mod config;
pub mod error;
pub mod password;
pub mod service;

pub use accounts::{AccountService, Registration};
pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use service::{AuthComponents, AuthService, Authenticator, CredentialVerifier};
