//! User accounts and login credentials.

use std::net::IpAddr;

use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::types::{Timestamp, UserId};

/// A row of the `user_accounts` table.
///
/// Contains the password hash -- never serialize this to API responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    pub tag: String,
    pub name: String,
    pub description: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Timestamp,
}

/// Credentials presented at login. At least one of `email`, `phone` or `tag`
/// identifies the account; they are tried in that order. Empty strings count
/// as absent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Credentials {
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(min = 3, max = 20))]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(min = 1, max = 64))]
    pub tag: Option<String>,
    #[validate(length(min = 1))]
    pub password: String,
}

impl Credentials {
    /// Whether any account identifier was supplied.
    pub fn has_identifier(&self) -> bool {
        [&self.email, &self.phone, &self.tag]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

/// Deserialize an optional string, reading `""` as `None`.
pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}

/// Request metadata recorded in the login history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginMeta {
    pub user_agent: String,
    pub ip_address: Option<IpAddr>,
}

/// Outcome of checking credentials against the account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    Verified(UserId),
    NoAccount,
    PasswordMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_presence() {
        let mut creds = Credentials {
            password: "secret".into(),
            ..Default::default()
        };
        assert!(!creds.has_identifier());

        creds.email = Some(String::new());
        assert!(!creds.has_identifier());

        creds.tag = Some("alice".into());
        assert!(creds.has_identifier());
    }

    #[test]
    fn empty_identifiers_deserialize_as_absent() {
        let creds: Credentials = serde_json::from_value(serde_json::json!({
            "email": "",
            "phone": "",
            "tag": "zed",
            "password": "secret",
        }))
        .unwrap();

        assert_eq!(creds.email, None);
        assert_eq!(creds.phone, None);
        assert_eq!(creds.tag.as_deref(), Some("zed"));
        assert!(creds.validate().is_ok());
        assert!(creds.has_identifier());
    }

    #[test]
    fn missing_identifiers_default_to_absent() {
        let creds: Credentials =
            serde_json::from_value(serde_json::json!({ "password": "secret" })).unwrap();
        assert!(!creds.has_identifier());
    }

    #[test]
    fn rejects_malformed_email() {
        let creds = Credentials {
            email: Some("not-an-email".into()),
            password: "secret".into(),
            ..Default::default()
        };
        assert!(creds.validate().is_err());
    }
}
