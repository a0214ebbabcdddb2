//! Account registration and credential verification.

use std::sync::Arc;

use async_trait::async_trait;
use chatline_core::account::{empty_as_none, Account, CredentialCheck, Credentials};
use chatline_core::store::{AccountStore, StoreError};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AuthError, AuthResult};
use crate::password::{hash_password, validate_password_strength, verify_password};
use crate::service::CredentialVerifier;

/// Input for creating an account.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 64))]
    pub tag: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub description: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(min = 3, max = 20))]
    pub phone: Option<String>,
    pub password: String,
}

/// Creates accounts and checks login credentials against them.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    password_min_length: usize,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>, password_min_length: usize) -> Self {
        Self {
            accounts,
            password_min_length,
        }
    }

    /// Create an account. The tag must be unused and at least one of email
    /// or phone must be given.
    pub async fn register(&self, input: &Registration) -> AuthResult<Account> {
        input
            .validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        if non_empty(&input.email).is_none() && non_empty(&input.phone).is_none() {
            return Err(AuthError::Validation(
                "Either email or phone is required".into(),
            ));
        }
        validate_password_strength(&input.password, self.password_min_length)
            .map_err(AuthError::Validation)?;

        if self.accounts.read_by_tag(&input.tag).await?.is_some() {
            return Err(AuthError::AccountExists(format!(
                "tag '{}' is already taken",
                input.tag
            )));
        }

        let password_hash =
            hash_password(&input.password).map_err(|e| AuthError::Password(e.to_string()))?;

        let account = Account {
            id: Uuid::new_v4(),
            tag: input.tag.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            password_hash,
            email: non_empty(&input.email).map(str::to_owned),
            phone: non_empty(&input.phone).map(str::to_owned),
            created_at: Utc::now(),
        };

        match self.accounts.create(&account).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration, or email / phone clash.
            Err(StoreError::Conflict(msg)) => return Err(AuthError::AccountExists(msg)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %account.id, tag = %account.tag, "Account registered");
        Ok(account)
    }

    pub async fn find_by_tag(&self, tag: &str) -> AuthResult<Account> {
        self.accounts
            .read_by_tag(tag)
            .await?
            .ok_or(AuthError::NoAccountFound)
    }

    /// Resolve the account named by the credentials: email, then phone,
    /// then tag. The first identifier present that matches wins.
    async fn lookup(&self, credentials: &Credentials) -> AuthResult<Option<Account>> {
        if let Some(email) = non_empty(&credentials.email) {
            if let Some(account) = self.accounts.read_by_email(email).await? {
                return Ok(Some(account));
            }
        }
        if let Some(phone) = non_empty(&credentials.phone) {
            if let Some(account) = self.accounts.read_by_phone(phone).await? {
                return Ok(Some(account));
            }
        }
        if let Some(tag) = non_empty(&credentials.tag) {
            if let Some(account) = self.accounts.read_by_tag(tag).await? {
                return Ok(Some(account));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl CredentialVerifier for AccountService {
    async fn verify_credentials(&self, credentials: &Credentials) -> AuthResult<CredentialCheck> {
        let Some(account) = self.lookup(credentials).await? else {
            return Ok(CredentialCheck::NoAccount);
        };
        let matches = verify_password(&credentials.password, &account.password_hash)
            .map_err(|e| AuthError::Password(e.to_string()))?;
        if matches {
            Ok(CredentialCheck::Verified(account.id))
        } else {
            Ok(CredentialCheck::PasswordMismatch)
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
