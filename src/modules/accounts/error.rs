use thiserror::Error;

use super::store::StoreError;
use crate::modules::auth::tokens::TokenError;
use crate::modules::email::NotifyError;

/// Failures surfaced by account operations
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid Credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("Forbidden")]
    Forbidden,
    /// The account change was saved; only the email could not be delivered.
    #[error("notification for account {account_id} failed: {source}")]
    Notification {
        account_id: String,
        #[source]
        source: NotifyError,
    },
    #[error("storage error: {0}")]
    Store(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AccountError {
    pub fn missing_fields() -> Self {
        AccountError::Validation("Missing required fields!".to_string())
    }
}

impl From<StoreError> for AccountError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail(_) => {
                AccountError::Conflict("Email already in use!".to_string())
            }
            other => AccountError::Store(other),
        }
    }
}

impl From<TokenError> for AccountError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Encoding(e) => AccountError::Internal(format!("token issue failed: {}", e)),
            TokenError::Expired | TokenError::Invalid => {
                AccountError::Unauthorized("Unauthorized, Invalid Token!".to_string())
            }
        }
    }
}
