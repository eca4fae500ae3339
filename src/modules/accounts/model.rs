use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AccountError;

/// Role attached to every account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Student,
    Instructor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Instructor => "instructor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            _ => Err(AccountError::Validation("Invalid role".to_string())),
        }
    }
}

/// Registration status. These three values are the only ones ever written.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Confirmed => "confirmed",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = AccountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "confirmed" => Ok(Status::Confirmed),
            "rejected" => Ok(Status::Rejected),
            _ => Err(AccountError::Validation("Invalid status update".to_string())),
        }
    }
}

/// Admin decision on a self-submitted registration request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Confirm,
    Reject,
}

impl ReviewAction {
    /// Status written by this decision
    pub fn resulting_status(&self) -> Status {
        match self {
            ReviewAction::Confirm => Status::Confirmed,
            ReviewAction::Reject => Status::Rejected,
        }
    }
}

impl FromStr for ReviewAction {
    type Err = AccountError;

    // Older clients send "Confirm"; casing is not significant.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "confirm" => Ok(ReviewAction::Confirm),
            "reject" => Ok(ReviewAction::Reject),
            _ => Err(AccountError::Validation("Invalid Action".to_string())),
        }
    }
}

/// A stored account record, including its password hash
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub is_registration_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Build a fresh record with a generated id and default status
    pub fn new(
        first_name: String,
        last_name: String,
        email: &str,
        role: Role,
        password_hash: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email: normalize_email(email),
            password_hash,
            role,
            status: Status::default(),
            is_registration_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Password-less students may exist until they complete registration;
    /// everybody else needs a hash.
    pub fn check_invariants(&self) -> Result<(), AccountError> {
        let password_optional = self.role == Role::Student && !self.is_registration_complete;
        if self.password_hash.is_none() && !password_optional {
            return Err(AccountError::Validation("Password is required".to_string()));
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }
}

/// Account as exposed over the API; never carries the password hash
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub status: Status,
    pub is_registration_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            role: account.role,
            status: account.status,
            is_registration_complete: account.is_registration_complete,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Lowercased, trimmed form used for storage and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
