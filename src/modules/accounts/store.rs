use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use super::model::{normalize_email, Account};

/// Errors raised by an account store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("an account with email {0} already exists")]
    DuplicateEmail(String),
    #[error("no account with id {0}")]
    Missing(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid store data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence seam for account records.
///
/// Implementations own the email uniqueness guarantee: `insert` must refuse a
/// second record for the same normalized email even when two callers race
/// past an earlier `find_by_email` check.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: Account) -> Result<Account, StoreError>;
    async fn update(&self, account: &Account) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
}

/// In-memory table with an email index
#[derive(Default, Clone)]
struct AccountTable {
    accounts: HashMap<String, Account>,
    email_index: HashMap<String, String>,
}

impl AccountTable {
    fn from_accounts(accounts: Vec<Account>) -> Result<Self, StoreError> {
        let mut table = Self::default();
        for account in accounts {
            table.insert(account)?;
        }
        Ok(table)
    }

    fn insert(&mut self, account: Account) -> Result<(), StoreError> {
        let email = normalize_email(&account.email);
        if self.email_index.contains_key(&email) {
            return Err(StoreError::DuplicateEmail(email));
        }
        self.email_index.insert(email, account.id.clone());
        self.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    fn update(&mut self, account: &Account) -> Result<(), StoreError> {
        let previous_email = match self.accounts.get(&account.id) {
            Some(existing) => normalize_email(&existing.email),
            None => return Err(StoreError::Missing(account.id.clone())),
        };

        let email = normalize_email(&account.email);
        if email != previous_email {
            if self.email_index.contains_key(&email) {
                return Err(StoreError::DuplicateEmail(email));
            }
            self.email_index.remove(&previous_email);
            self.email_index.insert(email, account.id.clone());
        }

        self.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    fn by_id(&self, id: &str) -> Option<Account> {
        self.accounts.get(id).cloned()
    }

    fn by_email(&self, email: &str) -> Option<Account> {
        self.email_index
            .get(&normalize_email(email))
            .and_then(|id| self.accounts.get(id))
            .cloned()
    }

    fn sorted(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        accounts
    }
}

/// Process-memory store, used in tests and when no database path is configured
#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<AccountTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        self.table.write().await.insert(account.clone())?;
        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        self.table.write().await.update(account)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.table.read().await.by_id(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.table.read().await.by_email(email))
    }
}

/// On-disk document layout
#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    accounts: Vec<Account>,
}

/// Document store kept in a single JSON file.
///
/// Every write goes to a sibling temp file first and is renamed over the
/// original, so a crash never leaves a half-written document behind. The
/// in-memory table only changes once the file write succeeded.
pub struct JsonFileStore {
    path: PathBuf,
    table: Mutex<AccountTable>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let table = match tokio::fs::read(&path).await {
            Ok(data) => {
                let file: StoreFile = serde_json::from_slice(&data)?;
                AccountTable::from_accounts(file.accounts)?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Account store {} not found, starting empty", path.display());
                AccountTable::default()
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        debug!(
            "Loaded {} accounts from {}",
            table.accounts.len(),
            path.display()
        );

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, table: &AccountTable) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(&StoreFile {
            accounts: table.sorted(),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        next.insert(account.clone())?;
        self.persist(&next).await?;
        *table = next;
        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        next.update(account)?;
        self.persist(&next).await?;
        *table = next;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.table.lock().await.by_id(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.table.lock().await.by_email(email))
    }
}
