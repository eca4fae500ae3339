pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use error::AccountError;
pub use model::{Account, AccountView, ReviewAction, Role, Status};
pub use service::{AccountService, ServiceSettings};
pub use store::{AccountStore, JsonFileStore, MemoryStore, StoreError};
