// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{accounts, auth, config, email, http, utils};

// Re-export commonly used types
pub use modules::accounts::{AccountError, AccountService, AccountStore, JsonFileStore, MemoryStore};
pub use modules::auth::{PasswordHasher, TokenIssuer};
pub use modules::config::{AppConfig, ServerArgs};
pub use modules::email::{LogNotifier, Notifier, SmtpNotifier};
pub use modules::http::{build_router, serve, AppState};
