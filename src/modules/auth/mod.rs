pub mod middleware;
pub mod password;
pub mod tokens;

// Re-export the main types and functions
pub use middleware::{admin_only, protect, restrict_to, CurrentAccount};
pub use password::PasswordHasher;
pub use tokens::{Claims, TokenError, TokenIssuer};
