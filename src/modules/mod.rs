// Declare all modules
pub mod accounts;
pub mod auth;
pub mod config;
pub mod email;
pub mod http;
pub mod utils;

// No re-exports here as they're handled in lib.rs
