//! Process configuration.
//!
//! Deployment settings (listen address, store location, log file) come from
//! command-line flags with environment fallbacks. Secrets and mail settings
//! come from the environment only.

use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};
use thiserror::Error;

use crate::modules::accounts::service::ServiceSettings;
use crate::modules::email::SmtpCredentials;
use crate::modules::utils::io::is_valid_email;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 86_400;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_APP_NAME: &str = "Musically";
const MIN_SECRET_LEN: usize = 32;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable required")]
    Missing(&'static str),
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Flags controlling where the server listens, stores and logs
#[derive(Debug, Clone, PartialEq)]
pub struct ServerArgs {
    pub bind: String,
    pub database: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

pub fn command() -> Command {
    Command::new("student-accounts")
        .about("Account and student registration service")
        .arg(
            Arg::new("bind")
                .long("bind")
                .env("BIND_ADDR")
                .default_value(DEFAULT_BIND_ADDR)
                .help("Address to listen on"),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .env("DATABASE_PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("JSON account store; accounts are kept in memory when unset"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .env("LOG_FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Append logs to this file instead of stderr"),
        )
}

impl ServerArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            bind: matches
                .get_one::<String>("bind")
                .cloned()
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database: matches.get_one::<PathBuf>("database").cloned(),
            log_file: matches.get_one::<PathBuf>("log-file").cloned(),
        }
    }
}

/// Settings loaded from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub token_lifetime_secs: u64,
    /// `None` when no mail credentials are configured
    pub smtp: Option<SmtpCredentials>,
    pub client_url: String,
    pub admin_email: String,
    pub app_name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} characters", MIN_SECRET_LEN),
            });
        }

        let token_lifetime_secs = match get("JWT_EXPIRES_IN_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "JWT_EXPIRES_IN_SECS",
                    reason: format!("{:?} is not a positive number of seconds", value),
                })?,
            None => DEFAULT_TOKEN_LIFETIME_SECS,
        };

        let smtp = match (get("EMAIL_USER"), get("EMAIL_PASS")) {
            (Some(username), Some(password)) => {
                let port = match get("SMTP_PORT") {
                    Some(value) => value.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        key: "SMTP_PORT",
                        reason: e.to_string(),
                    })?,
                    None => DEFAULT_SMTP_PORT,
                };
                Some(SmtpCredentials {
                    username,
                    password,
                    host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                    port,
                })
            }
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("EMAIL_PASS")),
            (None, Some(_)) => return Err(ConfigError::Missing("EMAIL_USER")),
        };

        let client_url = get("CLIENT_URL").ok_or(ConfigError::Missing("CLIENT_URL"))?;
        if !(client_url.starts_with("http://") || client_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "CLIENT_URL",
                reason: "must start with http:// or https://".to_string(),
            });
        }

        let admin_email = get("ADMIN_EMAIL").ok_or(ConfigError::Missing("ADMIN_EMAIL"))?;
        if !is_valid_email(&admin_email) {
            return Err(ConfigError::Invalid {
                key: "ADMIN_EMAIL",
                reason: format!("{:?} is not an email address", admin_email),
            });
        }

        Ok(Self {
            jwt_secret,
            token_lifetime_secs,
            smtp,
            client_url,
            admin_email,
            app_name: get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        })
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            client_url: self.client_url.clone(),
            admin_email: self.admin_email.clone(),
            app_name: self.app_name.clone(),
        }
    }
}
