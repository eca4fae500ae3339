use env_logger::{Builder, Env, WriteStyle};
use log::{info, warn};
use std::fs::OpenOptions;
use std::path::Path;

/// Initialize logging to stderr, or append to `log_file` when given.
/// `RUST_LOG` overrides the default `info` filter.
pub fn initialize_logging(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder
        .format_timestamp_secs()
        .format_module_path(true)
        .write_style(WriteStyle::Auto);

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;

    info!("Logging system initialized");
    Ok(())
}

/// Helper function to format sensitive data for logging
fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Mask the local part of an address, keep the domain readable
pub fn mask_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", format_sensitive(local), domain),
        None => format_sensitive(email),
    }
}

/// Structured log line for account lifecycle events
pub fn log_account_event(event_type: &str, email: &str, success: bool, details: Option<&str>) {
    if success {
        info!(
            "Account event: type={}, email={}, success=true, details={:?}",
            event_type,
            mask_email(email),
            details
        );
    } else {
        warn!(
            "Account event: type={}, email={}, success=false, details={:?}",
            event_type,
            mask_email(email),
            details
        );
    }
}
