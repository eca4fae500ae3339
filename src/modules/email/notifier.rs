use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{Message, SmtpTransport, Transport};
use log::{debug, info, warn};
use thiserror::Error;

use super::smtp::SmtpCredentials;
use crate::modules::utils::logging::mask_email;

/// A single plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to deliver email: {0}")]
    Transport(String),
}

/// Outbound email seam. One call, one message, no retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Sends through an SMTP relay with STARTTLS
pub struct SmtpNotifier {
    from: Mailbox,
    mailer: SmtpTransport,
}

impl SmtpNotifier {
    /// Build the transport once; it is shared for the life of the process
    pub fn new(creds: SmtpCredentials, sender_name: &str) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&format!("{} <{}>", sender_name, creds.username))?;

        let tls_parameters = TlsParameters::builder(creds.host.clone())
            .build()
            .map_err(|e| NotifyError::Build(format!("Failed to build TLS parameters: {}", e)))?;

        let mailer = SmtpTransport::relay(&creds.host)
            .map_err(|e| NotifyError::Build(format!("Failed to create SMTP transport: {}", e)))?
            .credentials(Credentials::new(creds.username, creds.password))
            .port(creds.port)
            .tls(Tls::Required(tls_parameters))
            .pool_config(PoolConfig::new().max_size(4))
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(Self { from, mailer })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let email = self.build_message(message)?;
        let mailer = self.mailer.clone();

        // lettre's SMTP transport blocks on network IO.
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| NotifyError::Transport(format!("send task failed: {}", e)))?
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        info!(
            "Email sent: to={}, subject={:?}",
            mask_email(&message.to),
            message.subject
        );
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
/// Used when no SMTP credentials are configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        parse_mailbox(&message.to)?;
        warn!("{}", undelivered_summary(message));
        // Bodies can carry registration links
        debug!("Undelivered email body:\n{}", message.body);
        Ok(())
    }
}

/// Recipient and subject only; the body stays out of warn-level logs
fn undelivered_summary(message: &EmailMessage) -> String {
    format!(
        "SMTP not configured, email not delivered: to={}, subject={:?}",
        mask_email(&message.to),
        message.subject
    )
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}
