mod notifier;
#[cfg(test)]
pub(crate) mod outbox;
mod smtp;
pub mod templates;

pub use notifier::{EmailMessage, LogNotifier, Notifier, NotifyError, SmtpNotifier};
pub use smtp::SmtpCredentials;
