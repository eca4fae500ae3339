use std::fmt;

/// SMTP relay settings used by the notifier
#[derive(Clone)]
pub struct SmtpCredentials {
    // The email address/username for SMTP authentication, also used as sender
    pub username: String,
    // The password or app-specific password for SMTP
    pub password: String,
    // SMTP server hostname (e.g., smtp.gmail.com)
    pub host: String,
    // SMTP server port (typically 587 for STARTTLS)
    pub port: u16,
}

// Keep the password out of debug output and logs.
impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
