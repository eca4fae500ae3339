use std::error::Error;
use std::sync::Arc;

use log::{info, warn};
use student_accounts::config::command;
use student_accounts::{
    serve, AccountService, AccountStore, AppConfig, AppState, JsonFileStore, LogNotifier,
    MemoryStore, Notifier, PasswordHasher, ServerArgs, SmtpNotifier, TokenIssuer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = ServerArgs::from_matches(&command().get_matches());
    student_accounts::utils::logging::initialize_logging(args.log_file.as_deref())?;

    let config = AppConfig::from_env()?;

    // Process-lifetime services, built once and handed to the service.
    let store: Arc<dyn AccountStore> = match &args.database {
        Some(path) => {
            let store = JsonFileStore::open(path).await?;
            info!("Using account store at {}", store.path().display());
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_PATH not set, accounts will be kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match config.smtp.clone() {
        Some(creds) => {
            info!("Sending email through {}:{}", creds.host, creds.port);
            Arc::new(SmtpNotifier::new(creds, &config.app_name)?)
        }
        None => {
            warn!("EMAIL_USER/EMAIL_PASS not set, emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let service = AccountService::new(
        store,
        notifier,
        TokenIssuer::new(&config.jwt_secret, config.token_lifetime_secs),
        PasswordHasher::default(),
        config.service_settings(),
    );

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    serve(listener, AppState::new(service)).await?;

    info!("Server stopped");
    Ok(())
}
