use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use actrix::{
    api::HttpPartyApi,
    client::{self, ClientError, GameClient},
    config::ClientConfig,
    session::{JsonFileStore, SessionStore},
    terminal::{self, TerminalFrontend},
};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Logs go to stderr so they do not interleave with the game view
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "actrix=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    tracing::info!("Starting Actrix client against {}", config.server_url);

    let api = HttpPartyApi::new(&config.server_url, config.request_timeout)?;
    let store = SessionStore::new(JsonFileStore::open(&config.session_file)?);
    let mut client = GameClient::new(Arc::new(api), store, config);

    if client.resume().await {
        tracing::info!("Resumed previous session");
    }

    let lines = terminal::spawn_stdin_reader();
    let mut frontend = TerminalFrontend::new(std::io::stdout());
    client::run(&mut client, &mut frontend, lines).await?;

    tracing::info!("Bye");
    Ok(())
}
