//! Intake bot - collects name, phone number and location over chat
//!
//! Drives one linear conversation per user and appends each completed
//! answer set, with a timestamp, to a persistent table.

mod config;
mod runtime;
mod signal;
mod state_machine;
mod store;
mod telegram;

use config::BotConfig;
use runtime::SessionManager;
use store::TableStore;
use telegram::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = BotConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    // Initialize table
    let store = TableStore::new(&config.store_path);
    tracing::info!(path = %store.path().display(), "Opening table");
    store.ensure_initialized()?;
    tracing::info!(rows = store.rows()?.len(), "Table ready");

    let client = TelegramClient::new(&config)?;
    let manager = SessionManager::new(store, client.clone());

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
            }
            shutdown.cancel();
        });
    }

    tracing::info!(timeout_secs = config.poll_timeout_secs, "Polling for updates");
    telegram::run_polling(&client, &manager, config.poll_timeout_secs, shutdown).await;

    // In-progress sessions are not persisted
    let abandoned = manager.active_sessions().await;
    if abandoned > 0 {
        tracing::warn!(sessions = abandoned, "Dropping unfinished sessions");
    }

    Ok(())
}
