//! Telegram Bot API transport
//!
//! Long-polls `getUpdates`, classifies text messages into signals for the
//! session manager, and sends replies with `sendMessage`.

mod error;
mod types;

pub use error::{TransportError, TransportErrorKind};
pub use types::*;

use crate::config::BotConfig;
use crate::runtime::{RecordStore, ReplySink, SessionManager};
use crate::signal::Signal;
use crate::state_machine::SessionId;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pause after a failed poll before polling again
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Slack on top of the long-poll timeout before the HTTP request gives up
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    /// `{api_base}/bot{token}`, never logged
    base_url: String,
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs) + REQUEST_TIMEOUT_SLACK)
            .build()
            .map_err(TransportError::from_request)?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.token
            ),
        })
    }

    /// Fetch pending updates, waiting up to `timeout_secs` for new ones
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };
        self.call("getUpdates", &request).await
    }

    /// Send a plain-text message to a chat
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let request = SendMessageRequest { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, TransportError>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(params)
            .send()
            .await
            .map_err(TransportError::from_request)?;

        let body = response
            .text()
            .await
            .map_err(TransportError::from_request)?;

        parse_response(method, &body)
    }
}

/// Unwrap the Bot API envelope
fn parse_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T, TransportError> {
    let envelope: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| TransportError::malformed(format!("{method}: {e}")))?;

    if !envelope.ok {
        let description = envelope
            .description
            .unwrap_or_else(|| "no description".to_string());
        return Err(TransportError::api(match envelope.error_code {
            Some(code) => format!("{method} failed ({code}): {description}"),
            None => format!("{method} failed: {description}"),
        }));
    }

    envelope
        .result
        .ok_or_else(|| TransportError::malformed(format!("{method}: ok response without result")))
}

impl Update {
    /// The session and signal carried by this update, if it is a text message.
    ///
    /// Messages without a sender (channel posts) are keyed by chat alone.
    pub fn into_signal(self) -> Option<(SessionId, Signal)> {
        let message = self.message?;
        let text = message.text?;
        let user_id = message.from.map_or(message.chat.id, |u| u.id);
        Some((
            SessionId::new(message.chat.id, user_id),
            Signal::classify(&text),
        ))
    }
}

/// Poll for updates and dispatch them until `shutdown` fires.
pub async fn run_polling<S, R>(
    client: &TelegramClient,
    manager: &SessionManager<S, R>,
    timeout_secs: u64,
    shutdown: CancellationToken,
) where
    S: RecordStore + 'static,
    R: ReplySink + 'static,
{
    let mut offset: Option<i64> = None;

    loop {
        let result = tokio::select! {
            () = shutdown.cancelled() => break,
            result = client.get_updates(offset, timeout_secs) => result,
        };

        match result {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    let update_id = update.update_id;
                    let Some((session_id, signal)) = update.into_signal() else {
                        tracing::debug!(update_id, "Skipping non-text update");
                        continue;
                    };
                    let outcome = manager.dispatch(session_id, signal).await;
                    tracing::debug!(update_id, session = %session_id, ?outcome, "Dispatched update");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind, "Polling failed");
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                }
            }
        }
    }

    tracing::info!("Polling stopped");
}
