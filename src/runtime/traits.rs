//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::state_machine::SessionId;
use crate::store::{Record, StoreError, TableStore};
use crate::telegram::TelegramClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable destination for completed records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append one record, returning only once it is persisted
    async fn append(&self, record: &Record) -> Result<(), StoreError>;
}

/// Outbound channel back to the user
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Send a plain-text reply to the session's chat
    async fn send_reply(&self, session_id: SessionId, text: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn append(&self, record: &Record) -> Result<(), StoreError> {
        (**self).append(record).await
    }
}

#[async_trait]
impl<T: ReplySink + ?Sized> ReplySink for Arc<T> {
    async fn send_reply(&self, session_id: SessionId, text: &str) -> Result<(), String> {
        (**self).send_reply(session_id, text).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// File I/O and the writer lock wait run on the blocking pool
#[async_trait]
impl RecordStore for TableStore {
    async fn append(&self, record: &Record) -> Result<(), StoreError> {
        let store = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || TableStore::append(&store, &record)).await?
    }
}

#[async_trait]
impl ReplySink for TelegramClient {
    async fn send_reply(&self, session_id: SessionId, text: &str) -> Result<(), String> {
        self.send_message(session_id.chat_id, text)
            .await
            .map_err(|e| e.to_string())
    }
}
