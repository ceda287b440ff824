//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::state_machine::SessionId;
use crate::store::{Record, StoreError};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// In-Memory Record Store
// ============================================================================

/// Record store that keeps appended records in memory
pub struct InMemoryRecordStore {
    records: Mutex<Vec<Record>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Get all appended records in arrival order
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn append(&self, record: &Record) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ============================================================================
// Failing Record Store
// ============================================================================

/// Record store that behaves like an unwritable table
pub struct FailingRecordStore {
    attempts: Mutex<usize>,
}

impl FailingRecordStore {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(0),
        }
    }

    /// Number of append calls received
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl RecordStore for FailingRecordStore {
    async fn append(&self, _record: &Record) -> Result<(), StoreError> {
        *self.attempts.lock().unwrap() += 1;
        Err(StoreError::Io {
            path: PathBuf::from("/unwritable/user_data.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only file system"),
        })
    }
}

// ============================================================================
// Recording Reply Sink
// ============================================================================

/// Reply sink that records every reply and streams it to the test
pub struct RecordingReplySink {
    sent: Mutex<Vec<(SessionId, String)>>,
    tx: mpsc::UnboundedSender<(SessionId, String)>,
}

impl RecordingReplySink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(SessionId, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            sent: Mutex::new(Vec::new()),
            tx,
        };
        (sink, rx)
    }

    /// Reply texts in send order, across all sessions
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Reply texts sent to one session
    pub fn texts_for(&self, session_id: SessionId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == session_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ReplySink for RecordingReplySink {
    async fn send_reply(&self, session_id: SessionId, text: &str) -> Result<(), String> {
        self.sent
            .lock()
            .unwrap()
            .push((session_id, text.to_string()));
        let _ = self.tx.send((session_id, text.to_string()));
        Ok(())
    }
}

/// Wait for the next reply, failing the test if none arrives
pub async fn next_reply(
    rx: &mut mpsc::UnboundedReceiver<(SessionId, String)>,
) -> (SessionId, String) {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for reply")
        .expect("reply sink dropped")
}
