//! In-process store backend
//!
//! A [`FamilyStore`] that keeps records in a `RwLock`'d map and feeds change
//! events through a `broadcast` channel. The composing application uses it as
//! the embedded backend; tests use it to drive the full engine without a
//! remote database.

use std::collections::HashMap;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

use crate::models::Member;
use crate::storage::errors::StorageError;
use crate::storage::traits::{ChangeAction, ChangeEvent, FamilyStore, WriteOp};

/// Default change-feed channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// In-memory [`FamilyStore`] with a broadcast change feed.
#[derive(Debug)]
pub struct MemoryStore {
    members: RwLock<HashMap<String, Member>>,
    event_tx: broadcast::Sender<ChangeEvent>,
}

impl MemoryStore {
    /// Create a store with the default change-feed capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a store with an explicit change-feed capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self {
            members: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Number of stored member records.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Emit a raw event on the change feed without touching stored records.
    ///
    /// Lets tests exercise ingestion paths (malformed payloads, redelivery)
    /// that a well-behaved store would never produce.
    pub fn simulate_event(&self, event: ChangeEvent) -> Result<(), StorageError> {
        self.event_tx
            .send(event)
            .map(|_| ())
            .map_err(|e| StorageError::Connection(format!("Failed to send simulated event: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FamilyStore for MemoryStore {
    async fn get_member(&self, id: &str) -> Result<Option<Member>, StorageError> {
        Ok(self.members.read().await.get(id).cloned())
    }

    async fn list_members(&self) -> Result<Vec<Member>, StorageError> {
        let mut members: Vec<Member> = self.members.read().await.values().cloned().collect();
        members.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(members)
    }

    async fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StorageError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut members = self.members.write().await;

        // Validate and serialize the whole batch before touching anything so
        // the write stays all-or-nothing.
        let mut events = Vec::with_capacity(batch.len());
        for op in &batch {
            match op {
                WriteOp::Put(member) => {
                    let action = if members.contains_key(&member.id) {
                        ChangeAction::Updated
                    } else {
                        ChangeAction::Created
                    };
                    events.push(ChangeEvent::for_member(action, member)?);
                }
                WriteOp::Delete(id) => {
                    if !members.contains_key(id) {
                        return Err(StorageError::Transaction(format!(
                            "cannot delete unknown member {}",
                            id
                        )));
                    }
                    events.push(ChangeEvent::for_deletion(id.clone()));
                }
            }
        }

        for op in batch {
            match op {
                WriteOp::Put(member) => {
                    members.insert(member.id.clone(), member);
                }
                WriteOp::Delete(id) => {
                    members.remove(&id);
                }
            }
        }

        // Emit while still holding the write lock so events for the same id
        // leave in application order across concurrent batches; send() is
        // synchronous and never blocks.
        debug!(events = events.len(), "applied atomic batch");
        for event in events {
            // No subscribers is fine; the feed may not be attached yet.
            if self.event_tx.send(event).is_err() {
                warn!("change event dropped: no active feed subscribers");
            }
        }

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.event_tx.subscribe()
    }
}
