//! Trait definitions for the remote family-document store
//!
//! The engine never talks to a concrete database; it goes through
//! [`FamilyStore`], which any backend can implement as long as it offers
//! per-record reads, an atomic multi-record batch write, and a change
//! subscription that emits events only after a write is durable.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::Member;
use crate::storage::errors::StorageError;

/// A single record write inside an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create or overwrite a member record
    Put(Member),

    /// Delete a member record by id
    Delete(String),
}

impl WriteOp {
    /// The id of the record this op touches.
    pub fn member_id(&self) -> &str {
        match self {
            WriteOp::Put(member) => &member.id,
            WriteOp::Delete(id) => id,
        }
    }
}

/// What happened to a record, as reported by the change feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeAction::Created => write!(f, "CREATE"),
            ChangeAction::Updated => write!(f, "UPDATE"),
            ChangeAction::Deleted => write!(f, "DELETE"),
        }
    }
}

/// A change event from the store's subscription primitive.
///
/// Events for the same id arrive in causal order; no ordering is promised
/// across different ids. `record` carries the raw payload so a malformed
/// record can be skipped at ingestion without aborting the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Id of the affected member record
    pub id: String,

    /// What happened to the record
    pub action: ChangeAction,

    /// The record payload; `Null` for deletions
    pub record: serde_json::Value,
}

impl ChangeEvent {
    /// Build an event carrying a member payload.
    pub fn for_member(action: ChangeAction, member: &Member) -> Result<ChangeEvent, StorageError> {
        let record = serde_json::to_value(member)?;
        Ok(ChangeEvent {
            id: member.id.clone(),
            action,
            record,
        })
    }

    /// Build a deletion event for the given id.
    pub fn for_deletion(id: impl Into<String>) -> Self {
        ChangeEvent {
            id: id.into(),
            action: ChangeAction::Deleted,
            record: serde_json::Value::Null,
        }
    }
}

/// The remote document store collaborator.
#[async_trait]
pub trait FamilyStore: Send + Sync + Debug + 'static {
    /// Get a member record by id.
    async fn get_member(&self, id: &str) -> Result<Option<Member>, StorageError>;

    /// List all member records.
    async fn list_members(&self) -> Result<Vec<Member>, StorageError>;

    /// Apply a batch of writes as one atomic transaction.
    ///
    /// Either every op in the batch becomes durable or none does. Change
    /// events for the batch are emitted only after it is durable.
    async fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StorageError>;

    /// Subscribe to the store's change feed.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
