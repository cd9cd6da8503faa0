//! Local snapshot of the family graph.
//!
//! [`GraphStore`] is an indexed map of member id to record, fed exclusively by
//! the change feed. It does no I/O and is never written by mutations directly;
//! a failed remote transaction therefore simply never shows up here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

use crate::models::{Member, Relation};
use crate::storage::ChangeAction;

/// What changed in the local graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GraphEventKind {
    /// A member was inserted or overwritten
    Upserted,
    /// A member was removed
    Removed,
}

/// Notification that the local graph changed, for observers such as a UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEvent {
    /// Id of the affected member
    pub id: String,

    /// What happened
    pub kind: GraphEventKind,
}

/// An immutable copy of the graph at one point in time.
///
/// Iteration order is ascending id, so everything computed from a snapshot is
/// reproducible.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    members: BTreeMap<String, Member>,
}

impl Snapshot {
    /// Build a snapshot from a list of members (test and tooling helper).
    pub fn from_members(members: impl IntoIterator<Item = Member>) -> Self {
        Self {
            members: members.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }

    /// Look up a member by id.
    pub fn get(&self, id: &str) -> Option<&Member> {
        self.members.get(id)
    }

    /// Whether the snapshot contains the id.
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    /// Members in ascending id order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Number of members in the snapshot.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// In-memory store of the observed graph, keyed by member id.
#[derive(Debug)]
pub struct GraphStore {
    members: RwLock<BTreeMap<String, Member>>,
    event_tx: broadcast::Sender<GraphEvent>,
}

impl GraphStore {
    /// Create an empty graph store.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create an empty graph store with an explicit event channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self {
            members: RwLock::new(BTreeMap::new()),
            event_tx,
        }
    }

    /// Apply one change-feed event to the local graph.
    ///
    /// Idempotent under redelivery: re-applying a Created/Updated event is an
    /// overwrite with the same data, re-applying a Deleted event is a no-op.
    /// The write lock serializes concurrent ingestion per store instance.
    pub async fn ingest(&self, action: ChangeAction, id: &str, member: Option<Member>) {
        let event = {
            let mut members = self.members.write().await;
            match action {
                ChangeAction::Created | ChangeAction::Updated => {
                    let Some(member) = member else {
                        warn!(id, %action, "ingest called without a record; skipping");
                        return;
                    };
                    members.insert(member.id.clone(), member);
                    Some(GraphEvent {
                        id: id.to_string(),
                        kind: GraphEventKind::Upserted,
                    })
                }
                ChangeAction::Deleted => {
                    if members.remove(id).is_some() {
                        Some(GraphEvent {
                            id: id.to_string(),
                            kind: GraphEventKind::Removed,
                        })
                    } else {
                        debug!(id, "delete for unknown member; ignoring");
                        None
                    }
                }
            }
        };

        if let Some(event) = event {
            // No subscribers is fine.
            let _ = self.event_tx.send(event);
        }
    }

    /// Look up a member by id.
    pub async fn get(&self, id: &str) -> Option<Member> {
        self.members.read().await.get(id).cloned()
    }

    /// All members, in ascending id order.
    pub async fn all(&self) -> Vec<Member> {
        self.members.read().await.values().cloned().collect()
    }

    /// Copy the current state of the graph.
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            members: self.members.read().await.clone(),
        }
    }

    /// Derive the flat relation records for the whole graph.
    pub async fn relations(&self) -> Vec<Relation> {
        self.members
            .read()
            .await
            .values()
            .flat_map(|m| m.relations())
            .collect()
    }

    /// Number of members currently observed.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Whether the graph is empty.
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Whether the graph contains the id.
    pub async fn contains(&self, id: &str) -> bool {
        self.members.read().await.contains_key(id)
    }

    /// Subscribe to local graph change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
