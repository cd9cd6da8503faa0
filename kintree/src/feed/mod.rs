//! Change-feed adapter.
//!
//! Consumes the store's subscription stream and drives [`GraphStore`]
//! ingestion. A record that fails to decode is logged and skipped; one bad
//! record must never abort ingestion of the rest of the snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::graph::GraphStore;
use crate::models::Member;
use crate::storage::{ChangeAction, ChangeEvent};

/// Adapter between a store change feed and the local [`GraphStore`].
#[derive(Debug)]
pub struct ChangeFeed {
    graph: Arc<GraphStore>,
    skipped: AtomicU64,
}

impl ChangeFeed {
    /// Create an adapter that feeds the given graph store.
    pub fn new(graph: Arc<GraphStore>) -> Self {
        Self {
            graph,
            skipped: AtomicU64::new(0),
        }
    }

    /// Number of events skipped because their payload failed to decode.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Apply a single change event to the graph.
    pub async fn apply(&self, event: &ChangeEvent) {
        match event.action {
            ChangeAction::Deleted => {
                self.graph.ingest(ChangeAction::Deleted, &event.id, None).await;
            }
            ChangeAction::Created | ChangeAction::Updated => {
                match serde_json::from_value::<Member>(event.record.clone()) {
                    Ok(member) => {
                        debug!(id = %event.id, action = %event.action, "ingesting change event");
                        self.graph.ingest(event.action, &event.id, Some(member)).await;
                    }
                    Err(e) => {
                        self.skipped.fetch_add(1, Ordering::Relaxed);
                        warn!(id = %event.id, error = %e, "skipping undecodable record");
                    }
                }
            }
        }
    }

    /// Drive the feed until the sending side closes.
    pub async fn run(&self, mut rx: broadcast::Receiver<ChangeEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => self.apply(&event).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Per-id causal ordering still holds for what we receive;
                    // dropped events surface as a stale local view until the
                    // next write to the same record.
                    warn!(missed, "change feed lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("change feed closed");
                    break;
                }
            }
        }
    }

    /// Spawn the feed loop on the runtime.
    pub fn spawn(self: Arc<Self>, rx: broadcast::Receiver<ChangeEvent>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(rx).await })
    }
}
