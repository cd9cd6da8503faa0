//! # Kintree
//!
//! Collaborative family-graph engine: a small group of related people builds
//! a graph of members and relationships (parent/child, spouse/partner,
//! sibling) and views it as a generational tree.
//!
//! The engine owns three things and nothing else: the in-memory graph fed by
//! a remote store's change feed, the relationship-mutation protocol with
//! automatic reciprocal edges, and the deterministic 2D generational layout.
//! Authentication, persistence transport, and rendering are external
//! collaborators behind narrow seams.
//!
//! ## Quick Start
//!
//! The local graph is updated only after the store confirms a write and the
//! change feed delivers it, so reads are eventually consistent with
//! mutations.
//!
//! ```rust,no_run
//! use kintree::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConfigBuilder::defaults().build()?;
//!     let engine = kintree::init(config)?;
//!
//!     // Add two members and marry them.
//!     let ada = engine
//!         .coordinator()
//!         .add_member(MemberBuilder::new("Ada", "Lovelace").build())
//!         .await?;
//!     let will = engine
//!         .coordinator()
//!         .add_member(MemberBuilder::new("William", "King").build())
//!         .await?;
//!     engine.coordinator().add_spouse(&ada, &will).await?;
//!
//!     // The local graph catches up through the change feed; positions are
//!     // recomputed from whatever snapshot is current.
//!     let positions = engine.layout_positions().await;
//!
//!     engine.shutdown();
//!     let _ = positions;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **GraphStore**: id-indexed snapshot of the family, written only by the
//!   change feed, observable via events.
//! - **RelationshipCoordinator**: validates edits against the snapshot and
//!   submits them as atomic multi-record transactions; never mutates local
//!   state directly.
//! - **LayoutEngine**: pure snapshot-to-coordinates function.
//! - **ChangeFeed**: bridges the store's subscription stream into GraphStore
//!   ingestion, skipping malformed records.

pub mod config;
pub mod coordinator;
pub mod feed;
pub mod graph;
pub mod layout;
pub mod logging;
pub mod models;
pub mod storage;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::coordinator::RelationshipCoordinator;
use crate::feed::ChangeFeed;
use crate::graph::GraphStore;
use crate::layout::{LayoutEngine, Position};
use crate::storage::{FamilyStore, MemoryStore};

/// The prelude re-exports commonly used types for convenience
pub mod prelude {
    pub use crate::config::{
        ConfigBuilder, ConfigLoader, FeedConfig, KintreeConfig, LayoutConfig, LogFormat, LogLevel,
        LoggingConfig,
    };
    pub use crate::coordinator::RelationshipCoordinator;
    pub use crate::feed::ChangeFeed;
    pub use crate::graph::{GraphEvent, GraphEventKind, GraphStore, Snapshot};
    pub use crate::layout::{LayoutEngine, Position};
    pub use crate::models::{Member, MemberBuilder, Relation, RelationType};
    pub use crate::storage::{
        ChangeAction, ChangeEvent, FamilyStore, MemoryStore, StorageError, WriteOp,
    };
    pub use crate::{Engine, KintreeError, Result, init};
}

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for Kintree operations
#[derive(Debug, thiserror::Error)]
pub enum KintreeError {
    /// A referenced member id is absent from the snapshot used to validate
    /// the call
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested edit is malformed (self-relationship, missing id,
    /// insufficient edit rights)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The remote store rejected the atomic write; nothing was applied
    #[error("Transaction failure: {0}")]
    TransactionFailure(String),

    /// A record could not be decoded. Local-only: ingestion logs and skips,
    /// it never propagates this past the feed
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// Other storage-layer error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Logging error
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LogError),
}

impl From<crate::config::ConfigError> for KintreeError {
    fn from(err: crate::config::ConfigError) -> Self {
        KintreeError::Configuration(err.to_string())
    }
}

/// Result type for Kintree operations
pub type Result<T> = std::result::Result<T, KintreeError>;

/// The assembled engine: store, local graph, coordinator, feed, and layout.
///
/// Components are dependency-injected rather than ambient; the application
/// owns the `Engine` and shares what it needs.
#[derive(Debug)]
pub struct Engine {
    store: Arc<dyn FamilyStore>,
    graph: Arc<GraphStore>,
    coordinator: RelationshipCoordinator,
    layout: LayoutEngine,
    feed: Arc<ChangeFeed>,
    feed_task: JoinHandle<()>,
}

impl Engine {
    /// Wire the engine over an injected store.
    ///
    /// Subscribes to the store's change feed and spawns the ingestion loop,
    /// so this must run inside a tokio runtime.
    pub fn new(store: Arc<dyn FamilyStore>, config: &config::KintreeConfig) -> Self {
        let graph = Arc::new(GraphStore::new());
        let feed = Arc::new(ChangeFeed::new(Arc::clone(&graph)));
        let feed_task = Arc::clone(&feed).spawn(store.subscribe());
        let coordinator = RelationshipCoordinator::new(Arc::clone(&store), Arc::clone(&graph));
        let layout = LayoutEngine::new(config.layout);

        Self {
            store,
            graph,
            coordinator,
            layout,
            feed,
            feed_task,
        }
    }

    /// The mutation entry point.
    pub fn coordinator(&self) -> &RelationshipCoordinator {
        &self.coordinator
    }

    /// The local graph snapshot store.
    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    /// The layout engine.
    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    /// The underlying store collaborator.
    pub fn store(&self) -> &Arc<dyn FamilyStore> {
        &self.store
    }

    /// The change-feed adapter (exposes skip diagnostics).
    pub fn feed(&self) -> &Arc<ChangeFeed> {
        &self.feed
    }

    /// Compute positions from the current snapshot.
    pub async fn layout_positions(&self) -> HashMap<String, Position> {
        let snapshot = self.graph.snapshot().await;
        self.layout.compute(&snapshot)
    }

    /// Stop the change-feed ingestion loop.
    pub fn shutdown(self) {
        self.feed_task.abort();
    }
}

/// Initialize Kintree with the provided configuration.
///
/// Sets up logging, creates an embedded in-memory store, and wires the full
/// engine. Applications bringing their own store backend should call
/// [`Engine::new`] directly.
pub fn init(config: config::KintreeConfig) -> Result<Engine> {
    logging::init(&config.logging)?;

    let store: Arc<dyn FamilyStore> =
        Arc::new(MemoryStore::with_capacity(config.feed.channel_capacity));
    Ok(Engine::new(store, &config))
}
