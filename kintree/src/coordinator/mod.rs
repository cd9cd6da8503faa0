//! Relationship mutation coordinator.
//!
//! Every structural edit is validated against the local snapshot, then written
//! to the remote store as one atomic multi-record batch. The local graph is
//! never touched here; it catches up through the change feed once the write is
//! durable, so a failed mutation leaves no partial state to roll back.

use std::sync::Arc;

use tracing::{debug, info};

use crate::graph::GraphStore;
use crate::models::{Member, RelationType};
use crate::storage::{FamilyStore, WriteOp};
use crate::{KintreeError, Result};

/// Applies structural edits to the family graph.
///
/// Constructed with its collaborators injected; holds no global state. The
/// optional actor id is the authenticated user on whose behalf edits run,
/// supplied by the session layer.
#[derive(Debug)]
pub struct RelationshipCoordinator {
    store: Arc<dyn FamilyStore>,
    graph: Arc<GraphStore>,
    actor: Option<String>,
}

impl RelationshipCoordinator {
    /// Create a coordinator over the given store and local graph.
    pub fn new(store: Arc<dyn FamilyStore>, graph: Arc<GraphStore>) -> Self {
        Self {
            store,
            graph,
            actor: None,
        }
    }

    /// Record the acting user's id for audit logging.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Add a new member record to the family.
    ///
    /// Fails with `InvalidOperation` if the id is already present in the
    /// local snapshot.
    pub async fn add_member(&self, member: Member) -> Result<String> {
        if self.graph.contains(&member.id).await {
            return Err(KintreeError::InvalidOperation(format!(
                "member {} already exists",
                member.id
            )));
        }

        let id = member.id.clone();
        self.apply(vec![WriteOp::Put(member)]).await?;
        info!(id = %id, actor = ?self.actor, "added member");
        Ok(id)
    }

    /// Link a parent and a child.
    ///
    /// Appends `child_id` to the parent's children and `parent_id` to the
    /// child's parents in one atomic write. Idempotent: if the edge already
    /// exists in both directions, nothing is written.
    pub async fn add_parent_child(&self, parent_id: &str, child_id: &str) -> Result<()> {
        self.ensure_distinct(parent_id, child_id)?;
        let mut parent = self.require(parent_id).await?;
        let mut child = self.require(child_id).await?;
        self.ensure_editable(&parent)?;
        self.ensure_editable(&child)?;

        let changed = parent.children_ids.insert(child_id.to_string())
            | child.parent_ids.insert(parent_id.to_string());
        if !changed {
            debug!(parent_id, child_id, "parent-child edge already present");
            return Ok(());
        }
        parent.touch();
        child.touch();

        self.apply(vec![WriteOp::Put(parent), WriteOp::Put(child)])
            .await?;
        info!(parent_id, child_id, actor = ?self.actor, "linked parent and child");
        Ok(())
    }

    /// Link two members as spouses.
    ///
    /// Symmetric: each id is appended to the other's spouse set in one atomic
    /// write. Idempotent.
    pub async fn add_spouse(&self, a_id: &str, b_id: &str) -> Result<()> {
        self.ensure_distinct(a_id, b_id)?;
        let mut a = self.require(a_id).await?;
        let mut b = self.require(b_id).await?;
        self.ensure_editable(&a)?;
        self.ensure_editable(&b)?;

        let changed =
            a.spouse_ids.insert(b_id.to_string()) | b.spouse_ids.insert(a_id.to_string());
        if !changed {
            debug!(a_id, b_id, "spouse edge already present");
            return Ok(());
        }
        a.touch();
        b.touch();

        self.apply(vec![WriteOp::Put(a), WriteOp::Put(b)]).await?;
        info!(a_id, b_id, actor = ?self.actor, "linked spouses");
        Ok(())
    }

    /// Create a typed relation from one member to another.
    ///
    /// Types with a reciprocal (parent, child, partner) also create the
    /// inverse relation on the other endpoint inside the same atomic write.
    /// Sibling deliberately creates only the one-directional record.
    pub async fn add_relationship(
        &self,
        from_id: &str,
        to_id: &str,
        kind: RelationType,
    ) -> Result<()> {
        match kind {
            RelationType::Parent => self.add_parent_child(from_id, to_id).await,
            RelationType::Child => self.add_parent_child(to_id, from_id).await,
            RelationType::Partner => self.add_spouse(from_id, to_id).await,
            RelationType::Sibling => self.add_sibling(from_id, to_id).await,
        }
    }

    /// Remove a member and every reference to it.
    ///
    /// One atomic batch rewrites every member whose edge sets mention the id,
    /// then deletes the record itself. On failure nothing is removed.
    pub async fn delete_member(&self, id: &str) -> Result<()> {
        let snapshot = self.graph.snapshot().await;
        let target = snapshot
            .get(id)
            .ok_or_else(|| KintreeError::NotFound(format!("member {} not found", id)))?;
        self.ensure_editable(target)?;

        let mut batch = Vec::new();
        for member in snapshot.members() {
            if member.id != id && member.references(id) {
                let mut neighbor = member.clone();
                neighbor.strip_references(id);
                batch.push(WriteOp::Put(neighbor));
            }
        }
        let unlinked = batch.len();
        batch.push(WriteOp::Delete(id.to_string()));

        self.apply(batch).await?;
        info!(id, unlinked, actor = ?self.actor, "deleted member");
        Ok(())
    }

    /// One-directional sibling record; siblings get no reciprocal.
    async fn add_sibling(&self, from_id: &str, to_id: &str) -> Result<()> {
        self.ensure_distinct(from_id, to_id)?;
        let mut from = self.require(from_id).await?;
        self.require(to_id).await?;
        self.ensure_editable(&from)?;

        if !from.sibling_ids.insert(to_id.to_string()) {
            debug!(from_id, to_id, "sibling edge already present");
            return Ok(());
        }
        from.touch();

        self.apply(vec![WriteOp::Put(from)]).await?;
        info!(from_id, to_id, actor = ?self.actor, "linked sibling");
        Ok(())
    }

    /// Fetch a member from the local snapshot or fail with `NotFound`.
    async fn require(&self, id: &str) -> Result<Member> {
        self.graph
            .get(id)
            .await
            .ok_or_else(|| KintreeError::NotFound(format!("member {} not found", id)))
    }

    fn ensure_distinct(&self, a: &str, b: &str) -> Result<()> {
        if a == b {
            return Err(KintreeError::InvalidOperation(format!(
                "member {} cannot be related to itself",
                a
            )));
        }
        if a.is_empty() || b.is_empty() {
            return Err(KintreeError::InvalidOperation(
                "member id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_editable(&self, member: &Member) -> Result<()> {
        if !member.can_edit {
            return Err(KintreeError::InvalidOperation(format!(
                "member {} is not editable by the current user",
                member.id
            )));
        }
        Ok(())
    }

    /// Submit the batch to the remote store; any rejection surfaces as a
    /// transaction failure with no local effect.
    async fn apply(&self, batch: Vec<WriteOp>) -> Result<()> {
        self.store
            .apply(batch)
            .await
            .map_err(|e| KintreeError::TransactionFailure(e.to_string()))
    }
}
