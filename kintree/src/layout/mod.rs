//! Generational tree layout.
//!
//! A pure function from a graph [`Snapshot`] to per-member 2D positions. No
//! I/O, no hidden state; the same snapshot always produces the same
//! coordinates, so the whole layout is recomputed on every graph change.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::graph::Snapshot;
use crate::models::Member;

/// A computed 2D position for one member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Horizontal offset, centered on 0 within the generation row
    pub x: f32,

    /// Vertical offset, `level * level_height`
    pub y: f32,
}

/// Computes generational tree layouts from graph snapshots.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    /// Create an engine with the given geometry.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// The geometry in use.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute positions for every member reachable from a root.
    ///
    /// Roots are members with no parents, or whose listed parents all fail to
    /// resolve in the snapshot; a member whose parent has not loaded yet still
    /// renders. Members unreachable from any root (for example an isolated
    /// cycle of unresolved references) are absent from the output. Never
    /// fails: unresolvable ids are treated as absent.
    pub fn compute(&self, snapshot: &Snapshot) -> HashMap<String, Position> {
        let mut levels: HashMap<String, u32> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        // Snapshot iteration is ascending id, which fixes the root order.
        for member in snapshot.members() {
            if is_root(member, snapshot) {
                assign_level(member, 0, snapshot, &mut levels, &mut order);
            }
        }

        // Group by level, preserving assignment order within each row.
        let mut rows: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for id in &order {
            rows.entry(levels[id.as_str()]).or_default().push(id);
        }

        let mut positions = HashMap::with_capacity(order.len());
        for (level, row) in rows {
            let row_width = row.len() as f32 * self.config.node_width;
            let y = level as f32 * self.config.level_height;
            for (slot, id) in row.iter().enumerate() {
                let x = (slot as f32 + 0.5) * self.config.node_width - row_width / 2.0;
                positions.insert((*id).to_string(), Position { x, y });
            }
        }
        positions
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

/// A member is a root when none of its listed parents resolve in the snapshot.
fn is_root(member: &Member, snapshot: &Snapshot) -> bool {
    member.parent_ids.is_empty() || member.parent_ids.iter().all(|p| !snapshot.contains(p))
}

/// Depth-first level assignment; first assignment wins.
///
/// Spouses join the current generation, children go one below. The visited
/// check both dedupes shared descendants and terminates cycles.
fn assign_level(
    member: &Member,
    level: u32,
    snapshot: &Snapshot,
    levels: &mut HashMap<String, u32>,
    order: &mut Vec<String>,
) {
    if levels.contains_key(&member.id) {
        return;
    }
    levels.insert(member.id.clone(), level);
    order.push(member.id.clone());

    for spouse_id in &member.spouse_ids {
        if let Some(spouse) = snapshot.get(spouse_id) {
            assign_level(spouse, level, snapshot, levels, order);
        }
    }
    for child_id in &member.children_ids {
        if let Some(child) = snapshot.get(child_id) {
            assign_level(child, level + 1, snapshot, levels, order);
        }
    }
}
