//! Data models for the family graph.
//!
//! A [`Member`] is a node in the graph; all cross-references between members
//! are id lookups into the current snapshot, never owned pointers, so removing
//! a member can leave dangling ids (tolerated) but never dangling references.

mod member;
mod relation;

pub use member::{Member, MemberBuilder};
pub use relation::{Relation, RelationType};
