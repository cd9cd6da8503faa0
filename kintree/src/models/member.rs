//! The family member node

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Relation, RelationType};

/// A family member: a node in the graph.
///
/// Edge sets hold ids only. An id that does not resolve in the current
/// snapshot is tolerated everywhere; readers treat it as "absent". `BTreeSet`
/// gives true set semantics (re-adding an edge is a no-op) and deterministic
/// iteration order for layout and serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    /// Unique, stable identifier
    pub id: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Date of birth, if known
    pub birth_date: Option<NaiveDate>,

    /// Free-form gender label, if provided
    pub gender: Option<String>,

    /// Ids of this member's parents
    #[serde(default)]
    pub parent_ids: BTreeSet<String>,

    /// Ids of this member's spouses/partners
    #[serde(default)]
    pub spouse_ids: BTreeSet<String>,

    /// Ids of this member's children
    #[serde(default)]
    pub children_ids: BTreeSet<String>,

    /// Ids this member lists as siblings (not required to be symmetric)
    #[serde(default)]
    pub sibling_ids: BTreeSet<String>,

    /// Whether this member has an account of their own
    #[serde(default)]
    pub is_registered_user: bool,

    /// Whether the acting user may edit this record
    #[serde(default = "default_true")]
    pub can_edit: bool,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Member {
    /// Create a member with a fresh id and the given names.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        MemberBuilder::new(first_name, last_name).build()
    }

    /// Full display name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether any edge set references the given id.
    pub fn references(&self, id: &str) -> bool {
        self.parent_ids.contains(id)
            || self.spouse_ids.contains(id)
            || self.children_ids.contains(id)
            || self.sibling_ids.contains(id)
    }

    /// Remove the given id from every edge set.
    ///
    /// Returns true if anything changed.
    pub fn strip_references(&mut self, id: &str) -> bool {
        let removed = self.parent_ids.remove(id)
            | self.spouse_ids.remove(id)
            | self.children_ids.remove(id)
            | self.sibling_ids.remove(id);
        if removed {
            self.touch();
        }
        removed
    }

    /// Bump the update timestamp after a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Derive the flat relation records for this member's outgoing edges.
    pub fn relations(&self) -> Vec<Relation> {
        let mut out = Vec::with_capacity(
            self.children_ids.len()
                + self.parent_ids.len()
                + self.spouse_ids.len()
                + self.sibling_ids.len(),
        );
        for child in &self.children_ids {
            out.push(Relation::new(&self.id, child, RelationType::Parent));
        }
        for parent in &self.parent_ids {
            out.push(Relation::new(&self.id, parent, RelationType::Child));
        }
        for spouse in &self.spouse_ids {
            out.push(Relation::new(&self.id, spouse, RelationType::Partner));
        }
        for sibling in &self.sibling_ids {
            out.push(Relation::new(&self.id, sibling, RelationType::Sibling));
        }
        out
    }
}

/// Builder for [`Member`] records.
#[derive(Debug, Clone)]
pub struct MemberBuilder {
    id: Option<String>,
    first_name: String,
    last_name: String,
    birth_date: Option<NaiveDate>,
    gender: Option<String>,
    is_registered_user: bool,
    can_edit: bool,
}

impl MemberBuilder {
    /// Start building a member with the given names.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date: None,
            gender: None,
            is_registered_user: false,
            can_edit: true,
        }
    }

    /// Use an explicit id instead of a generated one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the birth date.
    pub fn birth_date(mut self, date: NaiveDate) -> Self {
        self.birth_date = Some(date);
        self
    }

    /// Set the gender label.
    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Mark the member as having their own account.
    pub fn registered_user(mut self, registered: bool) -> Self {
        self.is_registered_user = registered;
        self
    }

    /// Set whether the acting user may edit this record.
    pub fn can_edit(mut self, can_edit: bool) -> Self {
        self.can_edit = can_edit;
        self
    }

    /// Build the member record.
    pub fn build(self) -> Member {
        let now = Utc::now();
        Member {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            first_name: self.first_name,
            last_name: self.last_name,
            birth_date: self.birth_date,
            gender: self.gender,
            parent_ids: BTreeSet::new(),
            spouse_ids: BTreeSet::new(),
            children_ids: BTreeSet::new(),
            sibling_ids: BTreeSet::new(),
            is_registered_user: self.is_registered_user,
            can_edit: self.can_edit,
            created_at: now,
            updated_at: now,
        }
    }
}
