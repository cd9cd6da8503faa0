//! Typed relations between family members

use serde::{Deserialize, Serialize};

/// The kind of connection between two members.
///
/// A relation is directional: `(from, to, Parent)` reads as "`from` is a
/// parent of `to`". Most kinds imply a reciprocal relation on the other
/// endpoint; siblings deliberately do not (see [`RelationType::reciprocal`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// `from` is a parent of `to`
    Parent,
    /// `from` is a child of `to`
    Child,
    /// `from` and `to` are spouses/partners
    Partner,
    /// `from` considers `to` a sibling
    Sibling,
}

impl RelationType {
    /// The relation type automatically created on the other endpoint, if any.
    ///
    /// Sibling returns `None`: sibling edges are stored one-directionally and
    /// are not forced symmetric. Flagged for product clarification; do not
    /// "fix" without one.
    pub fn reciprocal(&self) -> Option<RelationType> {
        match self {
            RelationType::Parent => Some(RelationType::Child),
            RelationType::Child => Some(RelationType::Parent),
            RelationType::Partner => Some(RelationType::Partner),
            RelationType::Sibling => None,
        }
    }

    /// Whether creating a relation of this type also creates its inverse.
    pub fn requires_reciprocal(&self) -> bool {
        self.reciprocal().is_some()
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationType::Parent => write!(f, "parent"),
            RelationType::Child => write!(f, "child"),
            RelationType::Partner => write!(f, "partner"),
            RelationType::Sibling => write!(f, "sibling"),
        }
    }
}

/// A flat relation record between two members.
///
/// Records are derived on read from the adjacency sets on [`super::Member`];
/// they are never persisted separately, so the two representations cannot
/// drift apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    /// Source member ID
    pub from_id: String,

    /// Target member ID
    pub to_id: String,

    /// The kind of connection, read from `from`'s point of view
    pub kind: RelationType,
}

impl Relation {
    /// Create a new relation record.
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, kind: RelationType) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_and_child_are_mutual_reciprocals() {
        assert_eq!(RelationType::Parent.reciprocal(), Some(RelationType::Child));
        assert_eq!(RelationType::Child.reciprocal(), Some(RelationType::Parent));
    }

    #[test]
    fn partner_is_its_own_reciprocal() {
        assert_eq!(
            RelationType::Partner.reciprocal(),
            Some(RelationType::Partner)
        );
    }

    #[test]
    fn sibling_has_no_reciprocal() {
        assert_eq!(RelationType::Sibling.reciprocal(), None);
        assert!(!RelationType::Sibling.requires_reciprocal());
    }

    #[test]
    fn relation_type_serializes_lowercase() {
        let json = serde_json::to_string(&RelationType::Partner).unwrap();
        assert_eq!(json, "\"partner\"");
    }
}
