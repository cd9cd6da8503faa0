//! A rejected store transaction must surface to the caller and leave the
//! local graph exactly as it was: no partial edges, no compensating rollback
//! needed.

use std::sync::Arc;

use kintree::prelude::*;
use mockall::mock;
use tokio::sync::broadcast;

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl FamilyStore for Store {
        async fn get_member(&self, id: &str) -> std::result::Result<Option<Member>, StorageError>;
        async fn list_members(&self) -> std::result::Result<Vec<Member>, StorageError>;
        async fn apply(&self, batch: Vec<WriteOp>) -> std::result::Result<(), StorageError>;
        fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
    }
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore").finish()
    }
}

fn rejecting_store() -> MockStore {
    let mut store = MockStore::new();
    store
        .expect_apply()
        .returning(|_| Err(StorageError::Transaction("write conflict".to_string())));
    store
}

async fn graph_with(ids: &[&str]) -> Arc<GraphStore> {
    let graph = Arc::new(GraphStore::new());
    for id in ids {
        let member = MemberBuilder::new("Test", *id).id(*id).build();
        graph
            .ingest(ChangeAction::Created, id, Some(member))
            .await;
    }
    graph
}

#[tokio::test]
async fn failed_spouse_edit_leaves_graph_untouched() {
    let graph = graph_with(&["a", "b"]).await;
    let coordinator =
        RelationshipCoordinator::new(Arc::new(rejecting_store()) as Arc<dyn FamilyStore>, Arc::clone(&graph));

    let err = coordinator.add_spouse("a", "b").await.unwrap_err();
    assert!(matches!(err, KintreeError::TransactionFailure(_)));

    // Local state only reflects confirmed remote state.
    assert!(graph.get("a").await.unwrap().spouse_ids.is_empty());
    assert!(graph.get("b").await.unwrap().spouse_ids.is_empty());
}

#[tokio::test]
async fn failed_deletion_leaves_member_and_edges_intact() {
    let graph = graph_with(&["parent", "child"]).await;
    {
        // Hand-build the linked state the feed would normally deliver.
        let mut parent = graph.get("parent").await.unwrap();
        let mut child = graph.get("child").await.unwrap();
        parent.children_ids.insert("child".to_string());
        child.parent_ids.insert("parent".to_string());
        graph
            .ingest(ChangeAction::Updated, "parent", Some(parent))
            .await;
        graph
            .ingest(ChangeAction::Updated, "child", Some(child))
            .await;
    }
    let coordinator =
        RelationshipCoordinator::new(Arc::new(rejecting_store()) as Arc<dyn FamilyStore>, Arc::clone(&graph));

    let err = coordinator.delete_member("parent").await.unwrap_err();
    assert!(matches!(err, KintreeError::TransactionFailure(_)));

    let parent = graph.get("parent").await.unwrap();
    let child = graph.get("child").await.unwrap();
    assert!(parent.children_ids.contains("child"));
    assert!(child.parent_ids.contains("parent"));
}

#[tokio::test]
async fn validation_errors_never_reach_the_store() {
    // apply() has no expectation, so any call would panic the mock.
    let mut store = MockStore::new();
    store.expect_apply().never();

    let graph = graph_with(&["a"]).await;
    let coordinator =
        RelationshipCoordinator::new(Arc::new(store) as Arc<dyn FamilyStore>, Arc::clone(&graph));

    let err = coordinator.add_spouse("a", "a").await.unwrap_err();
    assert!(matches!(err, KintreeError::InvalidOperation(_)));

    let err = coordinator.add_parent_child("a", "missing").await.unwrap_err();
    assert!(matches!(err, KintreeError::NotFound(_)));
}
