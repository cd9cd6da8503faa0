//! End-to-end engine tests: coordinator -> store -> change feed -> graph ->
//! layout, over the embedded in-memory store.

use std::sync::Arc;
use std::time::Duration;

use kintree::prelude::*;
use serde_json::json;
use tokio::time::{sleep, timeout};

const SYNC_TIMEOUT: Duration = Duration::from_secs(2);

fn engine() -> Engine {
    let config = ConfigBuilder::defaults().build().unwrap();
    kintree::init(config).unwrap()
}

fn member(id: &str) -> Member {
    MemberBuilder::new("Test", id).id(id).build()
}

/// Wait until the local graph satisfies a predicate; the feed runs on its own
/// task, so reads are eventually consistent with confirmed writes.
async fn sync_until<F, Fut>(check: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    timeout(SYNC_TIMEOUT, async {
        while !check().await {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("graph did not converge in time");
}

async fn seed(engine: &Engine, ids: &[&str]) {
    for id in ids {
        engine.coordinator().add_member(member(id)).await.unwrap();
    }
    let graph = Arc::clone(engine.graph());
    let want = ids.len();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move { graph.len().await >= want }
    })
    .await;
}

#[tokio::test]
async fn couple_with_child_lays_out_two_generations() {
    let engine = engine();
    seed(&engine, &["a", "b", "c"]).await;

    engine.coordinator().add_spouse("a", "b").await.unwrap();
    let graph = Arc::clone(engine.graph());
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("a")
                .await
                .is_some_and(|m| m.spouse_ids.contains("b"))
        }
    })
    .await;

    // Each mutation is validated against the local snapshot, so wait for the
    // feed to deliver one edit before issuing the next one that touches the
    // same record.
    engine.coordinator().add_parent_child("a", "c").await.unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("c")
                .await
                .is_some_and(|m| m.parent_ids.contains("a"))
        }
    })
    .await;
    engine.coordinator().add_parent_child("b", "c").await.unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("c")
                .await
                .is_some_and(|m| m.parent_ids.len() == 2)
        }
    })
    .await;

    let positions = engine.layout_positions().await;
    let a = positions["a"];
    let b = positions["b"];
    let c = positions["c"];

    assert_eq!(a.y, b.y, "spouses share a generation");
    assert_eq!(
        (a.x - b.x).abs(),
        engine.layout().config().node_width,
        "spouses are adjacent"
    );
    assert_eq!(c.y, engine.layout().config().level_height);
    assert_eq!(c.x, (a.x + b.x) / 2.0, "child is centered under the couple");

    // Identical snapshot, identical coordinates.
    assert_eq!(positions, engine.layout_positions().await);

    engine.shutdown();
}

#[tokio::test]
async fn spouse_symmetry_and_parent_child_duality_hold() {
    let engine = engine();
    seed(&engine, &["a", "b", "c", "d"]).await;

    let graph = Arc::clone(engine.graph());

    engine.coordinator().add_spouse("a", "b").await.unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("b")
                .await
                .is_some_and(|m| m.spouse_ids.contains("a"))
        }
    })
    .await;

    engine.coordinator().add_spouse("b", "c").await.unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("c")
                .await
                .is_some_and(|m| m.spouse_ids.contains("b"))
        }
    })
    .await;

    engine.coordinator().add_parent_child("a", "d").await.unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("d")
                .await
                .is_some_and(|m| m.parent_ids.contains("a"))
        }
    })
    .await;
    // Re-adding an existing edge is a no-op at the coordinator.
    engine.coordinator().add_parent_child("a", "d").await.unwrap();

    let members = engine.graph().all().await;
    for m in &members {
        for spouse in &m.spouse_ids {
            let other = engine.graph().get(spouse).await.unwrap();
            assert!(other.spouse_ids.contains(&m.id), "spouse symmetry violated");
        }
        for child in &m.children_ids {
            let other = engine.graph().get(child).await.unwrap();
            assert!(
                other.parent_ids.contains(&m.id),
                "parent/child duality violated"
            );
        }
        for parent in &m.parent_ids {
            let other = engine.graph().get(parent).await.unwrap();
            assert!(
                other.children_ids.contains(&m.id),
                "parent/child duality violated"
            );
        }
    }

    // Idempotent add left singleton sets.
    let a = engine.graph().get("a").await.unwrap();
    assert_eq!(a.children_ids.len(), 1);

    engine.shutdown();
}

#[tokio::test]
async fn deleting_a_member_removes_every_reference() {
    let engine = engine();
    seed(&engine, &["child", "father", "mother"]).await;

    let graph = Arc::clone(engine.graph());

    engine
        .coordinator()
        .add_spouse("father", "mother")
        .await
        .unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("mother")
                .await
                .is_some_and(|m| m.spouse_ids.contains("father"))
        }
    })
    .await;

    engine
        .coordinator()
        .add_parent_child("father", "child")
        .await
        .unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("child")
                .await
                .is_some_and(|m| m.parent_ids.contains("father"))
        }
    })
    .await;

    engine
        .coordinator()
        .add_parent_child("mother", "child")
        .await
        .unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("child")
                .await
                .is_some_and(|m| m.parent_ids.len() == 2)
        }
    })
    .await;

    engine
        .coordinator()
        .add_relationship("child", "father", RelationType::Sibling)
        .await
        .unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("child")
                .await
                .is_some_and(|m| m.sibling_ids.len() == 1)
        }
    })
    .await;

    engine.coordinator().delete_member("father").await.unwrap();
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move { !graph.contains("father").await }
    })
    .await;

    for m in engine.graph().all().await {
        assert!(
            !m.references("father"),
            "{} still references the deleted member",
            m.id
        );
    }

    engine.shutdown();
}

#[tokio::test]
async fn sibling_relationship_stays_one_directional_end_to_end() {
    let engine = engine();
    seed(&engine, &["a", "b"]).await;

    engine
        .coordinator()
        .add_relationship("a", "b", RelationType::Sibling)
        .await
        .unwrap();

    let graph = Arc::clone(engine.graph());
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move {
            graph
                .get("a")
                .await
                .is_some_and(|m| m.sibling_ids.contains("b"))
        }
    })
    .await;

    let relations = engine.graph().relations().await;
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0], Relation::new("a", "b", RelationType::Sibling));

    engine.shutdown();
}

#[tokio::test]
async fn malformed_feed_record_is_skipped_without_stopping_ingestion() {
    let config = ConfigBuilder::defaults().build().unwrap();
    let store = Arc::new(MemoryStore::with_capacity(config.feed.channel_capacity));
    let engine = Engine::new(Arc::clone(&store) as Arc<dyn FamilyStore>, &config);

    store
        .simulate_event(ChangeEvent {
            id: "broken".to_string(),
            action: ChangeAction::Created,
            record: json!({"id": 7, "first_name": []}),
        })
        .unwrap();
    store
        .apply(vec![WriteOp::Put(member("good"))])
        .await
        .unwrap();

    let graph = Arc::clone(engine.graph());
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move { graph.contains("good").await }
    })
    .await;

    assert_eq!(engine.feed().skipped(), 1);
    assert!(!engine.graph().contains("broken").await);

    engine.shutdown();
}

#[tokio::test]
async fn redelivered_events_do_not_duplicate_members() {
    let config = ConfigBuilder::defaults().build().unwrap();
    let store = Arc::new(MemoryStore::with_capacity(config.feed.channel_capacity));
    let engine = Engine::new(Arc::clone(&store) as Arc<dyn FamilyStore>, &config);

    let m = member("a");
    let event = ChangeEvent::for_member(ChangeAction::Created, &m).unwrap();
    store.simulate_event(event.clone()).unwrap();
    store.simulate_event(event).unwrap();

    let graph = Arc::clone(engine.graph());
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move { graph.contains("a").await }
    })
    .await;

    assert_eq!(engine.graph().len().await, 1);

    engine.shutdown();
}

#[tokio::test]
async fn unusable_log_file_path_fails_init() {
    let mut config = ConfigBuilder::defaults().build().unwrap();
    // A path under /dev/null can never be created.
    config.logging.file = Some("/dev/null/kintree/engine.log".into());

    let err = kintree::init(config).unwrap_err();
    assert!(matches!(err, KintreeError::Logging(_)));
}

#[tokio::test]
async fn partial_graph_still_renders_unresolved_parents_as_roots() {
    let engine = engine();

    // The parent record never loads; the child must still get a position.
    let mut child = member("child");
    child.parent_ids.insert("never-loaded".to_string());
    engine.coordinator().add_member(child).await.unwrap();

    let graph = Arc::clone(engine.graph());
    sync_until(|| {
        let graph = Arc::clone(&graph);
        async move { graph.contains("child").await }
    })
    .await;

    let positions = engine.layout_positions().await;
    assert_eq!(positions["child"].y, 0.0);

    engine.shutdown();
}
