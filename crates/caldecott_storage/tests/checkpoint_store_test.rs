//! Tests for the JSON checkpoint store.

use caldecott_storage::{
    ArtifactKind, ArtifactReference, BookCheckpoint, CheckpointStore, ConversationTurn,
    CoverRecord, JsonCheckpointStore, OverlayTarget, PageRecord,
};
use tempfile::TempDir;
use uuid::Uuid;

fn artifact(kind: ArtifactKind) -> ArtifactReference {
    ArtifactReference {
        id: Uuid::new_v4(),
        content_hash: "abc123".to_string(),
        storage_backend: "filesystem".to_string(),
        storage_path: "/tmp/abc123".to_string(),
        size_bytes: 42,
        kind,
        mime_type: "image/png".to_string(),
    }
}

fn page_record(text: &str) -> PageRecord {
    PageRecord {
        text: text.to_string(),
        pristine: artifact(ArtifactKind::Illustration),
        composite: None,
        reference_page: None,
        completed_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn record_then_load_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("checkpoint.json");

    let store = JsonCheckpointStore::new(&path);
    let record = page_record("Luma steps outside.");
    let pristine_id = record.pristine.id;
    store
        .record_page(1, record, vec![ConversationTurn::user("prompt")])
        .await
        .unwrap();

    // A fresh store instance sees the durable state.
    let reloaded = JsonCheckpointStore::new(&path).load().await;
    assert!(reloaded.is_page_complete(1));
    let page = reloaded.page(1).unwrap();
    assert_eq!(page.text, "Luma steps outside.");
    assert_eq!(page.pristine.id, pristine_id);
    assert_eq!(reloaded.conversation().len(), 1);
    assert!(reloaded.updated_at().is_some());
}

#[tokio::test]
async fn missing_checkpoint_loads_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonCheckpointStore::new(temp_dir.path().join("absent.json"));

    let checkpoint = store.load().await;
    assert_eq!(checkpoint, BookCheckpoint::default());
    assert!(checkpoint.completed_pages().is_empty());
}

#[tokio::test]
async fn corrupt_checkpoint_loads_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("checkpoint.json");
    tokio::fs::write(&path, b"{ not json").await.unwrap();

    let checkpoint = JsonCheckpointStore::new(&path).load().await;
    assert_eq!(checkpoint, BookCheckpoint::default());
}

#[tokio::test]
async fn invalidate_clears_only_listed_pages() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonCheckpointStore::new(temp_dir.path().join("checkpoint.json"));

    for page in 1..=4 {
        store
            .record_page(
                page,
                page_record(&format!("text {page}")),
                vec![ConversationTurn::model(format!("response {page}"))],
            )
            .await
            .unwrap();
    }

    let checkpoint = store.invalidate(&[2, 3]).await.unwrap();

    assert_eq!(checkpoint.completed_pages(), vec![1, 4]);
    // Page 4 referenced page 3 during generation; its record survives the
    // invalidation of page 3.
    assert!(checkpoint.is_page_complete(4));
    // Conversation history is context, not completion state.
    assert_eq!(checkpoint.conversation().len(), 4);
}

#[tokio::test]
async fn resume_helpers_track_progress() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonCheckpointStore::new(temp_dir.path().join("checkpoint.json"));

    for page in [1, 2, 4] {
        store
            .record_page(page, page_record("text"), Vec::new())
            .await
            .unwrap();
    }

    let checkpoint = store.load().await;
    assert_eq!(checkpoint.next_pending_page(4), Some(3));
    assert!(!checkpoint.is_complete(4));

    store.record_page(3, page_record("text"), Vec::new()).await.unwrap();
    let checkpoint = store.load().await;
    assert_eq!(checkpoint.next_pending_page(4), None);
    assert!(checkpoint.is_complete(4));
}

#[tokio::test]
async fn previous_texts_feed_later_pages_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonCheckpointStore::new(temp_dir.path().join("checkpoint.json"));

    store
        .record_page(2, page_record("second"), Vec::new())
        .await
        .unwrap();
    store
        .record_page(1, page_record("first"), Vec::new())
        .await
        .unwrap();

    let texts = store.load().await.previous_texts();
    let pages: Vec<u32> = texts.keys().copied().collect();
    assert_eq!(pages, vec![1, 2]);
    assert_eq!(texts.get(&1).map(String::as_str), Some("first"));
}

#[tokio::test]
async fn conversation_window_returns_most_recent_turns() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonCheckpointStore::new(temp_dir.path().join("checkpoint.json"));

    let turns: Vec<ConversationTurn> = (0..6)
        .map(|i| ConversationTurn::user(format!("turn {i}")))
        .collect();
    store.record_page(1, page_record("text"), turns).await.unwrap();

    let checkpoint = store.load().await;
    let window = checkpoint.conversation_window(4);
    assert_eq!(window.len(), 4);
    assert_eq!(window[0].text, "turn 2");
    assert_eq!(window[3].text, "turn 5");

    // A window wider than history returns everything.
    assert_eq!(checkpoint.conversation_window(100).len(), 6);
}

#[tokio::test]
async fn failure_note_clears_on_later_success() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonCheckpointStore::new(temp_dir.path().join("checkpoint.json"));

    store
        .record_failure(3, "HTTP 503 error: busy".to_string())
        .await
        .unwrap();

    let checkpoint = store.load().await;
    assert_eq!(checkpoint.last_failure(3), Some("HTTP 503 error: busy"));
    assert!(!checkpoint.is_page_complete(3));

    let mut record = page_record("third");
    record.reference_page = Some(2);
    store.record_page(3, record, Vec::new()).await.unwrap();

    let checkpoint = store.load().await;
    assert_eq!(checkpoint.last_failure(3), None);
    assert!(checkpoint.failures().is_empty());
    assert_eq!(checkpoint.page(3).unwrap().reference_page, Some(2));
}

#[tokio::test]
async fn composite_attaches_to_recorded_page() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonCheckpointStore::new(temp_dir.path().join("checkpoint.json"));

    store
        .record_page(1, page_record("text"), Vec::new())
        .await
        .unwrap();

    let checkpoint = store
        .record_composite(OverlayTarget::Page(1), artifact(ArtifactKind::Composite))
        .await
        .unwrap();
    assert!(checkpoint.page(1).unwrap().composite.is_some());
}

#[tokio::test]
async fn composite_on_unrecorded_page_errors() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonCheckpointStore::new(temp_dir.path().join("checkpoint.json"));

    let result = store
        .record_composite(OverlayTarget::Page(9), artifact(ArtifactKind::Composite))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn cover_round_trips_and_accepts_composite() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("checkpoint.json");
    let store = JsonCheckpointStore::new(&path);

    store
        .record_cover(CoverRecord {
            pristine: artifact(ArtifactKind::Cover),
            composite: None,
            completed_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let checkpoint = store
        .record_composite(OverlayTarget::Cover, artifact(ArtifactKind::Composite))
        .await
        .unwrap();
    assert!(checkpoint.cover().unwrap().composite.is_some());

    let reloaded = JsonCheckpointStore::new(&path).load().await;
    assert!(reloaded.cover().is_some());
}

#[tokio::test]
async fn writes_leave_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("checkpoint.json");
    let store = JsonCheckpointStore::new(&path);

    store
        .record_page(1, page_record("text"), Vec::new())
        .await
        .unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());
}
