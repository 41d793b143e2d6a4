//! End-to-end orchestrator tests against a scripted driver.
//!
//! The driver replays queued replies instead of calling a real service,
//! so these tests exercise the whole loop: scene resolution, prompt
//! composition, text extraction, artifact storage, and checkpointing.

use async_trait::async_trait;
use caldecott::{
    ArtDriver, ArtifactKind, ArtifactReference, ArtifactStore, BookCheckpoint, BookConfig,
    BookErrorKind, CaldecottErrorKind, CaldecottResult, CheckpointErrorKind, CheckpointStore,
    FileSystemArtifacts, GeminiError, GeminiErrorKind, GenerateRequest, GenerateResponse,
    Illustrate, IllustrateRequest, JsonCheckpointStore, Orchestrator, Output, OverlaySelection,
    OverlayTarget, PlanOverlayRenderer, SceneErrorKind,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const STORY: &str =
    "TEXT START\nNia the otter finds a glowing lantern beside the quiet river.\nTEXT END";
const STORY_TEXT: &str = "Nia the otter finds a glowing lantern beside the quiet river.";
const PNG: &[u8] = &[137, 80, 78, 71, 13, 10, 26, 10];

/// One scripted illustration reply.
enum Reply {
    Image(Vec<u8>),
    Status(u16),
    TextOnly,
}

#[derive(Default)]
struct DriverState {
    texts: Mutex<VecDeque<String>>,
    images: Mutex<VecDeque<Reply>>,
    text_calls: AtomicUsize,
    illustrate_calls: AtomicUsize,
    references: Mutex<Vec<bool>>,
}

/// Driver that replays queued replies. Empty queues fall back to a valid
/// story line and a PNG so tests only script the interesting calls.
#[derive(Clone, Default)]
struct ScriptedDriver {
    state: Arc<DriverState>,
}

impl ScriptedDriver {
    fn queue_text(&self, text: &str) {
        self.state.texts.lock().unwrap().push_back(text.to_string());
    }

    fn queue_image(&self, reply: Reply) {
        self.state.images.lock().unwrap().push_back(reply);
    }

    fn text_calls(&self) -> usize {
        self.state.text_calls.load(Ordering::SeqCst)
    }

    fn illustrate_calls(&self) -> usize {
        self.state.illustrate_calls.load(Ordering::SeqCst)
    }

    /// Whether each illustration call carried a reference image, in order.
    fn references(&self) -> Vec<bool> {
        self.state.references.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtDriver for ScriptedDriver {
    async fn generate(&self, _req: &GenerateRequest) -> CaldecottResult<GenerateResponse> {
        self.state.text_calls.fetch_add(1, Ordering::SeqCst);
        let text = self
            .state
            .texts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| STORY.to_string());
        Ok(GenerateResponse {
            outputs: vec![Output::Text(text)],
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[async_trait]
impl Illustrate for ScriptedDriver {
    async fn illustrate(&self, req: &IllustrateRequest) -> CaldecottResult<GenerateResponse> {
        self.state.illustrate_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .references
            .lock()
            .unwrap()
            .push(req.reference.is_some());

        let reply = self
            .state
            .images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Image(PNG.to_vec()));
        match reply {
            Reply::Image(data) => Ok(GenerateResponse {
                outputs: vec![Output::Image {
                    mime: Some("image/png".to_string()),
                    data,
                }],
            }),
            Reply::Status(status_code) => Err(GeminiError::new(GeminiErrorKind::HttpError {
                status_code,
                message: "scripted failure".to_string(),
            })
            .into()),
            Reply::TextOnly => Ok(GenerateResponse {
                outputs: vec![Output::Text("no image this time".to_string())],
            }),
        }
    }
}

fn book_toml(page_count: u32) -> String {
    format!(
        r#"
        [book]
        title = "The River Lantern"
        page_count = {page_count}

        [[characters]]
        key = "nia"
        name = "Nia"
        appearance = "sleek brown fur, bright amber eyes"

        [characters.actions]
        intro = "finds the lantern"

        [[story_progression.phases]]
        name = "intro"
        start_page = 1
        end_page = {page_count}

        [scenes.intro]
        description = "a quiet riverbank at dusk"

        [scenes.conclusion]
        description = "the river at night"

        [generation]
        max_attempts = 3
        page_delay_seconds = 0
        "#
    )
}

fn cover_book_toml(page_count: u32) -> String {
    let mut toml = book_toml(page_count);
    toml.push_str(
        r#"
        [cover]
        generate_cover = true
        reference_page_for_style = 1
        cover_title = "The River Lantern"
        cover_author = "E. Rose"
        "#,
    );
    toml
}

struct Harness {
    driver: ScriptedDriver,
    orchestrator: Orchestrator<ScriptedDriver, JsonCheckpointStore, FileSystemArtifacts>,
    temp: TempDir,
}

fn harness(toml: &str) -> Harness {
    let temp = TempDir::new().unwrap();
    let config: BookConfig = toml.parse().unwrap();
    let driver = ScriptedDriver::default();
    let artifacts = FileSystemArtifacts::new(temp.path().join("artifacts")).unwrap();
    let checkpoints = JsonCheckpointStore::new(temp.path().join("checkpoint.json"));
    let orchestrator = Orchestrator::new(config, driver.clone(), checkpoints, artifacts);
    Harness {
        driver,
        orchestrator,
        temp,
    }
}

impl Harness {
    /// Durable state as a fresh store instance would see it.
    async fn checkpoint(&self) -> BookCheckpoint {
        JsonCheckpointStore::new(self.temp.path().join("checkpoint.json"))
            .load()
            .await
    }

    async fn artifact_bytes(&self, reference: &ArtifactReference) -> Vec<u8> {
        FileSystemArtifacts::new(self.temp.path().join("artifacts"))
            .unwrap()
            .retrieve(reference)
            .await
            .unwrap()
    }

    fn plan_renderer(&self) -> PlanOverlayRenderer {
        PlanOverlayRenderer::new(self.temp.path().join("overlay_plan.json"))
    }
}

#[tokio::test]
async fn run_generates_every_page_and_checkpoints() {
    let harness = harness(&book_toml(3));

    let outcome = harness.orchestrator.run().await.unwrap();

    assert_eq!(outcome.pages_generated, vec![1, 2, 3]);
    assert!(outcome.pages_skipped.is_empty());
    assert!(!outcome.cover_generated);

    let checkpoint = harness.checkpoint().await;
    assert!(checkpoint.is_complete(3));
    let page = checkpoint.page(1).unwrap();
    assert_eq!(page.text, STORY_TEXT);
    assert!(page.composite.is_none());
    assert_eq!(harness.artifact_bytes(&page.pristine).await, PNG);

    // Page 1 has nothing to anchor on; later pages reference completed work.
    assert_eq!(harness.driver.references(), vec![false, true, true]);
    assert_eq!(page.reference_page, None);
    assert_eq!(checkpoint.page(2).unwrap().reference_page, Some(1));
    assert_eq!(checkpoint.page(3).unwrap().reference_page, Some(2));
    assert_eq!(harness.driver.text_calls(), 3);
    assert_eq!(harness.driver.illustrate_calls(), 3);

    // Each page contributes its prompt and the model's reply.
    assert_eq!(checkpoint.conversation().len(), 6);
}

#[tokio::test]
async fn resume_skips_completed_pages() {
    let harness = harness(&book_toml(3));
    harness.orchestrator.run().await.unwrap();
    let calls_after_first = harness.driver.illustrate_calls();

    let outcome = harness.orchestrator.run().await.unwrap();

    assert!(outcome.pages_generated.is_empty());
    assert_eq!(outcome.pages_skipped, vec![1, 2, 3]);
    assert_eq!(harness.driver.illustrate_calls(), calls_after_first);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_exhaust_the_attempt_ceiling() {
    let harness = harness(&book_toml(5));
    for _ in 0..4 {
        harness.driver.queue_image(Reply::Image(PNG.to_vec()));
    }
    for _ in 0..3 {
        harness.driver.queue_image(Reply::Status(503));
    }

    let err = harness.orchestrator.run().await.unwrap_err();
    assert!(matches!(
        err.kind(),
        CaldecottErrorKind::Gemini(gemini)
            if matches!(gemini.kind, GeminiErrorKind::HttpError { status_code: 503, .. })
    ));

    // Pages before the failure stay checkpointed; the failed page does not.
    let checkpoint = harness.checkpoint().await;
    assert_eq!(checkpoint.completed_pages(), vec![1, 2, 3, 4]);
    assert!(checkpoint.page(5).is_none());

    // The failure note names the page and carries the error.
    assert!(checkpoint.last_failure(5).unwrap().contains("503"));

    // Page 5 burned exactly its attempt ceiling.
    assert_eq!(harness.driver.illustrate_calls(), 7);
}

#[tokio::test(start_paused = true)]
async fn imageless_replies_are_retried() {
    let harness = harness(&book_toml(1));
    harness.driver.queue_image(Reply::TextOnly);

    harness.orchestrator.run().await.unwrap();

    // The empty reply consumed one attempt; the retry delivered the image.
    assert_eq!(harness.driver.illustrate_calls(), 2);
    assert!(harness.checkpoint().await.is_page_complete(1));
}

#[tokio::test]
async fn regenerate_rebuilds_only_the_listed_pages() {
    let harness = harness(&book_toml(3));
    harness.orchestrator.run().await.unwrap();
    let before = harness.checkpoint().await;

    harness.driver.queue_image(Reply::Image(vec![1, 2, 3, 4]));
    let outcome = harness.orchestrator.regenerate(&[2]).await.unwrap();
    assert_eq!(outcome.pages_generated, vec![2]);

    let after = harness.checkpoint().await;
    assert_ne!(
        after.page(2).unwrap().pristine.content_hash,
        before.page(2).unwrap().pristine.content_hash
    );
    assert_eq!(
        after.page(1).unwrap().pristine.content_hash,
        before.page(1).unwrap().pristine.content_hash
    );
    assert_eq!(
        after.page(3).unwrap().pristine.content_hash,
        before.page(3).unwrap().pristine.content_hash
    );

    // The rebuild still anchored on a page that stayed complete.
    assert_eq!(harness.driver.references().last(), Some(&true));
}

#[tokio::test]
async fn regenerate_rejects_pages_outside_the_book() {
    let harness = harness(&book_toml(3));

    let err = harness.orchestrator.regenerate(&[7]).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        CaldecottErrorKind::Book(book)
            if matches!(book.kind, BookErrorKind::PageOutOfRange { page: 7, .. })
    ));
    assert_eq!(harness.driver.illustrate_calls(), 0);
}

#[tokio::test]
async fn run_generates_cover_after_pages() {
    let harness = harness(&cover_book_toml(2));

    let outcome = harness.orchestrator.run().await.unwrap();

    assert!(outcome.cover_generated);
    let checkpoint = harness.checkpoint().await;
    let cover = checkpoint.cover().unwrap();
    assert_eq!(cover.pristine.kind, ArtifactKind::Cover);
    assert!(cover.composite.is_none());

    // Two pages plus the cover, which anchors on page 1's artwork.
    assert_eq!(harness.driver.illustrate_calls(), 3);
    assert_eq!(harness.driver.references(), vec![false, true, true]);
}

#[tokio::test]
async fn rerun_keeps_the_existing_cover() {
    let harness = harness(&cover_book_toml(2));
    harness.orchestrator.run().await.unwrap();
    let calls_after_first = harness.driver.illustrate_calls();

    let outcome = harness.orchestrator.run().await.unwrap();

    assert!(!outcome.cover_generated);
    assert_eq!(harness.driver.illustrate_calls(), calls_after_first);
}

#[tokio::test]
async fn cover_requires_its_style_anchor_page() {
    let harness = harness(&cover_book_toml(2));

    let err = harness.orchestrator.generate_cover().await.unwrap_err();
    assert!(matches!(
        err.kind(),
        CaldecottErrorKind::Checkpoint(checkpoint)
            if matches!(checkpoint.kind, CheckpointErrorKind::PageNotRecorded(1))
    ));
}

#[tokio::test]
async fn apply_text_composites_completed_pages() {
    let harness = harness(&cover_book_toml(2));
    harness.orchestrator.run().await.unwrap();

    let targets = harness
        .orchestrator
        .apply_text(&harness.plan_renderer(), OverlaySelection::Completed)
        .await
        .unwrap();

    assert_eq!(
        targets,
        vec![
            OverlayTarget::Page(1),
            OverlayTarget::Page(2),
            OverlayTarget::Cover
        ]
    );

    let checkpoint = harness.checkpoint().await;
    assert!(checkpoint.page(1).unwrap().composite.is_some());
    assert!(checkpoint.page(2).unwrap().composite.is_some());
    assert!(checkpoint.cover().unwrap().composite.is_some());

    // Pristine artifacts survive the pass untouched.
    assert_eq!(
        checkpoint.page(1).unwrap().pristine.kind,
        ArtifactKind::Illustration
    );
}

#[tokio::test]
async fn apply_text_requires_a_recorded_page() {
    let harness = harness(&book_toml(2));

    let err = harness
        .orchestrator
        .apply_text(&harness.plan_renderer(), OverlaySelection::Page(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        CaldecottErrorKind::Checkpoint(checkpoint)
            if matches!(checkpoint.kind, CheckpointErrorKind::PageNotRecorded(1))
    ));
}

#[tokio::test]
async fn backup_prompt_covers_one_validation_failure() {
    let harness = harness(&book_toml(1));
    harness.driver.queue_text("hmm");
    harness.driver.queue_text(STORY);

    harness.orchestrator.run().await.unwrap();

    // The rejected draft cost one extra text call.
    assert_eq!(harness.driver.text_calls(), 2);
    assert_eq!(harness.checkpoint().await.page(1).unwrap().text, STORY_TEXT);
}

#[tokio::test]
async fn two_validation_failures_go_fatal() {
    let harness = harness(&book_toml(1));
    harness.driver.queue_text("hmm");
    harness.driver.queue_text("hmm");

    let err = harness.orchestrator.run().await.unwrap_err();
    assert!(matches!(
        err.kind(),
        CaldecottErrorKind::Scene(scene)
            if matches!(scene.kind, SceneErrorKind::StoryValidation { page: 1, .. })
    ));

    // The page never reached the illustration call or the checkpoint,
    // but its failure is on record for the next run.
    assert_eq!(harness.driver.illustrate_calls(), 0);
    let checkpoint = harness.checkpoint().await;
    assert!(checkpoint.page(1).is_none());
    assert!(checkpoint.last_failure(1).is_some());
}
