//! crates/storybook_core/src/workflow.rs
//!
//! The storybook generation workflow: health probe, story text, per-chapter
//! illustrations and assembly, with an offline fallback when the backend is
//! unreachable.

use crate::chapters::split_into_chapters;
use crate::domain::{GenerationRequest, Story};
use crate::mock::mock_story;
use crate::ports::{
    GeneratedIllustration, GeneratedStory, IllustrationRequest, PortError, PortResult,
    StoryBackend, StoryTextRequest,
};
use crate::progress::{
    illustration_percent, ProgressObserver, ProgressReporter, CHECKING_BACKEND, COMPLETE,
    ILLUSTRATING, STARTED, STORY_RECEIVED, WRITING_STORY,
};
use futures::{stream, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Longest slice of chapter text quoted in an illustration prompt.
const MAX_SCENE_CHARS: usize = 400;

//=========================================================================================
// Options
//=========================================================================================

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Upper bound on the health probe before the offline story is used.
    pub health_timeout: Duration,
    /// Illustrations in flight at once. 1 means strictly sequential.
    pub illustration_concurrency: usize,
    /// Requests made per illustration before the chapter is left without one.
    pub illustration_attempts: u32,
    pub target_age: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            health_timeout: Duration::from_secs(3),
            illustration_concurrency: 1,
            illustration_attempts: 1,
            target_age: "children".to_string(),
        }
    }
}

//=========================================================================================
// Free Helpers
//=========================================================================================

/// Rejects requests missing a character name, theme or art style.
pub fn validate(request: &GenerationRequest) -> PortResult<()> {
    let missing: Vec<&str> = [
        ("character name", &request.character_name),
        ("theme", &request.theme),
        ("art style", &request.art_style),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PortError::Validation(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )))
    }
}

/// Builds the illustration prompt for one chapter.
pub fn illustration_prompt(character_name: &str, chapter_text: &str, art_style: &str) -> String {
    let scene: String = chapter_text.chars().take(MAX_SCENE_CHARS).collect();
    format!(
        "A {} style children's storybook illustration featuring {}. Scene: {}",
        art_style.trim().replace('-', " "),
        character_name.trim(),
        scene
    )
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> PortResult<()> {
    if cancel.is_cancelled() {
        info!("Generation cancelled.");
        Err(PortError::Cancelled)
    } else {
        Ok(())
    }
}

//=========================================================================================
// The Generator
//=========================================================================================

/// Turns a [`GenerationRequest`] into a complete [`Story`].
#[derive(Clone)]
pub struct StoryGenerator {
    backend: Arc<dyn StoryBackend>,
    options: GenerationOptions,
}

impl StoryGenerator {
    pub fn new(backend: Arc<dyn StoryBackend>, options: GenerationOptions) -> Self {
        Self { backend, options }
    }

    /// Runs the workflow to completion.
    ///
    /// Backend unreachability is not an error: the offline story is returned.
    /// A failed story-text request aborts the run; failed illustrations are
    /// recorded on their chapters.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        observer: &dyn ProgressObserver,
    ) -> PortResult<Story> {
        self.generate_with_cancel(request, observer, &CancellationToken::new())
            .await
    }

    /// Like [`generate`](Self::generate), checking `cancel` between steps.
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> PortResult<Story> {
        validate(request)?;

        let progress = ProgressReporter::new(observer);
        progress.report(STARTED, "Starting your story");
        ensure_not_cancelled(cancel)?;

        progress.report(CHECKING_BACKEND, "Checking the story server");
        if !self.backend_reachable().await {
            warn!("Story server unreachable, creating an offline story.");
            let story = mock_story(request);
            progress.report(COMPLETE, "Story server unavailable, created an offline story");
            return Ok(story);
        }
        ensure_not_cancelled(cancel)?;

        progress.report(WRITING_STORY, "Writing the story");
        let generated = self
            .backend
            .generate_story(&self.text_request(request))
            .await?;
        info!(title = %generated.title, "Story text generated.");
        progress.report(STORY_RECEIVED, "Story written, preparing chapters");

        let mut story = self.assemble(request, generated)?;
        ensure_not_cancelled(cancel)?;

        progress.report(
            ILLUSTRATING,
            format!("Illustrating {} chapters", story.chapters.len()),
        );
        self.illustrate(request, &mut story, &progress, cancel)
            .await?;

        info!(
            story_id = %story.id,
            chapters = story.chapters.len(),
            illustrated = story.illustrated_chapters(),
            "Story generation complete."
        );
        progress.report(COMPLETE, "Your story is ready");
        Ok(story)
    }

    async fn backend_reachable(&self) -> bool {
        match tokio::time::timeout(self.options.health_timeout, self.backend.health_check()).await
        {
            Ok(reachable) => reachable,
            Err(_) => {
                warn!(
                    timeout_ms = self.options.health_timeout.as_millis() as u64,
                    "Health probe timed out."
                );
                false
            }
        }
    }

    fn text_request(&self, request: &GenerationRequest) -> StoryTextRequest {
        StoryTextRequest {
            theme: request.theme.clone(),
            art_style: request.art_style.clone(),
            character_name: request.character_name.trim().to_string(),
            character_age: request.character_age,
            character_gender: request.character_gender,
            target_age: self.options.target_age.clone(),
        }
    }

    fn assemble(&self, request: &GenerationRequest, generated: GeneratedStory) -> PortResult<Story> {
        let chapters = split_into_chapters(&generated.content);
        if chapters.is_empty() {
            return Err(PortError::Parse(
                "generated story contains no sentences".to_string(),
            ));
        }

        let id = generated
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let title = if generated.title.trim().is_empty() {
            format!("{}'s Story", request.character_name.trim())
        } else {
            generated.title.trim().to_string()
        };

        Ok(Story {
            id,
            title,
            theme: request.theme.clone(),
            art_style: request.art_style.clone(),
            character_name: request.character_name.trim().to_string(),
            character_age: request.character_age,
            character_gender: request.character_gender,
            chapters,
        })
    }

    /// Lazily yields `(chapter_index, result)` pairs in chapter order.
    ///
    /// At most `illustration_concurrency` requests are in flight; results are
    /// still yielded in the order the requests were given.
    pub fn illustration_results(
        &self,
        requests: Vec<IllustrationRequest>,
    ) -> impl Stream<Item = (usize, PortResult<GeneratedIllustration>)> + '_ {
        let attempts = self.options.illustration_attempts.max(1);
        stream::iter(requests.into_iter().enumerate())
            .map(move |(index, request)| async move {
                (index, self.request_illustration(&request, attempts).await)
            })
            .buffered(self.options.illustration_concurrency.max(1))
    }

    async fn request_illustration(
        &self,
        request: &IllustrationRequest,
        attempts: u32,
    ) -> PortResult<GeneratedIllustration> {
        let mut attempt = 1;
        loop {
            match self.backend.generate_illustration(request).await {
                Ok(illustration) => return Ok(illustration),
                Err(e) if attempt < attempts && !matches!(e, PortError::Auth(_)) => {
                    warn!(attempt, error = %e, "Illustration request failed, retrying.");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn illustrate(
        &self,
        request: &GenerationRequest,
        story: &mut Story,
        progress: &ProgressReporter<'_>,
        cancel: &CancellationToken,
    ) -> PortResult<()> {
        let total = story.chapters.len();
        let requests: Vec<IllustrationRequest> = story
            .chapters
            .iter_mut()
            .map(|chapter| {
                chapter.illustration_prompt = illustration_prompt(
                    &request.character_name,
                    &chapter.content,
                    &request.art_style,
                );
                IllustrationRequest {
                    prompt: chapter.illustration_prompt.clone(),
                    art_style: request.art_style.clone(),
                }
            })
            .collect();

        let mut results = std::pin::pin!(self.illustration_results(requests));
        let mut completed = 0;
        while let Some((index, result)) = results.next().await {
            ensure_not_cancelled(cancel)?;

            let chapter = &mut story.chapters[index];
            match result {
                Ok(illustration) => {
                    chapter.illustration_url = Some(illustration.image_url);
                    if !illustration.prompt.trim().is_empty() {
                        chapter.illustration_prompt = illustration.prompt;
                    }
                }
                Err(e) => {
                    warn!(chapter = chapter.number, error = %e, "Illustration failed, keeping chapter without one.");
                    chapter.illustration_url = None;
                    chapter.illustration_prompt = format!("Illustration unavailable: {}", e);
                }
            }

            completed += 1;
            progress.report(
                illustration_percent(completed, total),
                format!("Illustrated chapter {} of {}", completed, total),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProgressUpdate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const FIVE_SENTENCES: &str = "Mara found a door. It was blue! Behind it was a dragon. \
        The dragon was shy. They became friends.";

    struct FakeBackend {
        reachable: bool,
        health_delay: Option<Duration>,
        story: PortResult<GeneratedStory>,
        /// Illustration prompts containing this text fail.
        failing_scene: Option<String>,
        failures_before_success: AtomicUsize,
        health_calls: AtomicUsize,
        story_calls: AtomicUsize,
        illustration_calls: AtomicUsize,
    }

    impl FakeBackend {
        fn online(content: &str) -> Self {
            Self {
                reachable: true,
                health_delay: None,
                story: Ok(GeneratedStory {
                    id: Some("story-42".to_string()),
                    title: "Mara and the Shy Dragon".to_string(),
                    content: content.to_string(),
                }),
                failing_scene: None,
                failures_before_success: AtomicUsize::new(0),
                health_calls: AtomicUsize::new(0),
                story_calls: AtomicUsize::new(0),
                illustration_calls: AtomicUsize::new(0),
            }
        }

        fn offline() -> Self {
            Self {
                reachable: false,
                ..Self::online("")
            }
        }

        fn network_calls(&self) -> usize {
            self.health_calls.load(Ordering::SeqCst)
                + self.story_calls.load(Ordering::SeqCst)
                + self.illustration_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StoryBackend for FakeBackend {
        async fn health_check(&self) -> bool {
            self.health_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.health_delay {
                tokio::time::sleep(delay).await;
            }
            self.reachable
        }

        async fn generate_story(&self, _request: &StoryTextRequest) -> PortResult<GeneratedStory> {
            self.story_calls.fetch_add(1, Ordering::SeqCst);
            self.story.clone()
        }

        async fn generate_illustration(
            &self,
            request: &IllustrationRequest,
        ) -> PortResult<GeneratedIllustration> {
            let call = self.illustration_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(scene) = &self.failing_scene {
                if request.prompt.contains(scene.as_str()) {
                    return Err(PortError::Http {
                        status: 502,
                        message: "model overloaded".to_string(),
                    });
                }
            }
            let pending = self.failures_before_success.load(Ordering::SeqCst);
            if pending > 0 {
                self.failures_before_success.store(pending - 1, Ordering::SeqCst);
                return Err(PortError::Network("connection reset".to_string()));
            }
            Ok(GeneratedIllustration {
                image_url: format!("https://images.test/{}.png", call),
                prompt: String::new(),
            })
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("Mara", "fantasy", "watercolor")
    }

    fn generator(backend: Arc<FakeBackend>) -> StoryGenerator {
        StoryGenerator::new(backend, GenerationOptions::default())
    }

    fn recorder() -> (Arc<Mutex<Vec<ProgressUpdate>>>, impl Fn(&ProgressUpdate) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |update: &ProgressUpdate| {
            sink.lock().unwrap().push(update.clone())
        })
    }

    #[tokio::test]
    async fn missing_fields_fail_before_any_network_call() {
        let backend = Arc::new(FakeBackend::online(FIVE_SENTENCES));
        let generator = generator(backend.clone());
        let (_, observer) = recorder();

        for bad in [
            GenerationRequest::new("", "fantasy", "watercolor"),
            GenerationRequest::new("Mara", "  ", "watercolor"),
            GenerationRequest::new("Mara", "fantasy", ""),
        ] {
            let err = generator.generate(&bad, &observer).await.unwrap_err();
            assert!(matches!(err, PortError::Validation(_)), "got {:?}", err);
        }
        assert_eq!(backend.network_calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_backend_yields_offline_story() {
        let backend = Arc::new(FakeBackend::offline());
        let generator = generator(backend.clone());
        let (seen, observer) = recorder();

        let story = generator.generate(&request(), &observer).await.unwrap();

        assert!(story.title.contains("Mara"));
        assert!(story.title.contains("Fantasy"));
        assert!((1..=5).contains(&story.chapters.len()));
        assert_eq!(story.illustrated_chapters(), 0);
        assert_eq!(backend.story_calls.load(Ordering::SeqCst), 0);
        assert_eq!(seen.lock().unwrap().last().map(|u| u.percent), Some(100));
    }

    #[tokio::test]
    async fn slow_health_probe_selects_offline_path() {
        let mut backend = FakeBackend::online(FIVE_SENTENCES);
        backend.health_delay = Some(Duration::from_secs(5));
        let backend = Arc::new(backend);
        let options = GenerationOptions {
            health_timeout: Duration::from_millis(20),
            ..GenerationOptions::default()
        };
        let generator = StoryGenerator::new(backend.clone(), options);
        let (_, observer) = recorder();

        let story = generator.generate(&request(), &observer).await.unwrap();

        assert!(story.id.starts_with("offline-"));
        assert_eq!(backend.story_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn online_run_illustrates_every_chapter() {
        let backend = Arc::new(FakeBackend::online(FIVE_SENTENCES));
        let generator = generator(backend.clone());
        let (seen, observer) = recorder();

        let story = generator.generate(&request(), &observer).await.unwrap();

        assert_eq!(story.id, "story-42");
        assert_eq!(story.title, "Mara and the Shy Dragon");
        assert_eq!(story.chapters.len(), 5);
        assert_eq!(story.illustrated_chapters(), 5);
        assert_eq!(backend.illustration_calls.load(Ordering::SeqCst), 5);
        assert!(story.chapters[0].illustration_prompt.contains("watercolor"));
        assert!(story.chapters[0].illustration_prompt.contains("Mara found a door."));

        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|u| u.percent).collect();
        assert_eq!(percents, vec![0, 10, 20, 40, 60, 64, 68, 72, 76, 80, 100]);
    }

    #[tokio::test]
    async fn failed_illustration_keeps_its_chapter() {
        let mut backend = FakeBackend::online(FIVE_SENTENCES);
        backend.failing_scene = Some("Behind it was a dragon.".to_string());
        let backend = Arc::new(backend);
        let generator = generator(backend.clone());
        let (seen, observer) = recorder();

        let story = generator.generate(&request(), &observer).await.unwrap();

        let numbers: Vec<u32> = story.chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        for chapter in &story.chapters {
            if chapter.number == 3 {
                assert!(chapter.illustration_url.is_none());
                assert!(chapter.illustration_prompt.starts_with("Illustration unavailable"));
                assert!(chapter.illustration_prompt.contains("model overloaded"));
            } else {
                assert!(chapter.illustration_url.is_some());
            }
        }

        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|u| u.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    #[tokio::test]
    async fn story_generation_failure_is_fatal() {
        let mut backend = FakeBackend::online(FIVE_SENTENCES);
        backend.story = Err(PortError::Http {
            status: 500,
            message: "OpenAI quota exceeded".to_string(),
        });
        let backend = Arc::new(backend);
        let generator = generator(backend.clone());
        let (_, observer) = recorder();

        let err = generator.generate(&request(), &observer).await.unwrap_err();

        assert_eq!(err.to_string(), "OpenAI quota exceeded");
        assert_eq!(backend.story_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.illustration_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn long_story_is_capped_at_five_chapters() {
        let text = format!("{} One more. And another.", FIVE_SENTENCES);
        let backend = Arc::new(FakeBackend::online(&text));
        let generator = generator(backend.clone());
        let (_, observer) = recorder();

        let story = generator.generate(&request(), &observer).await.unwrap();

        assert_eq!(story.chapters.len(), 5);
        assert_eq!(backend.illustration_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn concurrent_illustrations_preserve_chapter_order() {
        let mut backend = FakeBackend::online(FIVE_SENTENCES);
        backend.failing_scene = Some("It was blue!".to_string());
        let backend = Arc::new(backend);
        let options = GenerationOptions {
            illustration_concurrency: 3,
            ..GenerationOptions::default()
        };
        let generator = StoryGenerator::new(backend, options);
        let (seen, observer) = recorder();

        let story = generator.generate(&request(), &observer).await.unwrap();

        assert_eq!(story.chapters[1].content, "It was blue!");
        assert!(story.chapters[1].illustration_url.is_none());
        assert_eq!(story.illustrated_chapters(), 4);
        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|u| u.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn retries_only_when_configured() {
        let backend = Arc::new(FakeBackend::online("Just one sentence."));
        backend.failures_before_success.store(1, Ordering::SeqCst);
        let (_, observer) = recorder();

        let story = generator(backend.clone())
            .generate(&request(), &observer)
            .await
            .unwrap();
        assert_eq!(story.illustrated_chapters(), 0);
        assert_eq!(backend.illustration_calls.load(Ordering::SeqCst), 1);

        let backend = Arc::new(FakeBackend::online("Just one sentence."));
        backend.failures_before_success.store(1, Ordering::SeqCst);
        let options = GenerationOptions {
            illustration_attempts: 2,
            ..GenerationOptions::default()
        };
        let story = StoryGenerator::new(backend.clone(), options)
            .generate(&request(), &observer)
            .await
            .unwrap();
        assert_eq!(story.illustrated_chapters(), 1);
        assert_eq!(backend.illustration_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_run_stops_before_network() {
        let backend = Arc::new(FakeBackend::online(FIVE_SENTENCES));
        let generator = generator(backend.clone());
        let (_, observer) = recorder();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = generator
            .generate_with_cancel(&request(), &observer, &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, PortError::Cancelled);
        assert_eq!(backend.network_calls(), 0);
    }

    #[tokio::test]
    async fn story_without_sentences_is_a_parse_error() {
        let backend = Arc::new(FakeBackend::online("   "));
        let (_, observer) = recorder();

        let err = generator(backend)
            .generate(&request(), &observer)
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Parse(_)));
    }
}
