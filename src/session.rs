//! GenerationSession - the caller-owned context that ties the credential
//! store to the Gemini client.
//!
//! The session reads the API key on every call and keeps the last client it
//! built, reusing it while the stored key is unchanged.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::credentials::{CredentialError, CredentialStore};
use crate::gemini::{
    build_edit_request, build_video_request, parse_edit_response, poll_until_done,
    resolve_completed, EditedImage, GeminiClient, GenerationError, GenerationOutput,
    GenerationRequest, ImageEditRequest, PollPolicy, SignedVideoUrl, VideoRequest,
    DEFAULT_IMAGE_MODEL, DEFAULT_TIMEOUT, DEFAULT_VIDEO_MODEL, GEMINI_API_BASE_URL,
};

/// Progress message reported when a video job is being submitted.
pub const PROGRESS_INITIALIZING: &str = "Initializing video generation...";

/// Progress message reported once the video job is running.
pub const PROGRESS_POLLING: &str = "Polling for results, this may take a few minutes...";

/// Builds a client bound to an API key.
pub trait ClientFactory: Send + Sync {
    fn build(&self, api_key: &str) -> Result<GeminiClient, GenerationError>;
}

/// Factory for real HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    base_url: String,
    timeout: Duration,
}

impl HttpClientFactory {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self { base_url, timeout }
    }
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::new(GEMINI_API_BASE_URL.to_string(), DEFAULT_TIMEOUT)
    }
}

impl ClientFactory for HttpClientFactory {
    fn build(&self, api_key: &str) -> Result<GeminiClient, GenerationError> {
        GeminiClient::with_options(api_key.to_string(), self.base_url.clone(), self.timeout)
    }
}

/// The client built for a specific API key.
struct BoundClient {
    api_key: String,
    client: Arc<GeminiClient>,
}

/// Runs image edits and video generations with the stored API key.
pub struct GenerationSession<F: ClientFactory = HttpClientFactory> {
    store: CredentialStore,
    factory: F,
    image_model: String,
    video_model: String,
    poll_policy: PollPolicy,
    cached: Mutex<Option<BoundClient>>,
}

impl GenerationSession<HttpClientFactory> {
    /// Build a session from configuration.
    pub fn from_config(config: &Config) -> Result<Self, CredentialError> {
        let store = CredentialStore::from_config(&config.credentials)?;
        let factory = HttpClientFactory::new(
            config.api.base_url.clone(),
            Duration::from_secs(config.api.timeout_secs),
        );
        Ok(GenerationSession::new(store, factory)
            .with_models(&config.api.image_model, &config.api.video_model)
            .with_poll_policy(config.polling.to_policy()))
    }
}

impl<F: ClientFactory> GenerationSession<F> {
    pub fn new(store: CredentialStore, factory: F) -> Self {
        Self {
            store,
            factory,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            poll_policy: PollPolicy::default(),
            cached: Mutex::new(None),
        }
    }

    pub fn with_models(mut self, image_model: &str, video_model: &str) -> Self {
        self.image_model = image_model.to_string();
        self.video_model = video_model.to_string();
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll_policy
    }

    /// Resolve the stored key and return a client bound to it, reusing the
    /// cached client when the key is unchanged.
    fn client(&self) -> Result<(Arc<GeminiClient>, String), GenerationError> {
        let api_key = self
            .store
            .get()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerationError::MissingCredential)?;

        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bound) = cached.as_ref() {
            if bound.api_key == api_key {
                return Ok((bound.client.clone(), api_key));
            }
        }

        log::debug!("Building Gemini client for updated API key");
        let client = Arc::new(self.factory.build(&api_key)?);
        *cached = Some(BoundClient {
            api_key: api_key.clone(),
            client: client.clone(),
        });
        Ok((client, api_key))
    }

    /// Edit an image following a text instruction.
    ///
    /// # Errors
    ///
    /// Fails with `MissingCredential` before any request when no key is
    /// stored. All other failures are normalized for display.
    pub async fn edit_image(
        &self,
        request: ImageEditRequest,
    ) -> Result<EditedImage, GenerationError> {
        self.run_edit(request).await.map_err(|e| {
            log::error!("Error calling Gemini API: {}", e);
            e.normalize_for_image()
        })
    }

    async fn run_edit(&self, request: ImageEditRequest) -> Result<EditedImage, GenerationError> {
        let (client, _) = self.client()?;
        let body = build_edit_request(&request);

        log::info!(
            "Editing image with {} (mask: {}, secondary: {})",
            self.image_model,
            request.mask.is_some(),
            request.secondary.is_some()
        );
        let response = client.generate_content(&self.image_model, &body).await?;
        parse_edit_response(&response)
    }

    /// Generate a video and return its signed URL.
    ///
    /// `progress` receives human-readable status lines. Submission and
    /// polling stop with `Cancelled` as soon as `cancel` fires.
    pub async fn generate_video(
        &self,
        request: VideoRequest,
        mut progress: impl FnMut(&str),
        cancel: &CancellationToken,
    ) -> Result<SignedVideoUrl, GenerationError> {
        self.run_video(request, &mut progress, cancel)
            .await
            .map_err(|e| {
                log::error!("Error calling Video Generation API: {}", e);
                e.normalize_for_video()
            })
    }

    async fn run_video(
        &self,
        request: VideoRequest,
        progress: &mut dyn FnMut(&str),
        cancel: &CancellationToken,
    ) -> Result<SignedVideoUrl, GenerationError> {
        progress(PROGRESS_INITIALIZING);

        let (client, api_key) = self.client()?;
        let body = build_video_request(&request);

        log::info!(
            "Submitting video generation to {} ({}, seed image: {})",
            self.video_model,
            request.aspect_ratio,
            request.image.is_some()
        );
        let operation = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Video generation cancelled before submission finished");
                return Err(GenerationError::Cancelled);
            }
            submitted = client.generate_videos(&self.video_model, &body) => submitted?,
        };
        log::info!("Video generation submitted, operation: {}", operation.name);

        progress(PROGRESS_POLLING);

        let fetcher = client.clone();
        let operation = poll_until_done(operation, &self.poll_policy, cancel, |name| {
            let client = fetcher.clone();
            async move { client.get_operation(&name).await }
        })
        .await?;

        resolve_completed(&operation, &api_key)
    }

    /// Download a generated video to `dest`.
    ///
    /// Stops with `Cancelled` as soon as `cancel` fires, removing the
    /// partially written file.
    pub async fn download_video(
        &self,
        url: &SignedVideoUrl,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, GenerationError> {
        let (client, _) = self.client()?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Download to {} cancelled", dest.display());
                if let Err(e) = tokio::fs::remove_file(dest).await {
                    log::debug!("No partial download to remove at {}: {}", dest.display(), e);
                }
                Err(GenerationError::Cancelled)
            }
            downloaded = client.download_video(url, dest) => downloaded,
        }
    }

    /// Run either kind of request.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        progress: impl FnMut(&str),
        cancel: &CancellationToken,
    ) -> Result<GenerationOutput, GenerationError> {
        match request {
            GenerationRequest::ImageEdit(edit) => {
                self.edit_image(edit).await.map(GenerationOutput::Image)
            }
            GenerationRequest::Video(video) => self
                .generate_video(video, progress, cancel)
                .await
                .map(GenerationOutput::Video),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFactory {
        builds: Arc<AtomicUsize>,
    }

    impl ClientFactory for CountingFactory {
        fn build(&self, api_key: &str) -> Result<GeminiClient, GenerationError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            GeminiClient::with_base_url(api_key.to_string(), "http://localhost:9".to_string())
        }
    }

    fn session() -> (GenerationSession<CountingFactory>, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        let session = GenerationSession::new(
            CredentialStore::in_memory(),
            CountingFactory {
                builds: builds.clone(),
            },
        );
        (session, builds)
    }

    #[test]
    fn test_client_is_reused_for_same_key() {
        let (session, builds) = session();
        session.store().set("key-1").unwrap();

        let (first, _) = session.client().unwrap();
        let (second, _) = session.client().unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_client_is_rebuilt_when_key_changes() {
        let (session, builds) = session();
        session.store().set("key-1").unwrap();
        let (first, _) = session.client().unwrap();

        session.store().set("key-2").unwrap();
        let (second, key) = session.client().unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(key, "key-2");
        assert_eq!(second.api_key(), "key-2");

        session.store().set("key-1").unwrap();
        session.client().unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 3, "cache holds only the last key");
    }

    #[test]
    fn test_missing_key_builds_nothing() {
        let (session, builds) = session();
        assert!(matches!(
            session.client(),
            Err(GenerationError::MissingCredential)
        ));

        session.store().set("   ").unwrap();
        assert!(matches!(
            session.client(),
            Err(GenerationError::MissingCredential)
        ));
        assert_eq!(builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_video_without_key_reports_initializing_then_fails() {
        let (session, _) = session();
        let mut messages = Vec::new();
        let err = session
            .generate_video(
                VideoRequest::new("clouds", crate::gemini::AspectRatio::Landscape),
                |m| messages.push(m.to_string()),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(err.is_missing_credential());
        assert_eq!(messages, vec![PROGRESS_INITIALIZING.to_string()]);
    }

    #[test]
    fn test_from_config_applies_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_toml(&format!(
            "[credentials]\nbackend = \"browser\"\nstore_dir = {:?}\n\n[polling]\ninterval_secs = 3\n",
            dir.path().display().to_string()
        ))
        .unwrap();

        let session = GenerationSession::from_config(&config).unwrap();
        assert_eq!(session.poll_policy().interval, Duration::from_secs(3));
        assert!(!session.store().has());
    }
}
