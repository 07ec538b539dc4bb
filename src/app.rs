//! Request orchestration: validate, consult the cache, generate on a miss,
//! and write the result back.

use crate::ai::{
    FailureClassifier, ImageGenerationService, OpenAiImageClient, SafetySystemClassifier,
    UpstreamFailure,
};
use crate::cache::{ImageCache, InMemoryCache, MongoCache};
use crate::config::{CacheBackend, Config};
use crate::models::{CacheKey, GenerationRequest, GenerationResult, ServiceFailure};
use crate::{prompts, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Serves generation and lookup requests against an injected cache and
/// image generator. Holds no per-request state.
pub struct App {
    cache: Arc<dyn ImageCache>,
    image_gen: Option<Arc<dyn ImageGenerationService>>,
    classifier: Arc<dyn FailureClassifier>,
}

/// Injectable service bundle used to construct [`App`].
pub struct AppServices {
    pub cache: Arc<dyn ImageCache>,
    /// `None` when no upstream credential is configured; generation requests
    /// then fail with a configuration error instead of failing startup.
    pub image_gen: Option<Arc<dyn ImageGenerationService>>,
    pub classifier: Arc<dyn FailureClassifier>,
}

impl AppServices {
    pub fn new(
        cache: Arc<dyn ImageCache>,
        image_gen: Option<Arc<dyn ImageGenerationService>>,
    ) -> Self {
        Self {
            cache,
            image_gen,
            classifier: Arc::new(SafetySystemClassifier),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.classifier = classifier;
        self
    }
}

/// Open the configured cache backend. Fails if MongoDB is unreachable.
pub async fn open_cache(config: &Config) -> Result<Arc<dyn ImageCache>> {
    let cache: Arc<dyn ImageCache> = match config.cache_backend {
        CacheBackend::MongoDb => Arc::new(MongoCache::connect(&config.mongodb).await?),
        CacheBackend::Memory => {
            warn!("Using in-memory cache; entries are lost on restart");
            Arc::new(InMemoryCache::new())
        }
    };
    info!("Cache backend: {}", cache.backend_name());
    Ok(cache)
}

/// Build the OpenAI image client, or `None` when no API key is configured.
pub fn image_client(config: &Config) -> Result<Option<Arc<dyn ImageGenerationService>>> {
    let Some(api_key) = config.openai_api_key.clone() else {
        warn!("OPENAI_API_KEY not set; image generation requests will fail");
        return Ok(None);
    };

    let http_client = reqwest::Client::builder()
        .timeout(config.openai_timeout)
        .build()?;
    info!("Image provider: OpenAI (model: {})", config.openai_image_model);

    let client = OpenAiImageClient::new_with_client(
        api_key,
        config.openai_image_model.clone(),
        http_client,
    )
    .with_base_url(config.openai_base_url.clone());
    Ok(Some(Arc::new(client)))
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// Tests use this to inject mocks.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            cache: services.cache,
            image_gen: services.image_gen,
            classifier: services.classifier,
        }
    }

    /// Construct an app from environment configuration, connecting to the
    /// configured cache.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let cache = open_cache(config).await?;
        let image_gen = image_client(config)?;
        Ok(Self::with_services(AppServices::new(cache, image_gen)))
    }

    pub fn cache(&self) -> &Arc<dyn ImageCache> {
        &self.cache
    }

    /// Return the cached image for the request, generating and caching one
    /// on a miss.
    pub async fn generate(&self, request: GenerationRequest) -> GenerationResult {
        info!(
            "Generating image for word: {} ({})",
            request.word, request.part_of_speech
        );
        let key = request.into_key().map_err(|failure| {
            warn!("Invalid generation request: {}", failure.message);
            failure
        })?;

        if let Some(image_url) = self.cached(&key).await? {
            info!("Serving cached image for word: {}", key.word);
            return Ok(image_url);
        }

        let image_gen = self.image_gen.as_ref().ok_or_else(|| {
            error!("OpenAI API key not configured");
            ServiceFailure::not_configured()
        })?;

        let prompt = prompts::sketch_prompt(&key);
        debug!("Image prompt: {}", prompt);

        let image_url = match image_gen.generate_image(&prompt).await {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to generate image: {}", e);
                return Err(match self.classifier.classify(&e) {
                    UpstreamFailure::ContentPolicy => {
                        warn!("Content policy violation for word: {}", key.word);
                        ServiceFailure::content_policy()
                    }
                    UpstreamFailure::Other => ServiceFailure::generator_failure(),
                });
            }
        };
        info!("Successfully generated image for word: {}", key.word);

        // Write-through is best effort; the caller still gets the image.
        if let Err(e) = self.cache.set(&key, &image_url).await {
            error!("Failed to cache image: {}", e);
        }

        Ok(image_url)
    }

    /// Return the cached image for the request without generating.
    pub async fn lookup(&self, request: GenerationRequest) -> GenerationResult {
        debug!(
            "Cache lookup request - Word: {}, PartOfSpeech: {}",
            request.word, request.part_of_speech
        );
        let key = request.into_key().map_err(|failure| {
            warn!("Invalid cache request: {}", failure.message);
            failure
        })?;

        self.cached(&key)
            .await?
            .ok_or_else(ServiceFailure::not_found)
    }

    async fn cached(
        &self,
        key: &CacheKey,
    ) -> std::result::Result<Option<String>, ServiceFailure> {
        match self.cache.get(key).await {
            Ok(entry) => Ok(entry.map(|entry| entry.image_reference)),
            Err(e) => {
                error!("Failed to retrieve from cache: {}", e);
                Err(ServiceFailure::cache_unavailable())
            }
        }
    }
}
