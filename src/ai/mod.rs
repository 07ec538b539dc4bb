//! Remote image generation
//!
//! Wraps the OpenAI Images API behind a service trait and classifies its
//! failures so request handlers can map them to user-facing responses.

pub mod classifier;
pub mod mock;
pub mod openai;

pub use classifier::{FailureClassifier, SafetySystemClassifier, UpstreamFailure};
pub use mock::MockImageGenerationClient;
pub use openai::OpenAiImageClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generate one image for `prompt`, returning its URL or other locator.
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}
