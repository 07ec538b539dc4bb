use super::ImageGenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted image generator. Responses cycle in order; with none configured
/// every call succeeds with a numbered placeholder URL.
#[derive(Clone)]
pub struct MockImageGenerationClient {
    responses: Arc<Mutex<Vec<std::result::Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_image_url(self, url: String) -> Self {
        self.responses.lock().unwrap().push(Ok(url));
        self
    }

    /// Fail with [`Error::AiProvider`] carrying `message`.
    pub fn with_error(self, message: String) -> Self {
        self.responses.lock().unwrap().push(Err(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.prompts.lock().unwrap().push(prompt.to_string());

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(format!("https://mock-images.example.com/{}.png", *count))
        } else {
            let index = (*count - 1) % responses.len();
            responses[index].clone().map_err(Error::AiProvider)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_urls_are_numbered() {
        let client = MockImageGenerationClient::new();
        assert_eq!(
            client.generate_image("a").await.unwrap(),
            "https://mock-images.example.com/1.png"
        );
        assert_eq!(
            client.generate_image("b").await.unwrap(),
            "https://mock-images.example.com/2.png"
        );
        assert_eq!(client.get_prompts(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_mock_scripted_responses_cycle() {
        let client = MockImageGenerationClient::new()
            .with_image_url("https://img/1".to_string())
            .with_error("boom".to_string());

        assert_eq!(client.generate_image("p").await.unwrap(), "https://img/1");
        let err = client.generate_image("p").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(ref m) if m == "boom"));
        assert_eq!(client.generate_image("p").await.unwrap(), "https://img/1");
        assert_eq!(client.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_clone_shares_call_count() {
        let client = MockImageGenerationClient::new();
        let probe = client.clone();
        client.generate_image("p").await.unwrap();
        assert_eq!(probe.get_call_count(), 1);
    }
}
