use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::ImageGenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiImageClient {
    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(&self, prompt: &str) -> ImageGenerationRequest {
        let dall_e = self.model.starts_with("dall-e");
        ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: "1024x1024".to_string(),
            quality: if dall_e { "standard" } else { "auto" }.to_string(),
            style: dall_e.then(|| "natural".to_string()),
            response_format: dall_e.then(|| "url".to_string()),
        }
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Image prompt: {}", prompt);
        let request = self.build_request(prompt);

        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &request).await?;

        let image_data = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::AiProvider("No image data in OpenAI response".to_string()))?;

        if let Some(url) = image_data.url {
            Ok(url)
        } else if let Some(b64_json) = image_data.b64_json {
            STANDARD.decode(&b64_json).map_err(|e| {
                Error::AiProvider(format!("Invalid base64 image data in response: {}", e))
            })?;
            Ok(format!("data:image/png;base64,{}", b64_json))
        } else {
            Err(Error::AiProvider(
                "No image data (neither URL nor base64) in response".to_string(),
            ))
        }
    }
}
