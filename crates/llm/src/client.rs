use async_trait::async_trait;
use pptmaker_common::{PptMakerError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::llm_trait::{ProviderClient, ProviderKind};
use crate::types::{EmbedRequest, EmbedResponse, GenerateOptions, GenerateRequest, GenerateResponse, TagsResponse};

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
    probe_timeout: Duration,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(base_url: impl Into<String>, request_timeout: Duration, probe_timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PptMakerError::provider(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {}", base_url);
        Ok(Self {
            base_url,
            client,
            probe_timeout,
        })
    }

    /// Client with the default 5 minute request timeout
    pub fn with_defaults(base_url: impl Into<String>) -> Result<Self> {
        Self::new(base_url, Duration::from_secs(300), Duration::from_secs(3))
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: serde::Serialize + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PptMakerError::provider(format!("Failed to send request to {}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| PptMakerError::provider(format!("Ollama API error: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| PptMakerError::provider(format!("Failed to parse Ollama response: {}", e)))
    }
}

#[async_trait]
impl ProviderClient for OllamaClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(self.probe_timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Ollama health check failed at {}: {}", url, e);
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let tags: TagsResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PptMakerError::provider(format!("Failed to connect to Ollama: {}", e)))?
            .error_for_status()
            .map_err(|e| PptMakerError::provider(format!("Ollama API error: {}", e)))?
            .json()
            .await
            .map_err(|e| PptMakerError::provider(format!("Failed to parse model list: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate_text(&self, prompt: &str, model: &str, options: &GenerateOptions) -> Result<String> {
        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            model,
            prompt.len()
        );

        let request = GenerateRequest::new(model, prompt, options);
        let result: GenerateResponse = self.post_json("/api/generate", &request).await?;

        if result.response.trim().is_empty() {
            return Err(PptMakerError::provider("Empty response from Ollama"));
        }

        debug!("Received response from Ollama - Length: {}", result.response.len());
        Ok(result.response)
    }

    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding - Model: {}, Text length: {}", model, text.len());

        let request = EmbedRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };
        let result: EmbedResponse = self.post_json("/api/embeddings", &request).await?;

        if result.embedding.is_empty() {
            return Err(PptMakerError::provider("Empty embedding from Ollama"));
        }

        Ok(result.embedding)
    }
}
