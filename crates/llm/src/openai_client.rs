use async_trait::async_trait;
use pptmaker_common::{PptMakerError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::llm_trait::{ProviderClient, ProviderKind};
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, EmbeddingsRequest, EmbeddingsResponse, GenerateOptions,
    ModelsResponse,
};

/// LM Studio client speaking the OpenAI-compatible `/v1` API
#[derive(Debug, Clone)]
pub struct LmStudioClient {
    base_url: String,
    api_url: String,
    client: Client,
    probe_timeout: Duration,
}

impl LmStudioClient {
    /// Create new LM Studio client
    pub fn new(base_url: impl Into<String>, request_timeout: Duration, probe_timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let api_url = if base_url.ends_with("/v1") {
            base_url.clone()
        } else {
            format!("{}/v1", base_url)
        };

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PptMakerError::provider(format!("Failed to create HTTP client: {}", e)))?;

        info!("LM Studio client initialized: {}", api_url);
        Ok(Self {
            base_url,
            api_url,
            client,
            probe_timeout,
        })
    }

    /// Client with the default 5 minute request timeout
    pub fn with_defaults(base_url: impl Into<String>) -> Result<Self> {
        Self::new(base_url, Duration::from_secs(300), Duration::from_secs(3))
    }

    async fn post_json<Req, Resp>(&self, endpoint: &str, body: &Req) -> Result<Resp>
    where
        Req: serde::Serialize + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.api_url, endpoint);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PptMakerError::provider(format!("LM Studio request to {} timed out", url))
                } else {
                    PptMakerError::provider(format!("Failed to send request to {}: {}", url, e))
                }
            })?
            .error_for_status()
            .map_err(|e| PptMakerError::provider(format!("LM Studio API error: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| PptMakerError::provider(format!("Failed to parse LM Studio response: {}", e)))
    }
}

/// Order embedding rows by their `index` field, falling back to
/// response order when the server omits it.
pub(crate) fn ordered_embeddings(response: EmbeddingsResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(PptMakerError::provider(format!(
            "Expected {} embeddings, got {}",
            expected,
            response.data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (position, row) in response.data.into_iter().enumerate() {
        let index = row.index.unwrap_or(position);
        if index >= expected || slots[index].is_some() {
            return Err(PptMakerError::provider(format!("Invalid embedding index {}", index)));
        }
        if row.embedding.is_empty() {
            return Err(PptMakerError::provider(format!("Empty embedding at index {}", index)));
        }
        slots[index] = Some(row.embedding);
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| PptMakerError::provider("Missing embedding in response")))
        .collect()
}

#[async_trait]
impl ProviderClient for LmStudioClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LmStudio
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.api_url);
        match self.client.get(&url).timeout(self.probe_timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("LM Studio health check failed at {}: {}", url, e);
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.api_url);
        let models: ModelsResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PptMakerError::provider(format!("Failed to connect to LM Studio: {}", e)))?
            .error_for_status()
            .map_err(|e| PptMakerError::provider(format!("LM Studio API error: {}", e)))?
            .json()
            .await
            .map_err(|e| PptMakerError::provider(format!("Failed to parse model list: {}", e)))?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    async fn generate_text(&self, prompt: &str, model: &str, options: &GenerateOptions) -> Result<String> {
        debug!(
            "Sending chat completion to LM Studio - Model: {}, Prompt length: {}",
            model,
            prompt.len()
        );

        let request = ChatCompletionRequest::new(model, prompt, options);
        let response: ChatCompletionResponse = self.post_json("chat/completions", &request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.into_text())
            .ok_or_else(|| PptMakerError::provider("LM Studio response has no choices"))?;

        if content.trim().is_empty() {
            return Err(PptMakerError::provider("Empty response from LM Studio"));
        }

        Ok(content)
    }

    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text.to_string()], model).await?;
        batch
            .pop()
            .ok_or_else(|| PptMakerError::provider("No embedding data returned from LM Studio"))
    }

    async fn embed_batch(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating {} embeddings - Model: {}", texts.len(), model);
        let request = EmbeddingsRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };
        let response: EmbeddingsResponse = self.post_json("embeddings", &request).await?;
        ordered_embeddings(response, texts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = LmStudioClient::with_defaults("http://localhost:1234").unwrap();
        assert_eq!(client.api_url, "http://localhost:1234/v1");

        let client = LmStudioClient::with_defaults("http://localhost:1234/v1/").unwrap();
        assert_eq!(client.api_url, "http://localhost:1234/v1");
        assert_eq!(client.identity(), "lm_studio@http://localhost:1234/v1");
    }

    #[test]
    fn test_ordered_embeddings_restores_index_order() {
        let body = r#"{"data":[
            {"index":1,"embedding":[0.0,1.0]},
            {"index":0,"embedding":[1.0,0.0]}
        ]}"#;
        let response: EmbeddingsResponse = serde_json::from_str(body).unwrap();
        let rows = ordered_embeddings(response, 2).unwrap();
        assert_eq!(rows, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_ordered_embeddings_rejects_malformed() {
        let short: EmbeddingsResponse = serde_json::from_str(r#"{"data":[{"embedding":[1.0]}]}"#).unwrap();
        assert!(ordered_embeddings(short, 2).is_err());

        let empty: EmbeddingsResponse = serde_json::from_str(r#"{"data":[{"embedding":[]}]}"#).unwrap();
        assert!(ordered_embeddings(empty, 1).is_err());

        let dup: EmbeddingsResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[1.0]},{"index":0,"embedding":[2.0]}]}"#)
                .unwrap();
        assert!(ordered_embeddings(dup, 2).is_err());
    }
}
