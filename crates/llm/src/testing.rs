//! In-process provider for tests.
//!
//! Enabled for this crate's own tests and, through the `test-util`
//! feature, for downstream crates.

use async_trait::async_trait;
use pptmaker_common::{PptMakerError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::llm_trait::{ProviderClient, ProviderKind};
use crate::types::GenerateOptions;

/// Dimension of the bag-of-words embeddings
pub const STUB_EMBEDDING_DIM: usize = 32;

/// Scripted provider: queued generations, bag-of-words embeddings
pub struct StubProvider {
    kind: ProviderKind,
    base_url: String,
    healthy: bool,
    failing: bool,
    models: Vec<String>,
    responses: Mutex<VecDeque<String>>,
    embeddings: HashMap<String, Vec<f32>>,
    prompts: Mutex<Vec<String>>,
    embed_calls: Mutex<usize>,
}

impl StubProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: kind.default_base_url().to_string(),
            healthy: true,
            failing: false,
            models: vec!["llama3.2:latest".to_string(), "nomic-embed-text".to_string()],
            responses: Mutex::new(VecDeque::new()),
            embeddings: HashMap::new(),
            prompts: Mutex::new(Vec::new()),
            embed_calls: Mutex::new(0),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn healthy(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    /// Every generate/embed call fails with a provider error
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Queue a raw model response; responses are consumed in order
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses
            .lock()
            .expect("stub lock poisoned")
            .push_back(response.into());
        self
    }

    /// Pin the embedding returned for an exact text
    pub fn with_embedding(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings.insert(text.into(), embedding);
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("stub lock poisoned").clone()
    }

    /// Number of texts embedded so far
    pub fn embed_calls(&self) -> usize {
        *self.embed_calls.lock().expect("stub lock poisoned")
    }

    /// Deterministic bag-of-words vector over lowercase alphanumeric words
    pub fn bag_of_words(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; STUB_EMBEDDING_DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
                % STUB_EMBEDDING_DIM;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl ProviderClient for StubProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        if self.failing {
            return Err(PptMakerError::provider("stub provider is failing"));
        }
        Ok(self.models.clone())
    }

    async fn generate_text(&self, prompt: &str, _model: &str, options: &GenerateOptions) -> Result<String> {
        if self.failing {
            return Err(PptMakerError::provider("stub provider is failing"));
        }

        let mut recorded = String::new();
        if let Some(system) = &options.system {
            recorded.push_str(system);
            recorded.push('\n');
        }
        recorded.push_str(prompt);
        self.prompts.lock().expect("stub lock poisoned").push(recorded);

        self.responses
            .lock()
            .expect("stub lock poisoned")
            .pop_front()
            .ok_or_else(|| PptMakerError::provider("stub provider has no scripted response"))
    }

    async fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>> {
        if self.failing {
            return Err(PptMakerError::provider("stub provider is failing"));
        }
        *self.embed_calls.lock().expect("stub lock poisoned") += 1;

        Ok(self
            .embeddings
            .get(text)
            .cloned()
            .unwrap_or_else(|| Self::bag_of_words(text)))
    }
}
