use async_trait::async_trait;
use pptmaker_common::{PptMakerError, Result};
use std::fmt;

use crate::types::GenerateOptions;

/// Local LLM server flavours we know how to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Native Ollama API (`/api/*`)
    Ollama,
    /// OpenAI-compatible LM Studio API (`/v1/*`)
    LmStudio,
}

impl ProviderKind {
    /// Documented default endpoint for this provider
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::LmStudio => "http://localhost:1234",
            Self::Ollama => "http://localhost:11434",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::LmStudio => "lm_studio",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = PptMakerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ollama" => Ok(Self::Ollama),
            "lm_studio" | "lmstudio" => Ok(Self::LmStudio),
            other => Err(PptMakerError::config(format!("Unknown provider: {}", other))),
        }
    }
}

/// Common contract for local LLM servers.
///
/// Callers never branch on the concrete provider; both wire formats are
/// normalized behind these methods.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Which provider this client speaks to
    fn kind(&self) -> ProviderKind;

    /// Base URL the client was built with
    fn base_url(&self) -> &str;

    /// Probe the server with a short timeout
    async fn health_check(&self) -> bool;

    /// Model identifiers in server order
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Generate text from a prompt
    async fn generate_text(&self, prompt: &str, model: &str, options: &GenerateOptions) -> Result<String>;

    /// Generate embedding for text
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving input order
    async fn embed_batch(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text, model).await?);
        }
        Ok(embeddings)
    }

    /// Stable identity used to detect index/query mismatches
    fn identity(&self) -> String {
        format!("{}@{}", self.kind(), self.base_url())
    }
}
