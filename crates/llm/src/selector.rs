//! Provider auto-detection
//!
//! Endpoints are probed in a fixed order (the GUI server on 1234 before the
//! CLI server on 11434) and the first healthy one wins.

use pptmaker_common::{AppConfig, PptMakerError, ProviderPreference, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::client::OllamaClient;
use crate::llm_trait::{ProviderClient, ProviderKind};
use crate::openai_client::LmStudioClient;

/// Keywords in priority order when picking a generation model
const PREFERRED_MODEL_KEYWORDS: &[&str] = &[
    "gpt-oss-20b",
    "gpt-oss",
    "gpt",
    "llama",
    "instruct",
    "chat",
    "mistral",
    "qwen",
];

/// One endpoint to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub kind: ProviderKind,
    pub base_url: String,
}

impl Endpoint {
    pub fn new(kind: ProviderKind, base_url: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: base_url.into(),
        }
    }
}

/// Chooses the provider client for a run
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    candidates: Vec<Endpoint>,
    explicit: Option<Endpoint>,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl ProviderSelector {
    /// Probe the given endpoints in order
    pub fn new(candidates: Vec<Endpoint>, request_timeout: Duration, probe_timeout: Duration) -> Self {
        Self {
            candidates,
            explicit: None,
            request_timeout,
            probe_timeout,
        }
    }

    /// Skip probing and always build `endpoint`
    pub fn explicit(endpoint: Endpoint, request_timeout: Duration, probe_timeout: Duration) -> Self {
        Self {
            candidates: Vec::new(),
            explicit: Some(endpoint),
            request_timeout,
            probe_timeout,
        }
    }

    /// Build the selector described by the configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let request_timeout = config.request_timeout();
        let probe_timeout = config.probe_timeout();

        let explicit_kind = match config.provider {
            ProviderPreference::Ollama => Some(ProviderKind::Ollama),
            ProviderPreference::LmStudio => Some(ProviderKind::LmStudio),
            ProviderPreference::Auto => None,
        };

        match explicit_kind {
            Some(kind) => {
                let base_url = config.base_url.clone().unwrap_or_else(|| match kind {
                    ProviderKind::Ollama => config.ollama_url.clone(),
                    ProviderKind::LmStudio => config.lm_studio_url.clone(),
                });
                Self::explicit(Endpoint::new(kind, base_url), request_timeout, probe_timeout)
            }
            None => Self::new(
                vec![
                    Endpoint::new(ProviderKind::LmStudio, config.lm_studio_url.clone()),
                    Endpoint::new(ProviderKind::Ollama, config.ollama_url.clone()),
                ],
                request_timeout,
                probe_timeout,
            ),
        }
    }

    pub fn candidates(&self) -> &[Endpoint] {
        &self.candidates
    }

    /// Construct a client for one endpoint without contacting it
    pub fn build_client(&self, endpoint: &Endpoint) -> Result<Arc<dyn ProviderClient>> {
        let client: Arc<dyn ProviderClient> = match endpoint.kind {
            ProviderKind::Ollama => Arc::new(OllamaClient::new(
                endpoint.base_url.clone(),
                self.request_timeout,
                self.probe_timeout,
            )?),
            ProviderKind::LmStudio => Arc::new(LmStudioClient::new(
                endpoint.base_url.clone(),
                self.request_timeout,
                self.probe_timeout,
            )?),
        };
        Ok(client)
    }

    /// Resolve the client for this run.
    ///
    /// An explicit endpoint is returned without probing; unreachable
    /// servers then fail at call time.
    pub async fn select(&self) -> Result<Arc<dyn ProviderClient>> {
        if let Some(endpoint) = &self.explicit {
            info!("Using explicitly configured provider: {} at {}", endpoint.kind, endpoint.base_url);
            return self.build_client(endpoint);
        }

        let clients = self
            .candidates
            .iter()
            .map(|endpoint| self.build_client(endpoint))
            .collect::<Result<Vec<_>>>()?;
        probe(clients).await
    }
}

/// Return the first candidate whose health check succeeds
pub async fn probe(candidates: Vec<Arc<dyn ProviderClient>>) -> Result<Arc<dyn ProviderClient>> {
    let mut tried = Vec::with_capacity(candidates.len());

    for client in candidates {
        if client.health_check().await {
            info!("{} detected and connected at {}", client.kind(), client.base_url());
            return Ok(client);
        }
        warn!("{} not available at {}", client.kind(), client.base_url());
        tried.push(client.identity());
    }

    Err(PptMakerError::NoProviderAvailable(tried.join(", ")))
}

/// Pick the model best suited to outline generation.
///
/// Embedding models are never chosen.
pub fn select_generation_model(models: &[String]) -> Option<String> {
    let text_models: Vec<&String> = models
        .iter()
        .filter(|m| !m.to_lowercase().contains("embed"))
        .collect();

    for keyword in PREFERRED_MODEL_KEYWORDS {
        if let Some(model) = text_models.iter().find(|m| m.to_lowercase().contains(keyword)) {
            return Some((*model).clone());
        }
    }

    text_models.first().map(|m| (*m).clone())
}
