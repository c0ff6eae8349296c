use pptmaker_common::{AppConfig, Result, DEFAULT_LLM_MODEL};
use pptmaker_extract::Extractor;
use pptmaker_llm::{select_generation_model, OutlineGenerator, ProviderClient, ProviderSelector};
use pptmaker_vector::{CachedEmbedder, Embedder, EmbeddingCache, TextEmbedder};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one generation or improvement run needs.
///
/// Built once per run and passed to the pipelines; nothing here is shared
/// across runs except the optional on-disk embedding cache.
pub struct RunContext {
    config: AppConfig,
    provider: Arc<dyn ProviderClient>,
    llm_model: String,
    cache: Option<Arc<EmbeddingCache>>,
    extractor: Extractor,
}

impl RunContext {
    /// Select the provider and resolve models from the configuration
    pub async fn resolve(config: AppConfig) -> Result<Self> {
        let provider = ProviderSelector::from_config(&config).select().await?;
        let llm_model = resolve_llm_model(&config, provider.as_ref()).await;
        Self::new(config, provider, llm_model)
    }

    /// Build a context around an already selected provider
    pub fn new(config: AppConfig, provider: Arc<dyn ProviderClient>, llm_model: impl Into<String>) -> Result<Self> {
        let cache = config
            .embedding_cache_dir
            .as_ref()
            .map(|dir| Arc::new(EmbeddingCache::persistent(dir)));
        let extractor = Extractor::new(config.fetch_timeout())?;
        let llm_model = llm_model.into();

        info!(
            "Run context - Provider: {}, LLM: {}, Embedding: {}",
            provider.identity(),
            llm_model,
            config.embedding_model
        );

        Ok(Self {
            config,
            provider,
            llm_model,
            cache,
            extractor,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn provider(&self) -> Arc<dyn ProviderClient> {
        self.provider.clone()
    }

    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Embedder for the configured embedding model
    pub fn embedder(&self) -> Arc<dyn TextEmbedder> {
        self.embedder_for(&self.config.embedding_model)
    }

    /// Embedder for `model` on this run's provider, cached when configured
    pub fn embedder_for(&self, model: &str) -> Arc<dyn TextEmbedder> {
        let embedder = Embedder::new(self.provider.clone(), model);
        match &self.cache {
            Some(cache) => Arc::new(CachedEmbedder::new(embedder, cache.clone())),
            None => Arc::new(embedder),
        }
    }

    /// Outline generator for the run's LLM model
    pub fn generator(&self) -> OutlineGenerator {
        OutlineGenerator::new(self.provider.clone(), self.llm_model.clone())
    }

    /// Outline generator for another model on the same provider
    pub fn generator_for(&self, model: &str) -> OutlineGenerator {
        OutlineGenerator::new(self.provider.clone(), model)
    }
}

/// Configured model, else the preferred installed one, else the default
async fn resolve_llm_model(config: &AppConfig, provider: &dyn ProviderClient) -> String {
    if let Some(model) = &config.llm_model {
        return model.clone();
    }

    match provider.list_models().await {
        Ok(models) => select_generation_model(&models).unwrap_or_else(|| {
            warn!("No text generation model listed, using {}", DEFAULT_LLM_MODEL);
            DEFAULT_LLM_MODEL.to_string()
        }),
        Err(e) => {
            warn!("Failed to list models ({}), using {}", e, DEFAULT_LLM_MODEL);
            DEFAULT_LLM_MODEL.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptmaker_llm::testing::StubProvider;
    use pptmaker_llm::ProviderKind;

    #[tokio::test]
    async fn test_resolve_llm_model() {
        let stub = StubProvider::new(ProviderKind::LmStudio).with_models(&["text-embedding-nomic", "qwen2.5-7b-instruct"]);
        let config = AppConfig::default();
        assert_eq!(resolve_llm_model(&config, &stub).await, "qwen2.5-7b-instruct");

        let config = AppConfig {
            llm_model: Some("mistral".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(resolve_llm_model(&config, &stub).await, "mistral");

        let failing = StubProvider::new(ProviderKind::Ollama).failing();
        assert_eq!(resolve_llm_model(&AppConfig::default(), &failing).await, DEFAULT_LLM_MODEL);
    }

    #[tokio::test]
    async fn test_embedder_signature_follows_model() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama));
        let ctx = RunContext::new(AppConfig::default(), stub, "llama3.2").unwrap();
        assert_eq!(ctx.embedder().signature(), "ollama@http://localhost:11434#nomic-embed-text");
        assert_eq!(ctx.embedder_for("all-minilm").signature(), "ollama@http://localhost:11434#all-minilm");
        assert_eq!(ctx.generator().model(), "llama3.2");
    }
}
