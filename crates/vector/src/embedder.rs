use async_trait::async_trait;
use pptmaker_common::{embedding_cache_key, PptMakerError, Result};
use pptmaker_llm::ProviderClient;
use std::sync::Arc;
use tracing::debug;

use crate::cache::EmbeddingCache;

/// Source of embeddings for an index or the deduplicator
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Identifies provider and model; vectors from different signatures
    /// are not comparable
    fn signature(&self) -> String;

    /// Embed texts, one vector per text in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| PptMakerError::provider("embedding response was empty"))
    }
}

/// A provider client paired with an embedding model
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn ProviderClient>,
    model: String,
}

impl Embedder {
    pub fn new(provider: Arc<dyn ProviderClient>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `kind@base_url` of the provider
    pub fn provider_identity(&self) -> String {
        self.provider.identity()
    }
}

#[async_trait]
impl TextEmbedder for Embedder {
    fn signature(&self) -> String {
        format!("{}#{}", self.provider.identity(), self.model)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.provider.embed_batch(texts, &self.model).await?;
        if embeddings.len() != texts.len() {
            return Err(PptMakerError::provider(format!(
                "expected {} embeddings, provider returned {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

/// [`Embedder`] that consults an [`EmbeddingCache`] before calling the provider
pub struct CachedEmbedder {
    inner: Embedder,
    cache: Arc<EmbeddingCache>,
}

impl CachedEmbedder {
    pub fn new(inner: Embedder, cache: Arc<EmbeddingCache>) -> Self {
        Self { inner, cache }
    }

    fn key(&self, text: &str) -> String {
        embedding_cache_key(&self.inner.provider_identity(), self.inner.model(), text)
    }
}

#[async_trait]
impl TextEmbedder for CachedEmbedder {
    fn signature(&self) -> String {
        self.inner.signature()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let cached = self.cache.get(&self.key(text)).await;
            if cached.is_none() {
                missing.push(i);
            }
            results.push(cached);
        }

        debug!(
            "Embedding cache - {} hits, {} misses",
            texts.len() - missing.len(),
            missing.len()
        );

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_batch(&batch).await?;
            for (i, embedding) in missing.into_iter().zip(fresh) {
                self.cache.insert(&self.key(&texts[i]), embedding.clone()).await?;
                results[i] = Some(embedding);
            }
        }

        results
            .into_iter()
            .map(|r| r.ok_or_else(|| PptMakerError::provider("embedding missing after cache fill")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptmaker_llm::testing::StubProvider;
    use pptmaker_llm::ProviderKind;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_signature() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama));
        let embedder = Embedder::new(stub, "nomic-embed-text");
        assert_eq!(embedder.signature(), "ollama@http://localhost:11434#nomic-embed-text");
    }

    #[tokio::test]
    async fn test_embed_preserves_order() {
        let stub = Arc::new(
            StubProvider::new(ProviderKind::LmStudio)
                .with_embedding("a", vec![1.0, 0.0])
                .with_embedding("b", vec![0.0, 1.0]),
        );
        let embedder = Embedder::new(stub, "embed");
        let vectors = embedder.embed_batch(&strings(&["b", "a"])).await.unwrap();
        assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert_eq!(embedder.embed("a").await.unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_cached_embedder_only_embeds_misses() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama));
        let cache = Arc::new(EmbeddingCache::in_memory());
        let embedder = CachedEmbedder::new(Embedder::new(stub.clone(), "embed"), cache.clone());

        let first = embedder.embed_batch(&strings(&["one", "two"])).await.unwrap();
        assert_eq!(stub.embed_calls(), 2);

        let second = embedder.embed_batch(&strings(&["two", "three", "one"])).await.unwrap();
        assert_eq!(stub.embed_calls(), 3);
        assert_eq!(second[0], first[1]);
        assert_eq!(second[2], first[0]);
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn test_cache_is_keyed_by_model() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama));
        let cache = Arc::new(EmbeddingCache::in_memory());

        CachedEmbedder::new(Embedder::new(stub.clone(), "model-a"), cache.clone())
            .embed("same text")
            .await
            .unwrap();
        CachedEmbedder::new(Embedder::new(stub.clone(), "model-b"), cache.clone())
            .embed("same text")
            .await
            .unwrap();

        assert_eq!(stub.embed_calls(), 2);
    }
}
