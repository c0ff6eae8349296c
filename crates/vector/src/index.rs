use pptmaker_common::{PptMakerError, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::embedder::TextEmbedder;
use crate::similarity::cosine_similarity;
use crate::types::{RetrievalResult, ScoredChunk, TextChunk};

/// In-memory embedding index over chunks.
///
/// Owned by a single generation run; vectors keep chunk insertion order.
pub struct EmbeddingIndex {
    embedder: Arc<dyn TextEmbedder>,
    signature: String,
    dimension: Option<usize>,
    chunks: Vec<TextChunk>,
    vectors: Vec<Vec<f32>>,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("signature", &self.signature)
            .field("dimension", &self.dimension)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl EmbeddingIndex {
    /// Embed every chunk and build the index.
    ///
    /// With `expected_dim` set, any vector of another length fails with
    /// [`PptMakerError::DimensionMismatch`]; otherwise the first vector fixes
    /// the dimension.
    pub async fn build(
        embedder: Arc<dyn TextEmbedder>,
        chunks: Vec<TextChunk>,
        expected_dim: Option<usize>,
    ) -> Result<Self> {
        let signature = embedder.signature();
        info!("Building embedding index - {} chunks ({})", chunks.len(), signature);

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(PptMakerError::provider(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let mut dimension = expected_dim;
        for vector in &vectors {
            if vector.is_empty() {
                return Err(PptMakerError::provider("provider returned an empty embedding"));
            }
            match dimension {
                Some(expected) if expected != vector.len() => {
                    return Err(PptMakerError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                Some(_) => {}
                None => dimension = Some(vector.len()),
            }
        }

        debug!("Embedding index ready - dimension {:?}", dimension);
        Ok(Self {
            embedder,
            signature,
            dimension,
            chunks,
            vectors,
        })
    }

    /// Embedder signature the index was built with
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Vector dimension; `None` for an empty index without an expected size
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top `k` chunks for `text`, embedded with the index's own embedder
    pub async fn query(&self, text: &str, k: usize) -> Result<RetrievalResult<'_>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(text).await?;
        self.search_vector(&vector, k)
    }

    /// Top `k` chunks for `text` embedded by `embedder`.
    ///
    /// Fails with [`PptMakerError::EmbeddingModelMismatch`] unless `embedder`
    /// has the signature the index was built with.
    pub async fn query_with(&self, embedder: &dyn TextEmbedder, text: &str, k: usize) -> Result<RetrievalResult<'_>> {
        let actual = embedder.signature();
        if actual != self.signature {
            return Err(PptMakerError::EmbeddingModelMismatch {
                expected: self.signature.clone(),
                actual,
            });
        }
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let vector = embedder.embed(text).await?;
        self.search_vector(&vector, k)
    }

    /// Rank stored chunks against a query vector.
    ///
    /// Scores are non-increasing; equal scores keep insertion order.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<RetrievalResult<'_>> {
        if let Some(expected) = self.dimension {
            if query.len() != expected {
                return Err(PptMakerError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut results: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .zip(&self.vectors)
            .map(|(chunk, vector)| ScoredChunk {
                chunk,
                score: cosine_similarity(query, vector),
            })
            .collect();

        // Stable sort keeps insertion order for ties
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        debug!("Search completed - {} results from {} chunks", results.len(), self.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::chunk_text;
    use crate::embedder::Embedder;
    use pptmaker_llm::testing::{StubProvider, STUB_EMBEDDING_DIM};
    use pptmaker_llm::ProviderKind;

    fn chunk(index: usize, text: &str) -> TextChunk {
        TextChunk {
            document: 0,
            index,
            text: text.to_string(),
            start: 0,
            end: text.chars().count(),
        }
    }

    fn pinned_embedder() -> Arc<dyn TextEmbedder> {
        let stub = StubProvider::new(ProviderKind::Ollama)
            .with_embedding("north", vec![0.0, 1.0])
            .with_embedding("east", vec![1.0, 0.0])
            .with_embedding("northeast", vec![1.0, 1.0])
            .with_embedding("also east", vec![2.0, 0.0])
            .with_embedding("nothing", vec![0.0, 0.0])
            .with_embedding("query east", vec![1.0, 0.0]);
        Arc::new(Embedder::new(Arc::new(stub), "embed"))
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity_with_stable_ties() {
        let chunks = vec![
            chunk(0, "north"),
            chunk(1, "east"),
            chunk(2, "nothing"),
            chunk(3, "northeast"),
            chunk(4, "also east"),
        ];
        let index = EmbeddingIndex::build(pinned_embedder(), chunks, None).await.unwrap();
        assert_eq!(index.dimension(), Some(2));

        let results = index.query("query east", 3).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["east", "also east", "northeast"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[0].score, results[1].score);
    }

    #[tokio::test]
    async fn test_zero_vector_scores_zero() {
        let index = EmbeddingIndex::build(pinned_embedder(), vec![chunk(0, "nothing")], None)
            .await
            .unwrap();
        let results = index.search_vector(&[1.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_result_lengths_and_order() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama));
        let embedder: Arc<dyn TextEmbedder> = Arc::new(Embedder::new(stub, "embed"));
        let text = "Rust ownership rules. Borrowing and lifetimes. Async runtimes like tokio. \
                    Cargo workspaces and crates. Error handling with Result.";
        let chunks = chunk_text(text, 24, 4).unwrap();
        let total = chunks.len();
        let index = EmbeddingIndex::build(embedder, chunks, Some(STUB_EMBEDDING_DIM))
            .await
            .unwrap();

        for k in 1..=total {
            let results = index.query("tokio async", k).await.unwrap();
            assert_eq!(results.len(), k);
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }
        assert_eq!(index.query("tokio async", total + 10).await.unwrap().len(), total);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_at_build() {
        let err = EmbeddingIndex::build(pinned_embedder(), vec![chunk(0, "east")], Some(768))
            .await
            .unwrap_err();
        assert!(matches!(err, PptMakerError::DimensionMismatch { expected: 768, actual: 2 }));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_at_query() {
        let index = EmbeddingIndex::build(pinned_embedder(), vec![chunk(0, "east")], None)
            .await
            .unwrap();
        let err = index.search_vector(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, PptMakerError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[tokio::test]
    async fn test_query_with_other_model_fails() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama));
        let build: Arc<dyn TextEmbedder> = Arc::new(Embedder::new(stub.clone(), "nomic-embed-text"));
        let index = EmbeddingIndex::build(build, vec![chunk(0, "text")], None).await.unwrap();

        let other = Embedder::new(stub.clone(), "mxbai-embed-large");
        let err = index.query_with(&other, "text", 1).await.unwrap_err();
        assert!(matches!(err, PptMakerError::EmbeddingModelMismatch { .. }));

        let same = Embedder::new(stub, "nomic-embed-text");
        assert_eq!(index.query_with(&same, "text", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_index() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama));
        let embedder: Arc<dyn TextEmbedder> = Arc::new(Embedder::new(stub.clone(), "embed"));
        let index = EmbeddingIndex::build(embedder, Vec::new(), None).await.unwrap();
        assert!(index.is_empty());
        assert!(index.query("anything", 3).await.unwrap().is_empty());
        assert_eq!(stub.embed_calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama).failing());
        let embedder: Arc<dyn TextEmbedder> = Arc::new(Embedder::new(stub, "embed"));
        let err = EmbeddingIndex::build(embedder, vec![chunk(0, "x")], None).await.unwrap_err();
        assert!(matches!(err, PptMakerError::Provider(_)));
    }
}
