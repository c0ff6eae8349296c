//! PptMaker Vector Search
//!
//! Chunking, embedding index and slide deduplication over provider
//! embeddings

mod cache;
mod chunking;
mod dedup;
mod embedder;
mod index;
mod similarity;
mod types;

pub use cache::EmbeddingCache;
pub use chunking::{chunk_document, chunk_text, reassemble};
pub use dedup::{DedupDecision, DedupOutcome, Deduplicator};
pub use embedder::{CachedEmbedder, Embedder, TextEmbedder};
pub use index::EmbeddingIndex;
pub use similarity::cosine_similarity;
pub use types::{RetrievalResult, ScoredChunk, TextChunk};
