use serde::{Deserialize, Serialize};

/// Text chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Position of the owning document in the ingested set
    pub document: usize,

    /// Sequence index within the document
    pub index: usize,

    /// Chunk text
    pub text: String,

    /// Start offset in the document, in chars
    pub start: usize,

    /// End offset in the document, in chars (exclusive)
    pub end: usize,
}

impl TextChunk {
    /// Length in chars
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One retrieved chunk with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a TextChunk,

    /// Similarity score (-1.0 to 1.0)
    pub score: f32,
}

/// Ranked retrieval output, descending by score
pub type RetrievalResult<'a> = Vec<ScoredChunk<'a>>;
