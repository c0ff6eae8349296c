/// PPT Maker error types
#[derive(Debug, thiserror::Error)]
pub enum PptMakerError {
    /// Network, HTTP status or malformed body from the LLM server
    #[error("Provider error: {0}")]
    Provider(String),

    /// Every configured endpoint failed its health check
    #[error("No AI provider available (tried: {0})")]
    NoProviderAvailable(String),

    /// Source path or URL with a kind we cannot ingest
    #[error("Unsupported source kind: {0}")]
    UnsupportedSourceKind(String),

    /// Source could not be read or fetched
    #[error("Source unavailable: {source_id}: {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    /// Chunk window parameters violate size > overlap >= 0
    #[error("Invalid chunk parameters: size={size}, overlap={overlap}")]
    InvalidChunkParameters { size: usize, overlap: usize },

    /// Query embedder differs from the one that built the index
    #[error("Embedding model mismatch: index built with {expected}, queried with {actual}")]
    EmbeddingModelMismatch { expected: String, actual: String },

    /// Embedding dimension differs within one index
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// No slide-like structure in a model response
    #[error("Outline parse error: {0}")]
    OutlineParse(String),

    /// Similarity threshold outside (0.0, 1.0]
    #[error("Invalid threshold: {0} (expected 0.0 < threshold <= 1.0)")]
    InvalidThreshold(f32),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document extraction error
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PptMakerError {
    /// Create provider error
    pub fn provider<S: Into<String>>(msg: S) -> Self {
        Self::Provider(msg.into())
    }

    /// Create unsupported source error
    pub fn unsupported_source<S: Into<String>>(source: S) -> Self {
        Self::UnsupportedSourceKind(source.into())
    }

    /// Create source unavailable error
    pub fn source_unavailable<S: Into<String>, R: Into<String>>(source: S, reason: R) -> Self {
        Self::SourceUnavailable {
            source_id: source.into(),
            reason: reason.into(),
        }
    }

    /// Create outline parse error
    pub fn outline_parse<S: Into<String>>(msg: S) -> Self {
        Self::OutlineParse(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create extraction error
    pub fn extraction<S: Into<String>>(msg: S) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error only affects a single ingestion source.
    ///
    /// Per-source errors are collected into a partial-success report
    /// instead of aborting the whole batch.
    pub fn is_per_source(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSourceKind(_) | Self::SourceUnavailable { .. } | Self::Extraction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_source_classification() {
        assert!(PptMakerError::unsupported_source("a.docx").is_per_source());
        assert!(PptMakerError::source_unavailable("https://x", "timeout").is_per_source());
        assert!(!PptMakerError::provider("connection refused").is_per_source());
        assert!(!PptMakerError::InvalidThreshold(1.5).is_per_source());
    }

    #[test]
    fn test_display() {
        let err = PptMakerError::InvalidChunkParameters { size: 3, overlap: 3 };
        assert_eq!(err.to_string(), "Invalid chunk parameters: size=3, overlap=3");

        let err = PptMakerError::source_unavailable("notes.txt", "not found");
        assert_eq!(err.to_string(), "Source unavailable: notes.txt: not found");
    }
}
