pub mod config;
pub mod error;
pub mod hash;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, ProviderPreference, DEFAULT_LLM_MODEL, MAX_SLIDES, MIN_SLIDES};
pub use error::PptMakerError;
pub use hash::{content_hash, embedding_cache_key};
pub type Result<T> = std::result::Result<T, PptMakerError>;
