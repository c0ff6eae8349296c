use crate::error::PptMakerError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest deck the generator will build
pub const MIN_SLIDES: usize = 2;

/// Largest deck the generator will build
pub const MAX_SLIDES: usize = 20;

/// Model used when none is configured and none can be discovered
pub const DEFAULT_LLM_MODEL: &str = "gpt-oss:20b";

/// Which provider to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPreference {
    /// Probe LM Studio, then Ollama
    #[default]
    Auto,
    /// Native Ollama API
    Ollama,
    /// OpenAI-compatible LM Studio API
    LmStudio,
}

impl std::str::FromStr for ProviderPreference {
    type Err = PptMakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(Self::Auto),
            "ollama" => Ok(Self::Ollama),
            "lm_studio" | "lmstudio" => Ok(Self::LmStudio),
            other => Err(PptMakerError::config(format!("Unknown provider: {}", other))),
        }
    }
}

/// PPT Maker application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Provider selection mode
    pub provider: ProviderPreference,

    /// Explicit base URL for the selected provider
    pub base_url: Option<String>,

    /// LM Studio server URL
    pub lm_studio_url: String,

    /// Ollama server URL
    pub ollama_url: String,

    /// Text generation model (auto-selected when absent)
    pub llm_model: Option<String>,

    /// Embedding model name
    pub embedding_model: String,

    /// Expected embedding dimension, checked when set
    pub embedding_dim: Option<usize>,

    /// Timeout for generation and embedding calls
    pub request_timeout_secs: u64,

    /// Timeout for provider health probes
    pub probe_timeout_secs: u64,

    /// Timeout for fetching web references
    pub fetch_timeout_secs: u64,

    /// Reference chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per topic
    pub top_k: usize,

    /// Upper bound on the assembled context block
    pub context_char_budget: usize,

    /// Slide deduplication threshold
    pub dedup_threshold: f32,

    /// Slide count used when the caller does not pass one
    pub default_slides: usize,

    /// Directory for generated outlines
    pub output_dir: PathBuf,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// On-disk embedding cache directory
    pub embedding_cache_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderPreference::Auto,
            base_url: None,
            lm_studio_url: "http://localhost:1234".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            llm_model: None,
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: None,
            request_timeout_secs: 300,
            probe_timeout_secs: 3,
            fetch_timeout_secs: 10,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            context_char_budget: 6000,
            dedup_threshold: 0.85,
            default_slides: 8,
            output_dir: PathBuf::from("./output"),
            log_dir: PathBuf::from("./output/log"),
            log_level: "info".to_string(),
            embedding_cache_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, an optional TOML file and
    /// `PPTMAKER_*` environment variables, in increasing precedence.
    pub fn load(path: Option<&Path>) -> Result<Self, PptMakerError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(PptMakerError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("PPTMAKER").try_parsing(true),
        );

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PptMakerError::config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Ensure output and log directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), PptMakerError> {
        for dir in [&self.output_dir, &self.log_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    PptMakerError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Get full path for a generated file
    pub fn get_output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), PptMakerError> {
        let urls = [Some(&self.lm_studio_url), Some(&self.ollama_url), self.base_url.as_ref()];
        for url in urls.into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PptMakerError::config(format!(
                    "Provider URL must start with http:// or https://: {}",
                    url
                )));
            }
        }

        if self.base_url.is_some() && self.provider == ProviderPreference::Auto {
            return Err(PptMakerError::config(
                "base_url requires an explicit provider (ollama or lm_studio)",
            ));
        }

        if self.chunk_size == 0 || self.chunk_size <= self.chunk_overlap {
            return Err(PptMakerError::config(format!(
                "chunk_size ({}) must be greater than chunk_overlap ({})",
                self.chunk_size, self.chunk_overlap
            )));
        }

        if !(self.dedup_threshold > 0.0 && self.dedup_threshold <= 1.0) {
            return Err(PptMakerError::config(format!(
                "dedup_threshold must be in (0.0, 1.0], got {}",
                self.dedup_threshold
            )));
        }

        if self.request_timeout_secs == 0 || self.probe_timeout_secs == 0 || self.fetch_timeout_secs == 0 {
            return Err(PptMakerError::config("Timeouts must be at least one second"));
        }

        if !(MIN_SLIDES..=MAX_SLIDES).contains(&self.default_slides) {
            return Err(PptMakerError::config(format!(
                "default_slides must be between {} and {}",
                MIN_SLIDES, MAX_SLIDES
            )));
        }

        if self.embedding_model.is_empty() {
            return Err(PptMakerError::config("Embedding model name cannot be empty"));
        }

        // Directives such as "pptmaker_llm=debug" go to EnvFilter as-is
        let is_directive = self.log_level.contains('=') || self.log_level.contains(',');
        if !is_directive && crate::logger::parse_log_level(&self.log_level).is_none() {
            return Err(PptMakerError::config(format!("Unknown log level: {}", self.log_level)));
        }

        Ok(())
    }
}
