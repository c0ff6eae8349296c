//! PptMaker LLM Integration
//!
//! Local provider clients (Ollama, LM Studio), provider auto-detection and
//! slide outline generation

mod client;
mod generator;
mod llm_trait;
mod openai_client;
mod outline;
mod prompts;
mod selector;
mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::OllamaClient;
pub use generator::{clean_enhanced_bullets, GeneratedOutline, OutlineGenerator};
pub use llm_trait::{ProviderClient, ProviderKind};
pub use openai_client::LmStudioClient;
pub use outline::{fallback_outline, parse_outline, ParsedOutline, Slide, SlideOutline, MAX_BULLETS};
pub use prompts::{enhance_prompt, outline_prompt, reorganize_prompt};
pub use selector::{probe, select_generation_model, Endpoint, ProviderSelector};
pub use types::GenerateOptions;
