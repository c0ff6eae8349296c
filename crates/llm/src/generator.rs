use pptmaker_common::{PptMakerError, Result};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use crate::llm_trait::ProviderClient;
use crate::outline::{fallback_outline, parse_outline, SlideOutline};
use crate::prompts::{enhance_prompt, outline_prompt, reorganize_prompt, OUTLINE_SYSTEM, PREAMBLE_PHRASES, REORGANIZE_SYSTEM};
use crate::types::GenerateOptions;

/// Maximum bullets kept from an enhancement response
const MAX_ENHANCED_BULLETS: usize = 5;

/// Outline produced by the generator
#[derive(Debug, Clone)]
pub struct GeneratedOutline {
    pub outline: SlideOutline,

    /// Normalization notes from the parser
    pub warnings: Vec<String>,

    /// The model response could not be parsed and a fallback was used
    pub used_fallback: bool,
}

/// Builds slide outlines by prompting a provider
pub struct OutlineGenerator {
    client: Arc<dyn ProviderClient>,
    model: String,
}

impl OutlineGenerator {
    /// Create new outline generator
    pub fn new(client: Arc<dyn ProviderClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate an outline of `num_slides` slides about `topic`.
    ///
    /// Provider failures propagate. An unparseable response is replaced by
    /// the deterministic fallback outline.
    pub async fn generate(&self, topic: &str, num_slides: usize, context: Option<&str>) -> Result<GeneratedOutline> {
        info!(
            "Generating outline - Model: {}, Slides: {}, Context: {} chars",
            self.model,
            num_slides,
            context.map(str::len).unwrap_or(0)
        );

        let options = GenerateOptions::default()
            .with_system(OUTLINE_SYSTEM)
            .with_temperature(0.7)
            .with_max_tokens(2000)
            .json_mode();
        let prompt = outline_prompt(topic, num_slides, context);

        self.request_outline(&prompt, &options, num_slides, || fallback_outline(topic, num_slides))
            .await
    }

    /// Ask the model to condense and reorder existing slide material.
    ///
    /// `fallback` is used when the response cannot be parsed.
    pub async fn reorganize(
        &self,
        source: &str,
        num_slides: usize,
        fallback: SlideOutline,
    ) -> Result<GeneratedOutline> {
        info!(
            "Reorganizing outline - Model: {}, Slides: {}, Source: {} chars",
            self.model,
            num_slides,
            source.len()
        );

        let options = GenerateOptions::default()
            .with_system(REORGANIZE_SYSTEM)
            .with_temperature(0.3)
            .with_max_tokens(2000)
            .json_mode();
        let prompt = reorganize_prompt(source, num_slides);

        self.request_outline(&prompt, &options, num_slides, || fallback).await
    }

    async fn request_outline(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        num_slides: usize,
        fallback: impl FnOnce() -> SlideOutline,
    ) -> Result<GeneratedOutline> {
        if num_slides == 0 {
            return Err(PptMakerError::invalid_input("Number of slides must be at least 1"));
        }

        let raw = self.client.generate_text(prompt, &self.model, options).await?;
        debug!("Outline response - Length: {}", raw.len());

        match parse_outline(&raw, num_slides) {
            Ok(parsed) => Ok(GeneratedOutline {
                outline: parsed.outline,
                warnings: parsed.warnings,
                used_fallback: false,
            }),
            Err(PptMakerError::OutlineParse(reason)) => {
                warn!("Outline parse failed ({}), using fallback outline", reason);
                Ok(GeneratedOutline {
                    outline: fallback(),
                    warnings: vec![format!("fallback outline used: {}", reason)],
                    used_fallback: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Sharpen one slide's bullets.
    ///
    /// Keeps the original bullets when the model returns nothing usable.
    pub async fn enhance_slide(&self, title: &str, bullets: &[String]) -> Result<Vec<String>> {
        if bullets.is_empty() {
            return Ok(Vec::new());
        }

        let options = GenerateOptions::default().with_temperature(0.7).with_max_tokens(500);
        let response = self
            .client
            .generate_text(&enhance_prompt(title, bullets), &self.model, &options)
            .await?;

        let enhanced = clean_enhanced_bullets(&response);
        if enhanced.is_empty() {
            debug!("Enhancement for '{}' returned no bullets, keeping original", title);
            return Ok(bullets.to_vec());
        }
        Ok(enhanced)
    }
}

/// Strip glyphs, numbering and preamble lines from an enhancement response
pub fn clean_enhanced_bullets(response: &str) -> Vec<String> {
    static GLYPH: OnceLock<Regex> = OnceLock::new();
    let glyph = GLYPH.get_or_init(|| Regex::new(r"^(?:[-•*‣◦–]+|\d{1,2}[.)])\s*").expect("valid glyph regex"));

    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let lower = line.to_lowercase();
            !PREAMBLE_PHRASES.iter().any(|phrase| lower.contains(phrase))
        })
        .map(|line| glyph.replace(line, "").trim().trim_matches('*').trim().to_string())
        .filter(|line| !line.is_empty())
        .take(MAX_ENHANCED_BULLETS)
        .collect()
}
