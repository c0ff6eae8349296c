use pptmaker_common::{content_hash, PptMakerError, Result, MAX_SLIDES, MIN_SLIDES};
use pptmaker_extract::SlideText;
use pptmaker_llm::{Slide, SlideOutline, MAX_BULLETS};
use pptmaker_vector::{DedupDecision, Deduplicator};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::context::RunContext;

/// Bullets longer than this are shortened in the condensed outline
const MAX_CONDENSED_WORDS: usize = 12;

/// Bullets per slide passed to the model as source material
const MAX_SOURCE_BULLETS: usize = 12;

/// Improvement options
#[derive(Debug, Clone, Default)]
pub struct ImprovementOptions {
    /// Model for the reorganized outline; defaults to the run's model
    pub outline_model: Option<String>,

    /// Model for deduplication embeddings; defaults to the configured one
    pub embed_model: Option<String>,

    /// Similarity above which a slide is a duplicate; defaults to the
    /// configured threshold
    pub threshold: Option<f32>,

    /// Target slide count; defaults to the number of surviving slides
    pub num_slides: Option<usize>,
}

/// Improvement result
#[derive(Debug)]
pub struct ImprovementReport {
    pub outline: SlideOutline,
    pub warnings: Vec<String>,

    /// The condensed outline replaced an unparseable response
    pub used_fallback: bool,

    pub original_slides: usize,

    /// Indices of slides that survived deduplication
    pub kept: Vec<usize>,

    pub decisions: Vec<DedupDecision>,
}

impl ImprovementReport {
    pub fn removed(&self) -> usize {
        self.original_slides - self.kept.len()
    }
}

/// Rewrites an existing deck into a condensed outline
pub struct ImprovementPipeline<'a> {
    ctx: &'a RunContext,
}

impl<'a> ImprovementPipeline<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    /// Improve the presentation at `path`; the file is only read
    pub async fn improve(&self, path: &Path, options: &ImprovementOptions) -> Result<ImprovementReport> {
        info!("Starting improvement: {}", path.display());
        let slides = self.ctx.extractor().slides(path).await?;
        self.improve_slides(&slides, options).await
    }

    /// Deduplicate already extracted slides and reorganize the survivors
    pub async fn improve_slides(&self, slides: &[SlideText], options: &ImprovementOptions) -> Result<ImprovementReport> {
        if slides.iter().all(|s| s.to_text().is_empty()) {
            return Err(PptMakerError::invalid_input("Presentation contains no slide text"));
        }

        // Phase 1: deduplication
        let threshold = options.threshold.unwrap_or(self.ctx.config().dedup_threshold);
        let embedder = match &options.embed_model {
            Some(model) => self.ctx.embedder_for(model),
            None => self.ctx.embedder(),
        };
        let dedup = Deduplicator::new(embedder, threshold)?;
        let texts: Vec<String> = slides.iter().map(SlideText::to_text).collect();
        let outcome = dedup.deduplicate_texts(&texts).await?;

        let survivors: Vec<&SlideText> = outcome
            .kept
            .iter()
            .map(|&i| &slides[i])
            .filter(|s| !s.to_text().is_empty())
            .collect();
        info!(
            "Deduplication removed {} of {} slides",
            outcome.removed(),
            slides.len()
        );

        // Phase 2: reorganization
        let num_slides = options
            .num_slides
            .unwrap_or(survivors.len())
            .clamp(MIN_SLIDES, MAX_SLIDES);
        let source = source_summary(&survivors);
        let fallback = condensed_outline(&survivors, num_slides);

        let generator = match &options.outline_model {
            Some(model) => self.ctx.generator_for(model),
            None => self.ctx.generator(),
        };
        let generated = generator.reorganize(&source, num_slides, fallback).await?;

        info!(
            "Improvement completed - {} slides{}",
            generated.outline.len(),
            if generated.used_fallback { " (condensed fallback)" } else { "" }
        );

        Ok(ImprovementReport {
            outline: generated.outline,
            warnings: generated.warnings,
            used_fallback: generated.used_fallback,
            original_slides: slides.len(),
            kept: outcome.kept,
            decisions: outcome.decisions,
        })
    }
}

/// Surviving slides as `Slide N: title` blocks for the reorganize prompt
fn source_summary(slides: &[&SlideText]) -> String {
    slides
        .iter()
        .map(|s| {
            let capped = SlideText {
                index: s.index,
                title: if s.title.is_empty() { "Untitled".to_string() } else { s.title.clone() },
                bullets: s.bullets.iter().take(MAX_SOURCE_BULLETS).cloned().collect(),
            };
            capped.to_outline_text()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut a bullet to its first 12 words
fn shrink(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= MAX_CONDENSED_WORDS {
        return words.join(" ");
    }
    format!("{}...", words[..MAX_CONDENSED_WORDS].join(" "))
}

/// Title with the most words longer than three letters
fn guess_main_title(slides: &[&SlideText]) -> String {
    slides
        .iter()
        .map(|s| s.title.as_str())
        .filter(|t| !t.is_empty())
        .enumerate()
        // Earliest title wins ties
        .max_by_key(|(position, title)| {
            let long_words = title.split_whitespace().filter(|w| w.chars().count() > 3).count();
            (long_words, std::cmp::Reverse(*position))
        })
        .map(|(_, title)| title.to_string())
        .unwrap_or_else(|| "Improved Presentation".to_string())
}

/// Outline built only from the surviving slides' own text.
///
/// A bullet repeated anywhere earlier in the deck (ignoring case and
/// spacing) is dropped before each slide is capped.
pub fn condensed_outline(slides: &[&SlideText], num_slides: usize) -> SlideOutline {
    let mut seen = HashSet::new();
    let condensed = slides
        .iter()
        .filter(|s| !s.to_text().is_empty())
        .map(|s| {
            let title = if s.title.is_empty() {
                format!("Slide {}", s.index + 1)
            } else {
                s.title.clone()
            };
            let bullets = s
                .bullets
                .iter()
                .filter(|b| {
                    let normalized = b.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
                    seen.insert(content_hash(normalized))
                })
                .take(MAX_BULLETS)
                .map(|b| shrink(b))
                .collect();
            Slide::new(title, bullets)
        })
        .take(num_slides)
        .collect();

    SlideOutline {
        title: guess_main_title(slides),
        slides: condensed,
    }
}
