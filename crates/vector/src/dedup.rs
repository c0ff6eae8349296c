//! Greedy near-duplicate removal over slide texts.
//!
//! Slides are visited in order and each is compared with every slide kept
//! so far, so the earliest occurrence of repeated content wins.

use pptmaker_common::{PptMakerError, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::embedder::TextEmbedder;
use crate::similarity::cosine_similarity;

/// What happened to one slide
#[derive(Debug, Clone, PartialEq)]
pub enum DedupDecision {
    Kept,
    Duplicate {
        /// Index of the kept slide it repeats
        of: usize,
        similarity: f32,
    },
}

/// Deduplication result
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    /// Indices of surviving slides, ascending
    pub kept: Vec<usize>,

    /// One decision per input slide
    pub decisions: Vec<DedupDecision>,
}

impl DedupOutcome {
    pub fn removed(&self) -> usize {
        self.decisions.len() - self.kept.len()
    }
}

/// Embedding-based slide deduplicator
pub struct Deduplicator {
    embedder: Arc<dyn TextEmbedder>,
    threshold: f32,
}

impl Deduplicator {
    /// `threshold` must lie in (0.0, 1.0]
    pub fn new(embedder: Arc<dyn TextEmbedder>, threshold: f32) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(PptMakerError::InvalidThreshold(threshold));
        }
        Ok(Self { embedder, threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Kept indices of `slide_texts`
    pub async fn deduplicate(&self, slide_texts: &[String]) -> Result<Vec<usize>> {
        Ok(self.deduplicate_texts(slide_texts).await?.kept)
    }

    /// Kept indices plus a decision per slide.
    ///
    /// A slide is a duplicate when its similarity to a kept slide exceeds the
    /// threshold or its whitespace-normalized text equals a kept slide's.
    /// Blank slides are always kept and never compared.
    pub async fn deduplicate_texts(&self, slide_texts: &[String]) -> Result<DedupOutcome> {
        let normalized: Vec<String> = slide_texts.iter().map(|t| normalize(t)).collect();

        // Only non-blank slides are sent to the provider
        let to_embed: Vec<usize> = (0..slide_texts.len()).filter(|&i| !normalized[i].is_empty()).collect();
        let batch: Vec<String> = to_embed.iter().map(|&i| slide_texts[i].clone()).collect();
        let embedded = self.embedder.embed_batch(&batch).await?;

        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; slide_texts.len()];
        for (i, vector) in to_embed.into_iter().zip(embedded) {
            vectors[i] = Some(vector);
        }

        let mut kept: Vec<usize> = Vec::new();
        let mut decisions = Vec::with_capacity(slide_texts.len());

        for i in 0..slide_texts.len() {
            let Some(vector) = &vectors[i] else {
                kept.push(i);
                decisions.push(DedupDecision::Kept);
                continue;
            };

            let mut duplicate_of = None;
            for &j in &kept {
                let Some(other) = &vectors[j] else { continue };

                if normalized[i] == normalized[j] {
                    duplicate_of = Some((j, 1.0));
                    break;
                }
                let similarity = cosine_similarity(vector, other);
                if similarity > self.threshold {
                    duplicate_of = Some((j, similarity));
                    break;
                }
            }

            match duplicate_of {
                Some((of, similarity)) => {
                    debug!("Slide {} duplicates slide {} (similarity {:.3})", i, of, similarity);
                    decisions.push(DedupDecision::Duplicate { of, similarity });
                }
                None => {
                    kept.push(i);
                    decisions.push(DedupDecision::Kept);
                }
            }
        }

        info!(
            "Deduplication - kept {} of {} slides (threshold {})",
            kept.len(),
            slide_texts.len(),
            self.threshold
        );
        Ok(DedupOutcome { kept, decisions })
    }
}

/// Lowercase and collapse whitespace
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
