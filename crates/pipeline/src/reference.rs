//! Reference material ingestion and retrieval context assembly

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use pptmaker_common::{PptMakerError, Result};
use pptmaker_extract::{Document, Extractor};
use pptmaker_vector::{chunk_document, EmbeddingIndex, TextEmbedder};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::context::RunContext;

/// Sources fetched concurrently during ingestion
const MAX_CONCURRENT_SOURCES: usize = 4;

/// A source that could not be ingested
#[derive(Debug)]
pub struct SourceFailure {
    pub source: String,
    pub error: PptMakerError,
}

/// Partial-success result of ingestion
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Extracted documents, in source order
    pub documents: Vec<Document>,
    pub failures: Vec<SourceFailure>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Characters of extracted text across all documents
    pub fn total_chars(&self) -> usize {
        self.documents.iter().map(Document::char_count).sum()
    }
}

/// Chunking and retrieval settings
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub context_char_budget: usize,
    pub embedding_dim: Option<usize>,
}

/// Ingests reference sources and builds the retrieval context for a topic
pub struct ReferenceProcessor {
    extractor: Extractor,
    embedder: Arc<dyn TextEmbedder>,
    settings: ReferenceSettings,
}

impl ReferenceProcessor {
    pub fn new(extractor: Extractor, embedder: Arc<dyn TextEmbedder>, settings: ReferenceSettings) -> Self {
        Self {
            extractor,
            embedder,
            settings,
        }
    }

    /// Processor using the run's extractor, embedder and configuration
    pub fn from_context(ctx: &RunContext) -> Self {
        let config = ctx.config();
        Self::new(
            ctx.extractor().clone(),
            ctx.embedder(),
            ReferenceSettings {
                chunk_size: config.chunk_size,
                chunk_overlap: config.chunk_overlap,
                context_char_budget: config.context_char_budget,
                embedding_dim: config.embedding_dim,
            },
        )
    }

    /// Extract every source.
    ///
    /// Never fails as a whole: each failing source is recorded in the
    /// report and the rest are still processed.
    pub async fn ingest(&self, sources: &[String]) -> IngestReport {
        info!("Ingesting {} reference sources", sources.len());
        let progress = ingest_progress(sources.len() as u64);

        let results: Vec<(String, Result<Document>)> = stream::iter(sources.iter().cloned())
            .map(|source| {
                let extractor = &self.extractor;
                let progress = &progress;
                async move {
                    let result = extractor.extract(&source).await;
                    progress.inc(1);
                    (source, result)
                }
            })
            .buffered(MAX_CONCURRENT_SOURCES)
            .collect()
            .await;
        progress.finish_and_clear();

        let mut report = IngestReport::default();
        for (source, result) in results {
            match result {
                Ok(document) => report.documents.push(document),
                Err(err) => {
                    if err.is_per_source() {
                        warn!("Skipping source {}: {}", source, err);
                    } else {
                        error!("Unexpected failure ingesting {}: {}", source, err);
                    }
                    report.failures.push(SourceFailure { source, error: err });
                }
            }
        }

        info!(
            "Ingestion completed - {} documents ({} chars), {} failures",
            report.documents.len(),
            report.total_chars(),
            report.failures.len()
        );
        report
    }

    /// Retrieve the chunks most relevant to `topic` as one context block.
    ///
    /// Chunks are emitted in descending similarity, each after a
    /// `[Source: <label>]` marker, until the next whole chunk would exceed
    /// the character budget.
    pub async fn build_context(&self, topic: &str, documents: &[Document], top_k: usize) -> Result<String> {
        let mut chunks = Vec::new();
        for (position, document) in documents.iter().enumerate() {
            chunks.extend(chunk_document(
                position,
                &document.text,
                self.settings.chunk_size,
                self.settings.chunk_overlap,
            )?);
        }
        if chunks.is_empty() {
            return Ok(String::new());
        }

        let index = EmbeddingIndex::build(self.embedder.clone(), chunks, self.settings.embedding_dim).await?;
        let results = index.query(topic, top_k).await?;

        let budget = self.settings.context_char_budget;
        let mut context = String::new();
        let mut used = 0;
        let mut included = 0;

        for result in &results {
            let label = documents
                .get(result.chunk.document)
                .map(|d| d.label.as_str())
                .unwrap_or("unknown");
            let block = format!("[Source: {}]\n{}", label, result.chunk.text.trim());
            let separator = if context.is_empty() { 0 } else { 2 };
            let cost = separator + block.chars().count();

            if used + cost > budget {
                debug!("Context budget reached after {} of {} chunks", included, results.len());
                break;
            }
            if separator > 0 {
                context.push_str("\n\n");
            }
            context.push_str(&block);
            used += cost;
            included += 1;
        }

        info!(
            "Context built - {} chunks, {} chars from {} documents",
            included,
            used,
            documents.len()
        );
        Ok(context)
    }
}

fn ingest_progress(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] [{bar:30}] {pos}/{len} sources")
            .expect("valid progress template")
            .progress_chars("=>-"),
    );
    bar
}
