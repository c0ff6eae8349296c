//! PptMaker Reference Extraction
//!
//! Turns presentations, PDFs, text files and web pages into plain-text
//! documents

mod pdf;
mod postprocess;
mod pptx;
mod types;
mod web;

pub use pdf::extract_pdf_text;
pub use postprocess::{normalize_text, split_to_bullets, strip_markup};
pub use pptx::{extract_slides, extract_slides_from_reader, render_slides};
pub use types::{Document, SlideText, SourceKind};
pub use web::{host_label, WebFetcher};

use pptmaker_common::{PptMakerError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Extracts [`Document`]s from reference sources
#[derive(Debug, Clone)]
pub struct Extractor {
    web: WebFetcher,
}

impl Extractor {
    /// Create extractor; web fetches are bounded by `fetch_timeout`
    pub fn new(fetch_timeout: Duration) -> Result<Self> {
        Ok(Self {
            web: WebFetcher::new(fetch_timeout)?,
        })
    }

    /// Resolve the source kind and extract its text.
    ///
    /// A source that yields no text is an extraction error.
    pub async fn extract(&self, source: &str) -> Result<Document> {
        let kind = SourceKind::resolve(source)?;

        let text = match kind {
            SourceKind::Presentation => {
                let path = PathBuf::from(source);
                let slides = run_blocking(move || extract_slides(&path)).await?;
                render_slides(&slides)
            }
            SourceKind::Pdf => {
                let path = PathBuf::from(source);
                run_blocking(move || extract_pdf_text(&path)).await?
            }
            SourceKind::Text => read_text_file(Path::new(source)).await?,
            SourceKind::Web => self.web.fetch_text(source).await?,
        };

        let text = normalize_text(&text);
        if text.is_empty() {
            return Err(PptMakerError::extraction(format!("no text extracted from {}", source)));
        }

        let label = match kind {
            SourceKind::Web => host_label(source),
            _ => file_label(source),
        };

        info!("Extracted {} ({}) - {} chars", label, kind, text.chars().count());
        Ok(Document::new(source, label, kind, text))
    }

    /// Slides of an existing presentation
    pub async fn slides(&self, path: &Path) -> Result<Vec<SlideText>> {
        let path = path.to_path_buf();
        run_blocking(move || extract_slides(&path)).await
    }
}

/// Run a blocking extractor off the async runtime
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PptMakerError::extraction(format!("extraction task failed: {}", e)))?
}

async fn read_text_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PptMakerError::source_unavailable(path.display().to_string(), e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn file_label(source: &str) -> String {
    Path::new(source)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| source.to_string())
}
