use pptmaker_common::{content_hash, PptMakerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

/// Kind of reference source, resolved once at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Presentation,
    Pdf,
    Text,
    Web,
}

impl SourceKind {
    /// Classify a path or URL.
    ///
    /// `http(s)://` is web content; other schemes and unknown extensions
    /// fail with [`PptMakerError::UnsupportedSourceKind`].
    pub fn resolve(source: &str) -> Result<Self> {
        let source = source.trim();

        if source.contains("://") {
            let url = Url::parse(source).map_err(|_| PptMakerError::unsupported_source(source))?;
            return match url.scheme() {
                "http" | "https" => Ok(Self::Web),
                _ => Err(PptMakerError::unsupported_source(source)),
            };
        }

        let extension = Path::new(source)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("pptx") => Ok(Self::Presentation),
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") | Some("md") => Ok(Self::Text),
            _ => Err(PptMakerError::unsupported_source(source)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Presentation => "presentation",
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted reference document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path or URL as given
    pub source: String,

    /// Short name used in context markers (file name or host)
    pub label: String,

    pub kind: SourceKind,

    /// Extracted text
    pub text: String,

    /// SHA-256 of the extracted text
    pub content_hash: String,
}

impl Document {
    pub fn new(source: impl Into<String>, label: impl Into<String>, kind: SourceKind, text: String) -> Self {
        Self {
            source: source.into(),
            label: label.into(),
            kind,
            content_hash: content_hash(&text),
            text,
        }
    }

    /// Length in chars
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Text of one slide from an existing presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideText {
    /// Zero-based slide position
    pub index: usize,

    /// Empty when no title could be identified
    pub title: String,

    pub bullets: Vec<String>,
}

impl SlideText {
    /// Title and bullets as one line each
    pub fn to_text(&self) -> String {
        std::iter::once(self.title.as_str())
            .chain(self.bullets.iter().map(String::as_str))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `Slide N: title` followed by `- bullet` lines
    pub fn to_outline_text(&self) -> String {
        let mut text = format!("Slide {}: {}", self.index + 1, self.title);
        for bullet in &self.bullets {
            text.push_str("\n- ");
            text.push_str(bullet);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_kinds() {
        assert_eq!(SourceKind::resolve("deck.pptx").unwrap(), SourceKind::Presentation);
        assert_eq!(SourceKind::resolve("/tmp/Report.PDF").unwrap(), SourceKind::Pdf);
        assert_eq!(SourceKind::resolve("notes.txt").unwrap(), SourceKind::Text);
        assert_eq!(SourceKind::resolve("README.md").unwrap(), SourceKind::Text);
        assert_eq!(SourceKind::resolve("https://example.com/a").unwrap(), SourceKind::Web);
        assert_eq!(SourceKind::resolve("http://example.com/page.pdf").unwrap(), SourceKind::Web);
    }

    #[test]
    fn test_resolve_unsupported() {
        for source in ["ftp://example.com/file.txt", "slides.ppt", "archive", "data.docx"] {
            let err = SourceKind::resolve(source).unwrap_err();
            assert!(matches!(err, PptMakerError::UnsupportedSourceKind(_)), "{source}");
        }
    }

    #[test]
    fn test_document_hash() {
        let doc = Document::new("a.txt", "a.txt", SourceKind::Text, "hello".to_string());
        assert_eq!(doc.content_hash, content_hash("hello"));
        assert_eq!(doc.char_count(), 5);
    }

    #[test]
    fn test_slide_text_rendering() {
        let slide = SlideText {
            index: 1,
            title: "Goals".to_string(),
            bullets: vec!["Ship it".to_string(), "Measure it".to_string()],
        };
        assert_eq!(slide.to_text(), "Goals\nShip it\nMeasure it");
        assert_eq!(slide.to_outline_text(), "Slide 2: Goals\n- Ship it\n- Measure it");
    }
}
