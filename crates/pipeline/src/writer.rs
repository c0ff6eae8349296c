//! Outline output
//!
//! Producing a binary PowerPoint file is left to downstream tooling; the
//! writers here emit the outline in a structured form that such tooling
//! (or a person) can consume.

use chrono::Local;
use pptmaker_common::{PptMakerError, Result};
use pptmaker_llm::SlideOutline;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Serializes an outline to a file
pub trait OutlineWriter: Send + Sync {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn render(&self, outline: &SlideOutline) -> Result<String>;

    /// Render and write to `path`, creating parent directories
    fn write(&self, outline: &SlideOutline, path: &Path) -> Result<PathBuf> {
        let rendered = self.render(outline)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, rendered)?;
        info!("Outline saved: {}", path.display());
        Ok(path.to_path_buf())
    }
}

pub struct JsonOutlineWriter;

impl OutlineWriter for JsonOutlineWriter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, outline: &SlideOutline) -> Result<String> {
        Ok(serde_json::to_string_pretty(outline)?)
    }
}

pub struct MarkdownOutlineWriter;

impl OutlineWriter for MarkdownOutlineWriter {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, outline: &SlideOutline) -> Result<String> {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "# {}", outline.title);
        for (i, slide) in outline.slides.iter().enumerate() {
            let _ = writeln!(out, "\n## {}. {}\n", i + 1, slide.title);
            for bullet in &slide.bullets {
                let _ = writeln!(out, "- {}", bullet);
            }
        }
        Ok(out)
    }
}

/// Output formats selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn writer(self) -> Box<dyn OutlineWriter> {
        match self {
            OutputFormat::Json => Box::new(JsonOutlineWriter),
            OutputFormat::Markdown => Box::new(MarkdownOutlineWriter),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = PptMakerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            other => Err(PptMakerError::invalid_input(format!("Unknown output format: {}", other))),
        }
    }
}

/// `prefix_YYYYMMDD_HHMMSS.ext`
pub fn timestamped_filename(prefix: &str, extension: &str) -> String {
    format!("{}_{}.{}", prefix, Local::now().format("%Y%m%d_%H%M%S"), extension)
}

/// `<input stem>_improved_YYYYMMDD_HHMMSS.ext`
pub fn improved_filename(input: &Path, extension: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "presentation".to_string());
    timestamped_filename(&format!("{}_improved", stem), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptmaker_llm::Slide;
    use pretty_assertions::assert_eq;

    fn outline() -> SlideOutline {
        SlideOutline {
            title: "Tides".to_string(),
            slides: vec![
                Slide::new("Basics", vec!["Moon gravity".to_string(), "Two cycles a day".to_string()]),
                Slide::new("Summary", vec!["Predictable".to_string()]),
            ],
        }
    }

    #[test]
    fn test_markdown_render() {
        let rendered = MarkdownOutlineWriter.render(&outline()).unwrap();
        assert_eq!(
            rendered,
            "# Tides\n\n## 1. Basics\n\n- Moon gravity\n- Two cycles a day\n\n## 2. Summary\n\n- Predictable\n"
        );
    }

    #[test]
    fn test_json_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/deck.json");

        let written = JsonOutlineWriter.write(&outline(), &path).unwrap();
        assert_eq!(written, path);

        let parsed: SlideOutline = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, outline());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("pptx".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Markdown.writer().extension(), "md");
    }

    #[test]
    fn test_filenames() {
        let name = timestamped_filename("presentation", "json");
        assert!(name.starts_with("presentation_"));
        assert!(name.ends_with(".json"));
        // presentation_YYYYMMDD_HHMMSS.json
        assert_eq!(name.len(), "presentation_".len() + 15 + ".json".len());

        let improved = improved_filename(Path::new("/tmp/decks/q3 review.pptx"), "md");
        assert!(improved.starts_with("q3 review_improved_"));
        assert!(improved.ends_with(".md"));
    }
}
