//! Slide outline types and the lenient response parser.
//!
//! Two response shapes are accepted, tried in this order:
//!
//! 1. A JSON object anywhere in the text:
//!    `{"title": "...", "slides": [{"title": "...", "content": ["..."]}]}`.
//!    `sections` may replace `slides`, `points`/`bullets` may replace
//!    `content`, and an optional `conclusion` object becomes the last slide.
//! 2. Plain text, one line per element:
//!
//!    ```text
//!    Slide 1: Title          also "## Slide 1 - Title", "**Slide 1: Title**", "## Title"
//!    - bullet                also "*", "•", "1.", "1)"
//!    ---                     explicit delimiter; the next plain line is the title
//!    Title: Some title       explicit title line
//!    ```
//!
//!    A single leading `# Heading` names the deck. Plain lines before the
//!    first slide are treated as preamble and ignored.
//!
//! Normalization never invents content: untitled slides are dropped,
//! bullets are capped at [`MAX_BULLETS`], excess slides are truncated and a
//! short response is reported rather than padded.

use pptmaker_common::{PptMakerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Bullet cap per slide
pub const MAX_BULLETS: usize = 6;

/// One slide: a title and up to [`MAX_BULLETS`] bullets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub bullets: Vec<String>,
}

impl Slide {
    pub fn new(title: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            title: title.into(),
            bullets,
        }
    }
}

/// Ordered slides of a presentation plus the deck title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideOutline {
    pub title: String,
    pub slides: Vec<Slide>,
}

impl SlideOutline {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// Parser output with the normalization notes
#[derive(Debug, Clone)]
pub struct ParsedOutline {
    pub outline: SlideOutline,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
struct RawSlide {
    title: Option<String>,
    bullets: Vec<String>,
    /// Opened by a header or delimiter rather than by leading text
    explicit: bool,
}

impl RawSlide {
    fn explicit(title: Option<String>) -> Self {
        Self {
            title,
            bullets: Vec::new(),
            explicit: true,
        }
    }

    fn is_empty(&self) -> bool {
        self.title.is_none() && self.bullets.is_empty()
    }
}

/// Compiled line patterns for the plain-text grammar
struct LinePatterns {
    slide_header: Regex,
    heading: Regex,
    delimiter: Regex,
    bullet: Regex,
    title_label: Regex,
}

fn patterns() -> &'static LinePatterns {
    static PATTERNS: OnceLock<LinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LinePatterns {
        slide_header: Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:\*\*)?\s*slide\s+\d+\s*(?:[:.)\-–—]\s*)?(.*)$")
            .expect("valid slide header regex"),
        heading: Regex::new(r"^\s*(#{1,6})\s+(.+)$").expect("valid heading regex"),
        delimiter: Regex::new(r"^\s*(?:-{3,}|={3,}|\*{3,})\s*$").expect("valid delimiter regex"),
        bullet: Regex::new(r"^\s*(?:[-*•‣◦–]|\d{1,2}[.)])\s+(.*)$").expect("valid bullet regex"),
        title_label: Regex::new(r"(?i)^\s*(?:\*\*)?title(?:\*\*)?\s*:\s*(.+)$").expect("valid title regex"),
    })
}

/// Strip markdown emphasis and whitespace from a title or bullet
fn clean(text: &str) -> String {
    text.trim().trim_matches('*').trim().trim_matches('"').trim().to_string()
}

fn non_empty(text: &str) -> Option<String> {
    let cleaned = clean(text);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Slice from the first `{` to the last `}`
fn json_candidate(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn json_bullets(entry: &Value) -> Vec<String> {
    let list = ["content", "points", "bullets"]
        .iter()
        .find_map(|key| entry.get(*key));

    match list {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => item.get("text").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.lines().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn json_slide(entry: &Value) -> RawSlide {
    match entry {
        Value::String(title) => RawSlide::explicit(non_empty(title)),
        _ => RawSlide {
            title: entry.get("title").and_then(Value::as_str).and_then(non_empty),
            bullets: json_bullets(entry),
            explicit: true,
        },
    }
}

/// Parse the JSON shape; `None` when the text holds no usable object
fn parse_json(raw: &str) -> Option<(Option<String>, Vec<RawSlide>)> {
    let value: Value = serde_json::from_str(json_candidate(raw)?).ok()?;
    let entries = value
        .get("slides")
        .or_else(|| value.get("sections"))
        .and_then(Value::as_array)?;

    let mut slides: Vec<RawSlide> = entries.iter().map(json_slide).collect();
    if let Some(conclusion) = value.get("conclusion").filter(|c| c.is_object()) {
        slides.push(json_slide(conclusion));
    }

    let deck_title = value.get("title").and_then(Value::as_str).and_then(non_empty);
    Some((deck_title, slides))
}

/// Parse the plain-text grammar; `None` when no slide structure is present
fn parse_text(raw: &str) -> Option<(Option<String>, Vec<RawSlide>)> {
    let re = patterns();
    let mut deck_title = None;
    let mut blocks: Vec<RawSlide> = Vec::new();
    let mut current = RawSlide::default();
    let mut saw_structure = false;

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if re.delimiter.is_match(line) {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            current = RawSlide::explicit(None);
            saw_structure = true;
        } else if let Some(caps) = re.slide_header.captures(line) {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            current = RawSlide::explicit(non_empty(&caps[1]));
            saw_structure = true;
        } else if let Some(caps) = re.heading.captures(line) {
            let is_deck_title = caps[1].len() == 1
                && deck_title.is_none()
                && !current.explicit
                && !blocks.iter().any(|b| b.explicit);
            if is_deck_title {
                deck_title = non_empty(&caps[2]);
                continue;
            }
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            current = RawSlide::explicit(non_empty(&caps[2]));
            saw_structure = true;
        } else if let Some(caps) = re.bullet.captures(line) {
            if let Some(bullet) = non_empty(&caps[1]) {
                current.bullets.push(bullet);
                saw_structure = true;
            }
        } else if let Some(caps) = re.title_label.captures(line) {
            if current.title.is_some() {
                blocks.push(std::mem::take(&mut current));
                current = RawSlide::explicit(None);
            }
            current.title = non_empty(&caps[1]);
        } else if current.title.is_none() && !line.trim_end().ends_with(':') {
            current.title = non_empty(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    if !saw_structure {
        return None;
    }

    // Leading prose without bullets is preamble once real slides exist
    if blocks.iter().any(|b| b.explicit) {
        blocks.retain(|b| b.explicit || !b.bullets.is_empty());
    }

    Some((deck_title, blocks))
}

/// Parse a raw model response into at most `max_slides` slides.
///
/// Fails with [`PptMakerError::OutlineParse`] only when no titled slide
/// can be recovered.
pub fn parse_outline(raw: &str, max_slides: usize) -> Result<ParsedOutline> {
    if max_slides == 0 {
        return Err(PptMakerError::invalid_input("An outline needs at least one slide"));
    }

    let (deck_title, raw_slides) = parse_json(raw)
        .or_else(|| parse_text(raw))
        .ok_or_else(|| PptMakerError::outline_parse("no slide structure found in model response"))?;

    let mut warnings = Vec::new();
    let mut slides = Vec::with_capacity(raw_slides.len());

    for (position, raw_slide) in raw_slides.into_iter().enumerate() {
        let Some(title) = raw_slide.title else {
            warnings.push(format!("slide {} has no title and was dropped", position + 1));
            continue;
        };

        let mut bullets: Vec<String> = raw_slide
            .bullets
            .iter()
            .filter_map(|b| non_empty(b))
            .collect();
        if bullets.len() > MAX_BULLETS {
            warnings.push(format!(
                "slide '{}' had {} bullets, truncated to {}",
                title,
                bullets.len(),
                MAX_BULLETS
            ));
            bullets.truncate(MAX_BULLETS);
        }

        slides.push(Slide { title, bullets });
    }

    if slides.is_empty() {
        return Err(PptMakerError::outline_parse("model response contained no titled slides"));
    }

    if slides.len() > max_slides {
        warnings.push(format!(
            "model returned {} slides, truncated to {}",
            slides.len(),
            max_slides
        ));
        slides.truncate(max_slides);
    } else if slides.len() < max_slides {
        warnings.push(format!(
            "model returned {} of {} requested slides",
            slides.len(),
            max_slides
        ));
    }

    for warning in &warnings {
        warn!("Outline parse: {}", warning);
    }

    let title = deck_title.unwrap_or_else(|| slides[0].title.clone());
    Ok(ParsedOutline {
        outline: SlideOutline { title, slides },
        warnings,
    })
}

/// Deterministic placeholder outline used when a response cannot be parsed
pub fn fallback_outline(topic: &str, num_slides: usize) -> SlideOutline {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let topic = topic.trim();

    let mut slides = vec![Slide::new(topic, strings(&["Overview", "Key Topics", "Objectives"]))];

    if num_slides >= 3 {
        slides.push(Slide::new(
            "Introduction",
            strings(&["Background", "Context", "Importance", "Scope"]),
        ));
    }
    if num_slides >= 4 {
        slides.push(Slide::new(
            "Main Content",
            strings(&["Key Point 1", "Key Point 2", "Key Point 3", "Supporting Details"]),
        ));
    }
    for i in 4..num_slides {
        slides.push(Slide::new(
            format!("Additional Topic {}", i - 3),
            (1..=4).map(|j| format!("Point {}", j)).collect(),
        ));
    }
    if num_slides >= 2 {
        slides.push(Slide::new("Thank You", strings(&["Thank you for your attention!"])));
    }

    slides.truncate(num_slides);
    SlideOutline {
        title: topic.to_string(),
        slides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn titles(outline: &SlideOutline) -> Vec<&str> {
        outline.slides.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_parse_json_response() {
        let raw = r#"Sure! Here is the outline:
```json
{"title": "Rust in Production",
 "slides": [
   {"slide_number": 1, "title": "Why Rust", "content": ["Safety", "Speed"]},
   {"slide_number": 2, "title": "Adoption", "content": ["Cloud", "Embedded"]}
 ]}
```"#;
        let parsed = parse_outline(raw, 2).unwrap();
        assert_eq!(parsed.outline.title, "Rust in Production");
        assert_eq!(titles(&parsed.outline), vec!["Why Rust", "Adoption"]);
        assert_eq!(parsed.outline.slides[0].bullets, vec!["Safety", "Speed"]);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_parse_json_sections_with_conclusion() {
        let raw = r#"{"title": "Improved",
            "sections": [{"title": "Context", "points": ["a", " ", "b"]}],
            "conclusion": {"title": "Wrap-up", "points": ["Next steps"]}}"#;
        let parsed = parse_outline(raw, 2).unwrap();
        assert_eq!(titles(&parsed.outline), vec!["Context", "Wrap-up"]);
        assert_eq!(parsed.outline.slides[0].bullets, vec!["a", "b"]);
    }

    #[test]
    fn test_truncates_excess_slides_in_order() {
        let raw: String = (1..=7)
            .map(|i| format!("Slide {}: Topic {}\n- point {}\n", i, i, i))
            .collect();
        let parsed = parse_outline(&raw, 5).unwrap();
        assert_eq!(parsed.outline.len(), 5);
        assert_eq!(
            titles(&parsed.outline),
            vec!["Topic 1", "Topic 2", "Topic 3", "Topic 4", "Topic 5"]
        );
        assert!(parsed.warnings.iter().any(|w| w.contains("truncated to 5")));
    }

    #[test]
    fn test_caps_bullets() {
        let raw = "Slide 1: Many\n- 1\n- 2\n- 3\n- 4\n- 5\n- 6\n- 7\n- 8\n";
        let parsed = parse_outline(raw, 1).unwrap();
        assert_eq!(parsed.outline.slides[0].bullets.len(), MAX_BULLETS);
        assert_eq!(parsed.outline.slides[0].bullets.last().unwrap(), "6");
    }

    #[test]
    fn test_drops_untitled_slide_with_warning() {
        let raw = "Slide 1: Intro\n- hello\n---\n- orphan bullet\n---\nSummary\n- bye\n";
        let parsed = parse_outline(raw, 3).unwrap();
        assert_eq!(titles(&parsed.outline), vec!["Intro", "Summary"]);
        assert!(parsed.warnings.iter().any(|w| w.contains("no title")));
        assert!(parsed.warnings.iter().any(|w| w.contains("2 of 3")));
    }

    #[test]
    fn test_markdown_variants_and_preamble() {
        let raw = "Here is your presentation outline.\n\
                   # Ocean Health\n\
                   ## Slide 1 - **Overview**\n\
                   * Coral reefs\n\
                   1. Fisheries\n\
                   ## Pollution\n\
                   • Plastics\n\
                   Let me know if you want changes!\n";
        let parsed = parse_outline(raw, 2).unwrap();
        assert_eq!(parsed.outline.title, "Ocean Health");
        assert_eq!(titles(&parsed.outline), vec!["Overview", "Pollution"]);
        assert_eq!(parsed.outline.slides[0].bullets, vec!["Coral reefs", "Fisheries"]);
        assert_eq!(parsed.outline.slides[1].bullets, vec!["Plastics"]);
    }

    #[test]
    fn test_delimited_blocks_without_headers() {
        let raw = "Introduction\n- what\n- why\n---\nTitle: Details\n- how\n";
        let parsed = parse_outline(raw, 2).unwrap();
        assert_eq!(titles(&parsed.outline), vec!["Introduction", "Details"]);
    }

    #[test]
    fn test_complete_parse_failure() {
        let err = parse_outline("I'm sorry, I can't help with that.", 5).unwrap_err();
        assert!(matches!(err, PptMakerError::OutlineParse(_)));

        let err = parse_outline("", 5).unwrap_err();
        assert!(matches!(err, PptMakerError::OutlineParse(_)));

        let err = parse_outline("- only\n- bullets\n", 5).unwrap_err();
        assert!(matches!(err, PptMakerError::OutlineParse(_)));
    }

    #[test]
    fn test_zero_slides_rejected() {
        let err = parse_outline("Slide 1: A\n- b\n", 0).unwrap_err();
        assert!(matches!(err, PptMakerError::InvalidInput(_)));
    }

    #[test]
    fn test_fallback_outline() {
        let outline = fallback_outline("Solar Power", 5);
        assert_eq!(outline.title, "Solar Power");
        assert_eq!(
            titles(&outline),
            vec!["Solar Power", "Introduction", "Main Content", "Additional Topic 1", "Thank You"]
        );

        assert_eq!(titles(&fallback_outline("X", 2)), vec!["X", "Thank You"]);
        assert_eq!(fallback_outline("X", 8).len(), 8);
        assert_eq!(fallback_outline("X", 5), fallback_outline("X", 5));
    }
}
