use regex::Regex;
use std::sync::OnceLock;

/// Paragraphs longer than this many words are split into sentences
const MAX_BULLET_WORDS: usize = 25;

struct MarkupPatterns {
    blocks: Vec<Regex>,
    comments: Regex,
    block_tags: Regex,
    tags: Regex,
    spaces: Regex,
    blank_lines: Regex,
    sentence_end: Regex,
}

fn patterns() -> &'static MarkupPatterns {
    static PATTERNS: OnceLock<MarkupPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| MarkupPatterns {
        blocks: ["script", "style", "noscript", "svg", "head"]
            .iter()
            .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b.*?</{tag}\s*>")).expect("valid block regex"))
            .collect(),
        comments: Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"),
        block_tags: Regex::new(r"(?i)</?(p|div|br|li|h[1-6]|tr|section|article|ul|ol|table)\b[^>]*>")
            .expect("valid block tag regex"),
        tags: Regex::new(r"<[^>]+>").expect("valid tag regex"),
        spaces: Regex::new(r"[ \t\u{a0}]+").expect("valid space regex"),
        blank_lines: Regex::new(r"\n\s*\n(\s*\n)*").expect("valid blank line regex"),
        sentence_end: Regex::new(r"([.!?])\s+").expect("valid sentence regex"),
    })
}

/// Trim lines and collapse runs of blank lines into one
pub fn normalize_text(text: &str) -> String {
    let re = patterns();
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = text
        .lines()
        .map(|line| re.spaces.replace_all(line.trim(), " ").to_string())
        .collect();
    let joined = lines.join("\n");
    re.blank_lines.replace_all(joined.trim(), "\n\n").to_string()
}

/// Decode the handful of entities common in page text
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Reduce an HTML page to readable text
pub fn strip_markup(html: &str) -> String {
    let re = patterns();
    let mut text = html.to_string();
    for block in &re.blocks {
        text = block.replace_all(&text, " ").into_owned();
    }
    let text = re.comments.replace_all(&text, " ");
    let text = re.block_tags.replace_all(&text, "\n");
    let text = re.tags.replace_all(&text, " ");
    normalize_text(&decode_entities(&text))
}

/// Split a shape's text into bullets.
///
/// One bullet per non-empty line; lines over 25 words are split at
/// sentence ends.
pub fn split_to_bullets(text: &str) -> Vec<String> {
    let re = patterns();
    let mut bullets = Vec::new();

    for line in text.lines() {
        let line = re.spaces.replace_all(line.trim(), " ");
        let line = line.trim_start_matches(['•', '-', '–', '*']).trim();
        if line.is_empty() {
            continue;
        }

        if line.split_whitespace().count() > MAX_BULLET_WORDS {
            let marked = re.sentence_end.replace_all(line, "$1\n");
            bullets.extend(
                marked
                    .lines()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        } else {
            bullets.push(line.to_string());
        }
    }

    bullets
}
