//! Slide text extraction from `.pptx` packages.
//!
//! Slides are read in presentation order, as listed by `<p:sldIdLst>` in
//! `ppt/presentation.xml` and resolved through its relationships. Packages
//! without that part fall back to `slideN.xml` part-number order. Every
//! text shape contributes its DrawingML paragraphs.

use pptmaker_common::{PptMakerError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

use crate::postprocess::split_to_bullets;
use crate::types::SlideText;

/// Longest text (in words) accepted as a title when no title placeholder exists
const MAX_TITLE_WORDS: usize = 12;

#[derive(Debug, Default)]
struct ShapeText {
    /// `type` attribute of the shape's placeholder, if any
    placeholder: Option<String>,
    paragraphs: Vec<String>,
}

impl ShapeText {
    fn is_title_placeholder(&self) -> bool {
        matches!(self.placeholder.as_deref(), Some("title") | Some("ctrTitle"))
    }

    fn word_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.split_whitespace().count()).sum()
    }
}

fn placeholder_type(element: &BytesStart<'_>) -> String {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"type")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
        // A placeholder without a type is a body placeholder
        .unwrap_or_else(|| "body".to_string())
}

/// Text shapes of one slide part, in document order
fn parse_slide_xml(xml: &str) -> Result<Vec<ShapeText>> {
    let mut reader = Reader::from_str(xml);

    let mut shapes = Vec::new();
    let mut current: Option<ShapeText> = None;
    let mut shape_depth = 0usize;
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sp" | b"graphicFrame" => {
                    if shape_depth == 0 {
                        current = Some(ShapeText::default());
                    }
                    shape_depth += 1;
                }
                b"ph" => {
                    if let Some(shape) = current.as_mut() {
                        shape.placeholder = Some(placeholder_type(&e));
                    }
                }
                b"p" if current.is_some() => paragraph = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"ph" => {
                    if let Some(shape) = current.as_mut() {
                        shape.placeholder = Some(placeholder_type(&e));
                    }
                }
                b"br" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push(' ');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                if let Some(p) = paragraph.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| PptMakerError::extraction(format!("invalid slide text: {}", e)))?;
                    p.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let (Some(p), Some(shape)) = (paragraph.take(), current.as_mut()) {
                        let p = p.split_whitespace().collect::<Vec<_>>().join(" ");
                        if !p.is_empty() {
                            shape.paragraphs.push(p);
                        }
                    }
                }
                b"sp" | b"graphicFrame" => {
                    shape_depth = shape_depth.saturating_sub(1);
                    if shape_depth == 0 {
                        if let Some(shape) = current.take().filter(|s| !s.paragraphs.is_empty()) {
                            shapes.push(shape);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PptMakerError::extraction(format!(
                    "malformed slide XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Pick the title shape and turn the rest into bullets
fn slide_from_shapes(index: usize, shapes: Vec<ShapeText>) -> SlideText {
    let title_position = shapes.iter().position(ShapeText::is_title_placeholder).or_else(|| {
        shapes.iter().position(|s| {
            let words = s.word_count();
            words > 0 && words <= MAX_TITLE_WORDS
        })
    });

    let mut title = String::new();
    let mut bullets = Vec::new();
    for (position, shape) in shapes.into_iter().enumerate() {
        if Some(position) == title_position {
            title = shape.paragraphs.join(" ");
        } else {
            bullets.extend(split_to_bullets(&shape.paragraphs.join("\n")));
        }
    }

    SlideText { index, title, bullets }
}

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Number N of a `ppt/slides/slideN.xml` part
fn slide_number(name: &str) -> Option<usize> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn xml_error(part: &str, position: impl std::fmt::Display, e: quick_xml::Error) -> PptMakerError {
    PptMakerError::extraction(format!("malformed {} at position {}: {}", part, position, e))
}

/// Relationship ids of `<p:sldId>` entries, in presentation order
fn slide_rids(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut rids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sldId" => {
                // `r:id`; the unprefixed `id` is the numeric slide id
                let rid = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.local_name().as_ref() == b"id" && attr.key.as_ref() != b"id")
                    .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());
                if let Some(rid) = rid {
                    rids.push(rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(PRESENTATION_PART, reader.buffer_position(), e)),
            _ => {}
        }
    }

    Ok(rids)
}

/// `Id -> Target` of every relationship in a `.rels` part
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(value),
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(PRESENTATION_RELS, reader.buffer_position(), e)),
            _ => {}
        }
    }

    Ok(targets)
}

/// Resolve a relationship target of `ppt/presentation.xml` to a part name
fn resolve_target(target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut xml = String::new();
    archive
        .by_name(name)
        .map_err(|e| PptMakerError::extraction(format!("cannot open {}: {}", name, e)))?
        .read_to_string(&mut xml)?;
    Ok(xml)
}

/// Slide part names in the order the deck presents them
fn slide_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    let names: HashSet<String> = archive.file_names().map(str::to_string).collect();

    if names.contains(PRESENTATION_PART) && names.contains(PRESENTATION_RELS) {
        let rids = slide_rids(&read_part(archive, PRESENTATION_PART)?)?;
        let targets = relationship_targets(&read_part(archive, PRESENTATION_RELS)?)?;

        let ordered: Vec<String> = rids
            .iter()
            .filter_map(|rid| {
                let part = targets.get(rid).map(|t| resolve_target(t));
                if part.is_none() {
                    debug!("Slide relationship {} has no target", rid);
                }
                part
            })
            .filter(|part| names.contains(part))
            .collect();
        if !ordered.is_empty() {
            return Ok(ordered);
        }
        debug!("No slides resolved from {}, using part numbers", PRESENTATION_PART);
    }

    let mut numbered: Vec<(usize, String)> = names
        .iter()
        .filter_map(|name| slide_number(name).map(|n| (n, name.clone())))
        .collect();
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

/// Extract slides from any seekable `.pptx` byte source
pub fn extract_slides_from_reader<R: Read + Seek>(reader: R) -> Result<Vec<SlideText>> {
    let mut archive =
        ZipArchive::new(reader).map_err(|e| PptMakerError::extraction(format!("not a valid .pptx package: {}", e)))?;

    let parts = slide_parts(&mut archive)?;
    let mut slides = Vec::with_capacity(parts.len());
    for (index, name) in parts.iter().enumerate() {
        let shapes = parse_slide_xml(&read_part(&mut archive, name)?)?;
        slides.push(slide_from_shapes(index, shapes));
    }

    debug!("Extracted {} slides", slides.len());
    Ok(slides)
}

/// Extract slides from a `.pptx` file
pub fn extract_slides(path: &Path) -> Result<Vec<SlideText>> {
    let file = File::open(path).map_err(|e| PptMakerError::source_unavailable(path.display().to_string(), e.to_string()))?;
    extract_slides_from_reader(BufReader::new(file))
}

/// Render slides as `Slide N: title` blocks for use as reference text
pub fn render_slides(slides: &[SlideText]) -> String {
    slides
        .iter()
        .filter(|s| !s.title.is_empty() || !s.bullets.is_empty())
        .map(SlideText::to_outline_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn shape(placeholder: Option<&str>, paragraphs: &[&str]) -> String {
        let ph = match placeholder {
            Some(kind) => format!(r#"<p:nvPr><p:ph type="{}"/></p:nvPr>"#, kind),
            None => "<p:nvPr/>".to_string(),
        };
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", p))
            .collect();
        format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Shape\"/><p:cNvSpPr/>{}</p:nvSpPr>\
             <p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>",
            ph, body
        )
    }

    pub(crate) fn slide_xml(shapes: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            shapes.concat()
        )
    }

    /// Minimal package holding only the given slide parts
    pub(crate) fn build_pptx(slides: &[(usize, String)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<Types/>").unwrap();
        for (number, xml) in slides {
            zip.start_file(format!("ppt/slides/slide{}.xml", number), options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.start_file("ppt/slides/_rels/slide1.xml.rels", options).unwrap();
        zip.write_all(b"<Relationships/>").unwrap();
        zip.finish().unwrap().into_inner()
    }

    /// Package whose `sldIdLst` lists the slide parts in `order`
    fn build_ordered_pptx(slides: &[(usize, String)], order: &[usize]) -> Vec<u8> {
        let ids: String = order
            .iter()
            .enumerate()
            .map(|(i, n)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, n + 1))
            .collect();
        let rels: String = order
            .iter()
            .map(|n| {
                format!(
                    r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
                    n + 1,
                    n
                )
            })
            .collect();

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("ppt/presentation.xml", options).unwrap();
        write!(
            zip,
            r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            ids
        )
        .unwrap();
        zip.start_file("ppt/_rels/presentation.xml.rels", options).unwrap();
        write!(zip, "<Relationships>{}</Relationships>", rels).unwrap();
        for (number, xml) in slides {
            zip.start_file(format!("ppt/slides/slide{}.xml", number), options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub(crate) fn sample_deck() -> Vec<u8> {
        build_pptx(&[
            (
                2,
                slide_xml(&[
                    shape(None, &["A long opening paragraph that goes on well past twelve words before it finally ends"]),
                    shape(None, &["Market Overview"]),
                ]),
            ),
            (
                10,
                slide_xml(&[shape(Some("body"), &["Thanks"]), shape(Some("title"), &["Q &amp; A"])]),
            ),
            (
                1,
                slide_xml(&[
                    shape(Some("ctrTitle"), &["Quarterly Review"]),
                    shape(Some("body"), &["Revenue up", "Costs down"]),
                ]),
            ),
        ])
    }

    #[test]
    fn test_without_presentation_part_uses_slide_numbers() {
        let slides = extract_slides_from_reader(Cursor::new(sample_deck())).unwrap();
        let titles: Vec<_> = slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Quarterly Review", "Market Overview", "Q & A"]);
        assert_eq!(slides[0].bullets, vec!["Revenue up", "Costs down"]);
        assert_eq!(slides[2].bullets, vec!["Thanks"]);
        assert_eq!(slides.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_follows_presentation_slide_list() {
        let deck = build_ordered_pptx(
            &[
                (1, slide_xml(&[shape(Some("title"), &["Second In Deck"])])),
                (2, slide_xml(&[shape(Some("title"), &["First In Deck"])])),
            ],
            &[2, 1],
        );
        let slides = extract_slides_from_reader(Cursor::new(deck)).unwrap();
        let titles: Vec<_> = slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First In Deck", "Second In Deck"]);
        assert_eq!(slides[0].index, 0);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("slides/slide3.xml"), "ppt/slides/slide3.xml");
        assert_eq!(resolve_target("/ppt/slides/slide3.xml"), "ppt/slides/slide3.xml");
        assert_eq!(resolve_target("../ppt/slides/./slide3.xml"), "ppt/slides/slide3.xml");
    }

    #[test]
    fn test_first_short_shape_is_title() {
        let slides = extract_slides_from_reader(Cursor::new(sample_deck())).unwrap();
        assert_eq!(slides[1].title, "Market Overview");
        assert_eq!(slides[1].bullets.len(), 1);
        assert!(slides[1].bullets[0].starts_with("A long opening paragraph"));
    }

    #[test]
    fn test_render_slides() {
        let slides = extract_slides_from_reader(Cursor::new(sample_deck())).unwrap();
        let text = render_slides(&slides);
        assert!(text.starts_with("Slide 1: Quarterly Review\n- Revenue up\n- Costs down\n\nSlide 2: Market Overview"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract_slides_from_reader(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, PptMakerError::Extraction(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = extract_slides(Path::new("/nonexistent/deck.pptx")).unwrap_err();
        assert!(matches!(err, PptMakerError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("ppt/slides/slide12.xml"), Some(12));
        assert_eq!(slide_number("ppt/slides/_rels/slide1.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }
}
