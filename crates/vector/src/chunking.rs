//! Fixed-size overlapping windows over document text.
//!
//! Sizes and offsets count Unicode scalar values (`char`s), so a window never
//! splits a multi-byte character.

use pptmaker_common::{PptMakerError, Result};

use crate::types::TextChunk;

/// Split text into windows of `size` chars advancing by `size - overlap`
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<TextChunk>> {
    chunk_document(0, text, size, overlap)
}

/// Same as [`chunk_text`], tagging every chunk with `document`.
///
/// The last window is shorter when the text runs out. Empty text yields no
/// chunks.
pub fn chunk_document(document: usize, text: &str, size: usize, overlap: usize) -> Result<Vec<TextChunk>> {
    if size == 0 || overlap >= size {
        return Err(PptMakerError::InvalidChunkParameters { size, overlap });
    }

    // Byte offset of every char boundary, including the end of the text
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let step = size - overlap;
    let mut chunks = Vec::with_capacity(char_count.div_ceil(step));
    let mut start = 0;

    while start < char_count {
        let end = (start + size).min(char_count);
        chunks.push(TextChunk {
            document,
            index: chunks.len(),
            text: text[boundaries[start]..boundaries[end]].to_string(),
            start,
            end,
        });

        if end == char_count {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Concatenate chunks of one document, skipping the overlapping prefix of each
pub fn reassemble(chunks: &[TextChunk]) -> String {
    let mut text = String::new();
    let mut covered = 0usize;

    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start);
        text.extend(chunk.text.chars().skip(skip));
        covered = covered.max(chunk.end);
    }

    text
}
