use pptmaker_common::{PptMakerError, Result};
use std::path::Path;
use tracing::debug;

/// Extract the text of every page of a PDF.
///
/// Blocking; callers on the async runtime go through `spawn_blocking`.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(PptMakerError::source_unavailable(
            path.display().to_string(),
            "file not found",
        ));
    }

    let text = pdf_extract::extract_text(path)
        .map_err(|e| PptMakerError::extraction(format!("{}: {}", path.display(), e)))?;
    debug!("Extracted {} chars from PDF {}", text.len(), path.display());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pdf() {
        let err = extract_pdf_text(Path::new("/nonexistent/report.pdf")).unwrap_err();
        assert!(matches!(err, PptMakerError::SourceUnavailable { .. }));
    }
}
