use pptmaker_common::{PptMakerError, Result, MAX_SLIDES, MIN_SLIDES};
use pptmaker_llm::SlideOutline;
use tracing::info;

use crate::context::RunContext;
use crate::reference::{IngestReport, ReferenceProcessor};

/// Generation request options
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub num_slides: usize,

    /// Reference files or URLs
    pub sources: Vec<String>,

    /// Sharpen each slide's bullets with a second model call
    pub enhance: bool,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, num_slides: usize) -> Self {
        Self {
            topic: topic.into(),
            num_slides,
            sources: Vec::new(),
            enhance: false,
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_enhance(mut self, enhance: bool) -> Self {
        self.enhance = enhance;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(PptMakerError::invalid_input("Topic cannot be empty"));
        }
        if !(MIN_SLIDES..=MAX_SLIDES).contains(&self.num_slides) {
            return Err(PptMakerError::invalid_input(format!(
                "Number of slides must be between {} and {}, got {}",
                MIN_SLIDES, MAX_SLIDES, self.num_slides
            )));
        }
        Ok(())
    }
}

/// Generation result
#[derive(Debug)]
pub struct GenerationReport {
    pub outline: SlideOutline,
    pub warnings: Vec<String>,

    /// The placeholder outline replaced an unparseable response
    pub used_fallback: bool,

    pub ingest: IngestReport,

    /// Length of the retrieval context in chars
    pub context_chars: usize,
}

/// Topic to outline, optionally grounded in reference material
pub struct GenerationPipeline<'a> {
    ctx: &'a RunContext,
}

impl<'a> GenerationPipeline<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    /// Execute the generation workflow
    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationReport> {
        request.validate()?;
        let topic = request.topic.trim();
        info!("Starting generation - Topic: {}, Slides: {}", topic, request.num_slides);

        // Phase 1: reference material
        let mut ingest = IngestReport::default();
        let mut context = String::new();
        if !request.sources.is_empty() {
            let processor = ReferenceProcessor::from_context(self.ctx);
            ingest = processor.ingest(&request.sources).await;
            if !ingest.documents.is_empty() {
                context = processor
                    .build_context(topic, &ingest.documents, self.ctx.config().top_k)
                    .await?;
            }
        }

        // Phase 2: outline
        let generator = self.ctx.generator();
        let generated = generator
            .generate(topic, request.num_slides, Some(context.as_str()).filter(|c| !c.is_empty()))
            .await?;
        let mut outline = generated.outline;

        // Phase 3: enhancement
        if request.enhance && !generated.used_fallback {
            info!("Enhancing {} slides", outline.len());
            for slide in outline.slides.iter_mut() {
                slide.bullets = generator.enhance_slide(&slide.title, &slide.bullets).await?;
            }
        }

        info!(
            "Generation completed - {} slides{}",
            outline.len(),
            if generated.used_fallback { " (fallback outline)" } else { "" }
        );

        Ok(GenerationReport {
            outline,
            warnings: generated.warnings,
            used_fallback: generated.used_fallback,
            ingest,
            context_chars: context.chars().count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptmaker_common::AppConfig;
    use pptmaker_llm::testing::StubProvider;
    use pptmaker_llm::{fallback_outline, ProviderKind};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn context(stub: Arc<StubProvider>) -> RunContext {
        RunContext::new(AppConfig::default(), stub, "llama3.2").unwrap()
    }

    const TWO_SLIDES: &str = r#"{"title": "Tides", "slides": [
        {"title": "What Are Tides", "content": ["Ocean rise and fall"]},
        {"title": "Causes", "content": ["Moon gravity", "Sun gravity"]}]}"#;

    #[tokio::test]
    async fn test_generate_without_sources() {
        let stub = Arc::new(StubProvider::new(ProviderKind::Ollama).with_response(TWO_SLIDES));
        let ctx = context(stub.clone());

        let report = GenerationPipeline::new(&ctx)
            .run(&GenerationRequest::new("Tides", 2))
            .await
            .unwrap();

        assert_eq!(report.outline.title, "Tides");
        assert_eq!(report.outline.slides[1].bullets, vec!["Moon gravity", "Sun gravity"]);
        assert!(!report.used_fallback);
        assert_eq!(report.context_chars, 0);
        assert!(!stub.prompts()[0].contains("reference materials"));
    }

    #[tokio::test]
    async fn test_generate_with_sources_and_enhancement() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("moon.txt");
        std::fs::write(&notes, "The moon's gravity pulls ocean water toward it.").unwrap();

        let stub = Arc::new(
            StubProvider::new(ProviderKind::Ollama)
                .with_response(TWO_SLIDES)
                .with_response("Oceans rise twice daily\nLevels vary by coastline")
                .with_response("Here are the improved points:\nLunar pull dominates\nSolar pull adds"),
        );
        let ctx = context(stub.clone());
        let request = GenerationRequest::new("Tides", 2)
            .with_sources(vec![
                notes.to_string_lossy().into_owned(),
                "/nonexistent/missing.pdf".to_string(),
            ])
            .with_enhance(true);

        let report = GenerationPipeline::new(&ctx).run(&request).await.unwrap();

        assert_eq!(report.ingest.documents.len(), 1);
        assert_eq!(report.ingest.failures.len(), 1);
        assert!(report.context_chars > 0);
        assert!(stub.prompts()[0].contains("[Source: moon.txt]"));
        assert_eq!(
            report.outline.slides[0].bullets,
            vec!["Oceans rise twice daily", "Levels vary by coastline"]
        );
        assert_eq!(report.outline.slides[1].bullets, vec!["Lunar pull dominates", "Solar pull adds"]);
    }

    #[tokio::test]
    async fn test_unparseable_response_uses_fallback() {
        let stub = Arc::new(StubProvider::new(ProviderKind::LmStudio).with_response("Sorry, no."));
        let ctx = context(stub.clone());
        let request = GenerationRequest::new("Tides", 3).with_enhance(true);

        let report = GenerationPipeline::new(&ctx).run(&request).await.unwrap();
        assert!(report.used_fallback);
        assert_eq!(report.outline, fallback_outline("Tides", 3));
        // No enhancement calls on placeholder content
        assert_eq!(stub.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_validation() {
        let ctx = context(Arc::new(StubProvider::new(ProviderKind::Ollama)));
        let pipeline = GenerationPipeline::new(&ctx);

        for request in [
            GenerationRequest::new("   ", 5),
            GenerationRequest::new("Tides", 1),
            GenerationRequest::new("Tides", 21),
        ] {
            let err = pipeline.run(&request).await.unwrap_err();
            assert!(matches!(err, PptMakerError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_fatal() {
        let ctx = context(Arc::new(StubProvider::new(ProviderKind::Ollama).failing()));
        let err = GenerationPipeline::new(&ctx)
            .run(&GenerationRequest::new("Tides", 4))
            .await
            .unwrap_err();
        assert!(matches!(err, PptMakerError::Provider(_)));
    }
}
