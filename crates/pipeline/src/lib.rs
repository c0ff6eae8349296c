//! PPT Maker pipelines
//!
//! Per-run context, reference ingestion, outline generation, deck
//! improvement and outline output

pub mod context;
pub mod generate;
pub mod improve;
pub mod reference;
pub mod writer;

pub use context::RunContext;
pub use generate::{GenerationPipeline, GenerationReport, GenerationRequest};
pub use improve::{condensed_outline, ImprovementOptions, ImprovementPipeline, ImprovementReport};
pub use reference::{IngestReport, ReferenceProcessor, ReferenceSettings, SourceFailure};
pub use writer::{
    improved_filename, timestamped_filename, JsonOutlineWriter, MarkdownOutlineWriter, OutlineWriter, OutputFormat,
};
