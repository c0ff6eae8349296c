use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pptmaker_common::{logger, AppConfig, ProviderPreference};
use pptmaker_llm::ProviderSelector;
use pptmaker_pipeline::{
    improved_filename, timestamped_filename, GenerationPipeline, GenerationRequest, ImprovementOptions,
    ImprovementPipeline, OutputFormat, RunContext,
};
use std::path::PathBuf;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "pptmaker")]
#[command(about = "PPT Maker - presentation outlines from a local LLM server", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// auto, ollama or lm-studio
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Base URL of the provider; requires --provider ollama or lm-studio
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an outline for a topic
    Generate {
        topic: String,

        /// Number of slides (2-20)
        #[arg(short = 's', long)]
        slides: Option<usize>,

        /// Reference file path or URL (repeatable)
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Skip per-slide bullet enhancement
        #[arg(long)]
        no_enhance: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Deduplicate and reorganize an existing .pptx deck
    Improve {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Similarity above which a slide is dropped as a duplicate
        #[arg(long)]
        threshold: Option<f32>,

        #[arg(long)]
        outline_model: Option<String>,

        #[arg(long)]
        embed_model: Option<String>,

        /// Target slide count (defaults to the surviving slides)
        #[arg(short = 's', long)]
        slides: Option<usize>,

        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// List models offered by the selected provider
    Models,

    /// Check which providers are reachable
    Check,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    // Command-line flags override file and environment
    if let Some(provider) = &cli.provider {
        config.provider = provider.parse::<ProviderPreference>()?;
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();

    let config = load_config(&cli)?;
    match cli.command {
        Commands::Generate { .. } | Commands::Improve { .. } => {
            let log_file = logger::setup_logging(&config.log_dir, &config.log_level)?;
            tracing::debug!("Logging to {}", log_file.display());
        }
        // Read-only commands leave no log file behind
        Commands::Models | Commands::Check => logger::setup_console_logging(&config.log_level)?,
    }

    match cli.command {
        Commands::Generate {
            topic,
            slides,
            sources,
            no_enhance,
            output,
            format,
        } => {
            let num_slides = slides.unwrap_or(config.default_slides);
            config.ensure_directories()?;
            let ctx = RunContext::resolve(config).await?;

            let request = GenerationRequest::new(topic, num_slides)
                .with_sources(sources)
                .with_enhance(!no_enhance);
            let report = GenerationPipeline::new(&ctx).run(&request).await?;

            for failure in &report.ingest.failures {
                tracing::warn!("Skipped source {}: {}", failure.source, failure.error);
            }
            for warning in &report.warnings {
                tracing::warn!("{}", warning);
            }

            let writer = format.writer();
            let path = output.unwrap_or_else(|| {
                ctx.config()
                    .get_output_path(&timestamped_filename("presentation", writer.extension()))
            });
            let written = writer.write(&report.outline, &path)?;

            println!("{}", written.display());
        }
        Commands::Improve {
            input,
            output,
            threshold,
            outline_model,
            embed_model,
            slides,
            format,
        } => {
            if !input.exists() {
                bail!("Input file not found: {}", input.display());
            }
            config.ensure_directories()?;
            let ctx = RunContext::resolve(config).await?;

            let options = ImprovementOptions {
                outline_model,
                embed_model,
                threshold,
                num_slides: slides,
            };
            let report = ImprovementPipeline::new(&ctx).improve(&input, &options).await?;

            tracing::info!(
                "Removed {} duplicate slides, {} remain",
                report.removed(),
                report.kept.len()
            );
            for warning in &report.warnings {
                tracing::warn!("{}", warning);
            }

            let writer = format.writer();
            let path = output.unwrap_or_else(|| {
                ctx.config()
                    .get_output_path(&improved_filename(&input, writer.extension()))
            });
            let written = writer.write(&report.outline, &path)?;

            println!("{}", written.display());
        }
        Commands::Models => {
            let client = ProviderSelector::from_config(&config).select().await?;
            let models = client
                .list_models()
                .await
                .with_context(|| format!("Failed to list models from {}", client.identity()))?;

            println!("{} at {}", client.kind(), client.base_url());
            for model in models {
                println!("  {}", model);
            }
        }
        Commands::Check => {
            let selector = ProviderSelector::from_config(&config);
            let endpoints = match selector.candidates() {
                [] => {
                    // Explicit provider: probe just that one
                    let client = selector.select().await?;
                    vec![client]
                }
                candidates => candidates
                    .iter()
                    .map(|endpoint| selector.build_client(endpoint))
                    .collect::<pptmaker_common::Result<Vec<_>>>()?,
            };

            let mut any_available = false;
            for client in endpoints {
                let healthy = client.health_check().await;
                any_available |= healthy;
                println!(
                    "{:<10} {:<28} {}",
                    client.kind().to_string(),
                    client.base_url(),
                    if healthy { "available" } else { "unreachable" }
                );
            }

            if !any_available {
                bail!("No AI provider available");
            }
        }
    }

    Ok(())
}
