use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ragkit_answer::{AnswerComposer, OllamaGenerator, RagAssistant};
use ragkit_core::config::{Config, Settings};
use ragkit_core::sources::load_text_sources;
use ragkit_core::{Chunker, Error, GroundedAnswer, ScoredDocument, SourceText};
use ragkit_embed::{embedder_from_config, Encoder};
use ragkit_pipeline::{PipelineStatus, RetrievalPipeline};
use ragkit_vector::IndexStore;

#[derive(Parser)]
#[command(name = "ragkit", version, about = "Retrieval-augmented question answering over local text files")]
struct Cli {
    /// Directory of `.txt` sources (defaults to `data.source_dir`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the index (and persist it when `store.enabled`)
    Index {
        /// Ignore any persisted snapshot and re-embed everything
        #[arg(long)]
        rebuild: bool,
    },
    /// Show the chunks closest to a query
    Search {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Answer a question from the retrieved chunks
    Ask {
        question: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Ask the model directly, without retrieval
        #[arg(long)]
        baseline: bool,
    },
    /// Print the grounded answer next to the baseline answer
    Compare {
        question: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    info!(env = config.env_name(), "configuration loaded");

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| PathBuf::from(&settings.data.source_dir));

    if let Command::Ask { question, baseline: true, .. } = &cli.command {
        let composer = AnswerComposer::with_config(Arc::new(OllamaGenerator::new(&settings.generation, settings.retry)?), &settings.generation);
        println!("{}", composer.compose_baseline(question));
        return Ok(());
    }

    let sources = read_sources(&data_dir);
    let pipeline = Arc::new(build_pipeline(&settings)?);
    prepare(&pipeline, &sources, &settings, matches!(cli.command, Command::Index { rebuild: true }))?;

    let top_k = |k: Option<usize>| k.unwrap_or(settings.retrieval.top_k);
    match cli.command {
        Command::Index { .. } => {
            if let Some(stats) = pipeline.stats() {
                println!("✅ Indexed {} chunks (dimension {})", stats.total_vectors, stats.dimension);
            }
        }
        Command::Search { query, top_k: k } => {
            let hits = pipeline.ask(&query, top_k(k))?;
            print_hits(&hits);
        }
        Command::Ask { question, top_k: k, .. } => {
            let assistant = assistant(pipeline, &settings)?;
            print_answer(&assistant.ask(&question, top_k(k))?);
        }
        Command::Compare { question, top_k: k } => {
            let assistant = assistant(pipeline, &settings)?;
            let cmp = assistant.compare(&question, top_k(k))?;
            println!("=== With retrieval ===");
            print_answer(&cmp.grounded);
            println!("\n=== Without retrieval ===");
            println!("{}", cmp.baseline);
        }
    }
    Ok(())
}

fn read_sources(dir: &std::path::Path) -> Vec<SourceText> {
    match load_text_sources(dir) {
        Ok(sources) => sources,
        Err(err) => {
            warn!(%err, "no sources loaded");
            Vec::new()
        }
    }
}

fn build_pipeline(settings: &Settings) -> Result<RetrievalPipeline> {
    let chunker = Chunker::new(settings.chunking)?;
    let backend = embedder_from_config(&settings.embedding)?;
    let encoder = Encoder::new(backend, settings.retry).with_progress(settings.embedding.show_progress);
    Ok(RetrievalPipeline::new(chunker, encoder, settings.embedding.batch_size)?)
}

/// Restores a matching persisted snapshot when the store is enabled, and
/// otherwise builds the index and persists it. A failing store degrades to
/// an in-memory index.
fn prepare(pipeline: &RetrievalPipeline, sources: &[SourceText], settings: &Settings, rebuild: bool) -> Result<()> {
    if !settings.store.enabled {
        pipeline.prepare(sources)?;
        return Ok(());
    }
    let rt = tokio::runtime::Runtime::new()?;
    match prepare_with_store(&rt, pipeline, sources, settings, rebuild) {
        Err(Error::Storage(msg)) => {
            warn!(%msg, "index store unavailable, continuing without persistence");
            if pipeline.status() != PipelineStatus::Ready {
                pipeline.prepare(sources)?;
            }
            Ok(())
        }
        other => Ok(other?),
    }
}

fn prepare_with_store(
    rt: &tokio::runtime::Runtime,
    pipeline: &RetrievalPipeline,
    sources: &[SourceText],
    settings: &Settings,
    rebuild: bool,
) -> ragkit_core::Result<()> {
    let store = rt.block_on(IndexStore::open(&settings.store.uri))?;
    let fingerprint = pipeline.fingerprint(sources);

    if rebuild {
        rt.block_on(store.invalidate())?;
    } else if let Some(index) = rt.block_on(store.load(&fingerprint))? {
        return pipeline.restore(index);
    }

    pipeline.prepare(sources)?;
    if let Some(index) = pipeline.snapshot() {
        rt.block_on(store.save(&index, &fingerprint))?;
    }
    Ok(())
}

fn assistant(pipeline: Arc<RetrievalPipeline>, settings: &Settings) -> Result<RagAssistant> {
    let generator = OllamaGenerator::new(&settings.generation, settings.retry)?;
    Ok(RagAssistant::new(pipeline, AnswerComposer::with_config(Arc::new(generator), &settings.generation)))
}

fn print_hits(hits: &[ScoredDocument]) {
    if hits.is_empty() {
        println!("No results");
        return;
    }
    for (i, hit) in hits.iter().enumerate() {
        let meta = &hit.document.metadata;
        println!("{}. [{:.3}] {} (chunk {}, word {})", i + 1, hit.score, meta.source, meta.chunk_id, meta.start_offset);
        println!("   {}", preview(&hit.document.content, 200));
    }
}

fn print_answer(answer: &GroundedAnswer) {
    println!("{}", answer.answer);
    if !answer.citations.is_empty() {
        println!("\nSources:");
        for c in &answer.citations {
            println!("  [source {}] {} (chunk {}, score {:.3})", c.marker, c.source, c.chunk_id, c.score);
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
