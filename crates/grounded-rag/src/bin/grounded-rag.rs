//! Command-line front end
//!
//! Run with: cargo run -p grounded-rag -- ingest docs/*.pdf --ask "What changed?"

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grounded_rag::{
    ingestion::DocumentPipeline,
    providers::{ollama::ollama_providers, EmbeddingProvider, InMemoryVectorStore},
    QueryOptions, RagConfig, RagService,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "grounded-rag", version, about = "Grounded answers over prose and tabular documents")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest files into an in-memory knowledge base, optionally asking a question
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Question to answer once ingestion finishes
        #[arg(long)]
        ask: Option<String>,
        /// Maximum fragments used as context
        #[arg(long)]
        limit: Option<usize>,
        /// Minimum similarity for a fragment to be used
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Analyze a query's intent and suggested search terms
    Analyze { query: String },
    /// Print the fragments a file produces, without embedding them
    Inspect { file: PathBuf },
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Ollama-backed service over a fresh in-memory store
async fn build_service(config: &RagConfig) -> anyhow::Result<RagService> {
    let (embedder, llm) = ollama_providers(config)?;
    if !embedder.health_check().await? {
        tracing::warn!("Ollama not available at {}", config.ollama.base_url);
        tracing::warn!("  Start: ollama serve");
        tracing::warn!(
            "  Pull models: ollama pull {} && ollama pull {}",
            config.embeddings.model,
            config.ollama.generate_model
        );
    }

    Ok(RagService::new(
        config.clone(),
        Arc::new(embedder),
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(llm),
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grounded_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RagConfig::from_file(path)?,
        None => RagConfig::default(),
    };

    match cli.command {
        Command::Inspect { file } => {
            let pipeline = DocumentPipeline::new(&config)?;
            let fragments = pipeline.ingest(&file, &display_name(&file))?;
            println!("{}", serde_json::to_string_pretty(&fragments)?);
        }
        Command::Ingest {
            files,
            ask,
            limit,
            threshold,
        } => {
            let files: Vec<(PathBuf, String)> = files
                .into_iter()
                .map(|path| {
                    let name = display_name(&path);
                    (path, name)
                })
                .collect();

            let service = build_service(&config).await?;
            for (filename, result) in service.ingest_all(&files).await {
                match result {
                    Ok(response) => println!("{}", response.message),
                    Err(e) => eprintln!("{}: {}", filename, e),
                }
            }
            println!("Knowledge base: {} fragments", service.stats().await?.total_documents);

            if let Some(query) = ask {
                let mut options = QueryOptions::from_config(&config);
                if let Some(limit) = limit {
                    options.retrieval_limit = limit;
                }
                if let Some(threshold) = threshold {
                    options.similarity_threshold = threshold;
                }

                let response = service.answer(&query, &options).await?;
                println!("\n{}\n", response.response);
                for source in &response.sources {
                    let kind = source
                        .chunk_type
                        .map(|t| format!(", {:?}", t).to_lowercase())
                        .unwrap_or_default();
                    println!(
                        "  - {} [{}{}] chunk {} ({:.1}% match)",
                        source.filename,
                        source.file_type.as_str().to_uppercase(),
                        kind,
                        source.chunk_index,
                        source.similarity * 100.0
                    );
                }
            }
        }
        Command::Analyze { query } => {
            let service = build_service(&config).await?;
            let analysis = service.analyze_query(&query).await;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
    }

    Ok(())
}
