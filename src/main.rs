//! CodeKB CLI - per-user codebase knowledge index.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use codekb::cli::Commands;
use codekb::{
    format_context, ApiState, Container, ContainerConfig, FileCategory, HeaderSessionAuth,
    LexicalStore, StateStore, VectorStore,
};

/// CodeKB - codebase knowledge index with hybrid retrieval
#[derive(Parser)]
#[command(name = "codekb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the data directory
    #[arg(short, long, global = true, default_value = "~/.codekb")]
    data_dir: String,

    /// Use deterministic mock embeddings instead of the HTTP endpoint
    #[arg(long, global = true)]
    mock_embeddings: bool,

    /// Keep vectors in memory instead of the on-disk collection
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let data_dir = expand_tilde(&cli.data_dir);
    let mut config = ContainerConfig::new(data_dir);
    config.mock_embeddings = cli.mock_embeddings;
    config.memory_storage = cli.memory;

    let container = Container::new(config).await?;

    match cli.command {
        Commands::Refresh { path, user } => {
            let use_case = container.refresh_use_case();
            let report = use_case.execute(&user, Path::new(&path)).await?;
            println!("Knowledge index refreshed: {}", report);
        }

        Commands::Search {
            query,
            user,
            num,
            file_type,
        } => {
            let use_case = container.search_use_case();

            let hits = match file_type.as_deref() {
                Some(raw) => {
                    let category = FileCategory::parse(raw)
                        .ok_or_else(|| anyhow::anyhow!("Unknown file type: {}", raw))?;
                    use_case
                        .search_by_category(&user, &query, num, category)
                        .await?
                }
                None => use_case.search(&user, &query, num).await?,
            };

            if hits.is_empty() {
                println!("No results found.");
            } else {
                println!("Found {} results:\n", hits.len());
                for (i, hit) in hits.iter().enumerate() {
                    println!("{}. {}", i + 1, hit.display_line());
                    if let Some(symbol) = hit.chunk().symbol() {
                        println!("   Symbol: {} ({})", symbol.name(), symbol.kind());
                    }
                    let preview: String = hit
                        .chunk()
                        .content()
                        .lines()
                        .take(3)
                        .map(|line| format!("   | {}", line))
                        .collect::<Vec<_>>()
                        .join("\n");
                    println!("{}\n", preview);
                }
                println!("--- context ---\n{}", format_context(&hits));
            }
        }

        Commands::Serve { port } => {
            let state = ApiState::new(
                container.refresh_use_case(),
                Arc::new(HeaderSessionAuth::new()),
            );
            codekb::serve(state, port).await?;
        }

        Commands::Stats { user } => {
            let vector_count = container.vector_store().count_by_user(&user).await?;
            let lexical_count = container.lexical_store().count_by_user(&user).await?;
            let file_count = container.state_store().count_by_user(&user).await?;

            println!("CodeKB Statistics for {}", user);
            println!("==========================");
            println!("Indexed files:  {}", file_count);
            println!("Vector chunks:  {}", vector_count);
            println!("Lexical rows:   {}", lexical_count);
            println!("Data dir:       {}", container.data_dir());
            if !container.vector_store().is_available() {
                println!("Vector store:   degraded (lexical-only retrieval)");
            }
        }
    }

    Ok(())
}

/// Expand ~ to home directory.
fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
