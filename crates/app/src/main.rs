//! Blockgen binary.

use std::path::PathBuf;

use blockgen::{GenerationJob, generate_once, read_workspace_file};
use blockgen_infrastructure::load_settings;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Generate source code from a block workspace
#[derive(Parser, Debug)]
#[command(name = "blockgen", version, about)]
struct Cli {
    /// Workspace markup file
    workspace: PathBuf,

    /// Target language (javascript, python, lua, php, dart)
    #[arg(short, long)]
    language: String,

    /// Settings file (JSON); missing file means defaults
    #[arg(long, default_value = "blockgen.json")]
    settings: PathBuf,

    /// Block-definition resource, relative to the asset root
    #[arg(
        long = "blocks",
        value_name = "RES",
        default_value = "default/test_blocks.json"
    )]
    blocks: Vec<String>,

    /// Extra generator resource, relative to the asset root
    #[arg(long = "generator", value_name = "RES")]
    generators: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries only generated code
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.settings).await?.with_env_overrides();

    let workspace = read_workspace_file(&cli.workspace).await?;
    let job = cli.blocks.into_iter().fold(
        GenerationJob::new(workspace, &cli.language)?,
        GenerationJob::with_blocks,
    );
    let job = cli
        .generators
        .into_iter()
        .fold(job, GenerationJob::with_generator);

    let code = generate_once(&settings, job).await?;
    println!("{code}");

    Ok(())
}
