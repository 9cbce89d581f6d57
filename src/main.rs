mod error;
mod llm;
mod routes;
mod services;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::llm::{LlmClient, LlmGenerate};
use crate::services::attachment::{PendingFile, encode_all};
use crate::services::creation::{Creation, derive_name};
use crate::services::generation::{self, GenerationError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("LLM client not configured: {0}")]
    Llm(#[from] llm::types::LlmError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "screencast", about = "Generate narrated product demo screencasts from a URL and instructions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the studio web server.
    Serve(ServeArgs),
    /// Generate one demo document and write it to disk.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Cadence of the cosmetic loading labels.
    #[arg(long, env = "LOADING_STEP_MILLIS", default_value_t = services::loading::DEFAULT_STEP_MILLIS)]
    loading_step_millis: u64,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value = "")]
    url: String,

    #[arg(long, default_value = "")]
    instructions: String,

    /// Reference image; repeat for several, order is kept.
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Generate(args) => run_generate(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<(), CliError> {
    // Non-fatal: the page still loads and generation reports the missing key.
    let llm: Option<Arc<dyn LlmGenerate>> = match LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured, generation disabled");
            None
        }
    };

    let state = state::AppState::new(llm, Duration::from_millis(args.loading_step_millis));
    let app = routes::app(state, args.static_dir);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;

    tracing::info!(port = args.port, "screencast studio listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let url = args.url.trim();
    let instructions = args.instructions.trim();
    generation::validate_input(url, instructions, args.images.len())?;
    let llm = LlmClient::from_env()?;

    let files: Vec<PendingFile> = args.images.into_iter().map(PendingFile::from_path).collect();
    let batch = encode_all(&files).await;
    for name in &batch.skipped {
        eprintln!("skipped unreadable image: {name}");
    }
    generation::validate_input(url, instructions, batch.attachments.len())?;

    let html = generation::generate(&llm, url, instructions, &batch.attachments).await?;
    let original_image = batch.attachments.first().map(|a| a.data_url());
    let creation = Creation::new(derive_name(url, instructions), html, original_image);

    tokio::fs::create_dir_all(&args.out).await?;
    let path = args.out.join(creation.document_filename());
    tokio::fs::write(&path, &creation.html).await?;
    tracing::info!(path = %path.display(), html_len = creation.html.len(), "generate: wrote document");
    println!("{}", path.display());
    Ok(())
}
