use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use embed_ingest::Result;
use embed_ingest::commands::{IngestSummary, run_ingest};
use embed_ingest::config::Config;

#[derive(Parser)]
#[command(name = "embed-ingest")]
#[command(about = "Chunk a text file, embed each chunk, and store the vectors in a Supabase table")]
#[command(version)]
struct Cli {
    /// Path of the UTF-8 text file to ingest
    #[arg(default_value = "movies.txt")]
    input: PathBuf,
}

async fn run(cli: Cli) -> Result<IngestSummary> {
    let config = Config::from_env()?;
    run_ingest(&config, &cli.input).await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(summary) => {
            println!("Ingested {} chunks", summary.chunks);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
