//! Command-line front end for the retrieval pipeline
//!
//! This demo shows the boundary layer registry-dl leaves to its callers:
//! - Parsing arguments
//! - Loading Telegram credentials from the environment (or a `.env` file)
//! - Installing a tracing subscriber gated by `--verbose`
//! - Printing written paths and choosing the exit code
//!
//! ```bash
//! cargo run --example fetch_case -- -n 12345 -s abc
//! cargo run --example fetch_case -- -s abc -d 987654
//! ```

use clap::Parser;
use registry_dl::{CaseDownload, Config, Pipeline, RunOutput, RunRequest, TelegramConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Download case documents from the registry")]
struct Args {
    /// Case number to download
    #[arg(short = 'n', long = "vp-num")]
    case_number: Option<String>,

    /// Access token for the case
    #[arg(short, long)]
    secret: Option<String>,

    /// Download a single document by id (always overwrites)
    #[arg(short = 'd', long)]
    download_document: Option<String>,

    /// Replace documents that already exist
    #[arg(short = 'f', long)]
    force_rewrite_documents: bool,

    /// Output directory
    #[arg(short, long, default_value = "./out")]
    out_dir: PathBuf,

    /// Show debug messages
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let default_level = if args.verbose { "registry_dl=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = Config::default();
    config.download.output_dir = args.out_dir;
    config.notifications.telegram = TelegramConfig::from_env();

    let pipeline = match Pipeline::new(config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let request = RunRequest {
        case_number: args.case_number,
        secret_code: args.secret,
        document_id: args.download_document,
        force_overwrite: args.force_rewrite_documents,
    };

    match pipeline.run(request).await {
        Ok(output) => {
            if let RunOutput::Case(CaseDownload::NotFound) = output {
                eprintln!("no data for this case");
            }
            for path in output.written_paths() {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
