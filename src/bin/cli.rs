//! heapstore command runner
//!
//! Executes a file of commands against a data directory.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use heapstore::command::{CommandLog, Runner};
use heapstore::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// heapstore
#[derive(Parser, Debug)]
#[command(name = "heapstore")]
#[command(about = "Run table commands against a heap-file store")]
#[command(version)]
struct Args {
    /// Data directory (catalog and table files)
    #[arg(short, long, default_value = "./heapstore_data")]
    data_dir: PathBuf,

    /// Directory for log.csv
    #[arg(short, long, default_value = "./heapstore_logs")]
    log_dir: PathBuf,

    /// Table lock timeout in milliseconds (0 waits forever)
    #[arg(short = 't', long, default_value = "0")]
    lock_timeout_ms: u64,

    /// File with one command per line
    input: PathBuf,
}

fn main() -> ExitCode {
    // Stdout carries search results, so diagnostics go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,heapstore=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let input = match File::open(&args.input) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            tracing::error!("Cannot open input {}: {}", args.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .log_dir(&args.log_dir)
        .lock_timeout_ms(args.lock_timeout_ms)
        .build();

    let engine = match Engine::open(config.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let log = match CommandLog::open(&config.log_dir) {
        Ok(log) => log,
        Err(e) => {
            tracing::error!("Failed to open command log: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        "heapstore v{}: running {} against {}",
        heapstore::VERSION,
        args.input.display(),
        config.data_dir.display()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match Runner::new(&engine, log).run(input, &mut out) {
        Ok(summary) => {
            tracing::info!(
                "{} commands succeeded, {} failed",
                summary.succeeded,
                summary.failed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Run aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
