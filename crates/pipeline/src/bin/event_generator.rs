//! Seeded NDJSON event generator for pipeline input.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use eventflow_pipeline::generator::{self, Distribution, GeneratorConfig, DEFAULT_EVENT_TYPES};

/// Generate synthetic NDJSON event streams.
#[derive(Debug, Parser)]
#[command(name = "event-generator", version, about)]
struct Cli {
    /// Number of events to generate
    #[arg(long, default_value_t = 100_000)]
    count: u64,

    /// Output NDJSON file
    #[arg(long, default_value = "events.ndjson")]
    output: PathBuf,

    /// Number of unique users
    #[arg(long, default_value_t = 10_000)]
    users: u64,

    /// Comma-separated event types
    #[arg(long, value_delimiter = ',')]
    types: Vec<String>,

    /// RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// User distribution
    #[arg(long, value_enum, default_value_t = Distribution::Uniform)]
    distribution: Distribution,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let event_types = if cli.types.is_empty() {
        DEFAULT_EVENT_TYPES
            .iter()
            .map(|name| (*name).to_string())
            .collect()
    } else {
        cli.types
    };

    let config = GeneratorConfig {
        event_count: cli.count,
        output_file: cli.output,
        user_count: cli.users,
        event_types,
        seed: cli.seed,
        distribution: cli.distribution,
        start_time: None,
    };

    match generator::generate_events(&config) {
        Ok(()) => {
            println!(
                "wrote {} events to {}",
                config.event_count,
                config.output_file.display()
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
