//! Pipeline driver: parses flags, runs one pipeline and prints the
//! metrics snapshot.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use eventflow_pipeline::config::{default_parser_threads, DEFAULT_OUTPUT_FILE, DEFAULT_QUEUE_SIZE};
use eventflow_pipeline::{Metrics, MetricsSnapshot, PipelineConfig, PipelineCoordinator};

/// Multi-threaded NDJSON event aggregation pipeline.
#[derive(Debug, Parser)]
#[command(name = "event-pipeline", version, about)]
struct Cli {
    /// NDJSON input file
    #[arg(long)]
    input: PathBuf,

    /// Output file
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Parser worker threads; 0 selects the hardware concurrency
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Max queue size per stage; 0 disables backpressure
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE)]
    queue_size: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig {
        input_file: cli.input,
        output_file: cli.output,
        parser_threads: if cli.workers == 0 {
            default_parser_threads()
        } else {
            cli.workers
        },
        queue_size: cli.queue_size,
    };

    let coordinator = match PipelineCoordinator::new(config) {
        Ok(coordinator) => coordinator,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let metrics = Arc::new(Metrics::new());
    if let Err(error) = coordinator.run(&metrics) {
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }

    print_summary(&metrics.snapshot());
    ExitCode::SUCCESS
}

fn print_summary(snapshot: &MetricsSnapshot) {
    let total_processing = snapshot.reader_processing_ms
        + snapshot.parser_processing_ms
        + snapshot.rules_processing_ms
        + snapshot.aggregator_processing_ms
        + snapshot.writer_processing_ms;
    let total_measured = total_processing + snapshot.queue_overhead_ms;

    println!("\n=== Pipeline Performance ===");
    println!("Read: {} events", snapshot.read_events);
    println!("Processed: {} events", snapshot.aggregated_events);
    println!("Invalid: {} events", snapshot.invalid_events);
    println!("Filtered: {} events", snapshot.filtered_events);
    println!("Duration: {:.3} sec", snapshot.duration_sec);
    println!("Throughput: {:.0} events/sec", snapshot.throughput_per_sec);

    if total_measured > 0.0 {
        let pct = |part: f64| part / total_measured * 100.0;
        println!("\n=== Time Breakdown ===");
        println!(
            "Parser processing: {:.1}ms ({:.1}%)",
            snapshot.parser_processing_ms,
            pct(snapshot.parser_processing_ms)
        );
        println!(
            "Rules processing: {:.1}ms ({:.1}%)",
            snapshot.rules_processing_ms,
            pct(snapshot.rules_processing_ms)
        );
        println!(
            "Aggregator processing: {:.1}ms ({:.1}%)",
            snapshot.aggregator_processing_ms,
            pct(snapshot.aggregator_processing_ms)
        );
        println!(
            "Total processing: {total_processing:.1}ms ({:.1}%)",
            pct(total_processing)
        );
        println!(
            "Queue overhead: {:.1}ms ({:.1}%)",
            snapshot.queue_overhead_ms,
            pct(snapshot.queue_overhead_ms)
        );
    }
}
