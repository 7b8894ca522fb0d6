//! # DFS Benchmark Suite - Main Entry Point
//!
//! Two subcommands share one engine:
//!
//! - `throughput`: one write phase and one read phase at a fixed
//!   concurrency, printed as a results block per phase
//! - `sweep`: the same test across a range of concurrency levels with
//!   repeats, summarized in a table and written to JSON files
//!
//! Only setup failures (remote directory creation, payload generation)
//! end the process with a non-zero status. Failed client calls are part of
//! the measurement.

use anyhow::{Context, Result};
use clap::Parser;
use dfs_bench::{
    benchmark::{BenchmarkRunner, TestConfig},
    cli::{Args, Command, SweepArgs, ThroughputArgs},
    executor::ClientExecutor,
    logging::init_logging,
    results::ResultsManager,
    sweep::{thread_counts, ExperimentSweep},
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(args.verbose, args.quiet, args.log_file.as_deref())?;

    info!("Starting DFS Benchmark Suite v{}", dfs_bench::VERSION);

    match &args.command {
        Command::Throughput(throughput) => run_throughput(throughput).await,
        Command::Sweep(sweep) => run_sweep(sweep).await,
    }
}

async fn run_throughput(args: &ThroughputArgs) -> Result<()> {
    let config = TestConfig::from_args(args)?;
    let executor = Arc::new(ClientExecutor::from_config(&config));
    let runner = BenchmarkRunner::new(config, executor);

    let results = runner.run().await.map_err(|e| {
        error!("{}", e);
        e
    })?;

    println!("\n=== Test Results ===");
    for phase in [&results.write, &results.read] {
        println!("\n{}", phase);
    }
    Ok(())
}

async fn run_sweep(args: &SweepArgs) -> Result<()> {
    let template = TestConfig::from_sweep_args(args)?;
    let levels = thread_counts(args.max_threads);
    let executor = Arc::new(ClientExecutor::from_config(&template));
    let sweep = ExperimentSweep::new(template, levels, args.repeats, executor);

    let records = sweep
        .run()
        .await
        .context("Sweep aborted before completion")?;

    let mut results_manager = ResultsManager::new(args.output.clone());
    results_manager.add_records(records);

    println!("{}", results_manager.summary_table());
    results_manager.finalize()?;

    println!("\nResults have been saved with prefix '{}'", args.output);
    println!("Generated files:");
    println!(
        "- {} (Raw test data)",
        results_manager.raw_data_path().display()
    );
    println!(
        "- {} (Statistical summary)",
        results_manager.summary_path().display()
    );
    Ok(())
}
