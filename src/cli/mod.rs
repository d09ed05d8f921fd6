//! CLI argument parsing and command dispatch

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use factory_line_core::{
    Error, LinePlan, Orchestrator, OrchestratorBuilder, RunConfig, RunOutcome,
    DEFAULT_STATUS_CHECK_MS,
};

#[derive(Parser)]
#[command(name = "factory-line")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log file requested by the subcommand, if any
    pub fn log_file(&self) -> Option<&Path> {
        match &self.command {
            Commands::Run(args) => args.log_file.as_deref(),
            Commands::Validate(_) => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Produce an order with a set of factory lines
    Run(RunArgs),
    /// Check a run configuration without producing anything
    Validate(OrderArgs),
}

#[derive(Args, Debug, Clone)]
pub struct OrderArgs {
    /// Number of factory lines
    #[arg(short = 'n', long)]
    pub factories: usize,

    /// Total parts in the order
    #[arg(short = 'm', long)]
    pub order_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub order: OrderArgs,

    /// Seed for line capacities and durations
    #[arg(long)]
    pub seed: Option<u64>,

    /// Duration of the printer status check in milliseconds
    #[arg(long, default_value_t = DEFAULT_STATUS_CHECK_MS)]
    pub status_check_ms: u64,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl RunArgs {
    fn line_plan(&self) -> LinePlan {
        match self.seed {
            Some(seed) => LinePlan::Seeded(seed),
            None => LinePlan::Random,
        }
    }
}

/// Dispatch a parsed command line
pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| Error::resource(format!("cannot start async runtime: {e}")))?;
            runtime.block_on(run(args))
        }
        Commands::Validate(args) => validate(&args),
    }
}

fn build_orchestrator(args: &RunArgs) -> Result<Orchestrator, Error> {
    OrchestratorBuilder::new()
        .factory_count(args.order.factories)
        .order_size(args.order.order_size)
        .status_check_duration(Duration::from_millis(args.status_check_ms))
        .line_plan(args.line_plan())
        .build()
}

async fn run(args: RunArgs) -> Result<()> {
    let orchestrator = build_orchestrator(&args).context("invalid run configuration")?;

    if !args.json {
        for (idx, line) in orchestrator.lines().iter().enumerate() {
            println!(
                "Factory #{} created, with capacity {} and duration {} ms",
                idx + 1,
                line.capacity,
                line.duration.as_millis()
            );
        }
    }

    let outcome = orchestrator.run_with_signal_handling().await?;
    print_outcome(&outcome, args.json)
}

fn print_outcome(outcome: &RunOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", outcome.report);
    }
    Ok(())
}

fn validate(args: &OrderArgs) -> Result<()> {
    let config = RunConfig::new(args.factories, args.order_size);
    config.validate().map_err(Error::from)?;
    println!(
        "Configuration is valid: {} factory lines, order of {} parts",
        config.factory_count, config.order_size
    );
    Ok(())
}
