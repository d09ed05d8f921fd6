//! factory-line - Concurrent factory production simulator

use anyhow::Result;
use clap::Parser;

mod cli;
mod telemetry;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Flushes the log file worker when main returns
    let _guard = telemetry::init(cli.verbose, cli.log_file())?;
    tracing::debug!("factory-line starting");

    cli::execute(cli)
}
