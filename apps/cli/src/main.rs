//! FounderWiki CLI — Wikipedia career enrichment for founder datasets.
//!
//! Runs the resumable enrichment batch over an input founder CSV and exports
//! the accumulated career records to a flat CSV.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
