//! deploynote CLI — deploy-note generation for pull requests.
//!
//! Synthesizes a test script + launch requirements note for a change
//! request, commits it idempotently to the PR branch, and posts it as a
//! review comment.

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
