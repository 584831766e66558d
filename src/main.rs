//! Guardian shim CLI entry point.

use clap::Parser;

use guardian_shim::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    guardian_shim::cli::run(Cli::parse()).await
}
