mod cli;

use clap::Parser;
use cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run(CliArgs::parse()).await
}
