use anyhow::Result;
use clap::Parser;
use schola::cli::{Cli, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.run().await
}
