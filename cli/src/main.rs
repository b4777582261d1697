use clap::Parser;
use flexi_logger::Logger;
use log::debug;

mod cli;
mod commands;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _logger = Logger::try_with_str(&cli.log_level)?
        .log_to_stderr()
        .start()?;
    debug!("Using TextSynth host {}", cli.host);

    commands::run(cli).await
}
