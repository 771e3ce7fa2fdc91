//! formprobe CLI entry point

use clap::Parser;
use formprobe_cli::{init_logging, run, Cli, CliConfig, CliResult};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    init_logging(config.verbosity, config.color.should_color())?;

    // Check failures are reported in the output, not the exit status.
    run(&config).await.map(drop)
}
