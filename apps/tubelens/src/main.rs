//! Tubelens client binary.

use clap::Parser;
use tracing::error;
use tubelens::cli::{Cli, run};
use tubelens::logging::init_logging;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
