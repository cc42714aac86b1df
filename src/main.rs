use std::process::ExitCode;

use clap::Parser;
use propview::adapter::inbound::cli::{self, command::Cli, output};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tokio::select! {
        result = cli::run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                output::error(&format!("{e:#}"));
                ExitCode::FAILURE
            }
        },
        _ = signal::ctrl_c() => {
            info!("Interrupted");
            ExitCode::from(130)
        }
    }
}
