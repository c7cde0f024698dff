use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

use assistant_text::credentials::REMEDIATION;
use assistant_text::{app, channel, logging, Cli, RunError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            error!("assistant-text failed: {e:#}");
            ExitCode::FAILURE
        }
    };

    // A stdin read parked on the blocking pool can't be cancelled; don't wait for it.
    runtime.shutdown_background();
    code
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.resolve_config().context("loading configuration")?;
    let mode = cli.mode();
    let endpoint = config.api_endpoint.clone();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    let session = app::run(
        &config,
        mode,
        |token| async move { channel::connect(&endpoint, &token).await },
        stdin,
        &mut stdout,
    );

    // Dropping the session future on Ctrl-C drops the channel with it.
    let outcome = tokio::select! {
        outcome = session => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(RunError::Credentials(e)) => {
            error!(error = %e, "Error loading credentials");
            error!("{REMEDIATION}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
