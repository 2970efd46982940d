//! Lookout CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use lookout_channels::{Reconciler, SecretKey};
use lookout_cli::{Cli, CliError, logging};
use lookout_client::{ClientConfig, HttpApi};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();

    if !cli.command.is_remote() {
        return lookout_cli::run_local(&cli, &mut stdout);
    }

    let token = cli.api_token.clone().map(SecretKey::new);
    let config = ClientConfig::load(&cli.config, token)?;
    let reconciler = Reconciler::new(HttpApi::new(&config)?);

    lookout_cli::run(&cli, &reconciler, &mut stdout).await
}
