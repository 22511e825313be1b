use std::process::ExitCode;

use clap::Parser as _;
use ratebatch::{
    cli::{Cli, Log},
    commands,
    error::RunError,
    exit_codes,
    server::shutdown_signal,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let code = tokio::select! {
        result = commands::run(cli.command) => match result {
            Ok(()) => exit_codes::SUCCESS,
            Err(err) => {
                tracing::error!("{err:#}");
                err.downcast_ref::<RunError>().map_or(exit_codes::RUNTIME_ERROR, RunError::exit_code)
            },
        },
        _ = shutdown_signal() => {
            tracing::warn!("interrupted, persisted items are kept");
            exit_codes::INTERRUPTED
        },
    };

    ExitCode::from(code)
}

fn init_tracing(log: &Log) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ratebatch=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match log {
        Log::Plain => subscriber.init(),
        Log::Json => subscriber.json().init(),
    }
}
