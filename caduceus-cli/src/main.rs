use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod setup;

use crate::cli::{Cli, LogType};
use crate::setup::Setup;
use caduceus_core::error::CaduceusError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keep the file-appender guard alive for the whole run.
    let _log_guard = init_logging(&cli);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CaduceusError::NoUpdateRequired) => {
            info!("nothing to do, exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CaduceusError> {
    info!("this utility downloads all necessary files and sets up / updates the UniProt database");

    let mut setup = Setup::compose(&cli).await?;

    let result = setup.run().await;

    if let Err(err) = &result {
        if !err.is_no_update_required() {
            setup.remove_on_failure().await;
        }
    }

    result
}

fn init_logging(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        cli.loglevel.clone()
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    match cli.logtype {
        LogType::Console => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
        LogType::File => {
            let appender = tracing_appender::rolling::daily(&cli.logpath, "caduceus.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();

            Some(guard)
        }
    }
}
