//! pdfform binary
//!
//! Exit codes: 0 on success or help, 255 for an unknown command, 1 otherwise.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use pdfform_cli::cli::Cli;
use pdfform_cli::{commands, config};
use std::process::ExitCode;

fn main() -> ExitCode {
    config::load_env();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_failure(err),
    };

    config::init_tracing(cli.debug);
    tracing::debug!("pdfform v{}", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("Failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn parse_failure(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        ErrorKind::InvalidSubcommand => {
            config::init_tracing(false);
            let command = match err.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(name)) => name.clone(),
                _ => String::new(),
            };
            tracing::error!(
                "Unknown command {}. Use --help to see available commands",
                command
            );
            ExitCode::from(255)
        }
        _ => {
            let _ = err.print();
            ExitCode::FAILURE
        }
    }
}
