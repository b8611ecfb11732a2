//! codegen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments (reported by clap)
//! - 3: I/O error
//! - 4: Parse error
//! - 5: Render error

use std::process::ExitCode;

use clap::Parser;
use codegen_templates::{ErrorKind, TemplateError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const IO_ERROR: u8 = 3;
    pub const PARSE_ERROR: u8 = 4;
    pub const RENDER_ERROR: u8 = 5;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command.unwrap_or_default() {
        Commands::Generate(args) => commands::generate::execute(&cli.project, args),
        Commands::Validate(args) => commands::validate::execute(&cli.project, args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            if let Some(err) = e.downcast_ref::<TemplateError>() {
                tracing::debug!(phase = %err.phase(), kind = ?err.kind(), "generation failed");
            }
            let exit_code = categorize_error(&e);
            eprintln!("ERROR: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked from the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("codegen={level},codegen_templates={level},warn"))
    });

    let log_result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Map the failure class of the error to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<TemplateError>().map(TemplateError::kind) {
        Some(ErrorKind::Io) => ExitCodes::IO_ERROR,
        Some(ErrorKind::Parse) => ExitCodes::PARSE_ERROR,
        Some(ErrorKind::Render) => ExitCodes::RENDER_ERROR,
        None => ExitCodes::GENERAL_ERROR,
    }
}
