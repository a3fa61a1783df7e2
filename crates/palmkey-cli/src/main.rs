use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use palmkey_hand_core::errors::AppError;

use palmkey_cli::cli::{Cli, Commands, OutputMode};
use palmkey_cli::commands;
use palmkey_cli::output::{
    render_enroll, render_error, render_quality, render_remove, render_status, render_verify,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mode = cli.output_mode();
    init_tracing(cli.verbose);

    match run(cli, mode) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            render_error(&err, mode);
            err.exit_code()
        }
    }
}

fn run(cli: Cli, mode: OutputMode) -> Result<(), AppError> {
    match cli.command {
        Commands::Quality(args) => {
            let outcome = commands::run_quality(&args)?;
            render_quality(&outcome, mode)?;
        }
        Commands::Enroll(args) => {
            let outcome = commands::run_enroll(&args)?;
            render_enroll(&outcome, mode)?;
        }
        Commands::Status(args) => {
            let outcome = commands::run_status(&args)?;
            render_status(&outcome, mode)?;
        }
        Commands::Verify(args) => {
            let outcome = commands::run_verify(&args)?;
            render_verify(&outcome, mode)?;
        }
        Commands::Remove(args) => {
            let outcome = commands::run_remove(&args)?;
            render_remove(&outcome, mode)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(fmt_layer);
    if tracing::subscriber::set_global_default(registry).is_err() {
        // Already initialised (tests).
    }
}
