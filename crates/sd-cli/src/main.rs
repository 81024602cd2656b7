//! Schemadeploy CLI - baseline and incremental schema deployment

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::common::ExitCode;
use commands::{baseline, deploy, status, tracker};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match run(&cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(code) => std::process::ExitCode::from(code.0),
            None => {
                log::error!("{err:#}");
                std::process::ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Deploy(args) => deploy::execute(args, &cli.global),
        Commands::Baseline(args) => baseline::execute(args, &cli.global),
        Commands::Mark(args) => tracker::mark(args, &cli.global),
        Commands::Unmark(args) => tracker::unmark(args, &cli.global),
        Commands::Add(args) => tracker::add(args, &cli.global),
        Commands::Status(args) => status::execute(args, &cli.global),
    }
}

/// `info` by default, `debug` with `--verbose`; `RUST_LOG` overrides either.
fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .format_target(false)
        .init();
}
