//! xapian-bridge CLI - builds the native Xapian bridge

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use xapian_bridge::builder::{ConfigError, SpliceError};
use xapian_bridge::util::diagnostic::emit;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    let filter = if cli.verbose {
        EnvFilter::new("xapian_bridge=debug")
    } else {
        EnvFilter::new("xapian_bridge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Flags(args) => commands::flags::execute(args),
        Commands::Setup(args) => commands::setup::execute(args, color),
        Commands::Doctor => commands::doctor::execute(cli.verbose),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print build configuration errors as diagnostics, anything else plainly.
fn report(e: &anyhow::Error, color: bool) {
    if let Some(err) = e.downcast_ref::<ConfigError>() {
        emit(&err.to_diagnostic(), color);
    } else if let Some(err) = e.downcast_ref::<SpliceError>() {
        emit(&err.to_diagnostic(), color);
    } else {
        eprintln!("error: {:#}", e);
    }
}
