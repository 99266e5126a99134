//! keel CLI - Toolchain detection and configuration bootstrapper for CMake projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use keel::util::diagnostic::emit;
use keel::ConfigureError;

fn main() {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("keel=debug")
    } else if cli.quiet {
        EnvFilter::new("keel=warn")
    } else {
        EnvFilter::new("keel=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Ctrl-C goes to the running cmake or conan; keel reports how it exited
    if let Err(e) = ctrlc::set_handler(|| {}) {
        tracing::debug!("Could not install Ctrl-C handler: {}", e);
    }

    let use_color = cli.global().shell().use_color();
    if let Err(e) = run(cli) {
        match e.downcast_ref::<ConfigureError>() {
            Some(err) => {
                emit(&err.to_diagnostic(), use_color);
                std::process::exit(err.exit_code());
            }
            None => {
                eprintln!("error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let global = cli.global();

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &global),
        Commands::Configure(args) => commands::configure::execute(args, &global),
        Commands::Toolchain(args) => commands::toolchain::execute(args, &global),
        Commands::Workspaces => commands::workspaces::execute(&global),
        Commands::Clean(args) => commands::clean::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
