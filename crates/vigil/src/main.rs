// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vigil - a cost-bounded escalation pipeline for guardian chat monitoring.
//!
//! This is the binary entry point for the Vigil service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Vigil - guardian chat monitoring pipeline.
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the pipeline service (gateway + scheduler).
    Serve,
    /// Print the resolved effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match vigil_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            vigil_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run(config).await {
                eprintln!("vigil serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    eprintln!("vigil config: failed to render: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("vigil: use --help for available commands");
        }
    }
}
