// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Medfinder - find a medicine in stock at the nearest pharmacy, over WhatsApp.
//!
//! This is the binary entry point.

mod doctor;
mod import;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use medfinder_config::MedfinderConfig;

/// Medfinder - find a medicine in stock at the nearest pharmacy.
#[derive(Parser, Debug)]
#[command(name = "medfinder", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook gateway and the queue workers.
    Serve,
    /// Check configuration, storage, and every configured external service.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Upsert pharmacies, branches, and medicines from an inventory CSV.
    Import {
        /// Path to the CSV file.
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => medfinder_config::load_and_validate_path(path),
        None => medfinder_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            medfinder_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => {
            init_tracing(&config);
            serve::run_serve(config).await
        }
        Commands::Doctor { plain } => doctor::run_doctor(&config, plain).await,
        Commands::Import { csv } => {
            init_tracing(&config);
            import::run_import(&config, &csv).await
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `medfinder=<log_level>,warn`.
fn init_tracing(config: &MedfinderConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("medfinder={},warn", config.service.log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
