// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "viewfinder")]
#[command(about = "Real-time camera preview filter pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in effects
    List,

    /// Apply an effect to a still image
    Apply {
        /// Effect index (from 'viewfinder list')
        #[arg(short, long, default_value = "0")]
        effect: usize,

        /// Apply the 16-color quantize effect instead of a catalog entry
        #[arg(short, long, conflicts_with = "effect")]
        quantize: bool,

        /// Input image path
        input: PathBuf,

        /// Output file path (default: INPUT_filtered.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a live preview against the synthetic test-pattern source
    Preview {
        /// Initial effect index (from 'viewfinder list')
        #[arg(short, long, default_value = "0")]
        effect: usize,

        /// Run time in seconds (0 runs until Ctrl+C)
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Auto-advance to the next effect every N seconds
        #[arg(long)]
        cycle: Option<u64>,

        /// Configuration file path (default: platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=viewfinder=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => cli::list_effects(),
        Commands::Apply {
            effect,
            quantize,
            input,
            output,
        } => cli::apply_effect(effect, quantize, input, output),
        Commands::Preview {
            effect,
            duration,
            cycle,
            config,
        } => cli::preview(effect, duration, cycle, config),
    }
}
