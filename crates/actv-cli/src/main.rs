//! # actv CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use actv_cli::codes::{run_codes, run_seed, run_stats, CodesArgs, SeedArgs, StatsArgs};
use actv_cli::keys::{run_keygen, KeygenArgs};
use actv_cli::verify::{run_verify, VerifyArgs};

/// Activation service operator tool.
///
/// Provisions signing keys and activation codes, inspects the code store,
/// and verifies issued licenses offline.
#[derive(Parser, Debug)]
#[command(name = "actv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 license signing keypair.
    Keygen(KeygenArgs),

    /// Activation code generation.
    Codes(CodesArgs),

    /// Load a seed file of codes into the code store.
    Seed(SeedArgs),

    /// Show total, used and available code counts.
    Stats(StatsArgs),

    /// Verify a license file offline.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::Codes(args) => run_codes(args),
        Commands::Seed(args) => run_seed(args),
        Commands::Stats(args) => run_stats(args),
        Commands::Verify(args) => run_verify(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
