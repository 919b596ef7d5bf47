//! Veridian CLI
//!
//! Command-line interface for the Veridian credential platform.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "veridian")]
#[command(author, version, about = "Veridian: verifiable credentials anchored on-chain", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage did:key identities
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Issue a credential offline (in-process registry and store)
    Issue {
        /// Issuance request file (JSON)
        #[arg(short, long)]
        input: String,

        /// Issuer seed, hex (generated if not set)
        #[arg(long, env = "VERIDIAN_ISSUER_SEED")]
        seed: Option<String>,

        /// Issuer display name
        #[arg(long, default_value = "Veridian CLI Issuer", env = "VERIDIAN_ISSUER_NAME")]
        issuer_name: String,

        /// Output file for the signed credential (stdout if not set)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify a credential document's proof and expiry
    Verify {
        /// Credential document file (JSON)
        credential: String,
    },

    /// Show configuration and status
    Status,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Generate a fresh did:key identity
    Generate,

    /// Show the identity a seed reconstructs
    Show {
        /// Seed, hex
        seed: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("veridian={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Key { action } => match action {
            KeyAction::Generate => commands::key::generate()?,
            KeyAction::Show { seed } => commands::key::show(&seed)?,
        },
        Commands::Issue {
            input,
            seed,
            issuer_name,
            output,
        } => {
            commands::issue::run(&input, seed.as_deref(), &issuer_name, output.as_deref())
                .await?;
        }
        Commands::Verify { credential } => {
            commands::verify::run(&credential)?;
        }
        Commands::Status => {
            commands::status::show()?;
        }
    }

    Ok(())
}
