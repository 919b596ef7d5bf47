//! Status command - show configuration and status

use anyhow::Result;
use console::style;

pub fn show() -> Result<()> {
    println!(
        "\n{}",
        style("╔════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║   Veridian Status                      ║").cyan()
    );
    println!(
        "{}",
        style("╚════════════════════════════════════════╝").cyan()
    );
    println!();

    // Version info
    println!("{}", style("Version").bold().underlined());
    println!("  veridian-cli:    {}", env!("CARGO_PKG_VERSION"));
    println!();

    // Environment
    println!("{}", style("Environment").bold().underlined());
    println!(
        "  VERIDIAN_RPC_URL:          {}",
        if std::env::var("VERIDIAN_RPC_URL").is_ok() {
            style("Set").green()
        } else {
            style("Not set (chainless)").yellow()
        }
    );
    println!(
        "  VERIDIAN_CONTRACT_ADDRESS: {}",
        std::env::var("VERIDIAN_CONTRACT_ADDRESS").unwrap_or_else(|_| "Not set".to_string())
    );
    println!(
        "  VERIDIAN_IPFS_URL:         {}",
        if std::env::var("VERIDIAN_IPFS_URL").is_ok() {
            style("Set").green()
        } else {
            style("Not set (in-memory store)").yellow()
        }
    );
    println!(
        "  VERIDIAN_ISSUER_SEED:      {}",
        if std::env::var("VERIDIAN_ISSUER_SEED").is_ok() {
            style("Set").green()
        } else {
            style("Not set (ephemeral key)").yellow()
        }
    );
    println!(
        "  VERIDIAN_BIND:             {}",
        std::env::var("VERIDIAN_BIND").unwrap_or_else(|_| "0.0.0.0:4000 (default)".to_string())
    );
    println!();

    // Cryptography
    println!("{}", style("Cryptography").bold().underlined());
    println!("  DID method:      did:key (Ed25519)");
    println!("  Proof type:      Ed25519Signature2020");
    println!("  Canonicalizer:   JCS (RFC 8785)");
    println!("  Content hash:    SHA3-256 multihash");
    println!();

    // Quick help
    println!("{}", style("Quick Start").bold().underlined());
    println!("  Generate a key:  veridian key generate");
    println!("  Issue offline:   veridian issue -i request.json -o credential.json");
    println!("  Verify a file:   veridian verify credential.json");
    println!("  Show help:       veridian --help");

    Ok(())
}
