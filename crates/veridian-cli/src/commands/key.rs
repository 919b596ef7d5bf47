//! did:key identity commands

use anyhow::Result;
use console::style;
use veridian_vc::DidKey;

/// Generate a fresh did:key identity
pub fn generate() -> Result<()> {
    println!("\n{}", style("Generating did:key Identity").bold().underlined());
    println!();

    let key = DidKey::generate();

    println!("  DID:                 {}", style(key.did()).cyan());
    println!("  Verification method: {}", key.verification_method());
    println!("  Seed (hex):          {}", style(key.seed_hex()).yellow());
    println!();
    println!("{}", style("✓ Identity generated").green().bold());
    println!();
    println!(
        "{}",
        style("Note: The seed reconstructs this identity. Store it securely;").dim()
    );
    println!(
        "{}",
        style("      set VERIDIAN_ISSUER_SEED to issue under this DID.").dim()
    );

    Ok(())
}

/// Show the identity a seed reconstructs
pub fn show(seed: &str) -> Result<()> {
    let key = DidKey::from_seed_hex(seed)?;

    println!("\n{}", style("did:key Identity").bold().underlined());
    println!();
    println!("  DID:                 {}", style(key.did()).cyan());
    println!("  Verification method: {}", key.verification_method());

    Ok(())
}
