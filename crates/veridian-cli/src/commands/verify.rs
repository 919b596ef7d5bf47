//! Offline credential verification
//!
//! Checks the document's embedded proof and expiry. On-chain status
//! needs a registry endpoint; use the server's verify routes for that.

use std::fs;

use anyhow::{Context, Result};
use console::style;
use veridian_core::VcDocument;
use veridian_vc::ProofService;

pub fn run(credential_file: &str) -> Result<()> {
    println!("\n{}", style("Verifying Credential").bold().underlined());
    println!();

    let content = fs::read_to_string(credential_file)
        .with_context(|| format!("reading {credential_file}"))?;
    let doc: VcDocument =
        serde_json::from_str(&content).with_context(|| format!("parsing {credential_file}"))?;

    println!("  File:       {}", credential_file);
    println!("  Issuer:     {}", style(&doc.issuer).cyan());
    println!(
        "  Type:       {}",
        doc.types.last().map(String::as_str).unwrap_or("unknown")
    );
    if let Some(id) = doc.credential_id() {
        println!("  ID:         {id}");
    }
    if let Some(expires) = doc.expiration_date {
        println!("  Expires:    {}", expires.to_rfc3339());
    }
    println!();

    let check = ProofService::new().verify_credential(&doc);
    if check.verified {
        println!("{}", style("✓ Proof verified").green().bold());
        println!();
        println!(
            "{}",
            style("Note: On-chain validity and revocation are not checked offline.").dim()
        );
    } else {
        println!("{}", style("✗ Proof verification FAILED").red().bold());
        for error in &check.errors {
            println!("  • {error}");
        }
    }

    Ok(())
}
