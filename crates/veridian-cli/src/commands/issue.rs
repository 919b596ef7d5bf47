//! Offline issuance command
//!
//! Issues against an in-process registry and content store. Useful for
//! trying out request shapes and inspecting the signed document; the
//! anchor receipt it prints is local, not a public-chain transaction.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use veridian_chain::InMemoryRegistry;
use veridian_core::IssueRequest;
use veridian_issuer::{IssuanceCoordinator, IssuerIdentity};
use veridian_store::InMemoryStore;
use veridian_vc::{DidKey, KeyResolver};

pub async fn run(
    input_file: &str,
    seed: Option<&str>,
    issuer_name: &str,
    output_file: Option<&str>,
) -> Result<()> {
    println!("\n{}", style("Issuing Credential").bold().underlined());
    println!();

    let content = fs::read_to_string(input_file)
        .with_context(|| format!("reading {input_file}"))?;
    let request: IssueRequest =
        serde_json::from_str(&content).with_context(|| format!("parsing {input_file}"))?;

    let key = match seed {
        Some(seed) => DidKey::from_seed_hex(seed)?,
        None => DidKey::generate(),
    };

    let coordinator = IssuanceCoordinator::new(
        IssuerIdentity {
            name: issuer_name.to_string(),
            key,
        },
        Arc::new(KeyResolver::new()),
        Arc::new(InMemoryStore::new()),
        Some(Arc::new(InMemoryRegistry::new())),
        "http://localhost:4000",
    );

    let receipt = coordinator.issue(request).await?;

    println!("  Credential ID:  {}", style(receipt.credential_id.as_str()).cyan());
    println!("  Issuer DID:     {}", receipt.issuer_did);
    println!("  Subject DID:    {}", receipt.subject_did);
    println!("  VC CID:         {}", receipt.vc_cid);
    println!("  Metadata CID:   {}", receipt.metadata_cid);
    match &receipt.chain {
        Some(anchor) => println!("  Anchor tx:      {}", anchor.tx_hash),
        None => println!("  Anchor tx:      {}", style("none").yellow()),
    }
    println!();

    let rendered = serde_json::to_string_pretty(&receipt.document)?;
    match output_file {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing {path}"))?;
            println!("  Output:         {}", style(path).yellow());
            println!();
            println!("{}", style("✓ Credential issued").green().bold());
        }
        None => {
            println!("{rendered}");
        }
    }

    Ok(())
}
