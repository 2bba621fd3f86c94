//! Registry command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use tracing::info;
use verimark_core::{MatchPolicy, Verifier};

use crate::utils::{build_registry, short_hash};
use crate::{OutputFormat, RegistryArgs};

/// List every registry entry.
pub async fn list(args: RegistryArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let provider = build_registry(&args)?;
    let verifier = Verifier::new(MatchPolicy::default())?;

    let entries = verifier
        .list_registry(provider.as_ref())
        .await
        .context("Failed to fetch registry")?;

    info!(count = entries.len(), registry = %provider.source(), "Fetched registry");

    if quiet {
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let body = json!({
                "count": entries.len(),
                "source": provider.source(),
                "entries": entries,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            println!(
                "   {} {} ({} entries)",
                "Registry:".dimmed(),
                provider.source(),
                entries.len()
            );
            for entry in &entries {
                println!(
                    "   {}  {}",
                    short_hash(&entry.hash.to_hex()).bold(),
                    entry.owner
                );
            }
        }
    }
    Ok(())
}
