//! Hash command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;
use verimark_core::{HashReceipt, MatchPolicy, Verifier, VerimarkError};

use crate::utils::{build_asset_store, read_file};
use crate::{AssetArgs, OutputFormat};

/// Execute the hash command.
pub async fn execute(
    file: PathBuf,
    store: bool,
    assets: AssetArgs,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let content = read_file(&file)?;
    let verifier = Verifier::new(MatchPolicy::default())?;

    let receipt = match build_asset_store(&assets)? {
        Some(asset_store) if store => verifier
            .register_asset(&content, &asset_store)
            .await
            .context("Failed to hash image")?,
        None if store => {
            return Err(VerimarkError::Configuration(
                "--store requires --asset-store-url or ASSET_STORE_URL".into(),
            )
            .into())
        }
        _ => {
            let hash = verifier
                .compute_hash(&content)
                .context("Failed to hash image")?;
            HashReceipt {
                hash,
                asset_url: None,
                asset_stored: false,
            }
        }
    };

    info!(hash = %receipt.hash, path = %file.display(), "Computed hash");

    if quiet {
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipt)?),
        OutputFormat::Text => {
            println!("{}", receipt.hash.to_string().bold());
            if store {
                match &receipt.asset_url {
                    Some(url) => println!("   {} {}", "Stored at:".dimmed(), url),
                    None if receipt.asset_stored => {
                        println!("   {} {}", "Stored:".dimmed(), "yes".green())
                    }
                    None => println!("   {} {}", "Stored:".dimmed(), "upload failed".yellow()),
                }
            }
        }
    }
    Ok(())
}
