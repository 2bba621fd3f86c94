//! Analyze command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;
use verimark_core::analyze;

use crate::exit_codes::OutputError;
use crate::utils::{bit_grid, read_file};
use crate::OutputFormat;

/// Execute the analyze command.
pub fn execute(
    file: PathBuf,
    export: Option<PathBuf>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let content = read_file(&file)?;
    let analysis = analyze(&content).context("Failed to analyze image")?;

    if let Some(dir) = &export {
        std::fs::create_dir_all(dir).map_err(|source| OutputError {
            path: dir.clone(),
            source,
        })?;
        for (name, sample) in [
            ("gray_denoised.png", &analysis.gray_denoised),
            ("gray_original.png", &analysis.gray_original),
        ] {
            let path = dir.join(name);
            let png = sample.to_png()?;
            std::fs::write(&path, png).map_err(|source| OutputError { path, source })?;
        }
        info!(dir = %dir.display(), "Exported samples");
    }

    if quiet {
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis.summary())?),
        OutputFormat::Text => {
            println!("   {} {}", "Hash:".dimmed(), analysis.hash.to_string().bold());
            println!("   {} {}", "Binary:".dimmed(), analysis.binary());
            println!("   {} {:.4}", "Median:".dimmed(), analysis.median);
            println!("   {}", "Bitmask (8x8, DC top-left):".dimmed());
            for row in bit_grid(&analysis.bits()) {
                println!("      {row}");
            }
            if let Some(dir) = &export {
                println!("   {} {}", "Samples written to:".dimmed(), dir.display());
            }
        }
    }
    Ok(())
}
