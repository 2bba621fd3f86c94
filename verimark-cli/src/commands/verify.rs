//! Verify command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use tracing::{info, warn};
use verimark_core::{AssetFetcher, Verdict, VerificationReport, Verifier, VerimarkError};

use crate::exit_codes::MatchFound;
use crate::utils::{build_asset_store, build_policy, build_registry, read_file};
use crate::{AssetArgs, OutputFormat, PolicyArgs, RegistryArgs};

/// Execute the verify command.
pub async fn execute(
    file: PathBuf,
    registry: RegistryArgs,
    policy: PolicyArgs,
    assets: AssetArgs,
    fail_on_match: bool,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let content = read_file(&file)?;

    let verifier = Verifier::new(build_policy(&policy)).context("Invalid matching policy")?;
    let provider = build_registry(&registry)?;
    let asset_store = build_asset_store(&assets)?;
    let fetcher = asset_store.as_ref().map(|s| s as &dyn AssetFetcher);

    info!(
        path = %file.display(),
        registry = %provider.source(),
        variants = verifier.catalogue().len(),
        "Verifying image"
    );

    let report = verifier
        .verify(&content, provider.as_ref(), fetcher)
        .await
        .context("Verification failed")?;

    if !quiet {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_report(&report),
        }
    }

    if !report.registry_available {
        warn!("Registry could not be fetched");
        return Err(VerimarkError::ExternalUnavailable(format!(
            "registry {} could not be fetched",
            provider.source()
        ))
        .into());
    }

    if fail_on_match && report.verdict.is_match() {
        return Err(MatchFound(report.verdict.status_label().to_string()).into());
    }

    Ok(())
}

fn banner(verdict: Verdict) -> ColoredString {
    let text = match verdict {
        Verdict::Original => "║            ORIGINAL MATCH              ║",
        Verdict::Derivative => "║          PLAGIARISM DETECTED           ║",
        Verdict::Clear => "║                 CLEAR                  ║",
        Verdict::EmptyRegistry => "║              NO REGISTRY               ║",
    };
    match verdict {
        Verdict::Original => text.cyan().bold(),
        Verdict::Derivative => text.red().bold(),
        Verdict::Clear => text.green().bold(),
        Verdict::EmptyRegistry => text.yellow().bold(),
    }
}

fn frame(verdict: Verdict, line: &str) -> ColoredString {
    match verdict {
        Verdict::Original => line.cyan(),
        Verdict::Derivative => line.red(),
        Verdict::Clear => line.green(),
        Verdict::EmptyRegistry => line.yellow(),
    }
}

fn print_report(report: &VerificationReport) {
    let verdict = report.verdict;

    println!();
    println!("{}", frame(verdict, "╔════════════════════════════════════════╗"));
    println!("{}", banner(verdict));
    println!("{}", frame(verdict, "╚════════════════════════════════════════╝"));
    println!();
    println!("   {} {}", "Status:".dimmed(), verdict.status_label());

    if let Some(score) = report.score {
        println!("   {} {}", "Distance:".dimmed(), score);
    }
    if let Some(hash) = report.matched_hash {
        println!("   {} {}", "Matched hash:".dimmed(), hash);
    }
    if let Some(owner) = &report.owner {
        println!("   {} {}", "Owner:".dimmed(), owner);
    }
    if let Some(method) = &report.detection_method {
        println!("   {} {}", "Detection:".dimmed(), method);
    }
    println!(
        "   {} {} evaluated, {} skipped",
        "Variants:".dimmed(),
        report.variants_evaluated,
        report.variants_skipped
    );
    println!(
        "   {} {} entries (policy v{})",
        "Registry:".dimmed(),
        report.registry_size,
        report.policy_version
    );
    if !report.registry_available {
        println!("   {}", "Registry unavailable".yellow());
    }
}
