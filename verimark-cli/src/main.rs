//! Verimark CLI - perceptual fingerprinting and registry matching tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use verimark_core::policy::DEFAULT_PLAGIARISM_THRESHOLD;
use verimark_core::registry::{DEFAULT_ALGOD_URL, DEFAULT_APP_ID, DEFAULT_KEY_PREFIX};

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  65  Match found (with --fail-on-match)
  66  Cannot read input file
  69  Registry or asset store unavailable
  73  Cannot write exported file
  78  Invalid configuration";

#[derive(Parser)]
#[command(name = "verimark")]
#[command(author, version, about = "Perceptual fingerprinting and registry matching for artwork", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where to read the registry from.
#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Offline registry: JSON array of {"hash", "owner"} records
    #[arg(long, value_name = "PATH")]
    pub registry_file: Option<PathBuf>,

    /// Algorand node REST endpoint
    #[arg(long, env = "ALGOD_URL", default_value = DEFAULT_ALGOD_URL)]
    pub algod_url: String,

    /// Algorand node API token
    #[arg(long, env = "ALGOD_TOKEN", hide_env_values = true)]
    pub algod_token: Option<String>,

    /// Registry application id
    #[arg(long, env = "REGISTRY_APP_ID", default_value_t = DEFAULT_APP_ID)]
    pub app_id: u64,

    /// Prefix of the registry box names
    #[arg(long, env = "REGISTRY_BOX_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    pub box_prefix: String,
}

/// Matching policy overrides.
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Maximum distance reported as plagiarism
    #[arg(long, env = "PLAGIARISM_THRESHOLD", default_value_t = DEFAULT_PLAGIARISM_THRESHOLD)]
    pub threshold: u32,

    /// Zoom-out factors to try, e.g. 1.25,1.5,2.0
    #[arg(long, env = "ZOOM_FACTORS", value_delimiter = ',')]
    pub zoom: Vec<f64>,

    /// Also try mirrored zoom-out variants
    #[arg(long, env = "ZOOM_MIRROR", default_value_t = true, action = clap::ArgAction::Set)]
    pub zoom_mirror: bool,

    /// Compare bytes with the stored original on exact matches
    #[arg(long, env = "DERIVATIVE_BYTE_CHECK", default_value_t = true, action = clap::ArgAction::Set)]
    pub byte_check: bool,
}

/// Optional object store for original files.
#[derive(Args, Debug, Clone)]
pub struct AssetArgs {
    /// Base URL of the asset store
    #[arg(long, env = "ASSET_STORE_URL")]
    pub asset_store_url: Option<String>,

    /// Bearer token for the asset store
    #[arg(long, env = "ASSET_STORE_TOKEN", hide_env_values = true)]
    pub asset_store_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the perceptual hash of an image
    Hash {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Upload the original to the asset store
        #[arg(long)]
        store: bool,

        #[command(flatten)]
        assets: AssetArgs,
    },

    /// Check an image against the registry
    Verify {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Exit with code 65 when the image matches a registered work
        #[arg(long)]
        fail_on_match: bool,

        #[command(flatten)]
        registry: RegistryArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        #[command(flatten)]
        assets: AssetArgs,
    },

    /// Show every intermediate step of the hash computation
    Analyze {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the 32x32 samples as PNG files into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
    },

    /// Inspect the registry
    #[command(subcommand)]
    Registry(RegistryCommands),
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// List every registered hash and its owner
    List {
        #[command(flatten)]
        registry: RegistryArgs,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let quiet = cli.quiet;
    let format = cli.format;

    let result = match cli.command {
        Commands::Hash {
            file,
            store,
            assets,
        } => commands::hash::execute(file, store, assets, format, quiet).await,
        Commands::Verify {
            file,
            fail_on_match,
            registry,
            policy,
            assets,
        } => {
            commands::verify::execute(file, registry, policy, assets, fail_on_match, format, quiet)
                .await
        }
        Commands::Analyze { file, export } => {
            commands::analyze::execute(file, export, format, quiet)
        }
        Commands::Registry(RegistryCommands::List { registry }) => {
            commands::registry::list(registry, format, quiet).await
        }
    };

    let exit = match result {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::ExitCode::from(exit.code as u8)
}
