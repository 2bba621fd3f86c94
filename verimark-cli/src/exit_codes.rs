//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use std::path::PathBuf;

use verimark_core::VerimarkError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Image matches a registered work (only with `--fail-on-match`).
/// Maps to EX_DATAERR from sysexits.h.
pub const MATCH_FOUND: i32 = 65;

/// Cannot open or decode input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Cannot write an exported file.
/// Maps to EX_CANTCREAT from sysexits.h.
pub const OUTPUT_ERROR: i32 = 73;

/// Service unavailable (registry node, asset store).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// Invalid threshold, zoom factor or other setting.
/// Maps to EX_CONFIG from sysexits.h.
pub const CONFIG_ERROR: i32 = 78;

/// Raised by `verify --fail-on-match`.
#[derive(Debug)]
pub struct MatchFound(pub String);

impl std::fmt::Display for MatchFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Match found: {}", self.0)
    }
}

impl std::error::Error for MatchFound {}

/// Raised when an export path cannot be created or written.
#[derive(Debug)]
pub struct OutputError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cannot write {}", self.path.display())
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let code = err
            .chain()
            .find_map(|cause| {
                if cause.downcast_ref::<MatchFound>().is_some() {
                    return Some(MATCH_FOUND);
                }
                if cause.downcast_ref::<OutputError>().is_some() {
                    return Some(OUTPUT_ERROR);
                }
                if cause.downcast_ref::<std::io::Error>().is_some() {
                    return Some(INPUT_ERROR);
                }
                cause.downcast_ref::<VerimarkError>().map(|e| match e {
                    VerimarkError::InvalidImage(_) => INPUT_ERROR,
                    VerimarkError::ExternalUnavailable(_) => NETWORK_ERROR,
                    VerimarkError::Configuration(_) => CONFIG_ERROR,
                    _ => GENERAL_ERROR,
                })
            })
            .unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: Some(message),
        }
    }
}
