use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerimarkError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("External service unavailable: {0}")]
    ExternalUnavailable(String),

    #[error("Variant {variant} failed: {reason}")]
    VariantComputation { variant: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid perceptual hash: {0}")]
    InvalidHash(String),

    #[error("Invalid registry entry: {0}")]
    InvalidRegistryEntry(String),

    #[cfg(feature = "network")]
    #[error("Background task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl VerimarkError {
    pub(crate) fn variant(variant: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::VariantComputation {
            variant: variant.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VerimarkError>;
