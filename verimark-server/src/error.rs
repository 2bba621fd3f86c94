//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use verimark_core::VerimarkError;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Payload too large - upload exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Verimark core error - error from the fingerprinting library
    #[error("Verimark error: {0}")]
    Verimark(#[from] VerimarkError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a payload too large error
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Verimark(ref e) => match e {
                // Undecodable upload → 400
                VerimarkError::InvalidImage(_) | VerimarkError::InvalidHash(_) => {
                    StatusCode::BAD_REQUEST
                }

                // External service failures → 503
                VerimarkError::ExternalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

                // Registry returned something we cannot read → 502
                VerimarkError::InvalidRegistryEntry(_) => StatusCode::BAD_GATEWAY,

                // Internal processing failures → 500
                VerimarkError::VariantComputation { .. }
                | VerimarkError::Configuration(_)
                | VerimarkError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::PayloadTooLarge(_) => "FILE_TOO_LARGE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Verimark(ref e) => match e {
                VerimarkError::InvalidImage(_) => "INVALID_IMAGE",
                VerimarkError::InvalidHash(_) => "INVALID_HASH",
                VerimarkError::ExternalUnavailable(_) => "REGISTRY_UNAVAILABLE",
                VerimarkError::InvalidRegistryEntry(_) => "INVALID_REGISTRY_ENTRY",
                VerimarkError::VariantComputation { .. } => "VARIANT_FAILED",
                VerimarkError::Configuration(_) => "CONFIGURATION_ERROR",
                VerimarkError::Worker(_) => "INTERNAL_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // For Verimark errors, sanitize internal details
            Self::Verimark(ref e) => match e {
                VerimarkError::InvalidImage(_) => {
                    "Could not decode the uploaded file as an image".to_string()
                }
                VerimarkError::InvalidHash(_) => "Invalid perceptual hash".to_string(),
                VerimarkError::ExternalUnavailable(_) => "Registry unavailable".to_string(),
                VerimarkError::InvalidRegistryEntry(_) => {
                    "Registry returned an unreadable entry".to_string()
                }
                VerimarkError::VariantComputation { .. } => {
                    "Hash computation failed for every variant".to_string()
                }
                VerimarkError::Configuration(_) => "Server misconfigured".to_string(),
                VerimarkError::Worker(_) => "Internal server error".to_string(),
            },
            // For other errors, use the Display message
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Verimark(_) => "verimark",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                client_message = %client_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
