//! Upload validation module
//!
//! Provides validation utilities for multipart image uploads.

use verimark_core::fingerprint::is_supported_format;
use verimark_core::VerimarkError;

use crate::error::ApiError;

/// Accepted MIME type prefixes for uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Default max file size in bytes (25 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 25 * 1024 * 1024;

/// Validates the Content-Type of an uploaded file
///
/// Accepts image/* and application/octet-stream. The bytes are sniffed
/// again when decoding, so this only rejects obviously wrong uploads.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, application/octet-stream",
                    ct
                )))
            }
        }
        // Allow missing Content-Type (treat as binary)
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        Err(ApiError::payload_too_large(format!(
            "File too large: {} bytes exceeds maximum of {} MB",
            size,
            max_size / (1024 * 1024)
        )))
    } else {
        Ok(())
    }
}

/// Rejects empty uploads before they reach the decoder
pub fn validate_not_empty(data: &[u8]) -> Result<(), ApiError> {
    if data.is_empty() {
        Err(ApiError::bad_request("Uploaded file is empty"))
    } else {
        Ok(())
    }
}

/// Rejects uploads whose leading bytes match no decodable image format,
/// before any decoding work is scheduled
pub fn validate_image_signature(data: &[u8]) -> Result<(), ApiError> {
    if is_supported_format(data) {
        Ok(())
    } else {
        Err(VerimarkError::InvalidImage("unrecognized image signature".into()).into())
    }
}
