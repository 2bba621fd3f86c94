//! Multipart form parsing helpers
//!
//! Every upload endpoint takes a single image in the `file` field.

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{
    validate_content_type, validate_file_size, validate_image_signature, validate_not_empty,
};

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

impl FileField {
    /// Read the `file` field from a multipart request.
    ///
    /// Other fields are ignored. Fails when the field is missing, empty,
    /// larger than `max_file_size`, carries a non-image Content-Type, or
    /// does not start with a known image signature.
    pub async fn extract(multipart: &mut Multipart, max_file_size: usize) -> Result<Self, ApiError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            if field.name() != Some("file") {
                continue;
            }

            let content_type = field.content_type().map(|s| s.to_string());
            let file_name = field.file_name().map(|s| s.to_string());
            validate_content_type(content_type.as_deref())?;

            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?
                .to_vec();

            validate_file_size(data.len(), max_file_size)?;
            validate_not_empty(&data)?;
            validate_image_signature(&data)?;

            tracing::debug!(
                size = data.len(),
                content_type = content_type.as_deref().unwrap_or("-"),
                "Received upload"
            );

            return Ok(Self {
                data,
                content_type,
                file_name,
            });
        }

        Err(ApiError::bad_request(
            "No file provided. Use 'file' field in multipart form.",
        ))
    }
}
