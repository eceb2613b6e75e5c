//! Data types and error definitions for the request pipeline.

use crate::extract::ExtractError;
use crate::generation::DraftKind;
use crate::llm::ProviderRole;
use crate::render::{OutputFormat, RenderError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed request input; nothing was written.
    #[error("{0}")]
    InvalidInput(String),
    /// Uploaded document could not be parsed.
    #[error("Could not extract text from the file: {0}")]
    Extraction(ExtractError),
    /// Output document could not be produced.
    #[error("Failed to render minutes: {0}")]
    Render(#[from] RenderError),
    /// Requested file does not exist.
    #[error("File not found: {0}")]
    NotFound(String),
    /// Every provider failed to answer a question.
    #[error("Could not generate an answer.")]
    NoAnswer,
    /// Working-directory I/O failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractError> for ServiceError {
    fn from(error: ExtractError) -> Self {
        match error {
            ExtractError::UnsupportedFileType(name) => {
                Self::InvalidInput(format!("Unsupported file type: {name}"))
            }
            other => Self::Extraction(other),
        }
    }
}

/// A transcript document received from a client.
#[derive(Debug, Clone)]
pub struct UploadedTranscript {
    /// File name as sent by the client.
    pub file_name: String,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

/// Result of a successful generate request.
#[derive(Debug, Clone)]
pub struct GeneratedMinutes {
    /// Human-readable status line.
    pub message: String,
    /// Name of the rendered output file.
    pub filename: String,
    /// Name under which the upload was stored.
    pub docx_file: String,
    /// Absolute or configured path of the rendered file.
    pub full_path: PathBuf,
    /// Format that was rendered.
    pub format: OutputFormat,
    /// Whether the rendered text is real minutes or a failure description.
    pub draft_kind: DraftKind,
    /// Endpoint that produced the text, if any.
    pub served_by: Option<ProviderRole>,
    /// RFC 3339 completion timestamp.
    pub generated_at: String,
}

/// A rendered file ready to be streamed back.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    /// Location on disk.
    pub path: PathBuf,
    /// File name presented to the client.
    pub file_name: String,
    /// Format inferred from the extension.
    pub format: OutputFormat,
}
