//! Markdown-to-document rendering for generated minutes.
//!
//! Both renditions read the same `**...**` markup through [`markdown::layout`]; emphasized runs
//! come out bold, everything else in the body style. Rendering failures are fatal for the
//! request, so every error is propagated and partial files are removed.

pub mod docx;
pub mod markdown;
pub mod pdf;

use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub use docx::DocxDocument;
pub use pdf::PdfLayout;

/// MIME type served for PDF downloads.
pub const PDF_MIME: &str = "application/pdf";
/// MIME type served for DOCX downloads.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Errors raised while producing an output document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Output file could not be written.
    #[error("Failed to write output document: {0}")]
    Io(#[from] std::io::Error),
    /// PDF serialization failed.
    #[error("Failed to build PDF: {0}")]
    Pdf(String),
    /// DOCX packaging failed.
    #[error("Failed to package DOCX: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Output document kind selected by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Portable Document Format.
    #[default]
    Pdf,
    /// Word document.
    Docx,
}

impl std::str::FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(()),
        }
    }
}

impl OutputFormat {
    /// Lowercase name used in requests and file extensions.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// MIME type for downloads.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME,
            Self::Docx => DOCX_MIME,
        }
    }

    /// Output file name derived from the upload's base name.
    ///
    /// The mapping is deterministic so a repeated upload overwrites its previous output.
    pub fn output_file_name(self, base_name: &str) -> String {
        match self {
            Self::Pdf => format!("{base_name}.pdf"),
            Self::Docx => format!("{base_name}_minutes.docx"),
        }
    }

    /// Infer the format of an existing output file from its extension.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        Path::new(file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(|extension| extension.parse().ok())
    }
}

/// Render model output into `path` using the chosen format.
///
/// Bytes are written to a uniquely named sibling temporary file and renamed into place, so
/// concurrent renders of the same name never observe each other's partial output. The last
/// rename wins.
pub fn render_minutes(minutes: &str, format: OutputFormat, path: &Path) -> Result<(), RenderError> {
    let bytes = match format {
        OutputFormat::Pdf => PdfLayout::build(minutes).to_bytes(),
        OutputFormat::Docx => DocxDocument::build(minutes).to_bytes(),
    }
    .inspect_err(|error| {
        tracing::error!(format = format.as_str(), error = %error, "Error rendering minutes");
    })?;

    persist_atomically(path, &bytes).inspect_err(|error| {
        tracing::error!(path = %path.display(), error = %error, "Error writing minutes document");
    })?;

    tracing::debug!(
        path = %path.display(),
        format = format.as_str(),
        bytes = bytes.len(),
        "Rendered minutes document"
    );
    Ok(())
}

fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = tempfile::Builder::new()
        .prefix(".minutes-")
        .suffix(".part")
        .tempfile_in(parent)?;
    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|error| RenderError::Io(error.error))?;
    Ok(())
}
