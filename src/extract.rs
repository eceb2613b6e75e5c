//! Plain-text extraction from uploaded `.docx` transcripts.
//!
//! A `.docx` file is a zip container; the body lives in `word/document.xml`. Only paragraphs
//! that sit directly under `w:body` count, so table cells and headers do not leak into the
//! transcript. Paragraphs without text still contribute an empty line.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use thiserror::Error;

const DOCUMENT_PART: &str = "word/document.xml";

/// Errors raised while turning an upload into a transcript.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// File extension is not `.docx`.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    /// File could not be opened.
    #[error("Failed to open document: {0}")]
    Io(#[from] std::io::Error),
    /// Zip container was unreadable or lacked the document part.
    #[error("Invalid DOCX container: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// Document XML could not be parsed.
    #[error("Invalid DOCX markup: {0}")]
    Markup(#[from] quick_xml::Error),
}

/// Extracted text of an uploaded meeting document, one entry per paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    paragraphs: Vec<String>,
}

impl Transcript {
    /// Wrap an ordered list of paragraphs.
    pub fn from_paragraphs(paragraphs: Vec<String>) -> Self {
        Self { paragraphs }
    }

    /// Paragraphs in document order.
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Paragraphs joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }

    /// Whether the transcript has no visible text.
    pub fn is_blank(&self) -> bool {
        self.paragraphs.iter().all(|paragraph| paragraph.trim().is_empty())
    }
}

/// Whether a file name carries the only supported upload extension.
pub fn is_supported(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("docx"))
}

/// Extract the transcript from a `.docx` file on disk.
pub fn extract_transcript(path: &Path) -> Result<Transcript, ExtractError> {
    let display_name = path.display().to_string();
    if !is_supported(&display_name) {
        return Err(ExtractError::UnsupportedFileType(display_name));
    }
    let file = File::open(path)?;
    let transcript = read_docx(BufReader::new(file)).inspect_err(|error| {
        tracing::error!(path = %display_name, error = %error, "Error extracting text from DOCX");
    })?;
    tracing::debug!(
        path = %display_name,
        paragraphs = transcript.paragraphs.len(),
        "Extracted transcript"
    );
    Ok(transcript)
}

/// Extract the transcript from any seekable `.docx` byte source.
pub fn read_docx<R: Read + Seek>(reader: R) -> Result<Transcript, ExtractError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<Transcript, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut paragraph_depth: Option<usize> = None;
    let mut run_depth: Option<usize> = None;
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                depth += 1;
                match element.name().as_ref() {
                    b"w:body" => body_depth = Some(depth),
                    b"w:p" if paragraph_depth.is_none() && body_depth == Some(depth - 1) => {
                        paragraph_depth = Some(depth);
                        current.clear();
                    }
                    b"w:r" if paragraph_depth.is_some() && run_depth.is_none() => {
                        run_depth = Some(depth);
                    }
                    b"w:t" if paragraph_depth.is_some() => in_text = true,
                    _ => {}
                }
            }
            Event::Empty(element) => {
                let name = element.name();
                match name.as_ref() {
                    b"w:p" if paragraph_depth.is_none() && body_depth == Some(depth) => {
                        paragraphs.push(String::new());
                    }
                    b"w:tab" if run_depth.is_some() => current.push('\t'),
                    b"w:br" | b"w:cr" if run_depth.is_some() => current.push('\n'),
                    _ => {}
                }
            }
            Event::Text(text) if in_text => current.push_str(&text.unescape()?),
            Event::CData(data) if in_text => {
                current.push_str(&String::from_utf8_lossy(&data.into_inner()));
            }
            Event::End(element) => {
                match element.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:r" if run_depth == Some(depth) => run_depth = None,
                    b"w:p" if paragraph_depth == Some(depth) => {
                        paragraph_depth = None;
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    b"w:body" => body_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(Transcript { paragraphs })
}
