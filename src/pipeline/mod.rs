//! Request orchestration: upload handling, extraction, generation, rendering, and downloads.

pub mod sanitize;
mod service;
pub mod types;

pub use service::{MinutesApi, MinutesService};
pub use types::{DownloadTarget, GeneratedMinutes, ServiceError, UploadedTranscript};
