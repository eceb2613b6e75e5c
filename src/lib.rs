#![deny(missing_docs)]

//! Core library for the meeting-minutes HTTP service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Transcript extraction from uploaded DOCX documents.
pub mod extract;
/// Minutes generation and follow-up question answering.
pub mod generation;
/// Language-model provider clients with primary/backup fallback.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Request counters.
pub mod metrics;
/// Request orchestration from upload to rendered document.
pub mod pipeline;
/// Prompt templates.
pub mod prompts;
/// PDF and DOCX rendering of generated minutes.
pub mod render;
