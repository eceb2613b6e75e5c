//! Meeting-minutes generation over the primary/backup fallback client.

use crate::extract::Transcript;
use crate::llm::{
    AttemptFailure, FallbackClient, FallbackError, FallbackPolicy, ModelReply, ProviderError,
    ProviderRole,
};
use crate::prompts::minutes_prompt;
use thiserror::Error;

/// Errors that stop generation before any provider is called.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transcript has no visible text.
    #[error("Transcript is empty")]
    EmptyTranscript,
}

/// How the draft text came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    /// The model produced minutes.
    Generated,
    /// The model answered without the expected payload; the text carries its error.
    ContentError,
    /// No provider could be reached; the text describes the failure.
    ProviderFailure,
}

/// Text handed to the renderer, always present even when the providers failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinutesDraft {
    /// Markdown-flavored minutes or a descriptive failure line.
    pub text: String,
    /// Outcome classification.
    pub kind: DraftKind,
    /// Endpoint that answered, if any did.
    pub served_by: Option<ProviderRole>,
}

/// Builds the minutes prompt and runs it through the fallback client.
pub struct MinutesGenerator {
    llm: FallbackClient,
    max_tokens: u32,
}

impl MinutesGenerator {
    /// Wrap a fallback client with the token budget used for minutes.
    pub fn new(llm: FallbackClient, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    /// Generate minutes for a transcript.
    ///
    /// Transport failures never surface as errors: the returned draft carries a descriptive
    /// line instead so the caller always has something to render.
    pub async fn generate(&self, transcript: &Transcript) -> Result<MinutesDraft, GenerationError> {
        if transcript.is_blank() {
            return Err(GenerationError::EmptyTranscript);
        }

        let prompt = minutes_prompt(&transcript.text(), self.max_tokens);
        let draft = match self.llm.call(&prompt, FallbackPolicy::TransportOnly).await {
            Ok(outcome) => match outcome.reply {
                ModelReply::Text(text) => MinutesDraft {
                    text,
                    kind: DraftKind::Generated,
                    served_by: Some(outcome.served_by),
                },
                ModelReply::ContentError(detail) => MinutesDraft {
                    text: format!("LLM error: {detail}"),
                    kind: DraftKind::ContentError,
                    served_by: Some(outcome.served_by),
                },
            },
            Err(error) => {
                tracing::error!(error = %error, "Minutes generation failed on every provider");
                MinutesDraft {
                    text: describe_failure(&error),
                    kind: DraftKind::ProviderFailure,
                    served_by: None,
                }
            }
        };

        tracing::info!(
            kind = ?draft.kind,
            served_by = ?draft.served_by,
            chars = draft.text.len(),
            "Minutes draft ready"
        );
        Ok(draft)
    }
}

fn describe_failure(error: &FallbackError) -> String {
    match error.last() {
        Some(AttemptFailure::Transport(ProviderError::Timeout { .. })) => {
            "Error: Connection to LLM service timed out".to_string()
        }
        Some(AttemptFailure::Transport(ProviderError::Connect { detail, .. })) => {
            format!("Network Error: Unable to connect to LLM service. Details: {detail}")
        }
        Some(AttemptFailure::Transport(other)) => format!("Unexpected Error: {other}"),
        Some(AttemptFailure::Content(detail)) => format!("LLM error: {detail}"),
        None => "Unexpected Error: no language model provider was attempted".to_string(),
    }
}
