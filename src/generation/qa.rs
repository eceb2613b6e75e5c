//! Follow-up question answering over a stored transcript.

use crate::extract::Transcript;
use crate::llm::{FallbackClient, FallbackPolicy, ModelReply, ProviderRole};
use crate::prompts::question_prompt;

/// A model answer and the endpoint that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Trimmed answer text.
    pub text: String,
    /// Endpoint that answered.
    pub served_by: ProviderRole,
}

/// Answers questions strictly from the transcript, falling back to the backup on any failure.
pub struct QaAdapter {
    llm: FallbackClient,
    max_tokens: u32,
}

impl QaAdapter {
    /// Wrap a fallback client with the token budget used for answers.
    pub fn new(llm: FallbackClient, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    /// Ask a question about the transcript.
    ///
    /// Returns `None` when the question or transcript is blank, or when every provider failed.
    pub async fn answer(&self, transcript: &Transcript, question: &str) -> Option<Answer> {
        let question = question.trim();
        if question.is_empty() || transcript.is_blank() {
            tracing::warn!("Skipping question with blank input");
            return None;
        }

        let prompt = question_prompt(&transcript.text(), question, self.max_tokens);
        match self.llm.call(&prompt, FallbackPolicy::AnyFailure).await {
            Ok(outcome) => match outcome.reply {
                ModelReply::Text(text) => {
                    tracing::info!(served_by = %outcome.served_by, "Question answered");
                    Some(Answer {
                        text: text.trim().to_string(),
                        served_by: outcome.served_by,
                    })
                }
                ModelReply::ContentError(detail) => {
                    tracing::error!(detail = %detail, "Question answering returned no text");
                    None
                }
            },
            Err(error) => {
                tracing::error!(error = %error, "Question answering failed on every provider");
                None
            }
        }
    }
}
