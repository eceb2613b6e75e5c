//! Single-step primary → backup fallback over two provider clients.
//!
//! Each call tries the primary exactly once and, depending on the policy and the failure, the
//! backup exactly once. There is no retry loop and no backoff.

use crate::llm::client::CompletionClient;
use crate::llm::types::{ModelReply, Prompt, ProviderError, ProviderRole};
use std::fmt;

/// Which primary outcomes hand the call over to the backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Only transport failures fall back; content errors are returned inline.
    TransportOnly,
    /// Any outcome other than generated text falls back.
    AnyFailure,
}

/// A reply together with the endpoint that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome {
    /// Reply returned to the caller.
    pub reply: ModelReply,
    /// Endpoint that served the reply.
    pub served_by: ProviderRole,
}

/// Why a single attempt did not yield usable text.
#[derive(Debug)]
pub enum AttemptFailure {
    /// Transport-level failure.
    Transport(ProviderError),
    /// Provider answered without generated text.
    Content(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(error) => write!(f, "{error}"),
            Self::Content(detail) => write!(f, "LLM error: {detail}"),
        }
    }
}

/// Every configured provider failed.
#[derive(Debug)]
pub struct FallbackError {
    /// Failures in the order they were attempted.
    pub attempts: Vec<(ProviderRole, AttemptFailure)>,
}

impl FallbackError {
    /// Failure of the last attempted endpoint.
    pub fn last(&self) -> Option<&AttemptFailure> {
        self.attempts.last().map(|(_, failure)| failure)
    }
}

impl fmt::Display for FallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .attempts
            .iter()
            .map(|(role, failure)| format!("{role}: {failure}"))
            .collect();
        write!(f, "all providers failed ({})", rendered.join("; "))
    }
}

impl std::error::Error for FallbackError {}

/// Primary client with an optional backup tried after it fails.
pub struct FallbackClient {
    primary: Box<dyn CompletionClient>,
    backup: Option<Box<dyn CompletionClient>>,
}

impl FallbackClient {
    /// Pair a primary client with an optional backup.
    pub fn new(
        primary: Box<dyn CompletionClient>,
        backup: Option<Box<dyn CompletionClient>>,
    ) -> Self {
        Self { primary, backup }
    }

    /// Whether a backup endpoint is configured.
    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    /// Run the prompt against the primary, falling back once according to `policy`.
    pub async fn call(
        &self,
        prompt: &Prompt,
        policy: FallbackPolicy,
    ) -> Result<FallbackOutcome, FallbackError> {
        let mut attempts = Vec::new();

        match self.primary.complete(prompt).await {
            Ok(ModelReply::Text(text)) => {
                return Ok(FallbackOutcome {
                    reply: ModelReply::Text(text),
                    served_by: self.primary.role(),
                });
            }
            Ok(ModelReply::ContentError(detail)) => {
                if policy == FallbackPolicy::TransportOnly {
                    return Ok(FallbackOutcome {
                        reply: ModelReply::ContentError(detail),
                        served_by: self.primary.role(),
                    });
                }
                tracing::warn!(provider = %self.primary.role(), detail = %detail, "Primary LLM returned no text");
                attempts.push((self.primary.role(), AttemptFailure::Content(detail)));
            }
            Err(error) => {
                tracing::warn!(
                    provider = %error.provider(),
                    kind = error.kind(),
                    error = %error,
                    "Primary LLM failed"
                );
                attempts.push((self.primary.role(), AttemptFailure::Transport(error)));
            }
        }

        let Some(backup) = &self.backup else {
            tracing::error!("Primary LLM failed and no backup provider is configured");
            return Err(FallbackError { attempts });
        };

        tracing::info!("Attempting to communicate with the backup LLM");
        match backup.complete(prompt).await {
            Ok(ModelReply::Text(text)) => Ok(FallbackOutcome {
                reply: ModelReply::Text(text),
                served_by: backup.role(),
            }),
            Ok(ModelReply::ContentError(detail)) => {
                if policy == FallbackPolicy::TransportOnly {
                    return Ok(FallbackOutcome {
                        reply: ModelReply::ContentError(detail),
                        served_by: backup.role(),
                    });
                }
                tracing::error!(provider = %backup.role(), detail = %detail, "Backup LLM returned no text");
                attempts.push((backup.role(), AttemptFailure::Content(detail)));
                Err(FallbackError { attempts })
            }
            Err(error) => {
                tracing::error!(
                    provider = %error.provider(),
                    kind = error.kind(),
                    error = %error,
                    "Backup LLM failed"
                );
                attempts.push((backup.role(), AttemptFailure::Transport(error)));
                Err(FallbackError { attempts })
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Scripted, StubClient};
    use super::*;
    use std::sync::atomic::Ordering;

    fn prompt() -> Prompt {
        Prompt {
            system: "sys".into(),
            user: "user".into(),
            completion: "completion".into(),
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn primary_success_skips_backup() {
        let (primary, primary_calls) = StubClient::boxed(ProviderRole::Primary, Scripted::Text("ok"));
        let (backup, backup_calls) = StubClient::boxed(ProviderRole::Backup, Scripted::Text("backup"));
        let client = FallbackClient::new(primary, Some(backup));

        let outcome = client
            .call(&prompt(), FallbackPolicy::AnyFailure)
            .await
            .expect("outcome");

        assert_eq!(outcome.reply, ModelReply::Text("ok".into()));
        assert_eq!(outcome.served_by, ProviderRole::Primary);
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_failure_tries_backup_once() {
        let (primary, _) = StubClient::boxed(ProviderRole::Primary, Scripted::Timeout);
        let (backup, backup_calls) =
            StubClient::boxed(ProviderRole::Backup, Scripted::Text("from backup"));
        let client = FallbackClient::new(primary, Some(backup));

        let outcome = client
            .call(&prompt(), FallbackPolicy::TransportOnly)
            .await
            .expect("outcome");

        assert_eq!(outcome.served_by, ProviderRole::Backup);
        assert_eq!(outcome.reply, ModelReply::Text("from backup".into()));
        assert_eq!(backup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn content_error_is_inline_under_transport_only() {
        let (primary, _) = StubClient::boxed(ProviderRole::Primary, Scripted::Content("refused"));
        let (backup, backup_calls) = StubClient::boxed(ProviderRole::Backup, Scripted::Text("x"));
        let client = FallbackClient::new(primary, Some(backup));

        let outcome = client
            .call(&prompt(), FallbackPolicy::TransportOnly)
            .await
            .expect("outcome");

        assert_eq!(outcome.reply, ModelReply::ContentError("refused".into()));
        assert_eq!(backup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn content_error_falls_back_under_any_failure() {
        let (primary, _) = StubClient::boxed(ProviderRole::Primary, Scripted::Content("refused"));
        let (backup, backup_calls) = StubClient::boxed(ProviderRole::Backup, Scripted::Text("x"));
        let client = FallbackClient::new(primary, Some(backup));

        let outcome = client
            .call(&prompt(), FallbackPolicy::AnyFailure)
            .await
            .expect("outcome");

        assert_eq!(outcome.served_by, ProviderRole::Backup);
        assert_eq!(backup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_failures_are_reported_in_order() {
        let (primary, _) = StubClient::boxed(ProviderRole::Primary, Scripted::Timeout);
        let (backup, _) = StubClient::boxed(ProviderRole::Backup, Scripted::Content("empty"));
        let client = FallbackClient::new(primary, Some(backup));

        let error = client
            .call(&prompt(), FallbackPolicy::AnyFailure)
            .await
            .expect_err("both fail");

        assert_eq!(error.attempts.len(), 2);
        assert_eq!(error.attempts[0].0, ProviderRole::Primary);
        assert!(matches!(error.last(), Some(AttemptFailure::Content(detail)) if detail == "empty"));
        assert!(error.to_string().contains("primary: primary provider timed out"));
    }

    #[tokio::test]
    async fn missing_backup_returns_primary_failure() {
        let (primary, _) = StubClient::boxed(ProviderRole::Primary, Scripted::Timeout);
        let client = FallbackClient::new(primary, None);
        assert!(!client.has_backup());

        let error = client
            .call(&prompt(), FallbackPolicy::TransportOnly)
            .await
            .expect_err("no backup");
        assert_eq!(error.attempts.len(), 1);
    }
}
