//! Request and response types shared by every provider client.

use std::fmt;
use thiserror::Error;

/// A fully rendered request for a single model call.
///
/// Chat-shaped providers receive `system` and `user` as a message list; completion-shaped
/// providers receive `completion` as their only prompt string.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// System instruction framing the assistant's role.
    pub system: String,
    /// User instruction embedding the transcript.
    pub user: String,
    /// Single-string rendition for completion-style endpoints.
    pub completion: String,
    /// Optional generation budget forwarded to the provider.
    pub max_tokens: Option<u32>,
}

/// Which configured endpoint served (or failed) a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderRole {
    /// Endpoint tried first.
    Primary,
    /// Endpoint tried after the primary failed.
    Backup,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Backup => f.write_str("backup"),
        }
    }
}

/// Body of a successful (2xx, JSON) provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// The provider produced generated text.
    Text(String),
    /// The provider answered, but without the expected payload shape.
    ContentError(String),
}

/// Transport-level failures talking to a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider did not answer within the configured ceiling.
    #[error("{provider} provider timed out")]
    Timeout {
        /// Endpoint that timed out.
        provider: ProviderRole,
    },
    /// Connection could not be established.
    #[error("{provider} provider unreachable: {detail}")]
    Connect {
        /// Endpoint that was unreachable.
        provider: ProviderRole,
        /// Underlying transport message.
        detail: String,
    },
    /// Provider answered with a non-success status code.
    #[error("{provider} provider returned {status}: {body}")]
    Status {
        /// Endpoint that rejected the request.
        provider: ProviderRole,
        /// HTTP status code received.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },
    /// Response body was not valid JSON.
    #[error("{provider} provider sent an undecodable body: {detail}")]
    Decode {
        /// Endpoint that produced the body.
        provider: ProviderRole,
        /// Parser message.
        detail: String,
    },
    /// Any other request failure.
    #[error("{provider} provider request failed: {detail}")]
    Request {
        /// Endpoint the request targeted.
        provider: ProviderRole,
        /// Underlying transport message.
        detail: String,
    },
}

impl ProviderError {
    /// Endpoint the failure belongs to.
    pub fn provider(&self) -> ProviderRole {
        match self {
            Self::Timeout { provider }
            | Self::Connect { provider, .. }
            | Self::Status { provider, .. }
            | Self::Decode { provider, .. }
            | Self::Request { provider, .. } => *provider,
        }
    }

    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connect { .. } => "connect",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
            Self::Request { .. } => "request",
        }
    }
}
