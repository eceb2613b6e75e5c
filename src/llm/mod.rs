//! Language-model provider clients and the primary/backup fallback policy.

mod client;
mod fallback;
pub mod types;

pub use client::{CompletionClient, HttpProvider};
pub use fallback::{AttemptFailure, FallbackClient, FallbackError, FallbackOutcome, FallbackPolicy};
pub use types::{ModelReply, Prompt, ProviderError, ProviderRole};

#[cfg(test)]
pub(crate) use fallback::testing;
