//! Minutes generation and follow-up question answering on top of the fallback client.

mod minutes;
mod qa;

pub use minutes::{DraftKind, GenerationError, MinutesDraft, MinutesGenerator};
pub use qa::{Answer, QaAdapter};

use crate::config::Config;
use crate::llm::{FallbackClient, HttpProvider, ProviderRole};

/// Build the primary/backup client pair described by the configuration.
pub fn fallback_client_from_config(config: &Config) -> Result<FallbackClient, reqwest::Error> {
    let primary = HttpProvider::new(ProviderRole::Primary, &config.primary, config.llm_timeout)?;
    let backup = config
        .backup
        .as_ref()
        .map(|settings| HttpProvider::new(ProviderRole::Backup, settings, config.llm_timeout))
        .transpose()?;
    Ok(FallbackClient::new(
        Box::new(primary),
        backup.map(|client| Box::new(client) as Box<dyn crate::llm::CompletionClient>),
    ))
}
