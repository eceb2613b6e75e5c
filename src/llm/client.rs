//! HTTP client for chat- and completion-shaped model endpoints.

use crate::config::{ProviderSettings, ProviderShape};
use crate::llm::types::{ModelReply, Prompt, ProviderError, ProviderRole};
use crate::logging::redact_secret;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const MAX_LOGGED_BODY: usize = 512;

/// Interface implemented by language-model backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Which slot this client occupies in the fallback chain.
    fn role(&self) -> ProviderRole;

    /// Send the prompt and return the provider's reply.
    async fn complete(&self, prompt: &Prompt) -> Result<ModelReply, ProviderError>;
}

/// `reqwest`-backed provider speaking either the chat or the completion layout.
pub struct HttpProvider {
    http: Client,
    role: ProviderRole,
    url: String,
    api_key: Option<String>,
    model: String,
    shape: ProviderShape,
}

impl HttpProvider {
    /// Build a provider with a bounded per-request timeout.
    ///
    /// TLS certificates are always verified.
    pub fn new(
        role: ProviderRole,
        settings: &ProviderSettings,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent("minutes-api/llm")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            role,
            url: settings.url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            shape: settings.shape,
        })
    }

    fn payload(&self, prompt: &Prompt) -> Value {
        let mut payload = match self.shape {
            ProviderShape::Chat => json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": prompt.system },
                    { "role": "user", "content": prompt.user },
                ],
            }),
            ProviderShape::Completion => json!({
                "model": self.model,
                "prompt": prompt.completion,
            }),
        };
        if let Some(max_tokens) = prompt.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }
        payload
    }

    fn classify(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                provider: self.role,
            }
        } else if error.is_connect() {
            ProviderError::Connect {
                provider: self.role,
                detail: error.to_string(),
            }
        } else {
            ProviderError::Request {
                provider: self.role,
                detail: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl CompletionClient for HttpProvider {
    fn role(&self) -> ProviderRole {
        self.role
    }

    async fn complete(&self, prompt: &Prompt) -> Result<ModelReply, ProviderError> {
        tracing::info!(
            provider = %self.role,
            url = %self.url,
            model = %self.model,
            shape = ?self.shape,
            key = %self.api_key.as_deref().map(redact_secret).unwrap_or_default(),
            "Calling language model"
        );

        let mut request = self.http.post(&self.url).json(&self.payload(prompt));
        if let Some(key) = &self.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, authorization_value(key));
        }

        let response = request.send().await.map_err(|error| self.classify(error))?;
        let status = response.status();
        let body = response.text().await.map_err(|error| self.classify(error))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: self.role,
                status: status.as_u16(),
                body: truncate(&body, MAX_LOGGED_BODY),
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|error| ProviderError::Decode {
            provider: self.role,
            detail: error.to_string(),
        })?;

        let reply = match self.shape {
            ProviderShape::Chat => chat_reply(&value),
            ProviderShape::Completion => completion_reply(&value),
        };
        if let ModelReply::ContentError(detail) = &reply {
            tracing::error!(provider = %self.role, detail = %detail, "LLM returned an error");
        }
        Ok(reply)
    }
}

/// Keys that already carry a scheme (`Bearer ...`, `Token ...`) are sent verbatim.
fn authorization_value(key: &str) -> String {
    let key = key.trim();
    if key.contains(' ') {
        key.to_string()
    } else {
        format!("Bearer {key}")
    }
}

/// Extract `choices[0].message.content` from a chat-completions body.
pub(crate) fn chat_reply(value: &Value) -> ModelReply {
    let content = value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str);

    match content {
        Some(text) if !text.trim().is_empty() => ModelReply::Text(text.to_string()),
        Some(_) => ModelReply::ContentError("empty message content".into()),
        None => ModelReply::ContentError(error_detail(value)),
    }
}

/// Extract generated text from a text-generation body.
///
/// Accepts `{"generated_text": ..}`, `[{"generated_text": ..}]`, and `{"choices":[{"text": ..}]}`.
pub(crate) fn completion_reply(value: &Value) -> ModelReply {
    let candidate = match value {
        Value::Array(items) => items.first().and_then(|item| item.get("generated_text")),
        _ => value.get("generated_text").or_else(|| {
            value
                .get("choices")
                .and_then(Value::as_array)
                .and_then(|choices| choices.first())
                .and_then(|choice| choice.get("text"))
        }),
    };

    match candidate.and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => ModelReply::Text(text.to_string()),
        Some(_) => ModelReply::ContentError("empty generated text".into()),
        None => ModelReply::ContentError(error_detail(value)),
    }
}

fn error_detail(value: &Value) -> String {
    match value.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        None => "Unknown error".to_string(),
    }
}

fn truncate(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((index, _)) => format!("{}...", &body[..index]),
        None => body.to_string(),
    }
}
