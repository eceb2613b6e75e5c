use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SERVER_PORT: u16 = 5000;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 45;
const DEFAULT_MINUTES_MAX_TOKENS: u32 = 8000;
const DEFAULT_ANSWER_MAX_TOKENS: u32 = 500;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the minutes service.
///
/// Built once at process start and handed to every component that needs it; nothing in the
/// request path reads the environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory where uploaded transcripts are stored.
    pub upload_dir: PathBuf,
    /// Directory receiving rendered PDF and DOCX files.
    pub output_dir: PathBuf,
    /// Port the HTTP server listens on.
    pub server_port: u16,
    /// Provider tried first for every model call.
    pub primary: ProviderSettings,
    /// Provider tried once after the primary fails, when configured.
    pub backup: Option<ProviderSettings>,
    /// Ceiling applied to each provider request.
    pub llm_timeout: Duration,
    /// Token budget requested when generating minutes.
    pub minutes_max_tokens: u32,
    /// Token budget requested when answering questions.
    pub answer_max_tokens: u32,
    /// Largest accepted request body for uploads.
    pub max_upload_bytes: usize,
}

/// Connection details for a single language-model endpoint.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Full URL requests are posted to.
    pub url: String,
    /// Credential sent in the `Authorization` header.
    pub api_key: Option<String>,
    /// Model identifier included in the payload.
    pub model: String,
    /// Payload and response layout spoken by the endpoint.
    pub shape: ProviderShape,
}

/// Request/response layout understood by a provider endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderShape {
    /// Chat-completions style: a message list in, `choices[].message.content` out.
    Chat,
    /// Text-generation style: a single prompt string in, `generated_text` out.
    Completion,
}

impl std::str::FromStr for ProviderShape {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "completion" | "completions" | "generate" => Ok(Self::Completion),
            _ => Err(()),
        }
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Listening port override.
    pub port: Option<u16>,
    /// Upload directory override.
    pub upload_dir: Option<PathBuf>,
    /// Output directory override.
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an in-memory map of variables.
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(|key| values.get(key).cloned())
    }

    fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source(lookup);
        let llm_timeout_secs: u64 =
            source.parsed_or("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?;
        if llm_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("LLM_TIMEOUT_SECS".into()));
        }

        let server_port = match source.optional("SERVER_PORT") {
            Some(value) => Some(value),
            None => source
                .optional("FLASK_PORT")
                .or_else(|| source.optional("HTTP_PORT")),
        }
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
        })
        .transpose()?
        .unwrap_or(DEFAULT_SERVER_PORT);

        Ok(Self {
            upload_dir: PathBuf::from(source.required("UPLOAD_FOLDER")?),
            output_dir: PathBuf::from(source.required("OUTPUT_FOLDER")?),
            server_port,
            primary: ProviderSettings {
                url: source.required("PRIMARY_LLM_URL")?,
                api_key: source.optional("PRIMARY_LLM_API_KEY"),
                model: source.required("PRIMARY_LLM_MODEL")?,
                shape: source.shape_or("PRIMARY_LLM_SHAPE", ProviderShape::Chat)?,
            },
            backup: load_backup(&source)?,
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            minutes_max_tokens: source.parsed_or("MINUTES_MAX_TOKENS", DEFAULT_MINUTES_MAX_TOKENS)?,
            answer_max_tokens: source.parsed_or("ANSWER_MAX_TOKENS", DEFAULT_ANSWER_MAX_TOKENS)?,
            max_upload_bytes: source.parsed_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(port) = overrides.port {
            self.server_port = port;
        }
        if let Some(dir) = overrides.upload_dir {
            self.upload_dir = dir;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        self
    }
}

fn load_backup<F>(source: &Source<F>) -> Result<Option<ProviderSettings>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let url = source.optional("BACKUP_LLM_URL");
    let model = source.optional("BACKUP_LLM_MODEL");
    match (url, model) {
        (Some(url), Some(model)) => Ok(Some(ProviderSettings {
            url,
            api_key: source.optional("BACKUP_LLM_API_KEY"),
            model,
            shape: source.shape_or("BACKUP_LLM_SHAPE", ProviderShape::Completion)?,
        })),
        (Some(_), None) => Err(ConfigError::MissingVariable("BACKUP_LLM_MODEL".into())),
        (None, _) => Ok(None),
    }
}

struct Source<F>(F);

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parsed_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string())),
            None => Ok(default),
        }
    }

    fn shape_or(&self, key: &str, default: ProviderShape) -> Result<ProviderShape, ConfigError> {
        match self.optional(key) {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue(key.to_string())),
            None => Ok(default),
        }
    }
}

/// Load variables from a `.env` file, if present, without overriding the process environment.
///
/// Returns the path that was read.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Read the environment and apply command-line overrides.
///
/// Call after tracing is initialized so the resolved settings are logged.
pub fn init_config(overrides: Overrides) -> Result<Config, ConfigError> {
    let config = Config::from_env()?.with_overrides(overrides);
    log_loaded(&config);
    Ok(config)
}

fn log_loaded(config: &Config) {
    tracing::debug!(
        upload_dir = %config.upload_dir.display(),
        output_dir = %config.output_dir.display(),
        server_port = config.server_port,
        primary_url = %config.primary.url,
        primary_model = %config.primary.model,
        backup_configured = config.backup.is_some(),
        timeout_secs = config.llm_timeout.as_secs(),
        "Loaded configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn base_vars() -> HashMap<String, String> {
        [
            ("UPLOAD_FOLDER", "/tmp/uploads"),
            ("OUTPUT_FOLDER", "/tmp/output"),
            ("PRIMARY_LLM_URL", "https://llm.example.com/v1/chat/completions"),
            ("PRIMARY_LLM_MODEL", "primary-model"),
            ("PRIMARY_LLM_API_KEY", "pk-123"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }

    #[test]
    fn loads_defaults_without_backup() {
        let config = Config::from_map(&base_vars()).expect("config");
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.llm_timeout, Duration::from_secs(45));
        assert_eq!(config.minutes_max_tokens, 8000);
        assert_eq!(config.primary.shape, ProviderShape::Chat);
        assert_eq!(config.primary.api_key.as_deref(), Some("pk-123"));
        assert!(config.backup.is_none());
    }

    #[test]
    fn backup_defaults_to_completion_shape() {
        let mut vars = base_vars();
        vars.insert("BACKUP_LLM_URL".into(), "https://backup.example.com/generate".into());
        vars.insert("BACKUP_LLM_MODEL".into(), "backup-model".into());
        vars.insert("FLASK_PORT".into(), "8080".into());

        let config = Config::from_map(&vars).expect("config");
        let backup = config.backup.expect("backup configured");
        assert_eq!(backup.shape, ProviderShape::Completion);
        assert_eq!(backup.model, "backup-model");
        assert!(backup.api_key.is_none());
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn backup_url_without_model_is_rejected() {
        let mut vars = base_vars();
        vars.insert("BACKUP_LLM_URL".into(), "https://backup.example.com".into());
        let error = Config::from_map(&vars).expect_err("missing model");
        assert!(matches!(error, ConfigError::MissingVariable(key) if key == "BACKUP_LLM_MODEL"));
    }

    #[test]
    fn missing_primary_url_is_reported() {
        let mut vars = base_vars();
        vars.remove("PRIMARY_LLM_URL");
        let error = Config::from_map(&vars).expect_err("missing url");
        assert!(matches!(error, ConfigError::MissingVariable(key) if key == "PRIMARY_LLM_URL"));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let mut vars = base_vars();
        vars.insert("LLM_TIMEOUT_SECS".into(), "0".into());
        let error = Config::from_map(&vars).expect_err("zero timeout");
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "LLM_TIMEOUT_SECS"));
    }

    #[test]
    fn overrides_take_precedence() {
        let config = Config::from_map(&base_vars())
            .expect("config")
            .with_overrides(Overrides {
                port: Some(9000),
                upload_dir: Some(PathBuf::from("/srv/in")),
                output_dir: None,
            });
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.upload_dir, PathBuf::from("/srv/in"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/output"));
    }

    #[derive(Clone)]
    struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn resolved_settings_are_logged_under_an_active_subscriber() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let writer = CapturedWriter(captured.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let config = Config::from_map(&base_vars()).expect("config");

        tracing::subscriber::with_default(subscriber, || log_loaded(&config));

        let output = String::from_utf8(captured.lock().expect("log buffer").clone()).expect("utf8");
        assert!(output.contains("Loaded configuration"));
        assert!(output.contains("primary-model"));
        assert!(!output.contains("pk-123"));
    }
}
