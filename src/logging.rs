//! Tracing configuration and log routing.
//!
//! The service logs to stdout using a compact formatter and mirrors the stream to a file:
//! `MINUTES_LOG_FILE` when set, `logs/minutes-api.log` otherwise. Missing parent directories are
//! created and the file is opened for append behind a non-blocking writer.
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact stdout layer and, when available, a file layer.
/// - Keeps the non-blocking writer guard alive for the process lifetime.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    if let Some(writer) = configure_file_writer() {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

/// Mask a credential for log output, keeping at most a short prefix.
pub fn redact_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if prefix.is_empty() {
        "<empty>".to_string()
    } else {
        format!("{prefix}...")
    }
}

const DEFAULT_LOG_FILE: &str = "logs/minutes-api.log";

fn configure_file_writer() -> Option<NonBlocking> {
    let path = log_file_path(std::env::var("MINUTES_LOG_FILE").ok());
    match open_log_file(&path) {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(non_blocking)
        }
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}

fn log_file_path(configured: Option<String>) -> PathBuf {
    configured
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn log_path_defaults_when_unset_or_blank() {
        assert_eq!(log_file_path(None), PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(log_file_path(Some("  ".into())), PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(
            log_file_path(Some("/var/log/minutes.log".into())),
            PathBuf::from("/var/log/minutes.log")
        );
    }

    #[test]
    fn log_file_is_created_with_parents_and_appended() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("service.log");

        open_log_file(&path)
            .expect("first open")
            .write_all(b"one\n")
            .expect("write");
        open_log_file(&path)
            .expect("second open")
            .write_all(b"two\n")
            .expect("write");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "one\ntwo\n");
    }

    #[test]
    fn redaction_keeps_short_prefix() {
        assert_eq!(redact_secret("sk-abcdef"), "sk-a...");
        assert_eq!(redact_secret("ab"), "ab...");
        assert_eq!(redact_secret(""), "<empty>");
    }
}
