//! Minutes service coordinating extraction, generation, rendering, and downloads.

use crate::{
    config::Config,
    extract::{self, Transcript},
    generation::{Answer, GenerationError, MinutesGenerator, QaAdapter, fallback_client_from_config},
    metrics::{MetricsSnapshot, ServiceMetrics},
    pipeline::{
        sanitize::{base_name, exact_file_name, file_name_component},
        types::{DownloadTarget, GeneratedMinutes, ServiceError, UploadedTranscript},
    },
    render::{OutputFormat, render_minutes},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::Instrument;
use uuid::Uuid;

/// Coordinates the full request path: store the upload, extract the transcript, call the
/// providers, and render the output document.
///
/// The service owns long-lived provider clients and the metrics registry; construct it once at
/// process start and share it through an `Arc`.
pub struct MinutesService {
    config: Arc<Config>,
    generator: MinutesGenerator,
    qa: QaAdapter,
    metrics: Arc<ServiceMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait MinutesApi: Send + Sync {
    /// Store an uploaded transcript and render minutes in the requested format.
    async fn generate_minutes(
        &self,
        upload: UploadedTranscript,
        format: OutputFormat,
    ) -> Result<GeneratedMinutes, ServiceError>;

    /// Answer a question about a previously uploaded transcript.
    async fn answer_question(&self, file_name: &str, question: &str)
    -> Result<Answer, ServiceError>;

    /// Locate a rendered output file for download.
    async fn resolve_download(&self, file_name: &str) -> Result<DownloadTarget, ServiceError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl MinutesService {
    /// Build the service and its provider clients from configuration.
    pub fn new(config: Arc<Config>) -> Result<Self, reqwest::Error> {
        tracing::info!(
            backup_configured = config.backup.is_some(),
            "Initializing language model clients"
        );
        let generator = MinutesGenerator::new(
            fallback_client_from_config(&config)?,
            config.minutes_max_tokens,
        );
        let qa = QaAdapter::new(fallback_client_from_config(&config)?, config.answer_max_tokens);
        Ok(Self::with_components(config, generator, qa))
    }

    /// Assemble the service from prebuilt components.
    pub fn with_components(config: Arc<Config>, generator: MinutesGenerator, qa: QaAdapter) -> Self {
        Self {
            config,
            generator,
            qa,
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }

    /// Create the upload and output directories when missing.
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.config.upload_dir).await?;
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        tracing::debug!(
            upload_dir = %self.config.upload_dir.display(),
            output_dir = %self.config.output_dir.display(),
            "Working directories ready"
        );
        Ok(())
    }

    async fn generate_inner(
        &self,
        upload: UploadedTranscript,
        format: OutputFormat,
    ) -> Result<GeneratedMinutes, ServiceError> {
        let file_name = file_name_component(&upload.file_name)
            .ok_or_else(|| ServiceError::InvalidInput("No file selected.".into()))?;
        if !extract::is_supported(&file_name) {
            return Err(ServiceError::InvalidInput(
                "Invalid file. Please upload a DOCX file.".into(),
            ));
        }
        let base = base_name(&file_name)
            .ok_or_else(|| ServiceError::InvalidInput("Invalid file name.".into()))?;

        let upload_path = self.config.upload_dir.join(&file_name);
        tokio::fs::write(&upload_path, &upload.bytes).await?;
        tracing::info!(path = %upload_path.display(), bytes = upload.bytes.len(), "File uploaded");

        let transcript = load_transcript(upload_path).await?;
        let draft = self
            .generator
            .generate(&transcript)
            .await
            .map_err(|error| match error {
                GenerationError::EmptyTranscript => {
                    ServiceError::InvalidInput("The uploaded document contains no text.".into())
                }
            })?;

        let output_name = format.output_file_name(&base);
        let output_path = self.config.output_dir.join(&output_name);
        let text = draft.text.clone();
        let render_path = output_path.clone();
        run_blocking(move || {
            render_minutes(&text, format, &render_path).map_err(ServiceError::from)
        })
        .await?;

        self.metrics.record_minutes(draft.served_by);
        tracing::info!(
            output = %output_path.display(),
            kind = ?draft.kind,
            "Meeting minutes generated"
        );

        Ok(GeneratedMinutes {
            message: format!("{} generated successfully", format.as_str().to_uppercase()),
            filename: output_name,
            docx_file: file_name,
            full_path: output_path,
            format,
            draft_kind: draft.kind,
            served_by: draft.served_by,
            generated_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        })
    }

    async fn answer_inner(&self, file_name: &str, question: &str) -> Result<Answer, ServiceError> {
        if file_name.trim().is_empty() || question.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Question and filename are required.".into(),
            ));
        }
        let file_name = file_name_component(file_name)
            .ok_or_else(|| ServiceError::InvalidInput("Invalid file name.".into()))?;
        if !extract::is_supported(&file_name) {
            return Err(ServiceError::InvalidInput(format!(
                "Unsupported file type: {file_name}"
            )));
        }

        let upload_path = self.config.upload_dir.join(&file_name);
        if !path_exists(&upload_path).await? {
            tracing::warn!(path = %upload_path.display(), "Transcript for question not found");
            return Err(ServiceError::NotFound(file_name));
        }

        let transcript = load_transcript(upload_path).await?;
        let answer = self.qa.answer(&transcript, question).await;
        self.metrics
            .record_question(answer.as_ref().map(|answer| answer.served_by));
        answer.ok_or(ServiceError::NoAnswer)
    }
}

#[async_trait]
impl MinutesApi for MinutesService {
    async fn generate_minutes(
        &self,
        upload: UploadedTranscript,
        format: OutputFormat,
    ) -> Result<GeneratedMinutes, ServiceError> {
        let span = tracing::info_span!(
            "generate_minutes",
            request_id = %Uuid::new_v4(),
            file = %upload.file_name,
            format = format.as_str()
        );
        self.generate_inner(upload, format)
            .instrument(span)
            .await
            .inspect_err(|error| tracing::error!(error = %error, "Error in generate_minutes"))
    }

    async fn answer_question(
        &self,
        file_name: &str,
        question: &str,
    ) -> Result<Answer, ServiceError> {
        let span = tracing::info_span!(
            "ask_question",
            request_id = %Uuid::new_v4(),
            file = %file_name
        );
        self.answer_inner(file_name, question)
            .instrument(span)
            .await
            .inspect_err(|error| tracing::error!(error = %error, "Error in ask_question"))
    }

    async fn resolve_download(&self, file_name: &str) -> Result<DownloadTarget, ServiceError> {
        let name = exact_file_name(file_name)
            .ok_or_else(|| ServiceError::InvalidInput("Invalid file name.".into()))?;
        let path = self.config.output_dir.join(&name);
        tracing::info!(path = %path.display(), "Attempting to serve file");

        if !path_exists(&path).await? {
            tracing::error!(path = %path.display(), "File not found");
            return Err(ServiceError::NotFound(name));
        }
        let format = OutputFormat::from_file_name(&name)
            .ok_or_else(|| ServiceError::InvalidInput("Unsupported file type".into()))?;

        Ok(DownloadTarget {
            path,
            file_name: name,
            format,
        })
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

async fn load_transcript(path: PathBuf) -> Result<Transcript, ServiceError> {
    run_blocking(move || extract::extract_transcript(&path).map_err(ServiceError::from)).await
}

async fn path_exists(path: &Path) -> Result<bool, ServiceError> {
    Ok(tokio::fs::try_exists(path).await?)
}

async fn run_blocking<T, F>(task: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|error| ServiceError::Io(std::io::Error::other(error)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderSettings, ProviderShape};
    use crate::extract::testing::docx_with_paragraphs;
    use crate::generation::DraftKind;
    use crate::llm::testing::{Scripted, StubClient};
    use crate::llm::{FallbackClient, ProviderRole};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        config: Arc<Config>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            upload_dir: dir.path().join("uploads"),
            output_dir: dir.path().join("output"),
            server_port: 0,
            primary: ProviderSettings {
                url: "http://127.0.0.1:9/unused".into(),
                api_key: None,
                model: "unused".into(),
                shape: ProviderShape::Chat,
            },
            backup: None,
            llm_timeout: Duration::from_secs(1),
            minutes_max_tokens: 100,
            answer_max_tokens: 50,
            max_upload_bytes: 1024 * 1024,
        };
        Fixture {
            _dir: dir,
            config: Arc::new(config),
        }
    }

    async fn service(fixture: &Fixture, minutes: Scripted, answer: Scripted) -> MinutesService {
        let (primary, _) = StubClient::boxed(ProviderRole::Primary, minutes);
        let generator = MinutesGenerator::new(FallbackClient::new(primary, None), 100);
        let (qa_primary, _) = StubClient::boxed(ProviderRole::Primary, Scripted::Timeout);
        let (qa_backup, _) = StubClient::boxed(ProviderRole::Backup, answer);
        let qa = QaAdapter::new(FallbackClient::new(qa_primary, Some(qa_backup)), 50);
        let service = MinutesService::with_components(fixture.config.clone(), generator, qa);
        service.ensure_directories().await.expect("dirs");
        service
    }

    fn upload(name: &str) -> UploadedTranscript {
        UploadedTranscript {
            file_name: name.into(),
            bytes: docx_with_paragraphs(&["Alice: We shipped v2.", "", "Bob: I will follow up."]),
        }
    }

    #[tokio::test]
    async fn generates_pdf_named_after_upload() {
        let fixture = fixture();
        let service = service(
            &fixture,
            Scripted::Text("**Action Items**\n- Bob to follow up"),
            Scripted::Text("Bob"),
        )
        .await;

        let generated = service
            .generate_minutes(upload("weekly.docx"), OutputFormat::Pdf)
            .await
            .expect("generated");

        assert_eq!(generated.filename, "weekly.pdf");
        assert_eq!(generated.docx_file, "weekly.docx");
        assert_eq!(generated.message, "PDF generated successfully");
        assert_eq!(generated.draft_kind, DraftKind::Generated);
        assert!(generated.full_path.exists());
        assert!(fixture.config.upload_dir.join("weekly.docx").exists());
        assert_eq!(service.metrics_snapshot().minutes_generated, 1);
    }

    #[tokio::test]
    async fn provider_failure_still_renders_a_document() {
        let fixture = fixture();
        let service = service(&fixture, Scripted::Timeout, Scripted::Text("Bob")).await;

        let generated = service
            .generate_minutes(upload("weekly.docx"), OutputFormat::Docx)
            .await
            .expect("generated");

        assert_eq!(generated.filename, "weekly_minutes.docx");
        assert_eq!(generated.draft_kind, DraftKind::ProviderFailure);
        let transcript = extract::extract_transcript(&generated.full_path).expect("docx");
        assert_eq!(
            transcript.paragraphs()[1],
            "Error: Connection to LLM service timed out"
        );
    }

    #[tokio::test]
    async fn unsupported_upload_writes_nothing() {
        let fixture = fixture();
        let service = service(&fixture, Scripted::Text("x"), Scripted::Text("Bob")).await;

        let error = service
            .generate_minutes(
                UploadedTranscript {
                    file_name: "notes.txt".into(),
                    bytes: b"plain".to_vec(),
                },
                OutputFormat::Pdf,
            )
            .await
            .expect_err("invalid");

        assert!(matches!(error, ServiceError::InvalidInput(_)));
        let stored = std::fs::read_dir(&fixture.config.upload_dir)
            .expect("upload dir")
            .count();
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn corrupt_docx_is_an_extraction_failure() {
        let fixture = fixture();
        let service = service(&fixture, Scripted::Text("x"), Scripted::Text("Bob")).await;

        let error = service
            .generate_minutes(
                UploadedTranscript {
                    file_name: "broken.docx".into(),
                    bytes: b"not a zip".to_vec(),
                },
                OutputFormat::Pdf,
            )
            .await
            .expect_err("extraction");
        assert!(matches!(error, ServiceError::Extraction(_)));
    }

    #[tokio::test]
    async fn question_uses_backup_answer() {
        let fixture = fixture();
        let service = service(&fixture, Scripted::Text("x"), Scripted::Text("Bob follows up.")).await;
        service
            .generate_minutes(upload("weekly.docx"), OutputFormat::Pdf)
            .await
            .expect("generated");

        let answer = service
            .answer_question("weekly.docx", "Who follows up?")
            .await
            .expect("answer");
        assert_eq!(answer.text, "Bob follows up.");
        assert_eq!(answer.served_by, ProviderRole::Backup);

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.questions_answered, 1);
        assert_eq!(snapshot.backup_used, 1);
    }

    #[tokio::test]
    async fn question_failure_kinds_are_distinct() {
        let fixture = fixture();
        let service = service(&fixture, Scripted::Text("x"), Scripted::Timeout).await;

        let missing = service
            .answer_question("absent.docx", "Who?")
            .await
            .expect_err("missing");
        assert!(matches!(missing, ServiceError::NotFound(_)));

        let blank = service
            .answer_question("weekly.docx", " ")
            .await
            .expect_err("blank");
        assert!(matches!(blank, ServiceError::InvalidInput(_)));

        service
            .generate_minutes(upload("weekly.docx"), OutputFormat::Pdf)
            .await
            .expect("generated");
        let unanswered = service
            .answer_question("weekly.docx", "Who?")
            .await
            .expect_err("no answer");
        assert!(matches!(unanswered, ServiceError::NoAnswer));
    }

    #[tokio::test]
    async fn download_resolution_checks_existence_then_extension() {
        let fixture = fixture();
        let service = service(&fixture, Scripted::Text("x"), Scripted::Text("Bob")).await;

        let missing = service
            .resolve_download("nothing.pdf")
            .await
            .expect_err("missing");
        assert!(matches!(missing, ServiceError::NotFound(_)));

        std::fs::write(fixture.config.output_dir.join("notes.txt"), b"x").expect("write");
        let unsupported = service
            .resolve_download("notes.txt")
            .await
            .expect_err("unsupported");
        assert!(matches!(unsupported, ServiceError::InvalidInput(_)));

        let traversal = service
            .resolve_download("../uploads/weekly.docx")
            .await
            .expect_err("traversal");
        assert!(matches!(traversal, ServiceError::InvalidInput(_)));

        service
            .generate_minutes(upload("weekly.docx"), OutputFormat::Docx)
            .await
            .expect("generated");
        let target = service
            .resolve_download("weekly_minutes.docx")
            .await
            .expect("target");
        assert_eq!(target.format, OutputFormat::Docx);
    }
}
