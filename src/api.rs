//! HTTP surface for the meeting-minutes service.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` – Service status plus a machine-readable endpoint catalog.
//! - `POST /generate_minutes` – Multipart upload (`docx_file`, optional `output_format`) that
//!   extracts the transcript, generates minutes, and renders a PDF or DOCX.
//! - `POST /ask_question` – JSON `{ "filename", "question" }` answered from a stored transcript.
//! - `GET /download_file/:filename` – Stream a rendered PDF or DOCX as an attachment.
//! - `GET /download_pdf/:filename` – Older PDF-only download path.
//! - `GET /metrics` – Request counters.
//!
//! Every error leaves the router as `{"error": "..."}` with a 4xx or 5xx status.

use crate::pipeline::{MinutesApi, ServiceError, UploadedTranscript};
use crate::render::OutputFormat;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const SERVICE_NAME: &str = "Meeting Minutes Generation API";

/// Build the HTTP router for the minutes service.
///
/// `max_upload_bytes` bounds the request body accepted by every route.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: MinutesApi + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/generate_minutes", post(generate_minutes::<S>))
        .route("/ask_question", post(ask_question::<S>))
        .route("/download_file/:filename", get(download_file::<S>))
        .route("/download_pdf/:filename", get(download_pdf::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Success response for `POST /generate_minutes`.
#[derive(Serialize)]
struct GenerateResponse {
    message: String,
    filename: String,
    docx_file: String,
    #[serde(rename = "fullPath")]
    full_path: String,
    generated_at: String,
}

/// Fields collected from the multipart upload.
#[derive(Default)]
struct GenerateForm {
    upload: Option<UploadedTranscript>,
    output_format: Option<String>,
}

/// Generate minutes from an uploaded DOCX transcript.
///
/// The output format is validated before the upload touches disk.
async fn generate_minutes<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, ApiError>
where
    S: MinutesApi,
{
    let form = read_generate_form(multipart?).await?;
    let upload = form
        .upload
        .ok_or_else(|| ApiError::bad_request("No DOCX file uploaded."))?;
    if upload.file_name.trim().is_empty() || !crate::extract::is_supported(&upload.file_name) {
        return Err(ApiError::bad_request(
            "Invalid file. Please upload a DOCX file.",
        ));
    }
    let format = match form.output_format.as_deref() {
        None => OutputFormat::default(),
        Some(raw) => raw.parse().map_err(|()| {
            ApiError::bad_request("Invalid output format. Choose 'pdf' or 'docx'.")
        })?,
    };

    let generated = service.generate_minutes(upload, format).await?;
    Ok(Json(GenerateResponse {
        message: generated.message,
        filename: generated.filename,
        docx_file: generated.docx_file,
        full_path: generated.full_path.display().to_string(),
        generated_at: generated.generated_at,
    }))
}

async fn read_generate_form(mut multipart: Multipart) -> Result<GenerateForm, ApiError> {
    let mut form = GenerateForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("docx_file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                form.upload = Some(UploadedTranscript {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            Some("output_format") => {
                form.output_format = Some(field.text().await?);
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }
    Ok(form)
}

/// Request body for `POST /ask_question`.
#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    question: Option<String>,
}

/// Success response for `POST /ask_question`.
#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

/// Answer a question about a previously uploaded transcript.
async fn ask_question<S>(
    State(service): State<Arc<S>>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError>
where
    S: MinutesApi,
{
    let Json(request) = request?;
    let (Some(filename), Some(question)) = (request.filename, request.question) else {
        return Err(ApiError::bad_request("Question and filename are required."));
    };
    let answer = service.answer_question(&filename, &question).await?;
    Ok(Json(AskResponse {
        answer: answer.text,
    }))
}

/// Stream a rendered minutes file.
async fn download_file<S>(
    State(service): State<Arc<S>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError>
where
    S: MinutesApi,
{
    serve_download(service.as_ref(), &filename, None).await
}

/// PDF-only download kept for older clients.
async fn download_pdf<S>(
    State(service): State<Arc<S>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError>
where
    S: MinutesApi,
{
    serve_download(service.as_ref(), &filename, Some(OutputFormat::Pdf)).await
}

async fn serve_download<S>(
    service: &S,
    filename: &str,
    only: Option<OutputFormat>,
) -> Result<Response, ApiError>
where
    S: MinutesApi + ?Sized,
{
    let target = service.resolve_download(filename).await?;
    if only.is_some_and(|format| format != target.format) {
        return Err(ApiError::bad_request("Unsupported file type"));
    }
    let bytes = tokio::fs::read(&target.path)
        .await
        .map_err(ServiceError::from)?;
    tracing::info!(file = %target.file_name, bytes = bytes.len(), "Serving download");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        target.file_name.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, target.format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    minutes_generated: u64,
    questions_answered: u64,
    questions_unanswered: u64,
    backup_used: u64,
}

/// Return request counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: MinutesApi,
{
    let snapshot = service.metrics_snapshot();
    Json(MetricsResponse {
        minutes_generated: snapshot.minutes_generated,
        questions_answered: snapshot.questions_answered,
        questions_unanswered: snapshot.questions_unanswered,
        backup_used: snapshot.backup_used,
    })
}

/// Descriptor for a single endpoint in the discovery catalog.
#[derive(Serialize)]
struct EndpointDescriptor {
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /`.
#[derive(Serialize)]
struct IndexResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    endpoints: Vec<EndpointDescriptor>,
}

/// Describe the service and enumerate its endpoints.
async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        status: "API is running",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointDescriptor {
                method: "POST",
                path: "/generate_minutes",
                description: "Generate meeting minutes from a DOCX file (multipart field `docx_file`, optional `output_format` of pdf or docx).",
                request_example: None,
            },
            EndpointDescriptor {
                method: "POST",
                path: "/ask_question",
                description: "Ask a question about an uploaded meeting transcript.",
                request_example: Some(json!({
                    "filename": "weekly.docx",
                    "question": "Who owns the follow-up?"
                })),
            },
            EndpointDescriptor {
                method: "GET",
                path: "/download_file/:filename",
                description: "Download generated minutes (PDF or DOCX).",
                request_example: None,
            },
            EndpointDescriptor {
                method: "GET",
                path: "/download_pdf/:filename",
                description: "Download generated minutes in PDF form.",
                request_example: None,
            },
            EndpointDescriptor {
                method: "GET",
                path: "/metrics",
                description: "Return request counters.",
                request_example: None,
            },
        ],
    })
}

/// Error leaving the router as a JSON body.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        let status = match &error {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Extraction(_)
            | ServiceError::Render(_)
            | ServiceError::NoAnswer
            | ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %error, "Request failed");
        } else {
            tracing::warn!(error = %error, "Request rejected");
        }
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        tracing::warn!(error = %error, "Malformed multipart upload");
        Self {
            status: error.status(),
            message: error.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::warn!(error = %rejection, "Rejected multipart request");
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection, "Rejected JSON request");
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
