//! Axum route handlers for both analysis modes.
//!
//! Each mode has a browser route (HTML report) and an API route (JSON). Both
//! read the same multipart form: `resume` (PDF file) and `job_description`.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::Html,
    Json,
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::analysis::models::AnalysisResult;
use crate::analysis::prompts::AnalysisMode;
use crate::errors::AppError;
use crate::extractor::extract_document;
use crate::render::{self, HtmlError};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Form parsing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ResumeUpload {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct AnalysisForm {
    pub resume: Option<ResumeUpload>,
    pub job_description: Option<String>,
}

/// Reads the multipart body. A file input left empty arrives as a zero-byte
/// part and is treated as no upload. `upload_limit` is only used to name the
/// limit when the body is cut off by it.
pub async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    upload_limit: usize,
) -> Result<AnalysisForm, AppError> {
    let multipart_error = move |err: MultipartError| read_error(err, upload_limit);
    let mut multipart = multipart.map_err(|e| {
        AppError::Validation(format!("Expected a multipart form upload: {}", e.body_text()))
    })?;

    let mut form = AnalysisForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    form.resume = Some(ResumeUpload { file_name, bytes });
                }
            }
            Some("job_description") => {
                form.job_description = Some(field.text().await.map_err(multipart_error)?);
            }
            other => debug!("Ignoring unexpected form field {other:?}"),
        }
    }

    Ok(form)
}

fn read_error(err: MultipartError, upload_limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge {
            limit: upload_limit,
        };
    }
    AppError::Validation(format!("Could not read the upload: {}", err.body_text()))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared flow
// ────────────────────────────────────────────────────────────────────────────

/// upload check → job description check → extract → build prompt → remote call → validate.
/// Every input check happens before the remote call.
pub async fn analyze(
    state: &AppState,
    form: AnalysisForm,
    mode: AnalysisMode,
) -> Result<AnalysisResult, AppError> {
    let upload = form
        .resume
        .ok_or_else(|| AppError::Validation("A résumé PDF is required".to_string()))?;

    let job_description = match mode {
        AnalysisMode::Match => Some(
            form.job_description
                .filter(|jd| !jd.trim().is_empty())
                .ok_or_else(|| AppError::Validation("A job description is required".to_string()))?,
        ),
        AnalysisMode::JobSearch => None,
    };

    let document = extract_document(upload.bytes, upload.file_name).await?;
    if !document.has_text() {
        return Err(AppError::Validation(
            "No extractable text was found in the uploaded résumé".to_string(),
        ));
    }
    info!(
        "Extracted résumé {:?}: {} page(s)",
        document.file_name, document.page_count
    );

    let prompt = state
        .prompts
        .build(&document.text, mode, job_description.as_deref())?;

    state.pipeline.run(&prompt).await
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /
pub async fn handle_index() -> Html<String> {
    Html(render::index_page())
}

/// POST /analyze
pub async fn handle_analyze_page(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, HtmlError> {
    let form = read_form(multipart, state.config.max_upload_bytes).await?;
    let result = analyze(&state, form, AnalysisMode::Match).await?;
    Ok(Html(render::report(&result)))
}

/// POST /jobs
pub async fn handle_jobs_page(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, HtmlError> {
    let form = read_form(multipart, state.config.max_upload_bytes).await?;
    let result = analyze(&state, form, AnalysisMode::JobSearch).await?;
    Ok(Html(render::report(&result)))
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let form = read_form(multipart, state.config.max_upload_bytes).await?;
    Ok(Json(analyze(&state, form, AnalysisMode::Match).await?))
}

/// POST /api/v1/jobs
pub async fn handle_jobs(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let form = read_form(multipart, state.config.max_upload_bytes).await?;
    Ok(Json(analyze(&state, form, AnalysisMode::JobSearch).await?))
}
