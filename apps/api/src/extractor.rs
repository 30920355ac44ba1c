//! Text Extractor: turns an uploaded PDF into plain text, page order preserved.
//!
//! `pdf-extract` handles the common case. When it rejects a document, or panics
//! on one, `lopdf` loads it and each page is extracted on its own; a page that
//! yields nothing contributes an empty segment instead of failing the whole upload.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// An uploaded résumé after extraction. Lives for a single request.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: Option<String>,
    pub text: String,
    pub page_count: usize,
}

impl Document {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Extracts text off the async runtime; PDF parsing is CPU-bound.
pub async fn extract_document(bytes: Bytes, file_name: Option<String>) -> Result<Document, AppError> {
    let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))??;

    let document = Document {
        file_name,
        page_count: pages.len(),
        text: pages.concat(),
    };
    debug!(
        "Extracted {} chars from {} page(s) of {:?}",
        document.text.len(),
        document.page_count,
        document.file_name
    );
    Ok(document)
}

/// Returns one text segment per page, in page order.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, AppError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(AppError::DocumentFormat(
            "The uploaded file is not a PDF document".to_string(),
        ));
    }

    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => {
            warn!("pdf-extract failed ({e}); falling back to per-page extraction");
            extract_pages_individually(bytes)
        }
        Err(payload) => {
            warn!(
                "pdf-extract panicked ({}); falling back to per-page extraction",
                panic_message(payload.as_ref())
            );
            extract_pages_individually(bytes)
        }
    }
}

fn extract_pages_individually(bytes: &[u8]) -> Result<Vec<String>, AppError> {
    panic::catch_unwind(AssertUnwindSafe(|| read_pages_with_lopdf(bytes))).unwrap_or_else(
        |payload| {
            Err(AppError::DocumentFormat(format!(
                "Unable to read PDF: {}",
                panic_message(payload.as_ref())
            )))
        },
    )
}

fn read_pages_with_lopdf(bytes: &[u8]) -> Result<Vec<String>, AppError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| AppError::DocumentFormat(format!("Unable to read PDF: {e}")))?;

    let pages = doc
        .get_pages()
        .into_keys()
        .map(|page_num| {
            doc.extract_text(&[page_num]).unwrap_or_else(|e| {
                warn!("No extractable text on page {page_num}: {e}");
                String::new()
            })
        })
        .collect();

    Ok(pages)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "malformed document"
    }
}
