//! Statement upload and conversion handler

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use bankcsv_core::models::{StatementDialect, TransactionSource};
use bankcsv_core::{content_id, validate, AnalysisReport, Extraction, StatementDocument};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::store::StoredStatement;
use crate::{AppError, AppState};

/// Response for a converted statement
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub id: String,
    pub results_url: String,
    pub download_url: String,
    pub transaction_count: usize,
    pub source: TransactionSource,
    /// True when nothing could be parsed and sample data was substituted
    pub synthetic: bool,
    pub bank: StatementDialect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

const TIMEOUT_MESSAGE: &str = "Statement analysis took too long. Try a smaller statement.";

/// Parse and analyze one upload; runs on the blocking pool
///
/// Checks `cancelled` between stages and returns `Ok(None)` once it is set.
pub(crate) fn convert_document(
    state: &AppState,
    bytes: &[u8],
    filename: Option<&str>,
    cancelled: &AtomicBool,
) -> bankcsv_core::Result<Option<(Extraction, AnalysisReport)>> {
    let document = StatementDocument::from_bytes(bytes, filename, state.config.max_upload_bytes)?;
    if cancelled.load(Ordering::Relaxed) {
        return Ok(None);
    }

    let extraction = state
        .extractor
        .extract_or_synthesize(&document, Utc::now().date_naive());
    if cancelled.load(Ordering::Relaxed) {
        return Ok(None);
    }

    let report = state
        .analyzer
        .analyze(&extraction.transactions, extraction.source);
    Ok(Some((extraction, report)))
}

/// Upload errors are the client's fault; anything else is ours
fn upload_error(err: bankcsv_core::Error) -> AppError {
    use bankcsv_core::Error;

    match err {
        Error::FileTooLarge { max, .. } => AppError::bad_request(&format!(
            "File too large. Maximum size is {} MB",
            max / 1024 / 1024
        )),
        Error::EmptyDocument => AppError::bad_request("Uploaded file is empty"),
        Error::UnsupportedFormat(what) => {
            AppError::bad_request(&format!("Unsupported file format: {}", what))
        }
        Error::Json(e) => AppError::bad_request(&format!("Invalid text-layer document: {}", e)),
        Error::Pdf(e) => AppError::bad_request(&format!("Could not read PDF: {}", e)),
        other => other.into(),
    }
}

/// POST /api/convert - Parse and analyze a statement
///
/// Expects multipart form with:
/// - file: statement PDF, text-layer JSON or plain text (required)
pub async fn convert_statement(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, AppError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(|n| n.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;
        upload = Some((filename, bytes.to_vec()));
    }

    let (filename, bytes) = upload.ok_or_else(|| AppError::bad_request("Missing file field"))?;

    let max_bytes = state.config.max_upload_bytes;
    let kind = validate(filename.as_deref(), &bytes, max_bytes).map_err(upload_error)?;
    let id = content_id(&bytes);
    info!(
        id = %id,
        kind = %kind,
        size = bytes.len(),
        "Converting uploaded statement"
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    let worker_state = state.clone();
    let worker_cancelled = cancelled.clone();
    let worker_name = filename.clone();
    let mut job = tokio::task::spawn_blocking(move || {
        convert_document(&worker_state, &bytes, worker_name.as_deref(), &worker_cancelled)
    });

    let converted = match tokio::time::timeout(state.config.convert_timeout, &mut job).await {
        Ok(joined) => joined?.map_err(upload_error)?,
        Err(_) => {
            cancelled.store(true, Ordering::Relaxed);
            warn!(id = %id, "Statement conversion timed out");

            // The blocking thread cannot be interrupted; it stops at the next
            // stage boundary
            let abandoned = id.clone();
            tokio::spawn(async move {
                match job.await {
                    Ok(_) => info!(id = %abandoned, "Abandoned statement conversion finished"),
                    Err(e) => {
                        warn!(id = %abandoned, error = %e, "Abandoned statement conversion failed")
                    }
                }
            });
            return Err(AppError::gateway_timeout(TIMEOUT_MESSAGE));
        }
    };
    let Some((extraction, report)) = converted else {
        return Err(AppError::gateway_timeout(TIMEOUT_MESSAGE));
    };

    let response = ConvertResponse {
        results_url: format!("/api/statement/{}", id),
        download_url: format!("/api/statement/{}/download", id),
        transaction_count: report.transactions.len(),
        source: report.source,
        synthetic: report.synthetic,
        bank: extraction.dialect,
        warning: extraction.failure.as_ref().map(|f| {
            format!(
                "No transactions could be read ({}); showing sample data instead",
                f
            )
        }),
        id: id.clone(),
    };

    let evicted = state
        .store
        .insert(StoredStatement {
            id,
            filename,
            bank: extraction.dialect,
            created_at: Utc::now(),
            report,
        })
        .await;
    if !evicted.is_empty() {
        info!("Evicted {} statement(s) from the store", evicted.len());
    }

    Ok(Json(response))
}
