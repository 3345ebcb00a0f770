//! Converted statement retrieval and download handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Response, StatusCode},
    Json,
};
use bankcsv_core::export::{render, ExportFormat};
use serde::Deserialize;
use tracing::info;

use crate::store::StoredStatement;
use crate::{AppError, AppState};

/// Query parameters for a statement download
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Output format: csv (default), xls, json or pdf
    pub format: Option<String>,
}

async fn find_statement(state: &AppState, id: &str) -> Result<Arc<StoredStatement>, AppError> {
    state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found("Statement not found"))
}

/// GET /api/statement/:id - Full analysis of a converted statement
pub async fn get_statement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StoredStatement>, AppError> {
    let statement = find_statement(&state, &id).await?;
    Ok(Json(statement.as_ref().clone()))
}

/// GET /api/statement/:id/download - Transactions as a file
pub async fn download_statement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DownloadQuery>,
) -> Result<Response<Body>, AppError> {
    let format = match params.format.as_deref() {
        None | Some("") => ExportFormat::Csv,
        Some(value) => value.parse::<ExportFormat>().map_err(|_| {
            AppError::bad_request("Invalid format. Use 'csv', 'xls', 'json' or 'pdf'")
        })?,
    };

    let statement = find_statement(&state, &id).await?;
    let bytes = render(&statement.report, format)?;
    info!(
        id = %id,
        format = %format,
        size = bytes.len(),
        "Exported statement"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"statement-{}.{}\"",
                id,
                format.extension()
            ),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::internal(&e.to_string()))
}
