//! Single-description categorization handler

use std::sync::Arc;

use axum::{extract::State, Json};
use bankcsv_core::extract::extract_merchant;
use bankcsv_core::models::Category;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub category: Category,
    pub merchant: String,
}

/// POST /api/categorize - Categorize a transaction description
pub async fn categorize_description(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, AppError> {
    let description = request.description.trim();
    if description.is_empty() {
        return Err(AppError::bad_request("Description must not be empty"));
    }

    Ok(Json(CategorizeResponse {
        category: state.extractor.categorizer().categorize(description),
        merchant: extract_merchant(description),
    }))
}
