//! Prediction handlers

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use shared::{HistoryItem, HistoryQuery, PredictionInput, PredictionResponse};

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Run the full prediction pipeline for one set of growing conditions
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionInput>, JsonRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let Json(input) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let response = state.predictions.predict(input).await?;
    Ok(Json(response))
}

/// List recent predictions
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<HistoryItem>> {
    Json(state.predictions.history(query.limit).await)
}
