//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use shared::HealthResponse;

use crate::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// Root endpoint handler
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AgriSmart API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.predictions.health())
}
