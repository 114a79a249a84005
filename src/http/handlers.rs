// CrabScore - GPL-3.0-or-later
// This file is part of CrabScore.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// CrabScore is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// CrabScore is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with CrabScore.  If not, see <https://www.gnu.org/licenses/>.

use crate::http::error::{ApiError, ApiResult};
use crate::http::AppState;
use crate::parser::LogRecord;
use crate::service::{ModelInfo, ModelStatus, PredictionResult};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name reported by the health endpoint
pub const SERVICE_NAME: &str = "crabscore";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
}

/// Liveness: the process is up, regardless of model state
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        service: SERVICE_NAME.to_string(),
        version: format!("{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")),
        timestamp: Utc::now().timestamp(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
}

/// Readiness: true once a model has been trained.
///
/// Flag and version come from one model-info snapshot.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let info = state.service.model_info();
    Json(ReadinessResponse {
        ready: info.status == ModelStatus::Trained,
        timestamp: Utc::now().timestamp(),
        model_version: info.version,
        trained_at: info.trained_at,
    })
}

pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.service.model_info())
}

pub async fn predict(
    State(state): State<AppState>,
    Json(record): Json<LogRecord>,
) -> ApiResult<Json<PredictionResult>> {
    Ok(Json(state.service.predict(&record)?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    pub records: Vec<LogRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPredictResponse {
    pub predictions: Vec<PredictionResult>,
}

pub async fn predict_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchPredictRequest>,
) -> ApiResult<Json<BatchPredictResponse>> {
    let predictions = state.service.predict_batch(&req.records)?;
    Ok(Json(BatchPredictResponse { predictions }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrainRequest {
    pub records: Vec<LogRecord>,
    /// Falls back to the configured default contamination
    #[serde(default)]
    pub contamination: Option<f64>,
}

/// Fit a new model. Runs on the blocking pool since fitting is CPU-bound.
pub async fn train(
    State(state): State<AppState>,
    Json(req): Json<TrainRequest>,
) -> ApiResult<Json<ModelInfo>> {
    let service = state.service.clone();
    let info = tokio::task::spawn_blocking(move || {
        let contamination = req
            .contamination
            .unwrap_or(service.scoring_config().default_contamination);
        service.train(&req.records, contamination)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("training task failed: {e}")))??;

    Ok(Json(info))
}
