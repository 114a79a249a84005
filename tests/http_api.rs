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

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use crabscore::config::AppConfig;
use crabscore::http::{create_router, AppState};
use crabscore::ModelService;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let service = ModelService::new(&AppConfig::default()).expect("default config is valid");
    create_router(AppState::new(Arc::new(service)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("valid request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn training_body(contamination: f64) -> Value {
    let normal = |length: u64| {
        json!({
            "message_length": length,
            "level": "INFO",
            "service": "test",
            "has_exception": false,
            "has_timeout": false,
            "has_connection_error": false
        })
    };
    json!({
        "records": [
            normal(50),
            normal(45),
            normal(55),
            {
                "message_length": 200,
                "level": "ERROR",
                "service": "test",
                "has_exception": true,
                "has_timeout": false,
                "has_connection_error": false
            }
        ],
        "contamination": contamination
    })
}

#[tokio::test]
async fn health_is_up() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
    assert_eq!(body["service"], "crabscore");
}

#[tokio::test]
async fn not_ready_until_trained() {
    let app = app();

    let (status, body) = send(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], false);
    assert!(body.get("timestamp").is_some());
    assert!(body.get("model_version").is_none());

    let (status, body) = send(&app, "GET", "/api/v1/anomaly/model/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_loaded");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/anomaly/predict",
        Some(json!({"message": "hello", "level": "INFO"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Model not trained");
    assert_eq!(body["status"], 503);
}

#[tokio::test]
async fn train_then_predict() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/v1/anomaly/train", Some(training_body(0.25))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "trained");
    assert_eq!(body["version"], "1.0.1");

    let (_, ready) = send(&app, "GET", "/ready", None).await;
    assert_eq!(ready["ready"], true);
    assert_eq!(ready["model_version"], "1.0.1");
    assert!(ready.get("trained_at").is_some());

    let (status, prediction) = send(
        &app,
        "POST",
        "/api/v1/anomaly/predict",
        Some(json!({
            "log_id": "abc",
            "message_length": 200,
            "level": "ERROR",
            "service": "test",
            "has_exception": true,
            "has_timeout": false,
            "has_connection_error": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prediction["log_id"], "abc");
    assert_eq!(prediction["is_anomaly"], true);
    assert!(prediction["anomaly_score"].as_f64().expect("number") > 0.5);
    assert_eq!(prediction["model_version"], "1.0.1");
}

#[tokio::test]
async fn batch_predict() {
    let app = app();
    send(&app, "POST", "/api/v1/anomaly/train", Some(training_body(0.25))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/anomaly/predict/batch",
        Some(json!({"records": [
            {"message_length": 50, "level": "INFO", "service": "test"},
            {"message": "boom", "level": "ERROR"}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let predictions = body["predictions"].as_array().expect("array");
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0]["is_anomaly"], false);
}

#[tokio::test]
async fn invalid_training_requests() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/anomaly/train",
        Some(json!({"records": []})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);

    let (status, _) = send(&app, "POST", "/api/v1/anomaly/train", Some(training_body(0.9))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, info) = send(&app, "GET", "/api/v1/anomaly/model/info", None).await;
    assert_eq!(info["status"], "not_loaded");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/anomaly/predict")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("valid request");
    let response = app.oneshot(request).await.expect("router is infallible");
    assert!(response.status().is_client_error());
}
