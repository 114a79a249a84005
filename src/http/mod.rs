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

//! JSON-over-HTTP front end for the model service.
//!
//! Handlers only translate between JSON and the service types; every
//! decision about scoring or lifecycle is made by [`ModelService`].

pub mod error;
pub mod handlers;

use crate::service::ModelService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ModelService>,
}

impl AppState {
    #[must_use]
    pub const fn new(service: Arc<ModelService>) -> Self {
        Self { service }
    }
}

/// Build the router with all routes
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/api/v1/anomaly/model/info", get(handlers::model_info))
        .route("/api/v1/anomaly/predict", post(handlers::predict))
        .route("/api/v1/anomaly/predict/batch", post(handlers::predict_batch))
        .route("/api/v1/anomaly/train", post(handlers::train))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
