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

//! Mapping of scoring errors onto HTTP responses

use crate::error::ScoringError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Scoring(ScoringError),
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Scoring(ScoringError::ModelNotTrained) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Scoring(ScoringError::InvalidParameter(_) | ScoringError::InvalidTrainingSet(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Scoring(ScoringError::NotFitted) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        Self::Scoring(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Scoring(err) => {
                if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
                    tracing::error!("Scoring error: {err}");
                }
                err.to_string()
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
