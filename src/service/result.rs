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

//! Values handed back to callers of the model service.

use crate::anomaly::features::LayoutInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of scoring one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<String>,
    pub is_anomaly: bool,
    /// Normalized score in `[0, 1]`, higher = more anomalous
    pub anomaly_score: f64,
    /// Distance from the decision boundary in `[0, 1]`
    pub confidence: f64,
    pub model_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Trained,
    NotLoaded,
}

/// Read-only snapshot of the model lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub status: ModelStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contamination: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_samples: Option<usize>,
    pub feature_count: usize,
    pub feature_version: u8,
    pub layout_hash: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ModelInfo {
    pub(crate) fn not_loaded() -> Self {
        let layout = LayoutInfo::current();
        Self {
            status: ModelStatus::NotLoaded,
            version: None,
            trained_at: None,
            contamination: None,
            training_samples: None,
            feature_count: layout.feature_count,
            feature_version: layout.version,
            layout_hash: layout.hash,
            message: Some("Model not trained yet".to_string()),
        }
    }
}

/// Squash a raw detector score into `[0, 1]`.
///
/// `raw == threshold` maps to 0.5 and lower (more anomalous) raw scores map
/// to higher values.
#[must_use]
pub fn normalize_score(raw: f64, threshold: f64, steepness: f64) -> f64 {
    let z = steepness * (raw - threshold);
    let score = 1.0 / (1.0 + z.exp());
    if score.is_nan() {
        0.5
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// How far a normalized score sits from the 0.5 boundary, in `[0, 1]`
#[must_use]
pub const fn confidence(anomaly_score: f64) -> f64 {
    ((anomaly_score - 0.5).abs() * 2.0).clamp(0.0, 1.0)
}
