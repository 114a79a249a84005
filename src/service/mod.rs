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

//! Model lifecycle and the public prediction API.
//!
//! The fitted detector, its version and training metadata are published
//! together as one immutable [`FittedModel`] behind an [`ArcSwapOption`].
//! Predictions load a snapshot without locking; training builds the next
//! snapshot off to the side and swaps it in with a single store, so a
//! concurrent prediction sees either the old model or the new one in full.

pub mod result;

pub use result::{confidence, normalize_score, ModelInfo, ModelStatus, PredictionResult};

use crate::anomaly::detector::OutlierDetector;
use crate::anomaly::features::{self, LayoutInfo};
use crate::anomaly::isolation_forest::IsolationForest;
use crate::config::{AppConfig, ScoringConfig};
use crate::error::{Result, ScoringError};
use crate::parser::LogRecord;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Version reported before the first training run
pub const BASE_VERSION: &str = "1.0.0";

/// Everything a prediction needs, published atomically
#[derive(Debug)]
struct FittedModel<D> {
    detector: D,
    version: String,
    trained_at: DateTime<Utc>,
    contamination: f64,
    training_samples: usize,
}

impl<D> FittedModel<D> {
    fn info(&self) -> ModelInfo {
        let layout = LayoutInfo::current();
        ModelInfo {
            status: ModelStatus::Trained,
            version: Some(self.version.clone()),
            trained_at: Some(self.trained_at),
            contamination: Some(self.contamination),
            training_samples: Some(self.training_samples),
            feature_count: layout.feature_count,
            feature_version: layout.version,
            layout_hash: layout.hash,
            message: None,
        }
    }
}

/// Owns the single model of the process.
///
/// Share it as `Arc<ModelService>`; all methods take `&self`.
pub struct ModelService<D = IsolationForest> {
    /// Unfitted detector cloned for every training run
    template: D,
    scoring: ScoringConfig,
    current: ArcSwapOption<FittedModel<D>>,
    /// Number of successful trainings; the lock also serializes `train`
    generation: Mutex<u64>,
}

impl ModelService<IsolationForest> {
    /// Build an untrained isolation forest service from the app config.
    ///
    /// Fails with [`ScoringError::InvalidParameter`] on unusable scoring or
    /// forest settings.
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.forest.validate()?;
        Self::with_detector(IsolationForest::new(config.forest), config.scoring)
    }
}

impl<D: OutlierDetector + Clone> ModelService<D> {
    /// Create an untrained service around any detector implementation
    pub fn with_detector(template: D, scoring: ScoringConfig) -> Result<Self> {
        scoring.validate()?;
        Ok(Self {
            template,
            scoring,
            current: ArcSwapOption::empty(),
            generation: Mutex::new(0),
        })
    }

    #[must_use]
    pub const fn scoring_config(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Fit a fresh detector on `records` and publish it as the current model.
    ///
    /// On failure the previously published model (if any) stays in place.
    pub fn train(&self, records: &[LogRecord], contamination: f64) -> Result<ModelInfo> {
        if records.is_empty() {
            tracing::warn!("Rejected training request without records");
            return Err(ScoringError::InvalidTrainingSet(
                "no training records supplied".to_string(),
            ));
        }

        let mut generation = self
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        tracing::info!(
            "Training on {} records with contamination {contamination}",
            records.len()
        );

        let vectors = features::extract_all(records);
        let mut detector = self.template.clone();
        detector.fit(&vectors, contamination).map_err(|e| {
            tracing::warn!("Training rejected: {e}");
            match e {
                ScoringError::InvalidParameter(reason) | ScoringError::InvalidTrainingSet(reason) => {
                    ScoringError::InvalidTrainingSet(reason)
                }
                other @ (ScoringError::ModelNotTrained | ScoringError::NotFitted) => other,
            }
        })?;

        *generation += 1;
        let model = FittedModel {
            detector,
            version: format!("1.0.{}", *generation),
            trained_at: Utc::now(),
            contamination,
            training_samples: records.len(),
        };
        let info = model.info();
        self.current.store(Some(Arc::new(model)));

        tracing::info!(
            "Model {} trained on {} records",
            info.version.as_deref().unwrap_or(BASE_VERSION),
            records.len()
        );
        Ok(info)
    }

    /// Train with the configured default contamination
    pub fn train_default(&self, records: &[LogRecord]) -> Result<ModelInfo> {
        self.train(records, self.scoring.default_contamination)
    }

    /// Score one record against the current model
    pub fn predict(&self, record: &LogRecord) -> Result<PredictionResult> {
        let model = self.snapshot()?;
        self.score_with(&model, record)
    }

    /// Score many records against the same model snapshot
    pub fn predict_batch(&self, records: &[LogRecord]) -> Result<Vec<PredictionResult>> {
        let model = self.snapshot()?;
        records
            .iter()
            .map(|record| self.score_with(&model, record))
            .collect()
    }

    /// Lifecycle introspection; never fails
    #[must_use]
    pub fn model_info(&self) -> ModelInfo {
        self.current
            .load()
            .as_deref()
            .map_or_else(ModelInfo::not_loaded, FittedModel::info)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    /// Current model version, or [`BASE_VERSION`] while untrained
    #[must_use]
    pub fn model_version(&self) -> String {
        self.current
            .load()
            .as_deref()
            .map_or_else(|| BASE_VERSION.to_string(), |m| m.version.clone())
    }

    #[must_use]
    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.current.load().as_deref().map(|m| m.trained_at)
    }

    fn snapshot(&self) -> Result<Arc<FittedModel<D>>> {
        self.current.load_full().ok_or_else(|| {
            tracing::debug!("Prediction requested before training");
            ScoringError::ModelNotTrained
        })
    }

    fn score_with(&self, model: &FittedModel<D>, record: &LogRecord) -> Result<PredictionResult> {
        let vector = features::extract(record);
        let raw = model.detector.score(&vector)?;
        let threshold = model.detector.threshold()?;
        let is_anomaly = model.detector.decision(&vector)?;

        let anomaly_score = normalize_score(raw, threshold, self.scoring.score_steepness);
        let confidence = confidence(anomaly_score);

        tracing::debug!(
            "Scored {:?}: raw {raw:.4} threshold {threshold:.4} -> {anomaly_score:.3} (anomaly: {is_anomaly})",
            record.log_id
        );

        Ok(PredictionResult {
            log_id: record.log_id.clone(),
            is_anomaly,
            anomaly_score,
            confidence,
            model_version: model.version.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ModelService {
        ModelService::new(&AppConfig::default()).expect("default config is valid")
    }

    fn training_records() -> Vec<LogRecord> {
        let normal = |length| {
            LogRecord {
                level: Some("INFO".to_string()),
                service: Some("test".to_string()),
                ..LogRecord::default()
            }
            .with_message_length(length)
            .with_flags(false, false, false)
        };
        vec![
            normal(50),
            normal(45),
            normal(55),
            LogRecord {
                level: Some("ERROR".to_string()),
                service: Some("test".to_string()),
                ..LogRecord::default()
            }
            .with_message_length(200)
            .with_flags(true, false, false),
        ]
    }

    #[test]
    fn test_untrained_state() {
        let service = service();
        assert!(!service.is_ready());
        assert_eq!(service.model_version(), BASE_VERSION);
        assert_eq!(service.trained_at(), None);

        let info = service.model_info();
        assert_eq!(info.status, ModelStatus::NotLoaded);
        assert!(info.message.is_some());

        assert_eq!(
            service.predict(&LogRecord::default()),
            Err(ScoringError::ModelNotTrained)
        );
        assert_eq!(
            service.predict_batch(&[LogRecord::default()]),
            Err(ScoringError::ModelNotTrained)
        );
    }

    #[test]
    fn test_train_transitions_to_trained() {
        let service = service();
        let info = service.train(&training_records(), 0.25).expect("training");

        assert!(service.is_ready());
        assert_eq!(info.status, ModelStatus::Trained);
        assert_eq!(info.version.as_deref(), Some("1.0.1"));
        assert_eq!(info.contamination, Some(0.25));
        assert_eq!(info.training_samples, Some(4));
        assert_eq!(service.model_info(), info);
    }

    #[test]
    fn test_empty_training_set() {
        let service = service();
        assert!(matches!(
            service.train(&[], 0.1),
            Err(ScoringError::InvalidTrainingSet(_))
        ));
        assert!(!service.is_ready());
    }

    #[test]
    fn test_rejected_parameters_keep_previous_model() {
        let service = service();
        service.train(&training_records(), 0.25).expect("training");
        let before = service.model_info();

        assert!(matches!(
            service.train(&training_records(), 0.75),
            Err(ScoringError::InvalidTrainingSet(_))
        ));
        assert!(matches!(
            service.train(&training_records()[..1], 0.25),
            Err(ScoringError::InvalidTrainingSet(_))
        ));
        assert_eq!(service.model_info(), before);
    }

    #[test]
    fn test_train_default_uses_config() {
        let service = service();
        let info = service.train_default(&training_records()).expect("training");
        assert_eq!(info.contamination, Some(0.1));
    }

    #[test]
    fn test_batch_matches_single() {
        let service = service();
        service.train(&training_records(), 0.25).expect("training");

        let records = training_records();
        let batch = service.predict_batch(&records).expect("batch");
        for (record, result) in records.iter().zip(&batch) {
            assert_eq!(&service.predict(record).expect("single"), result);
        }
    }

    #[test]
    fn test_rejects_inverted_steepness() {
        // A negative slope would rank the most anomalous records lowest
        for score_steepness in [-10.0, 0.0] {
            let scoring = ScoringConfig {
                score_steepness,
                ..ScoringConfig::default()
            };
            assert!(matches!(
                ModelService::with_detector(IsolationForest::default(), scoring),
                Err(ScoringError::InvalidParameter(_))
            ));

            let config = AppConfig {
                scoring,
                ..AppConfig::default()
            };
            assert!(matches!(
                ModelService::new(&config),
                Err(ScoringError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_rejects_bad_forest_params() {
        let mut config = AppConfig::default();
        config.forest.max_samples = 1;
        assert!(matches!(
            ModelService::new(&config),
            Err(ScoringError::InvalidParameter(_))
        ));
    }
}
