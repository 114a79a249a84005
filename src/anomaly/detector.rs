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

use crate::anomaly::features::FeatureVector;
use crate::error::Result;

/// Minimum number of vectors a detector will fit on
pub const MIN_TRAINING_SAMPLES: usize = 2;

/// Trait for unsupervised outlier detectors over feature vectors.
///
/// Raw scores follow the isolation-style convention: lower = more anomalous.
/// Once fitted, a detector is only read, so it can be shared across threads.
pub trait OutlierDetector: Send + Sync {
    /// Fit on a training set. Replaces any previously fitted state.
    ///
    /// `contamination` is the expected share of outliers, in `(0, 0.5]`.
    fn fit(&mut self, vectors: &[FeatureVector], contamination: f64) -> Result<()>;

    /// Raw anomaly score of a single vector
    fn score(&self, vector: &FeatureVector) -> Result<f64>;

    /// Whether the vector falls on the outlier side of the learned threshold
    fn decision(&self, vector: &FeatureVector) -> Result<bool>;

    /// The raw score separating inliers from outliers
    fn threshold(&self) -> Result<f64>;

    fn is_fitted(&self) -> bool;
}

/// Check the fit preconditions common to every detector
pub fn validate_training_input(vectors: &[FeatureVector], contamination: f64) -> Result<()> {
    use crate::error::ScoringError;

    if !(contamination > 0.0 && contamination <= 0.5) {
        return Err(ScoringError::InvalidParameter(format!(
            "contamination must be in (0, 0.5], got {contamination}"
        )));
    }

    if vectors.len() < MIN_TRAINING_SAMPLES {
        return Err(ScoringError::InvalidTrainingSet(format!(
            "need at least {MIN_TRAINING_SAMPLES} samples, got {}",
            vectors.len()
        )));
    }

    if let Some(index) = vectors
        .iter()
        .position(|v| v.iter().any(|x| !x.is_finite()))
    {
        return Err(ScoringError::InvalidParameter(format!(
            "sample {index} contains a non-finite feature value"
        )));
    }

    Ok(())
}
