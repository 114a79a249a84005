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

//! Isolation forest outlier detector.
//!
//! Points that are easy to isolate with random axis-aligned splits end up on
//! short paths and are considered anomalous. Scores follow the usual
//! convention `-(2^(-E[h(x)] / c(psi)))`, so lower values are more anomalous
//! and every score lies in `[-1, 0)`.

use crate::anomaly::detector::{validate_training_input, OutlierDetector};
use crate::anomaly::features::{FeatureVector, FEATURE_COUNT};
use crate::error::{Result, ScoringError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Forest construction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Subsample size per tree, capped at the training set size
    pub max_samples: usize,
    /// Base seed; tree `i` uses `seed + i`
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

impl ForestParams {
    /// At least one tree and a subsample of two or more points
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ScoringError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_samples < 2 {
            return Err(ScoringError::InvalidParameter(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }
        Ok(())
    }
}

/// Average path length of an unsuccessful BST search over `n` points
#[must_use]
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build(data: &[FeatureVector], indices: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        Self {
            root: Self::grow(data, indices, 0, height_limit, rng),
        }
    }

    fn grow(
        data: &[FeatureVector],
        indices: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> Node {
        if indices.len() <= 1 || depth >= height_limit {
            return Node::Leaf {
                size: indices.len(),
            };
        }

        // Only features that still vary inside this node can split it
        let candidates: Vec<(usize, f64, f64)> = (0..FEATURE_COUNT)
            .filter_map(|feature| {
                let (lo, hi) = indices.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &i| (lo.min(data[i][feature]), hi.max(data[i][feature])),
                );
                (hi > lo).then_some((feature, lo, hi))
            })
            .collect();

        if candidates.is_empty() {
            return Node::Leaf {
                size: indices.len(),
            };
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let value = rng.gen_range(lo..hi);

        // value < hi, so both sides are non-empty
        let (left, right): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| data[i][feature] <= value);

        Node::Split {
            feature,
            value,
            left: Box::new(Self::grow(data, left, depth + 1, height_limit, rng)),
            right: Box::new(Self::grow(data, right, depth + 1, height_limit, rng)),
        }
    }

    fn path_length(&self, vector: &FeatureVector) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    node = if vector[*feature] <= *value { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Linear-interpolated quantile of an ascending slice, `q` in `[0, 1]`
const fn quantile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    // rank is non-negative, so truncation is floor
    let lower = rank as usize;
    let upper = if lower + 1 < sorted.len() {
        lower + 1
    } else {
        lower
    };
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

/// Ensemble of isolation trees with a contamination-derived threshold
#[derive(Debug, Clone, Default)]
pub struct IsolationForest {
    params: ForestParams,
    trees: Vec<IsolationTree>,
    sample_size: usize,
    threshold: Option<f64>,
}

impl IsolationForest {
    #[must_use]
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Subsample size the trees were grown on (0 before fitting)
    #[must_use]
    pub const fn sample_size(&self) -> usize {
        self.sample_size
    }

    #[must_use]
    pub const fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn raw_score(&self, vector: &FeatureVector) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(vector)).sum();
        let mean = total / self.trees.len() as f64;
        -(2f64).powf(-mean / average_path_length(self.sample_size))
    }
}

impl OutlierDetector for IsolationForest {
    fn fit(&mut self, vectors: &[FeatureVector], contamination: f64) -> Result<()> {
        validate_training_input(vectors, contamination)?;
        self.params.validate()?;

        let sample_size = self.params.max_samples.min(vectors.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let ForestParams {
            n_estimators, seed, ..
        } = self.params;

        let trees: Vec<IsolationTree> = (0..n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let indices =
                    rand::seq::index::sample(&mut rng, vectors.len(), sample_size).into_vec();
                IsolationTree::build(vectors, indices, height_limit, &mut rng)
            })
            .collect();

        self.trees = trees;
        self.sample_size = sample_size;

        let mut training_scores: Vec<f64> = vectors.iter().map(|v| self.raw_score(v)).collect();
        training_scores.sort_by(f64::total_cmp);
        let threshold = quantile(&training_scores, contamination);
        self.threshold = Some(threshold);

        tracing::debug!(
            "Fitted isolation forest: {} trees, subsample {}, height limit {}, threshold {:.4}",
            self.trees.len(),
            sample_size,
            height_limit,
            threshold
        );
        Ok(())
    }

    fn score(&self, vector: &FeatureVector) -> Result<f64> {
        if !self.is_fitted() {
            return Err(ScoringError::NotFitted);
        }
        Ok(self.raw_score(vector))
    }

    fn decision(&self, vector: &FeatureVector) -> Result<bool> {
        let threshold = self.threshold()?;
        Ok(self.score(vector)? < threshold)
    }

    fn threshold(&self) -> Result<f64> {
        self.threshold.ok_or(ScoringError::NotFitted)
    }

    fn is_fitted(&self) -> bool {
        self.threshold.is_some() && !self.trees.is_empty()
    }
}
