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

//! Error taxonomy shared by the detector and the model service.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoringError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Contamination out of range, non-finite features or bad detector settings
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Empty or too small training data, or a training run the detector rejected
    #[error("Invalid training set: {0}")]
    InvalidTrainingSet(String),

    /// Prediction requested before any successful training
    #[error("Model not trained")]
    ModelNotTrained,

    /// Detector queried before `fit`
    #[error("Detector has not been fitted")]
    NotFitted,
}
