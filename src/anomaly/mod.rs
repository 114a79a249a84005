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

pub mod detector;
pub mod features;
pub mod isolation_forest;
pub mod keyword;

pub use detector::{OutlierDetector, MIN_TRAINING_SAMPLES};
pub use features::{extract, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};
pub use isolation_forest::{ForestParams, IsolationForest};
pub use keyword::KeywordSignals;
