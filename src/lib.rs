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

//! `CrabScore` - log anomaly scoring.
//!
//! Log records are turned into a fixed six-value feature vector
//! ([`anomaly::features`]) and scored by an isolation forest
//! ([`anomaly::isolation_forest`]). [`service::ModelService`] owns the model
//! lifecycle and normalizes scores; [`http`] exposes it over JSON.

pub mod anomaly;
pub mod config;
pub mod error;
pub mod http;
pub mod parser;
pub mod service;

pub use error::{Result, ScoringError};
pub use parser::{LogLevel, LogRecord};
pub use service::{ModelInfo, ModelService, ModelStatus, PredictionResult};
