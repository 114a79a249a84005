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

use crate::anomaly::isolation_forest::ForestParams;
use crate::error::ScoringError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`ServerConfig::bind`]
pub const ENV_BIND: &str = "CRABSCORE_BIND";
/// Environment variable overriding [`ScoringConfig::default_contamination`]
pub const ENV_CONTAMINATION: &str = "CRABSCORE_CONTAMINATION";

/// Top-level configuration, read from `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub forest: ForestParams,

    #[serde(default)]
    pub server: ServerConfig,
}

/// How raw detector output is turned into predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Contamination used when a training request does not specify one
    pub default_contamination: f64,

    /// Slope of the logistic squashing around the decision threshold
    pub score_steepness: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_contamination: 0.1,
            score_steepness: 10.0,
        }
    }
}

impl ScoringConfig {
    /// Steepness must be positive and finite, otherwise the score no longer
    /// grows with anomalousness. Contamination must lie in `(0, 0.5]`.
    pub fn validate(&self) -> crate::error::Result<()> {
        let steepness = self.score_steepness;
        if !(steepness.is_finite() && steepness > 0.0) {
            return Err(ScoringError::InvalidParameter(format!(
                "scoring.score_steepness must be a positive number, got {steepness}"
            )));
        }
        let contamination = self.default_contamination;
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(ScoringError::InvalidParameter(format!(
                "scoring.default_contamination must be in (0, 0.5], got {contamination}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl AppConfig {
    /// Get the path to the default config file
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("crabscore").join("config.json"))
    }

    /// Load configuration from an explicit file. Missing or invalid files are errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults.
    ///
    /// An explicit path must exist. Without one, the default location is tried
    /// and any problem with it is logged and ignored. Environment overrides are
    /// applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                    tracing::warn!("Ignoring config at {}: {e:#}", path.display());
                    Self::default()
                }),
                _ => {
                    tracing::info!("No config found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind;
        }
        if let Some(raw) = lookup(ENV_CONTAMINATION) {
            self.scoring.default_contamination = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_CONTAMINATION} is not a number: {raw:?}"))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.forest.validate()?;
        Ok(())
    }
}
