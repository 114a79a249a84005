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

pub mod record;

pub use record::{LogLevel, LogRecord};

use anyhow::{Context, Result};
use std::path::Path;

/// Container layout of a record file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// A single JSON array of records
    JsonArray,
    /// One JSON object per line
    JsonLines,
}

/// Detect the record layout from the first non-blank character
#[must_use]
pub fn detect_format(content: &str) -> RecordFormat {
    if content.trim_start().starts_with('[') {
        RecordFormat::JsonArray
    } else {
        RecordFormat::JsonLines
    }
}

/// Parse records from either a JSON array or JSON lines.
///
/// Blank lines and lines starting with `#` are skipped in JSON-lines input.
pub fn parse_records(content: &str) -> Result<Vec<LogRecord>> {
    match detect_format(content) {
        RecordFormat::JsonArray => {
            serde_json::from_str(content).context("Failed to parse JSON array of log records")
        }
        RecordFormat::JsonLines => content
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            })
            .map(|(index, line)| {
                serde_json::from_str::<LogRecord>(line)
                    .with_context(|| format!("Invalid log record on line {}", index + 1))
            })
            .collect(),
    }
}

/// Read and parse a record file from disk
pub fn load_records(path: &Path) -> Result<Vec<LogRecord>> {
    tracing::info!("Loading log records from {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records = parse_records(&content)?;
    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}
