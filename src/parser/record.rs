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

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Naive timestamp layouts accepted besides RFC 3339; read as UTC
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse RFC 3339 or a naive ISO-like timestamp. Anything else is `None`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_TIMESTAMP_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|naive| naive.and_utc())
        })
}

/// Timestamps never fail a record: unparseable or non-string values become `None`
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp))
}

/// A structured log record as submitted for scoring or training.
///
/// Every field is optional. Missing values fall back to defaults when the
/// record is turned into features, so a sparse record is never rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Caller-supplied identifier, echoed back in the prediction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raw level string (e.g. `"ERROR"`, `"warn"`, `"E"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    /// Pre-computed message length, takes precedence over `message`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_exception: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_timeout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_connection_error: Option<bool>,
}

impl LogRecord {
    /// Create a record carrying only a message and a level.
    #[must_use]
    pub fn new(message: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            level: Some(level.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    #[must_use]
    pub const fn with_message_length(mut self, length: u64) -> Self {
        self.message_length = Some(length);
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, exception: bool, timeout: bool, connection_error: bool) -> Self {
        self.has_exception = Some(exception);
        self.has_timeout = Some(timeout);
        self.has_connection_error = Some(connection_error);
        self
    }

    /// The message text, empty when absent
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// Parsed log level; absent levels read as INFO
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
            .as_deref()
            .map_or(LogLevel::Info, LogLevel::from_str)
    }

    /// Length of the message in characters, or the explicit override
    #[must_use]
    pub fn message_length(&self) -> u64 {
        self.message_length
            .unwrap_or_else(|| self.message().chars().count() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl LogLevel {
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "TRACE" | "VERBOSE" | "T" | "V" => Self::Trace,
            "DEBUG" | "D" => Self::Debug,
            "INFO" | "INFORMATION" | "I" => Self::Info,
            "WARNING" | "WARN" | "W" => Self::Warn,
            "ERROR" | "ERR" | "E" => Self::Error,
            "FATAL" | "CRITICAL" | "CRIT" | "F" => Self::Fatal,
            _ => Self::Unknown,
        }
    }

    /// Ordinal used as a feature. Unknown levels rank like INFO.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Trace | Self::Debug => 0,
            Self::Info | Self::Unknown => 1,
            Self::Warn => 2,
            Self::Error => 3,
            Self::Fatal => 4,
        }
    }
}
