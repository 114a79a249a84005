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

//! Feature extraction for log records.
//!
//! The layout below is the contract between the extractor and every fitted
//! detector. Adding, removing or reordering a feature requires bumping
//! [`FEATURE_VERSION`] and retraining.

use crate::anomaly::keyword::KeywordSignals;
use crate::parser::LogRecord;
use crc32fast::Hasher;

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

/// Feature names in the order they appear in the vector
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "message_length",       // 0: characters in the message
    "level_severity",       // 1: DEBUG=0 .. FATAL=4
    "service_bucket",       // 2: stable hash bucket of the service name, 0 if absent
    "has_exception",        // 3: 0/1
    "has_timeout",          // 4: 0/1
    "has_connection_error", // 5: 0/1
];

pub const FEATURE_COUNT: usize = 6;

/// Number of hash buckets for service names (bucket 0 is reserved for "no service")
pub const SERVICE_BUCKETS: u32 = 1024;

pub type FeatureVector = [f64; FEATURE_COUNT];

/// CRC32 over the layout version and feature names
#[must_use]
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Layout description reported alongside model info
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
}

impl LayoutInfo {
    #[must_use]
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
        }
    }
}

/// Stable numeric id for a service name.
///
/// CRC32 is fixed across platforms and process restarts, unlike the std hasher.
#[must_use]
pub fn service_bucket(service: Option<&str>) -> u32 {
    match service.map(str::trim) {
        None | Some("") => 0,
        Some(name) => 1 + crc32fast::hash(name.as_bytes()) % SERVICE_BUCKETS,
    }
}

const fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Map a record to its feature vector. Never fails; missing fields use defaults.
#[must_use]
pub fn extract(record: &LogRecord) -> FeatureVector {
    // Only scan the message when at least one flag was not supplied
    let detected = if record.has_exception.is_some()
        && record.has_timeout.is_some()
        && record.has_connection_error.is_some()
    {
        KeywordSignals::default()
    } else {
        KeywordSignals::detect(record.message())
    };

    [
        record.message_length() as f64,
        f64::from(record.level().severity()),
        f64::from(service_bucket(record.service.as_deref())),
        flag(record.has_exception.unwrap_or(detected.has_exception)),
        flag(record.has_timeout.unwrap_or(detected.has_timeout)),
        flag(
            record
                .has_connection_error
                .unwrap_or(detected.has_connection_error),
        ),
    ]
}

/// Extract features for many records at once
#[must_use]
pub fn extract_all(records: &[LogRecord]) -> Vec<FeatureVector> {
    records.iter().map(extract).collect()
}
