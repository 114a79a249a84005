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

use fancy_regex::Regex;
use std::sync::LazyLock;

// Keyword families (case-insensitive). No word boundaries: the keywords
// must also match inside tokens like "NullPointerException".
static EXCEPTION_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(exception|null\s?pointer|stack\s?trace|traceback|panicked at)")
        .expect("exception pattern is valid")
});

static TIMEOUT_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(timeout|timed\s+out|time\s+out|deadline\s+exceeded|etimedout)")
        .expect("timeout pattern is valid")
});

static CONNECTION_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(connection\s+(refused|reset|closed|aborted)|unreachable|econnrefused|econnreset|broken\s+pipe)",
    )
    .expect("connection pattern is valid")
});

/// Boolean signals derived from a message's wording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordSignals {
    pub has_exception: bool,
    pub has_timeout: bool,
    pub has_connection_error: bool,
}

impl KeywordSignals {
    /// Scan a message for the keyword families.
    ///
    /// A pattern that fails to evaluate (backtrack limit) counts as no match.
    #[must_use]
    pub fn detect(message: &str) -> Self {
        if message.is_empty() {
            return Self::default();
        }

        Self {
            has_exception: matches(&EXCEPTION_KEYWORDS, message),
            has_timeout: matches(&TIMEOUT_KEYWORDS, message),
            has_connection_error: matches(&CONNECTION_KEYWORDS, message),
        }
    }
}

fn matches(pattern: &Regex, message: &str) -> bool {
    pattern.is_match(message).unwrap_or(false)
}
