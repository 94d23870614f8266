// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Source '{key}' is unavailable: {reason}")]
    SourceUnavailable { key: String, reason: String },
    #[error("{0}")]
    Validation(String),
    #[error("Line {line} of '{key}' is not a JSON object")]
    MalformedLine { key: String, line: u64 },
    #[error("Catalog listing is not supported by the {backend} store")]
    ListingUnsupported { backend: &'static str },
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

impl QueryError {
    pub fn unavailable(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors caused by the request itself rather than by storage.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub const fn category(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::Validation(_) => "validation",
            Self::MalformedLine { .. } => "malformed_line",
            Self::ListingUnsupported { .. } => "listing_unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_keeps_key_and_reason() {
        let err = QueryError::unavailable("plasma/x.jsonl.gz", "not found");
        assert_eq!(
            err.to_string(),
            "Source 'plasma/x.jsonl.gz' is unavailable: not found"
        );
        assert_eq!(err.category(), "source_unavailable");
        assert!(!err.is_client_error());
        assert!(QueryError::Validation("x".into()).is_client_error());
    }
}
