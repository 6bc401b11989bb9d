// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    /// Client not configured or initialized; fatal, never retried.
    Unavailable,
    /// The requested filter+order combination needs a precomputed composite
    /// index that does not exist. Recoverable: callers switch to in-memory
    /// filtering instead of surfacing this.
    MissingIndex,
    NotFound,
    PermissionDenied,
    Network,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::MissingIndex => "missing_index",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Network => "network_error",
            Self::Internal => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn missing_index(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::MissingIndex, message)
    }

    /// The single predicate the query engine consults before falling back.
    ///
    /// Adapters for real backends that only expose error text can map their
    /// errors through [`message_indicates_missing_index`] when constructing
    /// the [`StoreError`], so the engine itself never sniffs strings.
    #[must_use]
    pub const fn is_missing_index(&self) -> bool {
        matches!(self.code, StoreErrorCode::MissingIndex)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// Heuristic for adapters wrapping backends that report a missing composite
/// index only through prose.
#[must_use]
pub fn message_indicates_missing_index(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("requires an index")
        || lowered.contains("requires a composite index")
        || lowered.contains("no matching index")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_index_predicate_keys_on_code_not_text() {
        let err = StoreError::missing_index("anything");
        assert!(err.is_missing_index());
        let err = StoreError::new(StoreErrorCode::Network, "requires an index");
        assert!(!err.is_missing_index());
    }

    #[test]
    fn message_heuristic_recognizes_known_phrasings() {
        assert!(message_indicates_missing_index(
            "The query requires an index. You can create it here: https://..."
        ));
        assert!(message_indicates_missing_index(
            "FAILED_PRECONDITION: no matching index found"
        ));
        assert!(!message_indicates_missing_index("permission denied"));
    }
}
