//! Rejection error types.
//!
//! The gate raises exactly one error type, [`RejectionError`], with one
//! variant per pipeline stage that can reject a query. A rejected query is
//! permanently rejected; there is no retry concept.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Result alias for validation operations.
pub type ValidationResult<T> = Result<T, RejectionError>;

/// Which pipeline stage rejected the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// The query is not a single well-formed SELECT statement.
    InvalidStructure,
    /// The query contains a blocked keyword or construct.
    DisallowedKeyword,
    /// No configured whitelist pattern matched the query.
    NotWhitelisted,
}

impl RejectionKind {
    /// Returns the stable string tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidStructure => "invalid_structure",
            Self::DisallowedKeyword => "disallowed_keyword",
            Self::NotWhitelisted => "not_whitelisted",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected query, carrying the original text and the reason.
///
/// The query string is stored exactly as submitted; all normalization is
/// local to the validation pass and never reflected back to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RejectionError {
    /// The query failed a structural check (not a SELECT, stacked
    /// statements, nested query).
    #[error("{detail}")]
    InvalidStructure {
        /// The original query text.
        query: String,
        /// The specific structural complaint.
        detail: String,
    },

    /// The query contains a keyword from the blocked set.
    #[error("query contains disallowed keyword: {keyword}")]
    DisallowedKeyword {
        /// The original query text.
        query: String,
        /// The offending token.
        keyword: String,
    },

    /// The query did not match any configured whitelist pattern.
    #[error("query does not match any whitelisted pattern")]
    NotWhitelisted {
        /// The original query text.
        query: String,
    },
}

impl RejectionError {
    /// Creates a structural rejection with the given detail message.
    pub fn invalid_structure(query: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidStructure {
            query: query.into(),
            detail: detail.into(),
        }
    }

    /// Creates a rejection naming the blocked keyword that was found.
    pub fn disallowed_keyword(query: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self::DisallowedKeyword {
            query: query.into(),
            keyword: keyword.into(),
        }
    }

    /// Creates a rejection for a query no whitelist pattern matched.
    pub fn not_whitelisted(query: impl Into<String>) -> Self {
        Self::NotWhitelisted {
            query: query.into(),
        }
    }

    /// Returns the original, unmodified query text.
    pub fn query(&self) -> &str {
        match self {
            Self::InvalidStructure { query, .. }
            | Self::DisallowedKeyword { query, .. }
            | Self::NotWhitelisted { query } => query,
        }
    }

    /// Returns the human-readable rejection reason.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Returns the taxonomy tag for the rejecting pipeline stage.
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::InvalidStructure { .. } => RejectionKind::InvalidStructure,
            Self::DisallowedKeyword { .. } => RejectionKind::DisallowedKeyword,
            Self::NotWhitelisted { .. } => RejectionKind::NotWhitelisted,
        }
    }
}

// Serialized as the flat `{ query, reason, kind }` object the calling layer
// embeds in its transport error payload.
impl Serialize for RejectionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("RejectionError", 3)?;
        state.serialize_field("query", self.query())?;
        state.serialize_field("reason", &self.reason())?;
        state.serialize_field("kind", &self.kind())?;
        state.end()
    }
}
