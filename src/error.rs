//! Error types for modelgen.

use std::fmt;
use thiserror::Error;

/// What a `NoMatch` failure ran out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchKind {
    /// The DDL path glob resolved to zero files.
    Files,
    /// Every candidate table was scanned and none satisfied the filter.
    Tables,
}

impl fmt::Display for NoMatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoMatchKind::Files => write!(f, "sql not matched"),
            NoMatchKind::Tables => write!(f, "no tables matched"),
        }
    }
}

/// The main error type for modelgen operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required selector was empty or malformed before any I/O happened.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Selection finished without a single entry.
    #[error("{0}")]
    NoMatch(NoMatchKind),

    /// Connectivity or catalog query failure against a live database.
    #[error("Introspection error: {0}")]
    Introspection(String),

    /// A matched table could not be turned into a descriptor.
    #[error("Conversion error for table '{table}': {reason}")]
    Conversion { table: String, reason: String },

    /// The generation backend failed for one entry.
    #[error("Generation error for '{target}': {reason}")]
    Generation { target: String, reason: String },

    /// DDL syntax error.
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Create an invalid input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a conversion error for the given table.
    pub fn conversion(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Create a generation error for the given target.
    pub fn generation(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Generation {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// True for both flavours of `NoMatch`.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch(_))
    }
}

impl From<sqlx::Error> for ModelError {
    fn from(e: sqlx::Error) -> Self {
        ModelError::Introspection(e.to_string())
    }
}

/// Result type alias for modelgen operations.
pub type ModelResult<T> = Result<T, ModelError>;
