//! Shared error type across dovestats crates.

use std::time::Duration;

use thiserror::Error;

/// Stable error codes (used in logs, metric labels and test vectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Stats socket could not be reached, written or read.
    TransportUnavailable,
    /// Exchange with the stats socket exceeded its deadline.
    Timeout,
    /// Header line missing or lacking required fields.
    MalformedHeader,
    /// Data row width differs from header width.
    ColumnCountMismatch,
    /// A value is not a 64-bit float.
    ValueParseFailure,
    /// Stream ended in the middle of a line.
    UnexpectedEof,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::TransportUnavailable => "TRANSPORT_UNAVAILABLE",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::MalformedHeader => "MALFORMED_HEADER",
            ErrorKind::ColumnCountMismatch => "COLUMN_COUNT_MISMATCH",
            ErrorKind::ValueParseFailure => "VALUE_PARSE_FAILURE",
            ErrorKind::UnexpectedEof => "UNEXPECTED_EOF",
            ErrorKind::BadConfig => "BAD_CONFIG",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, DoveStatsError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DoveStatsError {
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("column count mismatch: expected {expected} fields, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },
    #[error("failed to parse value {value:?} for column {column}: {reason}")]
    ValueParseFailure {
        column: String,
        value: String,
        reason: String,
    },
    #[error("premature end of stream: {0}")]
    UnexpectedEof(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl DoveStatsError {
    /// Map the error to its stable code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DoveStatsError::TransportUnavailable(_) => ErrorKind::TransportUnavailable,
            DoveStatsError::Timeout(_) => ErrorKind::Timeout,
            DoveStatsError::MalformedHeader(_) => ErrorKind::MalformedHeader,
            DoveStatsError::ColumnCountMismatch { .. } => ErrorKind::ColumnCountMismatch,
            DoveStatsError::ValueParseFailure { .. } => ErrorKind::ValueParseFailure,
            DoveStatsError::UnexpectedEof(_) => ErrorKind::UnexpectedEof,
            DoveStatsError::BadConfig(_) => ErrorKind::BadConfig,
            DoveStatsError::UnsupportedVersion => ErrorKind::UnsupportedVersion,
            DoveStatsError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wrap an I/O failure on the stats socket.
    pub fn transport(context: &str, err: std::io::Error) -> Self {
        DoveStatsError::TransportUnavailable(format!("{context}: {err}"))
    }
}
