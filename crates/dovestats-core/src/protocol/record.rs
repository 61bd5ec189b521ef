//! Measurement records produced by the `EXPORT` decoders.

use std::sync::Arc;

/// Row label substituted for an empty identity in detail exports.
pub const EMPTY_LABEL: &str = "empty_user";

/// Which of the two `EXPORT` line formats a scope answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// One aggregate row, whitespace-separated (e.g. `global`).
    Global,
    /// One row per identity, tab-separated (e.g. `user`, `domain`).
    Detail,
}

impl ScopeKind {
    /// Default classification by Dovecot naming: only `global` is an aggregate scope.
    pub fn by_convention(scope: &str) -> Self {
        if scope == "global" {
            ScopeKind::Global
        } else {
            ScopeKind::Detail
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Detail => "detail",
        }
    }
}

/// One measurement series: `(namespace, column)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDescriptor {
    /// Scope for global exports, header qualifier for detail exports.
    pub namespace: String,
    /// Column name from the header line.
    pub column: String,
}

impl ColumnDescriptor {
    pub fn new(namespace: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            column: column.into(),
        }
    }
}

/// A single decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    /// Series this value belongs to (shared by every row of one decode call).
    pub column: Arc<ColumnDescriptor>,
    /// Row label; `None` for global exports.
    pub label: Option<Arc<str>>,
    pub value: f64,
}

impl MeasurementRecord {
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
