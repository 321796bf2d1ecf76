use serde::Serialize;

use crate::source_map::Range;

// Markup diagnostics.
pub const E_NESTING_DEPTH: &str = "E_NESTING_DEPTH";
pub const W_TAG_UNCLOSED: &str = "W_TAG_UNCLOSED";
pub const W_TAG_UNMATCHED: &str = "W_TAG_UNMATCHED";
pub const W_URL_REJECTED: &str = "W_URL_REJECTED";
pub const W_ATTR_INVALID: &str = "W_ATTR_INVALID";

// Field diagnostics.
pub const E_FIELD_REQUIRED: &str = "E_FIELD_REQUIRED";
pub const E_FIELD_OPTION: &str = "E_FIELD_OPTION";
pub const W_FIELD_UNUSED: &str = "W_FIELD_UNUSED";
pub const W_FIELD_DUPLICATE: &str = "W_FIELD_DUPLICATE";

/// A located, recoverable issue found while parsing markup.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        range: Range,
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            range,
            severity,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

impl DiagnosticSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        }
    }
}

/// A problem with one field's value or definition. Field issues are hints for
/// operators and administrators; they never block generation on their own.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field_key: String,
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
}

impl FieldIssue {
    pub fn new(
        field_key: impl Into<String>,
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_key: field_key.into(),
            severity,
            code,
            message: message.into(),
        }
    }
}
