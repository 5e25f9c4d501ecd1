//! Lint findings (warnings, info, suggestions).
//!
//! Linting never blocks editing. Findings are collected and reported
//! alongside whatever the user was doing.

use serde::{Deserialize, Serialize};

/// One finding, positioned by 1-based line and column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub span: Option<(usize, usize)>, // (start, end) byte offsets into the document
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>, line: usize, column: usize) -> Self {
        Diagnostic {
            level,
            message: message.into(),
            line,
            column,
            span: None,
            suggestion: None,
        }
    }

    pub fn warning(message: impl Into<String>, line: usize, column: usize) -> Self {
        Diagnostic::new(DiagnosticLevel::Warning, message, line, column)
    }

    pub fn info(message: impl Into<String>, line: usize, column: usize) -> Self {
        Diagnostic::new(DiagnosticLevel::Info, message, line, column)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Probably not what the user meant
    Warning,
    /// Style or completeness note
    Info,
}

impl DiagnosticLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Info => "info",
        }
    }
}

/// Accumulates diagnostics while walking a document.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Warning)
    }

    /// Diagnostics ordered by position, warnings before info on the same spot.
    pub fn into_diagnostics(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| (d.line, d.column, d.level));
        self.diagnostics
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
