use std::rc::Rc;

use thiserror::Error;

use crate::frontend::position::{Position, SourceFile};
use crate::frontend::token::Token;

/// Which stage rejected the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexical,
    Syntax,
    Semantic,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Lexical => write!(f, "lexical error"),
            DiagnosticKind::Syntax => write!(f, "syntax error"),
            DiagnosticKind::Semantic => write!(f, "semantic error"),
        }
    }
}

/// A compile-time error with the source span to underline.
///
/// Displays as `path:line:col: message` for CLI-friendly output. Rendering the
/// underlined source is left to a [`Reporter`].
#[derive(Debug, Clone, Error)]
#[error("{}:{}:{}: {}", .file.path(), .start.line, .start.column, .message)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: Rc<SourceFile>,
    pub start: Position,
    pub end: Position,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        file: Rc<SourceFile>,
        start: Position,
        end: Position,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            file,
            start,
            end,
            message: message.into(),
        }
    }

    /// A diagnostic covering exactly one token.
    pub fn at_token(kind: DiagnosticKind, token: &Token, message: impl Into<String>) -> Self {
        Diagnostic::new(kind, token.file.clone(), token.start, token.end, message)
    }

    /// The source text under the span.
    pub fn snippet(&self) -> &str {
        self.file.slice(self.start, self.end)
    }
}

/// Receives the single diagnostic of a failed compilation.
pub trait Reporter {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Keeps reported diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let file = SourceFile::new("prog.smol", "var 1;");
        let diag = Diagnostic::new(
            DiagnosticKind::Syntax,
            file,
            Position { line: 1, column: 1, index: 0 },
            Position { line: 1, column: 6, index: 5 },
            "expected an identifier after 'var' keyword",
        );
        assert_eq!(
            diag.to_string(),
            "prog.smol:1:1: expected an identifier after 'var' keyword"
        );
        assert_eq!(diag.snippet(), "var 1");
    }

    #[test]
    fn test_collecting_reporter() {
        let file = SourceFile::new("x", "@");
        let diag = Diagnostic::new(
            DiagnosticKind::Lexical,
            file,
            Position::START,
            Position::START.advanced('@'),
            "unexpected character",
        );
        let mut reporter = CollectingReporter::new();
        reporter.report(&diag);
        assert_eq!(reporter.diagnostics.len(), 1);
        assert_eq!(reporter.diagnostics[0].kind, DiagnosticKind::Lexical);
    }
}
