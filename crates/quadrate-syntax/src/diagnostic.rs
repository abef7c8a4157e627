//! Structured diagnostics shared by the lexer and the parser.
//!
//! A front-end pass never stops at the first problem. Every lexical or
//! syntactic issue is appended to a [`Diagnostics`] sink owned by that pass
//! and handed back next to whatever tree could be built.
//!
//! # Examples
//!
//! ```rust
//! use quadrate_syntax::{DiagnosticKind, Diagnostics, Span};
//!
//! let mut sink = Diagnostics::new();
//! sink.report(DiagnosticKind::InvalidCharacter, Span::new(4, 5, 1, 5), "unexpected character '#'");
//!
//! assert_eq!(sink.len(), 1);
//! assert_eq!(sink.kinds().collect::<Vec<_>>(), vec![DiagnosticKind::InvalidCharacter]);
//! assert_eq!(sink.iter().next().unwrap().to_string(), "unexpected character '#'");
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::source::Span;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    // lexical
    UnterminatedString,
    UnterminatedComment,
    InvalidCharacter,
    // syntactic
    UnexpectedToken,
    UnexpectedEof,
    /// A required `{ ... }` is absent
    MissingBody,
    /// A stack signature is malformed around `--`
    MalformedSignature,
    /// Blocks are nested past the parser's limit
    NestingTooDeep,
    /// The caller asked the parse to stop early
    Cancelled,
}

impl DiagnosticKind {
    pub fn is_lexical(self) -> bool {
        matches!(
            self,
            DiagnosticKind::UnterminatedString
                | DiagnosticKind::UnterminatedComment
                | DiagnosticKind::InvalidCharacter
        )
    }

    /// Short stable code used when rendering.
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::UnterminatedString => "unterminated-string",
            DiagnosticKind::UnterminatedComment => "unterminated-comment",
            DiagnosticKind::InvalidCharacter => "invalid-character",
            DiagnosticKind::UnexpectedToken => "unexpected-token",
            DiagnosticKind::UnexpectedEof => "unexpected-eof",
            DiagnosticKind::MissingBody => "missing-body",
            DiagnosticKind::MalformedSignature => "malformed-signature",
            DiagnosticKind::NestingTooDeep => "nesting-too-deep",
            DiagnosticKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One reported problem, located by its span.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

/// Append-only collector for one front-end pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn report(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::new(kind, span, message));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = DiagnosticKind> + '_ {
        self.items.iter().map(|d| d.kind)
    }

    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.kinds().any(|k| k == kind)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
