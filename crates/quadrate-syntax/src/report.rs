//! Human-readable rendering of diagnostics.

use std::fmt::Write;

use owo_colors::OwoColorize;

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::source::SourceBuffer;

/// Renders diagnostics against the source they were reported for.
///
/// ```text
/// error[unexpected-token]: expected '}' but found end of file
///   --> main.qd:3:1
///      |
///    3 | fn broken {
///      |           ^
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn render(&self, diag: &Diagnostic, source: &SourceBuffer<'_>) -> String {
        let mut out = String::new();
        let header = format!("error[{}]", diag.kind.code());
        if self.color {
            let _ = writeln!(out, "{}: {}", header.red().bold(), diag.message.bold());
        } else {
            let _ = writeln!(out, "{}: {}", header, diag.message);
        }

        let span = diag.span;
        let file = source.name().unwrap_or("<input>");
        let _ = writeln!(out, "  --> {}:{}:{}", file, span.line, span.col);

        if let Some(src_line) = source.line_text(span.line) {
            let gutter = format!("{:4} | ", span.line);
            let blank = format!("{:4} | ", "");
            let remaining = src_line.chars().count().saturating_sub(span.col.saturating_sub(1));
            let token_len = source
                .text()
                .get(span.start..span.end)
                .unwrap_or("")
                .chars()
                .take_while(|&c| c != '\n')
                .count();
            let width = token_len.min(remaining).max(1);
            let marker = format!(
                "{}{}",
                " ".repeat(span.col.saturating_sub(1)),
                "^".repeat(width)
            );
            if self.color {
                let _ = writeln!(out, "{}", blank.bright_black());
                let _ = writeln!(out, "{}{}", gutter.bright_black(), src_line);
                let _ = writeln!(out, "{}{}", blank.bright_black(), marker.red());
            } else {
                let _ = writeln!(out, "{}", blank);
                let _ = writeln!(out, "{}{}", gutter, src_line);
                let _ = writeln!(out, "{}{}", blank, marker);
            }
        }
        out
    }

    /// Renders every diagnostic followed by a one-line summary.
    pub fn render_all(&self, diags: &Diagnostics, source: &SourceBuffer<'_>) -> String {
        let mut out = String::new();
        for diag in diags {
            out.push_str(&self.render(diag, source));
            out.push('\n');
        }
        let file = source.name().unwrap_or("<input>");
        let summary = match diags.len() {
            0 => format!("{}: no errors", file),
            1 => format!("{}: 1 error", file),
            n => format!("{}: {} errors", file, n),
        };
        if self.color && !diags.is_empty() {
            let _ = writeln!(out, "{}", summary.red());
        } else {
            let _ = writeln!(out, "{}", summary);
        }
        out
    }
}
