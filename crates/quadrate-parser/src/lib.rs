pub mod parser;

use std::sync::atomic::AtomicBool;

use log::debug;
use quadrate_lexer::Lexer;
use quadrate_syntax::{Comment, Diagnostics, Program, Result, SourceBuffer};

pub use parser::Parser;

/// Everything one parse produces: a tree, possibly partial, and the problems
/// found along the way, lexical ones first.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub program: Program,
    pub diagnostics: Diagnostics,
    /// Source comments in order, for tools that print the tree back out
    pub comments: Vec<Comment>,
    pub file: Option<String>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Lex and parse a source buffer.
///
/// Malformed source is not an error: it yields diagnostics next to a partial
/// tree. `Err` is reserved for fatal failures such as allocation.
pub fn parse_source(source: &SourceBuffer<'_>) -> Result<ParseOutput> {
    run(source, None)
}

/// Like [`parse_source`], but stops between top-level statements once
/// `cancel` is set and reports a `Cancelled` diagnostic.
pub fn parse_source_with_cancellation(
    source: &SourceBuffer<'_>,
    cancel: &AtomicBool,
) -> Result<ParseOutput> {
    run(source, Some(cancel))
}

pub fn parse_str(src: &str) -> Result<ParseOutput> {
    parse_source(&SourceBuffer::new(src))
}

fn run(source: &SourceBuffer<'_>, cancel: Option<&AtomicBool>) -> Result<ParseOutput> {
    let mut diagnostics = Diagnostics::new();
    let (tokens, comments) = Lexer::new(source).tokenize_with_comments(&mut diagnostics)?;
    let lexical = diagnostics.len();
    let mut parser = Parser::new(tokens, &mut diagnostics);
    if let Some(flag) = cancel {
        parser = parser.with_cancellation(flag);
    }
    let program = parser.parse_program();
    debug!(
        "parsed {}: {} statements, {} lexical and {} syntax diagnostics",
        source.name().unwrap_or("<input>"),
        program.statements.len(),
        lexical,
        diagnostics.len() - lexical
    );
    Ok(ParseOutput {
        program,
        diagnostics,
        comments,
        file: source.name().map(str::to_string),
    })
}
