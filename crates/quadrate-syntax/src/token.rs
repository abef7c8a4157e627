//! Token definitions for the Quadrate language.
//!
//! This module defines every token the Quadrate lexer can produce. A token is
//! the smallest meaningful unit of Quadrate source: a keyword, a punctuation
//! mark, an operator symbol, a pointer operation, a builtin instruction, a
//! literal or an identifier.
//!
//! # Token Categories
//!
//! - **Keywords**: declaration and control words (`fn`, `if`, `switch`, `defer`)
//! - **Punctuation**: structural marks (`(`, `{`, `::`, `->`, `--`)
//! - **Operators**: symbolic aliases for instructions (`+`, `.`, `<=`, `!`)
//! - **Pointer operations**: memory fetch/store (`@p`, `!f`)
//! - **Builtins**: reserved instruction words (`dup`, `add`, `print`, `spawn`)
//! - **Literals**: numbers (`42`, `-3.5`) and strings (`"hi\n"`)
//! - **Identifiers** and the loop variable `$`
//! - **Special**: end-of-file marker
//!
//! [`TokenKind`] is a plain classification; the text of the token lives in
//! [`Token::lexeme`].
//!
//! # Examples
//!
//! ```rust
//! use quadrate_syntax::{Operator, Span, Token, TokenKind};
//!
//! let minus = Token::new(TokenKind::Operator(Operator::Minus), "-", Span::new(2, 3, 1, 3));
//! assert_eq!(minus.kind.describe(), "operator '-'");
//!
//! let number = Token::new(TokenKind::Number, "-3", Span::new(2, 4, 1, 3));
//! assert!(number.kind.is_literal());
//! ```

use std::fmt;

use serde::Serialize;

use crate::source::Span;

/// Operator symbols.
///
/// Each is a symbolic alias for a builtin instruction: `.` prints, `+` adds,
/// `!` negates, and so on. The parser treats them as single leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    /// `.` - print the top of stack
    Dot,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEq,
    /// `>=`
    GreaterEq,
    /// `!` - logical not
    Bang,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Dot,
        Operator::Plus,
        Operator::Minus,
        Operator::Star,
        Operator::Slash,
        Operator::Percent,
        Operator::EqEq,
        Operator::NotEq,
        Operator::Less,
        Operator::Greater,
        Operator::LessEq,
        Operator::GreaterEq,
        Operator::Bang,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Dot => ".",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::EqEq => "==",
            Operator::NotEq => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessEq => "<=",
            Operator::GreaterEq => ">=",
            Operator::Bang => "!",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

/// Pointer fetch and store operations.
///
/// `@` fetches through the pointer on the stack, `!` stores through it; the
/// trailing letter selects the cell type (pointer, integer, float).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PointerOp {
    /// `@p`
    FetchPtr,
    /// `@i`
    FetchInt,
    /// `@f`
    FetchFloat,
    /// `!p`
    StorePtr,
    /// `!i`
    StoreInt,
    /// `!f`
    StoreFloat,
}

impl PointerOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PointerOp::FetchPtr => "@p",
            PointerOp::FetchInt => "@i",
            PointerOp::FetchFloat => "@f",
            PointerOp::StorePtr => "!p",
            PointerOp::StoreInt => "!i",
            PointerOp::StoreFloat => "!f",
        }
    }

    /// Resolves a sigil (`@` or `!`) and a cell letter to a pointer operation.
    pub fn from_parts(sigil: char, cell: char) -> Option<PointerOp> {
        let op = match (sigil, cell) {
            ('@', 'p') => PointerOp::FetchPtr,
            ('@', 'i') => PointerOp::FetchInt,
            ('@', 'f') => PointerOp::FetchFloat,
            ('!', 'p') => PointerOp::StorePtr,
            ('!', 'i') => PointerOp::StoreInt,
            ('!', 'f') => PointerOp::StoreFloat,
            _ => return None,
        };
        Some(op)
    }
}

/// Token types that can be produced by the Quadrate lexer.
///
/// Variants carry no text; the matched source text is stored alongside in
/// [`Token::lexeme`]. A word that appears in the reserved table (see
/// [`crate::reserved`]) is always classified as [`TokenKind::Builtin`] or as
/// its keyword, never as [`TokenKind::Ident`].
///
/// # Examples
///
/// ```rust
/// use quadrate_syntax::{lookup_reserved, TokenKind};
///
/// assert_eq!(lookup_reserved("switch"), Some(TokenKind::Switch));
/// assert_eq!(lookup_reserved("dup"), Some(TokenKind::Builtin));
/// assert_eq!(lookup_reserved("square"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // === Keywords ===
    /// `fn` - function definition or imported function declaration
    Fn,

    /// `pub` - marks a function as exported
    Pub,

    /// `const` - constant definition
    Const,

    /// `use` - module inclusion
    Use,

    /// `import` - foreign library import
    Import,

    /// `as` - names the namespace of an import
    As,

    If,
    Else,
    For,
    Loop,
    Switch,
    Case,
    Default,
    Defer,
    Ctx,
    Break,
    Continue,
    Return,

    // === Punctuation ===
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `:` - separates a parameter name from its type
    Colon,
    /// `::` - namespace qualifier
    ColonColon,
    /// `->` - local declaration
    Arrow,
    /// `--` - stack signature separator
    DashDash,
    /// `,`
    Comma,
    /// `=` - constant binding
    Equal,

    // === Operators ===
    Operator(Operator),
    PointerOp(PointerOp),

    /// A reserved instruction word such as `dup` or `print`
    Builtin,

    // === Literals ===
    /// Integer or decimal literal, sign included (`42`, `-3.5`)
    Number,

    /// String literal; the lexeme keeps the quotes and raw escapes
    String,

    /// Any other word
    Ident,

    /// `$` - the current loop counter
    Dollar,

    /// End-of-file marker - always the last token of a stream
    Eof,
}

impl TokenKind {
    /// Keywords that begin a statement and serve as resynchronization points.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Fn
                | TokenKind::Pub
                | TokenKind::Const
                | TokenKind::Use
                | TokenKind::Import
                | TokenKind::If
                | TokenKind::For
                | TokenKind::Loop
                | TokenKind::Switch
                | TokenKind::Defer
                | TokenKind::Ctx
                | TokenKind::Return
        )
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Fn
                | TokenKind::Pub
                | TokenKind::Const
                | TokenKind::Use
                | TokenKind::Import
                | TokenKind::As
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::Loop
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Defer
                | TokenKind::Ctx
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(self, TokenKind::Number | TokenKind::String)
    }

    /// Canonical text for kinds that only ever have one spelling.
    pub fn fixed_text(self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Fn => "fn",
            TokenKind::Pub => "pub",
            TokenKind::Const => "const",
            TokenKind::Use => "use",
            TokenKind::Import => "import",
            TokenKind::As => "as",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::Loop => "loop",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Defer => "defer",
            TokenKind::Ctx => "ctx",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Colon => ":",
            TokenKind::ColonColon => "::",
            TokenKind::Arrow => "->",
            TokenKind::DashDash => "--",
            TokenKind::Comma => ",",
            TokenKind::Equal => "=",
            TokenKind::Operator(op) => op.as_str(),
            TokenKind::PointerOp(op) => op.as_str(),
            TokenKind::Dollar => "$",
            TokenKind::Builtin
            | TokenKind::Number
            | TokenKind::String
            | TokenKind::Ident
            | TokenKind::Eof => return None,
        };
        Some(text)
    }

    /// Human-readable description used in diagnostics.
    pub fn describe(self) -> String {
        match self {
            TokenKind::Operator(op) => format!("operator '{}'", op.as_str()),
            TokenKind::PointerOp(op) => format!("pointer operation '{}'", op.as_str()),
            TokenKind::Builtin => "builtin operation".to_string(),
            TokenKind::Number => "number".to_string(),
            TokenKind::String => "string".to_string(),
            TokenKind::Ident => "identifier".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            kind if kind.is_keyword() => format!("keyword '{}'", kind),
            kind => format!("'{}'", kind),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed_text() {
            Some(text) => f.write_str(text),
            None => write!(f, "{:?}", self),
        }
    }
}

/// A token with its source text and location.
///
/// # Fields
///
/// - `kind`: the classification of this token
/// - `lexeme`: the exact source text it was scanned from
/// - `span`: where that text sits in the source buffer
///
/// # Examples
///
/// ```rust
/// use quadrate_syntax::{Span, Token, TokenKind};
///
/// let tok = Token::new(TokenKind::Builtin, "dup", Span::new(0, 3, 1, 1));
/// assert_eq!(tok.lexeme, "dup");
/// assert_eq!(tok.span.col, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// The classification of this token
    pub kind: TokenKind,

    /// Source text of this token
    pub lexeme: String,

    /// Location in the source buffer
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Describes this token for a diagnostic, quoting its text where useful.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Builtin | TokenKind::Number | TokenKind::String | TokenKind::Ident => {
                format!("{} '{}'", self.kind.describe(), self.lexeme)
            }
            kind => kind.describe(),
        }
    }
}

/// A `//` or `/* */` comment. Comments never reach the parser; the lexer
/// hands them out separately so the printer can put them back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    /// Comment text including its delimiters, without trailing whitespace
    pub text: String,
    pub span: Span,
}
