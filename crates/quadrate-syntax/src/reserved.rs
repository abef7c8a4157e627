//! The reserved-word table.
//!
//! Every keyword and builtin instruction word lives in one lookup table that is
//! built on first use and never modified afterwards, so any number of lexers on
//! any number of threads can consult it without locking.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::token::TokenKind;

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("fn", TokenKind::Fn),
    ("pub", TokenKind::Pub),
    ("const", TokenKind::Const),
    ("use", TokenKind::Use),
    ("import", TokenKind::Import),
    ("as", TokenKind::As),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("for", TokenKind::For),
    ("loop", TokenKind::Loop),
    ("switch", TokenKind::Switch),
    ("case", TokenKind::Case),
    ("default", TokenKind::Default),
    ("defer", TokenKind::Defer),
    ("ctx", TokenKind::Ctx),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("return", TokenKind::Return),
];

const BUILTINS: &[&str] = &[
    // stack
    "dup", "swap", "drop", "over", "rot", "nip", "tuck", "pick", "roll", "dup2", "swap2", "over2",
    "drop2", "depth", "clear", "dupd", "nipd", "overd", "swapd",
    // arithmetic
    "add", "sub", "mul", "div", "inc", "dec", "abs", "sqrt", "sq", "pow", "mod", "neg", "inv",
    "fac", "cb", "cbrt",
    // math
    "sin", "cos", "tan", "asin", "acos", "atan", "ln", "log10", "ceil", "floor", "round", "min",
    "max",
    // comparison
    "eq", "neq", "lt", "gt", "lte", "gte", "within",
    // logic and bitwise
    "and", "or", "not", "lshift", "rshift", "xor",
    // casts
    "castf", "casti", "casts",
    // i/o
    "print", "prints", "printv", "printsv", "nl", "read", "call",
    // threading
    "detach", "spawn", "wait",
    // errors
    "error",
];

fn table() -> &'static HashMap<&'static str, TokenKind> {
    static TABLE: OnceLock<HashMap<&'static str, TokenKind>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut map = HashMap::with_capacity(KEYWORDS.len() + BUILTINS.len());
        map.extend(KEYWORDS.iter().copied());
        map.extend(BUILTINS.iter().map(|&name| (name, TokenKind::Builtin)));
        map
    })
}

/// Classifies a word against the reserved table.
///
/// Returns the keyword kind, [`TokenKind::Builtin`], or `None` for a plain
/// identifier. Matching is exact and case-sensitive.
pub fn lookup_reserved(word: &str) -> Option<TokenKind> {
    table().get(word).copied()
}

pub fn is_builtin(word: &str) -> bool {
    lookup_reserved(word) == Some(TokenKind::Builtin)
}

pub fn is_keyword(word: &str) -> bool {
    lookup_reserved(word).is_some_and(TokenKind::is_keyword)
}

/// All builtin instruction words, grouped as stack, arithmetic, math,
/// comparison, logic, cast, I/O, threading and error operations.
pub fn builtin_names() -> &'static [&'static str] {
    BUILTINS
}

pub fn keyword_names() -> impl Iterator<Item = &'static str> {
    KEYWORDS.iter().map(|(name, _)| *name)
}
