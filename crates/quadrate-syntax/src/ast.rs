//! AST (abstract syntax tree) types for the Quadrate language.
//!
//! The tree is built once per parse and never mutated afterwards. Programs are
//! concatenative: a block is just an ordered list of statements, and every
//! operator or builtin word is its own leaf.

use std::fmt;

use serde::Serialize;

use crate::source::Span;
use crate::token::{Operator, PointerOp};

/// A node paired with the span it was parsed from.
///
/// Equality only looks at the node, so trees parsed from differently laid out
/// text compare equal when their structure matches.
#[derive(Debug, Clone, Serialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.node
    }
}

/// An identifier together with where it was written.
pub type Name = Spanned<String>;

/// A braced statement list. The closing brace is always present in source.
pub type Block = Spanned<Vec<Statement>>;

pub type Statement = Spanned<StatementKind>;

pub type Expr = Spanned<ExprKind>;

/// Entire program: the top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.statements.iter().filter_map(|s| match &s.node {
            StatementKind::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportStmt> {
        self.statements.iter().filter_map(|s| match &s.node {
            StatementKind::Import(i) => Some(i),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StatementKind {
    Function(FunctionDef),
    Constant(ConstantDef),
    Use(UseStmt),
    Import(ImportStmt),
    Expr(Expr),
}

/// `pub? fn name (signature)? { body }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDef {
    pub public: bool,
    pub name: Name,
    pub signature: Option<Spanned<StackSignature>>,
    pub body: Block,
}

/// `( inputs -- outputs )`, or the bare `()`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StackSignature {
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
}

impl StackSignature {
    pub fn is_bare(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}

/// `name:type_name`. The type is kept as written; nothing checks it here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: Name,
    pub type_name: Name,
}

/// `const name = value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantDef {
    pub name: Name,
    pub value: Expr,
}

/// `use module` or `use module.qd`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UseStmt {
    pub module: Name,
}

/// `import "library" as "namespace" { fn ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportStmt {
    /// Library path, without the quotes.
    pub library: Spanned<String>,
    /// Namespace the functions are bound under, without the quotes.
    pub namespace: Spanned<String>,
    pub functions: Vec<Spanned<ImportFunctionDecl>>,
}

/// A foreign function binding. It never has a body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportFunctionDecl {
    pub name: Name,
    pub signature: Option<Spanned<StackSignature>>,
}

/// Numeric literal. The sign is part of the value, except that integers have
/// no negative zero: `-0` is `Int(0)`. `-0.0` stays a negative `Float`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(x) => {
                let text = x.to_string();
                // keep a decimal point so the literal reads back as a float
                if text.contains('.') || !x.is_finite() {
                    f.write_str(&text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
        }
    }
}

/// Expressions. Each variant is a single word or a keyword construct; there
/// are no operator trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    NumberLit(Number),
    /// Raw text between the quotes; escapes are not decoded.
    StringLit(String),
    Identifier(String),
    NamespacedIdentifier {
        namespace: String,
        name: String,
    },
    BuiltinOp(String),
    OperatorSymbol(Operator),
    PointerOp(PointerOp),
    /// `-> name`
    LocalDecl(String),
    IfExpr {
        then: Block,
        else_: Option<Block>,
    },
    ForLoop {
        variable: Option<Name>,
        body: Block,
    },
    LoopStmt {
        body: Block,
    },
    /// The switched value is taken from the stack at run time.
    SwitchExpr {
        cases: Vec<Spanned<CaseClause>>,
        default: Option<Block>,
    },
    DeferBlock {
        body: Block,
    },
    CtxBlock {
        body: Block,
    },
    Break,
    Continue,
    Return,
    /// `$`
    LoopVar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseClause {
    pub value: Expr,
    pub body: Block,
}
