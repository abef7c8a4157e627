//! Canonical printer for Quadrate programs.
//!
//! One walk over the tree feeds an [`Emit`] sink. [`format_program`] lays the
//! tokens out as source text and [`to_lexemes`] collects them one per token.
//! Printed source parses back to an equal tree.
//!
//! Comments are not part of the tree. [`format_program_with_comments`] puts
//! them back by position: a comment before a statement gets its own line,
//! and one on the same line as a short statement stays at the end of it.

use quadrate_syntax::ast::*;
use quadrate_syntax::{Comment, Span};

trait Emit {
    /// A token separated from the previous one by a space.
    fn word(&mut self, text: &str);
    /// A token written directly after the previous one.
    fn glued(&mut self, text: &str);
    fn open_block(&mut self);
    fn close_block(&mut self);
    fn end_statement(&mut self) {}
    fn blank_line(&mut self) {}
    /// A statement, case or import declaration starting at byte `at` is next.
    fn item_start(&mut self, _at: usize) {}
    /// The item begun on source line `line` is printed. The next one starts
    /// at byte `limit`.
    fn item_end(&mut self, _line: usize, _limit: usize) {}
    /// The enclosing block closes at byte `at`.
    fn block_end(&mut self, _at: usize) {}
}

/// Tab-indented source text, one statement per line.
#[derive(Default)]
struct Layout<'c> {
    out: String,
    depth: usize,
    at_line_start: bool,
    after_open: bool,
    comments: &'c [Comment],
    next_comment: usize,
    /// Output offsets where the open items began
    items: Vec<usize>,
}

impl<'c> Layout<'c> {
    fn new(comments: &'c [Comment]) -> Self {
        Self {
            at_line_start: true,
            comments,
            ..Self::default()
        }
    }

    fn take_comment(&mut self, wanted: impl Fn(&Comment) -> bool) -> Option<&'c Comment> {
        let comments = self.comments;
        let comment = comments.get(self.next_comment).filter(|c| wanted(*c))?;
        self.next_comment += 1;
        Some(comment)
    }

    fn comment_line(&mut self, text: &str) {
        if self.after_open || !self.at_line_start {
            self.out.push('\n');
            self.after_open = false;
        }
        self.indent();
        self.out.push_str(text);
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn begin_token(&mut self, spaced: bool) {
        if self.after_open {
            self.out.push('\n');
            self.at_line_start = true;
            self.after_open = false;
        }
        if self.at_line_start {
            self.indent();
            self.at_line_start = false;
        } else if spaced && !self.out.is_empty() {
            self.out.push(' ');
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push('\t');
        }
    }
}

impl Emit for Layout<'_> {
    fn word(&mut self, text: &str) {
        self.begin_token(true);
        self.out.push_str(text);
    }

    fn glued(&mut self, text: &str) {
        self.begin_token(false);
        self.out.push_str(text);
    }

    fn open_block(&mut self) {
        self.word("{");
        self.depth += 1;
        self.after_open = true;
    }

    fn close_block(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.after_open {
            // empty block stays on one line
            self.after_open = false;
            self.out.push('}');
            return;
        }
        if !self.at_line_start {
            self.out.push('\n');
        }
        self.indent();
        self.out.push('}');
        self.at_line_start = false;
    }

    fn end_statement(&mut self) {
        if !self.at_line_start {
            self.out.push('\n');
            self.at_line_start = true;
        }
    }

    fn blank_line(&mut self) {
        self.out.push('\n');
    }

    fn item_start(&mut self, at: usize) {
        while let Some(c) = self.take_comment(|c| c.span.start < at) {
            self.comment_line(&c.text);
        }
        if self.after_open {
            self.out.push('\n');
            self.after_open = false;
            self.at_line_start = true;
        }
        self.items.push(self.out.len());
    }

    fn item_end(&mut self, line: usize, limit: usize) {
        let mark = self.items.pop().unwrap_or(self.out.len());
        if self.out[mark..].contains('\n') {
            return;
        }
        while let Some(c) = self.take_comment(|c| c.span.line == line && c.span.start < limit) {
            self.out.push(' ');
            self.out.push_str(&c.text);
        }
    }

    fn block_end(&mut self, at: usize) {
        while let Some(c) = self.take_comment(|c| c.span.start < at) {
            self.comment_line(&c.text);
        }
    }
}

#[derive(Default)]
struct Lexemes(Vec<String>);

impl Emit for Lexemes {
    fn word(&mut self, text: &str) {
        self.0.push(text.to_string());
    }
    fn glued(&mut self, text: &str) {
        self.0.push(text.to_string());
    }
    fn open_block(&mut self) {
        self.0.push("{".to_string());
    }
    fn close_block(&mut self) {
        self.0.push("}".to_string());
    }
}

/// Formats a program in canonical layout.
///
/// Blocks are indented with tabs and hold one statement per line. Functions
/// and imports are set off from their neighbours by a blank line. Empty
/// blocks print as `{}`.
pub fn format_program(program: &Program) -> String {
    format_program_with_comments(program, &[])
}

/// Like [`format_program`], placing `comments` (in source order) back
/// among the statements they were written next to.
pub fn format_program_with_comments(program: &Program, comments: &[Comment]) -> String {
    let mut layout = Layout::new(comments);
    emit_program(program, &mut layout);
    layout.out
}

/// The canonical lexeme of every token [`format_program`] would print, in order.
pub fn to_lexemes(program: &Program) -> Vec<String> {
    let mut lexemes = Lexemes::default();
    emit_program(program, &mut lexemes);
    lexemes.0
}

fn is_definition(stmt: &Statement) -> bool {
    matches!(
        stmt.node,
        StatementKind::Function(_) | StatementKind::Import(_)
    )
}

/// Prints one line-level item, giving the sink a chance to place comments
/// around it.
fn emit_item<E: Emit>(span: Span, limit: usize, e: &mut E, body: impl FnOnce(&mut E)) {
    e.item_start(span.start);
    body(e);
    e.item_end(span.line, limit);
    e.end_statement();
}

fn emit_program(program: &Program, e: &mut impl Emit) {
    let statements = &program.statements;
    for (i, stmt) in statements.iter().enumerate() {
        if i > 0 && (is_definition(&statements[i - 1]) || is_definition(stmt)) {
            e.blank_line();
        }
        let limit = statements.get(i + 1).map_or(usize::MAX, |next| next.span.start);
        emit_item(stmt.span, limit, e, |e| emit_statement(stmt, e));
    }
    e.block_end(usize::MAX);
}

fn emit_block(block: &Block, e: &mut impl Emit) {
    let close = block.span.end.saturating_sub(1);
    e.open_block();
    for (i, stmt) in block.iter().enumerate() {
        let limit = block.get(i + 1).map_or(close, |next| next.span.start);
        emit_item(stmt.span, limit, e, |e| emit_statement(stmt, e));
    }
    e.block_end(close);
    e.close_block();
}

fn emit_statement(stmt: &Statement, e: &mut impl Emit) {
    match &stmt.node {
        StatementKind::Function(f) => {
            if f.public {
                e.word("pub");
            }
            e.word("fn");
            e.word(&f.name);
            if let Some(sig) = &f.signature {
                emit_signature(sig, e);
            }
            emit_block(&f.body, e);
        }
        StatementKind::Constant(c) => {
            e.word("const");
            e.word(&c.name);
            e.word("=");
            emit_expr(&c.value, e);
        }
        StatementKind::Use(u) => {
            e.word("use");
            match u.module.strip_suffix(".qd") {
                Some(stem) => {
                    e.word(stem);
                    e.glued(".");
                    e.glued("qd");
                }
                None => e.word(&u.module),
            }
        }
        StatementKind::Import(i) => {
            e.word("import");
            e.word(&quoted(&i.library));
            e.word("as");
            e.word(&quoted(&i.namespace));
            let close = stmt.span.end.saturating_sub(1);
            e.open_block();
            for (n, decl) in i.functions.iter().enumerate() {
                let limit = i.functions.get(n + 1).map_or(close, |next| next.span.start);
                emit_item(decl.span, limit, e, |e| {
                    e.word("fn");
                    e.word(&decl.name);
                    if let Some(sig) = &decl.signature {
                        emit_signature(sig, e);
                    }
                });
            }
            e.block_end(close);
            e.close_block();
        }
        StatementKind::Expr(expr) => emit_expr(expr, e),
    }
}

/// `(a:int b:int -- c:int)`, `(-- c:int)`, `(a:int --)` or `()`.
fn emit_signature(sig: &StackSignature, e: &mut impl Emit) {
    e.glued("(");
    if sig.is_bare() {
        e.glued(")");
        return;
    }
    let mut first = true;
    for param in &sig.inputs {
        emit_parameter(param, first, e);
        first = false;
    }
    if first {
        e.glued("--");
    } else {
        e.word("--");
    }
    for param in &sig.outputs {
        emit_parameter(param, false, e);
    }
    e.glued(")");
}

fn emit_parameter(param: &Parameter, first: bool, e: &mut impl Emit) {
    if first {
        e.glued(&param.name);
    } else {
        e.word(&param.name);
    }
    e.glued(":");
    e.glued(&param.type_name);
}

fn emit_expr(expr: &Expr, e: &mut impl Emit) {
    match &expr.node {
        ExprKind::NumberLit(n) => e.word(&n.to_string()),
        ExprKind::StringLit(s) => e.word(&quoted(s)),
        ExprKind::Identifier(name) | ExprKind::BuiltinOp(name) => e.word(name),
        ExprKind::NamespacedIdentifier { namespace, name } => {
            e.word(namespace);
            e.glued("::");
            e.glued(name);
        }
        ExprKind::OperatorSymbol(op) => e.word(op.as_str()),
        ExprKind::PointerOp(op) => e.word(op.as_str()),
        ExprKind::LocalDecl(name) => {
            e.word("->");
            e.word(name);
        }
        ExprKind::IfExpr { then, else_ } => {
            e.word("if");
            emit_block(then, e);
            if let Some(otherwise) = else_ {
                e.word("else");
                emit_block(otherwise, e);
            }
        }
        ExprKind::ForLoop { variable, body } => {
            e.word("for");
            if let Some(var) = variable {
                e.word(var);
            }
            emit_block(body, e);
        }
        ExprKind::LoopStmt { body } => {
            e.word("loop");
            emit_block(body, e);
        }
        ExprKind::SwitchExpr { cases, default } => {
            let close = expr.span.end.saturating_sub(1);
            e.word("switch");
            e.open_block();
            for (n, case) in cases.iter().enumerate() {
                let limit = cases
                    .get(n + 1)
                    .map(|next| next.span.start)
                    .or_else(|| default.as_ref().map(|d| d.span.start))
                    .unwrap_or(close);
                emit_item(case.span, limit, e, |e| {
                    e.word("case");
                    emit_expr(&case.value, e);
                    emit_block(&case.body, e);
                });
            }
            if let Some(body) = default {
                emit_item(body.span, close, e, |e| {
                    e.word("default");
                    emit_block(body, e);
                });
            }
            e.block_end(close);
            e.close_block();
        }
        ExprKind::DeferBlock { body } => {
            e.word("defer");
            emit_block(body, e);
        }
        ExprKind::CtxBlock { body } => {
            e.word("ctx");
            emit_block(body, e);
        }
        ExprKind::Break => e.word("break"),
        ExprKind::Continue => e.word("continue"),
        ExprKind::Return => e.word("return"),
        ExprKind::LoopVar => e.word("$"),
    }
}

fn quoted(raw: &str) -> String {
    format!("\"{}\"", raw)
}
