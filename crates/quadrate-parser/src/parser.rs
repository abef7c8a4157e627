//! Recursive-descent parser for Quadrate.
//!
//! The parser looks one token ahead, plus a second token only to tell a plain
//! identifier from `namespace::name`. It never builds operator trees: a block
//! is the ordered list of its statements.
//!
//! Errors use panic-mode recovery. After reporting, tokens are skipped up to a
//! statement keyword or a brace and parsing resumes there, so one pass can
//! report several independent problems.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use quadrate_syntax::ast::*;
use quadrate_syntax::{DiagnosticKind, Diagnostics, Operator, Span, Token, TokenKind};

/// How many blocks and switches may be open at once. Anything deeper is
/// reported and skipped without recursing.
pub const MAX_NESTING: usize = 100;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    /// Blocks and switches currently open
    depth: usize,
    sink: &'a mut Diagnostics,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Parser<'a> {
    /// Creates a parser over a token stream. A missing trailing `Eof` is added.
    pub fn new(mut tokens: Vec<Token>, sink: &'a mut Diagnostics) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(
                TokenKind::Eof,
                "",
                Span::point(end.end, end.line, end.col + end.len()),
            ));
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            sink,
            cancel: None,
        }
    }

    /// Checks `flag` between top-level statements and stops early once it is set.
    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    // === token cursor ===

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }
    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }
    fn peek_nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }
    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }
    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }
    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            None
        }
    }
    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(i) => self.tokens[i].span,
            None => self.peek().span,
        }
    }

    // === reporting ===

    /// Reports a problem at the current token. At end of input the kind
    /// becomes [`DiagnosticKind::UnexpectedEof`].
    fn error_here(&mut self, kind: DiagnosticKind, message: String) {
        let tok = self.peek();
        let kind = if tok.kind == TokenKind::Eof && kind == DiagnosticKind::UnexpectedToken {
            DiagnosticKind::UnexpectedEof
        } else {
            kind
        };
        let span = tok.span;
        self.sink.report(kind, span, message);
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Option<Token> {
        if let Some(tok) = self.eat(kind) {
            return Some(tok);
        }
        let found = self.peek().describe();
        self.error_here(
            DiagnosticKind::UnexpectedToken,
            format!("expected {} {}, found {}", kind.describe(), context, found),
        );
        None
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    // === recovery ===

    fn synchronize(&mut self) {
        while !self.at(TokenKind::Eof) {
            let kind = self.peek_kind();
            if kind.starts_statement() || kind == TokenKind::LBrace || kind == TokenKind::RBrace {
                return;
            }
            self.advance();
        }
    }

    /// Resynchronizes after a failed statement that began at token `start`.
    fn recover(&mut self, start: usize) {
        let failed_at = self.pos;
        self.synchronize();
        if self.at(TokenKind::LBrace) {
            // the body of the broken statement, already accounted for
            self.skip_block();
        } else if self.pos == start {
            // the statement failed on its first token, which is itself a sync point
            self.advance();
        }
        debug!(
            "recovered at {}:{} after skipping {} tokens",
            self.peek().span.line,
            self.peek().span.col,
            self.pos - failed_at
        );
    }

    /// Skips a brace-balanced block without reporting its contents.
    fn skip_block(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skips tokens up to one of `stops` at brace depth zero, stepping over
    /// nested blocks. Stops at end of input.
    fn skip_until(&mut self, stops: &[TokenKind]) {
        let mut depth = 0usize;
        loop {
            let kind = self.peek_kind();
            match kind {
                TokenKind::Eof => return,
                _ if depth == 0 && stops.contains(&kind) => return,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
    }

    /// Checks the nesting limit before a block or switch opens at the
    /// current `{`. Past the limit the whole construct is reported once and
    /// skipped.
    fn enter_nested(&mut self) -> bool {
        if self.depth < MAX_NESTING {
            self.depth += 1;
            return true;
        }
        self.error_here(
            DiagnosticKind::NestingTooDeep,
            format!("blocks are nested more than {} levels deep", MAX_NESTING),
        );
        self.skip_block();
        false
    }

    // === program and statements ===

    /// Parse a whole token stream. Always returns a program, possibly partial.
    pub fn parse_program(mut self) -> Program {
        let statements = self.parse_statements(None);
        Program { statements }
    }

    /// Parses statements until `closer` (left unconsumed) or end of input.
    fn parse_statements(&mut self, closer: Option<TokenKind>) -> Vec<Statement> {
        let top_level = closer.is_none();
        let mut statements = Vec::new();
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Eof || Some(kind) == closer {
                break;
            }
            if top_level && self.is_cancelled() {
                let span = self.peek().span;
                self.sink
                    .report(DiagnosticKind::Cancelled, span, "parse cancelled");
                break;
            }
            match kind {
                TokenKind::RBrace => {
                    self.error_here(
                        DiagnosticKind::UnexpectedToken,
                        "unmatched '}'".to_string(),
                    );
                    self.advance();
                }
                TokenKind::LBrace => {
                    // keep nesting balanced by consuming the stray block whole
                    self.error_here(
                        DiagnosticKind::UnexpectedToken,
                        "a block must follow 'fn', 'if', 'else', 'for', 'loop', 'case', 'default', 'defer' or 'ctx'"
                            .to_string(),
                    );
                    let _ = self.parse_block("this block");
                }
                _ => {
                    let start = self.pos;
                    match self.parse_statement() {
                        Some(stmt) => statements.push(stmt),
                        None => self.recover(start),
                    }
                }
            }
        }
        statements
    }

    pub fn parse_statement(&mut self) -> Option<Statement> {
        let start = self.peek().span;
        debug!("statement at {}:{} ({})", start.line, start.col, self.peek_kind());
        let kind = match self.peek_kind() {
            TokenKind::Pub | TokenKind::Fn => StatementKind::Function(self.parse_function()?),
            TokenKind::Const => StatementKind::Constant(self.parse_constant()?),
            TokenKind::Use => StatementKind::Use(self.parse_use()?),
            TokenKind::Import => StatementKind::Import(self.parse_import()?),
            _ => StatementKind::Expr(self.parse_expr()?),
        };
        Some(Spanned::new(kind, start.to(self.prev_span())))
    }

    fn parse_function(&mut self) -> Option<FunctionDef> {
        let public = self.eat(TokenKind::Pub).is_some();
        self.expect(
            TokenKind::Fn,
            if public { "after 'pub'" } else { "to start a function" },
        )?;
        let name = self.callable_name("function name")?;
        let signature = if self.at(TokenKind::LParen) {
            let signature = self.parse_signature();
            if signature.is_none() && self.at(TokenKind::Eof) {
                // the signature error already explains the missing rest
                return None;
            }
            signature
        } else {
            None
        };
        let body = self.parse_block(&format!("function '{}'", name.node))?;
        Some(FunctionDef {
            public,
            name,
            signature,
            body,
        })
    }

    /// `( inputs? -- outputs? )` or `()`. Problems are reported as
    /// [`DiagnosticKind::MalformedSignature`] and skipped up to the closing `)`.
    fn parse_signature(&mut self) -> Option<Spanned<StackSignature>> {
        let open = self.advance();
        let mut sig = StackSignature::default();
        let mut separator: Option<Span> = None;
        loop {
            match self.peek_kind() {
                TokenKind::RParen => break,
                TokenKind::DashDash => {
                    let dash = self.advance();
                    if separator.is_some() {
                        self.sink.report(
                            DiagnosticKind::MalformedSignature,
                            dash.span,
                            "stack signature has more than one '--'",
                        );
                        self.skip_signature();
                        return None;
                    }
                    separator = Some(dash.span);
                }
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Eof => {
                    self.error_here(
                        DiagnosticKind::UnexpectedEof,
                        format!(
                            "stack signature opened at {}:{} is never closed",
                            open.span.line, open.span.col
                        ),
                    );
                    return None;
                }
                _ => {
                    let Some(param) = self.parse_parameter() else {
                        self.skip_signature();
                        return None;
                    };
                    if separator.is_some() {
                        sig.outputs.push(param);
                    } else {
                        sig.inputs.push(param);
                    }
                }
            }
        }
        let close = self.advance();
        let span = open.span.to(close.span);
        if separator.is_none() && !sig.inputs.is_empty() {
            self.sink.report(
                DiagnosticKind::MalformedSignature,
                span,
                "stack signature needs '--' between its inputs and outputs",
            );
            return None;
        }
        Some(Spanned::new(sig, span))
    }

    fn parse_parameter(&mut self) -> Option<Parameter> {
        let name = match self.peek_kind() {
            TokenKind::Ident => {
                let tok = self.advance();
                Spanned::new(tok.lexeme, tok.span)
            }
            _ => {
                let found = self.peek().describe();
                self.error_here(
                    DiagnosticKind::MalformedSignature,
                    format!("expected a parameter name in stack signature, found {}", found),
                );
                return None;
            }
        };
        if !self.at(TokenKind::Colon) {
            let found = self.peek().describe();
            self.error_here(
                DiagnosticKind::MalformedSignature,
                format!("expected ':' after parameter '{}', found {}", name.node, found),
            );
            return None;
        }
        self.advance();
        if !self.at(TokenKind::Ident) {
            let found = self.peek().describe();
            self.error_here(
                DiagnosticKind::MalformedSignature,
                format!("expected a type for parameter '{}', found {}", name.node, found),
            );
            return None;
        }
        let ty = self.advance();
        Some(Parameter {
            name,
            type_name: Spanned::new(ty.lexeme, ty.span),
        })
    }

    /// Skips the rest of a broken signature. Stops after `)`, or before a `{`
    /// or statement keyword so the function body can still be parsed.
    fn skip_signature(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::RParen => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => return,
                kind if kind.starts_statement() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_constant(&mut self) -> Option<ConstantDef> {
        self.advance();
        let name = self.plain_name("constant name")?;
        self.expect(TokenKind::Equal, &format!("after constant '{}'", name.node))?;
        let value = self.parse_expr()?;
        Some(ConstantDef { name, value })
    }

    fn parse_use(&mut self) -> Option<UseStmt> {
        self.advance();
        let mut module = self.plain_name("module name after 'use'")?;
        // `use helpers.qd` names a source file rather than a library module
        let dot = self.peek().span;
        if self.peek_kind() == TokenKind::Operator(Operator::Dot)
            && dot.start == module.span.end
            && self.peek_nth_kind(1) == TokenKind::Ident
        {
            let ext = &self.tokens[self.pos + 1];
            if ext.lexeme == "qd" && ext.span.start == dot.end {
                let ext_span = ext.span;
                self.pos += 2;
                module.node.push_str(".qd");
                module.span = module.span.to(ext_span);
            }
        }
        Some(UseStmt { module })
    }

    fn parse_import(&mut self) -> Option<ImportStmt> {
        self.advance();
        let library = self.string_literal("library path after 'import'")?;
        self.expect(TokenKind::As, "after the library path")?;
        let namespace = self.string_literal("namespace after 'as'")?;
        let open = self.expect(TokenKind::LBrace, "to open the import block")?;
        let mut functions = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Fn => {
                    if let Some(decl) = self.parse_import_decl() {
                        functions.push(decl);
                    }
                }
                TokenKind::Eof => {
                    self.error_here(
                        DiagnosticKind::UnexpectedEof,
                        format!(
                            "import block opened at {}:{} is never closed",
                            open.span.line, open.span.col
                        ),
                    );
                    return None;
                }
                _ => {
                    let found = self.peek().describe();
                    self.error_here(
                        DiagnosticKind::UnexpectedToken,
                        format!("only 'fn' declarations may appear in an import block, found {}", found),
                    );
                    self.skip_until(&[TokenKind::Fn, TokenKind::RBrace]);
                }
            }
        }
        Some(ImportStmt {
            library,
            namespace,
            functions,
        })
    }

    fn parse_import_decl(&mut self) -> Option<Spanned<ImportFunctionDecl>> {
        let start = self.advance().span;
        let name = self.callable_name("function name after 'fn'")?;
        let signature = if self.at(TokenKind::LParen) {
            self.parse_signature()
        } else {
            None
        };
        let span = start.to(self.prev_span());
        if self.at(TokenKind::LBrace) {
            self.error_here(
                DiagnosticKind::UnexpectedToken,
                format!("imported function '{}' cannot have a body", name.node),
            );
            let _ = self.parse_block("imported function");
        }
        Some(Spanned::new(ImportFunctionDecl { name, signature }, span))
    }

    // === blocks and expressions ===

    /// `{ statements }`. Returns `None` unless the closing brace is found.
    fn parse_block(&mut self, owner: &str) -> Option<Block> {
        if !self.at(TokenKind::LBrace) {
            let found = self.peek().describe();
            self.error_here(
                DiagnosticKind::MissingBody,
                format!("expected '{{' to open the body of {}, found {}", owner, found),
            );
            return None;
        }
        if !self.enter_nested() {
            return None;
        }
        let open = self.advance();
        let statements = self.parse_statements(Some(TokenKind::RBrace));
        self.depth -= 1;
        match self.eat(TokenKind::RBrace) {
            Some(close) => Some(Spanned::new(statements, open.span.to(close.span))),
            None => {
                self.error_here(
                    DiagnosticKind::UnexpectedEof,
                    format!(
                        "expected '}}' to close the block opened at {}:{}",
                        open.span.line, open.span.col
                    ),
                );
                None
            }
        }
    }

    pub fn parse_expr(&mut self) -> Option<Expr> {
        let tok = self.peek().clone();
        let kind = match tok.kind {
            TokenKind::Number => {
                self.advance();
                ExprKind::NumberLit(number_value(&tok.lexeme))
            }
            TokenKind::String => {
                self.advance();
                ExprKind::StringLit(string_contents(&tok.lexeme).to_string())
            }
            TokenKind::Ident if self.peek_nth_kind(1) == TokenKind::ColonColon => {
                self.advance();
                self.advance();
                let name = self.callable_name(&format!("name after '{}::'", tok.lexeme))?;
                ExprKind::NamespacedIdentifier {
                    namespace: tok.lexeme,
                    name: name.node,
                }
            }
            TokenKind::Ident => {
                self.advance();
                ExprKind::Identifier(tok.lexeme)
            }
            TokenKind::Builtin => {
                self.advance();
                ExprKind::BuiltinOp(tok.lexeme)
            }
            TokenKind::Operator(op) => {
                self.advance();
                ExprKind::OperatorSymbol(op)
            }
            TokenKind::PointerOp(op) => {
                self.advance();
                ExprKind::PointerOp(op)
            }
            TokenKind::Arrow => {
                self.advance();
                ExprKind::LocalDecl(self.plain_name("local name after '->'")?.node)
            }
            TokenKind::If => {
                self.advance();
                let then = self.parse_block("'if'")?;
                let else_ = match self.eat(TokenKind::Else) {
                    Some(_) => Some(self.parse_block("'else'")?),
                    None => None,
                };
                ExprKind::IfExpr { then, else_ }
            }
            TokenKind::For => {
                self.advance();
                let variable = match self.eat(TokenKind::Ident) {
                    Some(v) => Some(Spanned::new(v.lexeme, v.span)),
                    None => None,
                };
                let body = self.parse_block("'for'")?;
                ExprKind::ForLoop { variable, body }
            }
            TokenKind::Loop => {
                self.advance();
                ExprKind::LoopStmt {
                    body: self.parse_block("'loop'")?,
                }
            }
            TokenKind::Switch => self.parse_switch()?,
            TokenKind::Defer => {
                self.advance();
                ExprKind::DeferBlock {
                    body: self.parse_block("'defer'")?,
                }
            }
            TokenKind::Ctx => {
                self.advance();
                ExprKind::CtxBlock {
                    body: self.parse_block("'ctx'")?,
                }
            }
            TokenKind::Break => {
                self.advance();
                ExprKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                ExprKind::Continue
            }
            TokenKind::Return => {
                self.advance();
                ExprKind::Return
            }
            TokenKind::Dollar => {
                self.advance();
                ExprKind::LoopVar
            }
            TokenKind::Else => {
                self.error_here(
                    DiagnosticKind::UnexpectedToken,
                    "'else' without a matching 'if'".to_string(),
                );
                return None;
            }
            _ => {
                self.error_here(
                    DiagnosticKind::UnexpectedToken,
                    format!("expected an expression, found {}", tok.describe()),
                );
                return None;
            }
        };
        Some(Spanned::new(kind, tok.span.to(self.prev_span())))
    }

    /// `switch { (case expr block)* (default block)? }`. There is no
    /// scrutinee: the switched value comes off the stack at run time.
    fn parse_switch(&mut self) -> Option<ExprKind> {
        self.advance();
        if !self.at(TokenKind::LBrace) {
            let found = self.peek().describe();
            self.error_here(
                DiagnosticKind::MissingBody,
                format!("expected '{{' after 'switch', found {}", found),
            );
            return None;
        }
        if !self.enter_nested() {
            return None;
        }
        let open = self.advance();
        let arms = self.parse_switch_arms(open.span);
        self.depth -= 1;
        arms
    }

    fn parse_switch_arms(&mut self, open: Span) -> Option<ExprKind> {
        let mut cases = Vec::new();
        let mut default: Option<Block> = None;
        loop {
            match self.peek_kind() {
                TokenKind::Case => {
                    let case = self.advance();
                    if default.is_some() {
                        self.sink.report(
                            DiagnosticKind::UnexpectedToken,
                            case.span,
                            "'case' must come before 'default'",
                        );
                    }
                    let Some(value) = self.parse_expr() else {
                        self.skip_switch_arm();
                        continue;
                    };
                    let Some(body) = self.parse_block("'case'") else {
                        self.skip_switch_arm();
                        continue;
                    };
                    let span = case.span.to(body.span);
                    cases.push(Spanned::new(CaseClause { value, body }, span));
                }
                TokenKind::Default => {
                    let tok = self.advance();
                    if default.is_some() {
                        self.sink.report(
                            DiagnosticKind::UnexpectedToken,
                            tok.span,
                            "switch has more than one 'default'",
                        );
                    }
                    match self.parse_block("'default'") {
                        Some(body) => default = Some(body),
                        None => self.skip_switch_arm(),
                    }
                }
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    self.error_here(
                        DiagnosticKind::UnexpectedEof,
                        format!(
                            "switch opened at {}:{} is never closed",
                            open.line, open.col
                        ),
                    );
                    return None;
                }
                _ => {
                    let found = self.peek().describe();
                    self.error_here(
                        DiagnosticKind::UnexpectedToken,
                        format!("expected 'case', 'default' or '}}' in switch, found {}", found),
                    );
                    self.skip_switch_arm();
                }
            }
        }
        Some(ExprKind::SwitchExpr { cases, default })
    }

    /// Skips to the next `case`, `default` or the switch's closing brace,
    /// stepping over nested blocks.
    fn skip_switch_arm(&mut self) {
        self.skip_until(&[TokenKind::Case, TokenKind::Default, TokenKind::RBrace]);
    }

    // === names ===

    /// A name that must be a plain identifier: reserved words cannot be
    /// shadowed by parameters, constants, locals or modules.
    fn plain_name(&mut self, what: &str) -> Option<Name> {
        if let Some(tok) = self.eat(TokenKind::Ident) {
            return Some(Spanned::new(tok.lexeme, tok.span));
        }
        let tok = self.peek();
        let message = match tok.kind {
            TokenKind::Builtin => format!(
                "'{}' is a builtin operation and cannot be used as a {}",
                tok.lexeme, what
            ),
            kind if kind.is_keyword() => format!(
                "'{}' is a keyword and cannot be used as a {}",
                tok.lexeme, what
            ),
            _ => format!("expected {}, found {}", what, tok.describe()),
        };
        self.error_here(DiagnosticKind::UnexpectedToken, message);
        None
    }

    /// A function name. Builtin words are accepted because foreign libraries
    /// and standard modules export functions such as `sin` or `sqrt`.
    fn callable_name(&mut self, what: &str) -> Option<Name> {
        if matches!(self.peek_kind(), TokenKind::Ident | TokenKind::Builtin) {
            let tok = self.advance();
            return Some(Spanned::new(tok.lexeme, tok.span));
        }
        let found = self.peek().describe();
        self.error_here(
            DiagnosticKind::UnexpectedToken,
            format!("expected {}, found {}", what, found),
        );
        None
    }

    fn string_literal(&mut self, what: &str) -> Option<Spanned<String>> {
        if let Some(tok) = self.eat(TokenKind::String) {
            return Some(Spanned::new(string_contents(&tok.lexeme).to_string(), tok.span));
        }
        let found = self.peek().describe();
        self.error_here(
            DiagnosticKind::UnexpectedToken,
            format!("expected a string {}, found {}", what, found),
        );
        None
    }
}

/// Integer text that does not fit in an `i64` is kept as a float. `-0` is
/// plain integer zero; only a float literal such as `-0.0` keeps the sign.
fn number_value(text: &str) -> Number {
    if !text.contains('.') {
        if let Ok(n) = text.parse::<i64>() {
            return Number::Int(n);
        }
    }
    Number::Float(text.parse().unwrap_or(f64::NAN))
}

/// Strips the quotes from a string token. Escapes stay as written.
fn string_contents(lexeme: &str) -> &str {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
}
