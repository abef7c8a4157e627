//! Quadrate lexer: converts source text into tokens.
//!
//! Lexing never fails on bad input. Problems are reported to a
//! [`Diagnostics`] sink and scanning carries on where it can; the returned
//! stream always ends with an [`TokenKind::Eof`] token.
use log::{debug, trace};
use quadrate_syntax::error::{try_push, Error, Result};
use quadrate_syntax::{
    lookup_reserved, Comment, DiagnosticKind, Diagnostics, Operator, PointerOp, SourceBuffer, Span,
    Token, TokenKind,
};

const TOKEN_STREAM: &str = "token stream";

/// Streaming character scanner that produces tokens with positions.
pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    line: usize,
    col: usize,
    /// Collected only when asked for
    comments: Option<Vec<Comment>>,
}

/// Outcome of skipping whitespace and comments.
enum Trivia {
    Done,
    /// A block comment ran to end of input; scanning stops at this span.
    Unterminated(Span),
}

impl<'src> Lexer<'src> {
    /// Create a new lexer over the given source buffer.
    pub fn new(source: &SourceBuffer<'src>) -> Self {
        Self::from_text(source.text())
    }

    fn from_text(src: &'src str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            col: 1,
            comments: None,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }
    fn peek_next(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if let Some(c) = ch {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        ch
    }

    fn span_from(&self, start: usize, line: usize, col: usize) -> Span {
        Span::new(start, self.pos, line, col)
    }

    fn skip_trivia(&mut self) -> Trivia {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '/' && self.peek_next() == Some('/') {
                let (start, line, col) = (self.pos, self.line, self.col);
                while let Some(c2) = self.peek() {
                    if c2 == '\n' {
                        break;
                    }
                    self.advance();
                }
                self.keep_comment(start, line, col);
            } else if c == '/' && self.peek_next() == Some('*') {
                let (start, line, col) = (self.pos, self.line, self.col);
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            self.keep_comment(start, line, col);
                            break;
                        }
                        Some(_) => {}
                        None => return Trivia::Unterminated(Span::new(start, start + 2, line, col)),
                    }
                }
            } else {
                break;
            }
        }
        Trivia::Done
    }

    fn keep_comment(&mut self, start: usize, line: usize, col: usize) {
        if let Some(comments) = self.comments.as_mut() {
            let text = self.src[start..self.pos].trim_end();
            comments.push(Comment {
                text: text.to_string(),
                span: Span::new(start, start + text.len(), line, col),
            });
        }
    }

    /// `-?digits(.digits)?`. The caller has checked that a digit follows any `-`.
    fn read_number(&mut self) -> TokenKind {
        if self.peek() == Some('-') {
            self.advance();
        }
        self.eat_digits();
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.eat_digits();
        }
        TokenKind::Number
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn read_ident_or_reserved(&mut self, start: usize) -> TokenKind {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        lookup_reserved(&self.src[start..self.pos]).unwrap_or(TokenKind::Ident)
    }

    /// Consumes a string literal, opening quote included. Escapes are kept as
    /// written: a backslash simply protects the character after it.
    fn read_string(&mut self) -> bool {
        self.advance();
        while let Some(c) = self.advance() {
            match c {
                '"' => return true,
                '\\' => {
                    if self.advance().is_none() {
                        return false;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// `@p`, `!f`, ... only when the cell letter is not the start of a word.
    fn pointer_op(&self) -> Option<PointerOp> {
        let sigil = self.peek()?;
        let op = PointerOp::from_parts(sigil, self.peek_next()?)?;
        match self.peek_nth(2) {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => None,
            _ => Some(op),
        }
    }

    fn single(&mut self, kind: TokenKind) -> Option<TokenKind> {
        self.advance();
        Some(kind)
    }

    fn double(&mut self, kind: TokenKind) -> Option<TokenKind> {
        self.advance();
        self.advance();
        Some(kind)
    }

    /// Scans one token starting at the current position. Returns `None` when
    /// the characters consumed produced no token.
    fn scan_token(&mut self, sink: &mut Diagnostics) -> Option<TokenKind> {
        let (start, line, col) = (self.pos, self.line, self.col);
        let c = self.peek()?;
        let next = self.peek_next();
        match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ',' => self.single(TokenKind::Comma),
            '$' => self.single(TokenKind::Dollar),
            ':' if next == Some(':') => self.double(TokenKind::ColonColon),
            ':' => self.single(TokenKind::Colon),
            '-' if next == Some('-') => self.double(TokenKind::DashDash),
            '-' if next == Some('>') => self.double(TokenKind::Arrow),
            '-' if next.is_some_and(|n| n.is_ascii_digit()) => Some(self.read_number()),
            '-' => self.single(TokenKind::Operator(Operator::Minus)),
            '=' if next == Some('=') => self.double(TokenKind::Operator(Operator::EqEq)),
            '=' => self.single(TokenKind::Equal),
            '!' if next == Some('=') => self.double(TokenKind::Operator(Operator::NotEq)),
            '<' if next == Some('=') => self.double(TokenKind::Operator(Operator::LessEq)),
            '>' if next == Some('=') => self.double(TokenKind::Operator(Operator::GreaterEq)),
            '<' => self.single(TokenKind::Operator(Operator::Less)),
            '>' => self.single(TokenKind::Operator(Operator::Greater)),
            '!' | '@' => match self.pointer_op() {
                Some(op) => self.double(TokenKind::PointerOp(op)),
                None if c == '!' => self.single(TokenKind::Operator(Operator::Bang)),
                None => {
                    self.advance();
                    trace!("invalid character '@' at {}:{}", line, col);
                    sink.report(
                        DiagnosticKind::InvalidCharacter,
                        self.span_from(start, line, col),
                        "unexpected character '@' (pointer operations are @p, @i and @f)",
                    );
                    None
                }
            },
            '.' => self.single(TokenKind::Operator(Operator::Dot)),
            '+' => self.single(TokenKind::Operator(Operator::Plus)),
            '*' => self.single(TokenKind::Operator(Operator::Star)),
            '/' => self.single(TokenKind::Operator(Operator::Slash)),
            '%' => self.single(TokenKind::Operator(Operator::Percent)),
            '"' => {
                if self.read_string() {
                    Some(TokenKind::String)
                } else {
                    sink.report(
                        DiagnosticKind::UnterminatedString,
                        self.span_from(start, line, col),
                        "unterminated string literal",
                    );
                    None
                }
            }
            c if c.is_ascii_digit() => Some(self.read_number()),
            c if c.is_ascii_alphabetic() || c == '_' => Some(self.read_ident_or_reserved(start)),
            other => {
                self.advance();
                trace!("invalid character {:?} at {}:{}", other, line, col);
                sink.report(
                    DiagnosticKind::InvalidCharacter,
                    self.span_from(start, line, col),
                    format!("unexpected character '{}'", other.escape_default()),
                );
                None
            }
        }
    }

    /// Tokenize the entire input into a vector of tokens ending with Eof.
    ///
    /// Only allocation failure is returned as an error; everything else is
    /// reported to `sink`.
    pub fn tokenize(mut self, sink: &mut Diagnostics) -> Result<Vec<Token>> {
        self.scan_all(sink)
    }

    /// Like [`Lexer::tokenize`], but also hands back every complete comment
    /// in source order.
    pub fn tokenize_with_comments(
        mut self,
        sink: &mut Diagnostics,
    ) -> Result<(Vec<Token>, Vec<Comment>)> {
        self.comments = Some(Vec::new());
        let tokens = self.scan_all(sink)?;
        Ok((tokens, self.comments.take().unwrap_or_default()))
    }

    fn scan_all(&mut self, sink: &mut Diagnostics) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        tokens
            .try_reserve(self.src.len() / 4 + 1)
            .map_err(|e| Error::out_of_memory(TOKEN_STREAM, e))?;
        loop {
            if let Trivia::Unterminated(span) = self.skip_trivia() {
                sink.report(
                    DiagnosticKind::UnterminatedComment,
                    span,
                    "unterminated block comment",
                );
                let eof = Token::new(TokenKind::Eof, "", Span::point(span.start, span.line, span.col));
                try_push(&mut tokens, eof, TOKEN_STREAM)?;
                break;
            }
            let (start, line, col) = (self.pos, self.line, self.col);
            if self.peek().is_none() {
                let eof = Token::new(TokenKind::Eof, "", Span::point(start, line, col));
                try_push(&mut tokens, eof, TOKEN_STREAM)?;
                break;
            }
            if let Some(kind) = self.scan_token(sink) {
                let tk = Token::new(kind, &self.src[start..self.pos], self.span_from(start, line, col));
                trace!("{}:{} {:?} {:?}", line, col, tk.kind, tk.lexeme);
                try_push(&mut tokens, tk, TOKEN_STREAM)?;
            }
        }
        debug!(
            "lexed {} tokens with {} diagnostics",
            tokens.len(),
            sink.len()
        );
        Ok(tokens)
    }
}

/// Tokenize `src` with a fresh diagnostics sink.
pub fn tokenize(src: &str) -> Result<(Vec<Token>, Diagnostics)> {
    let mut sink = Diagnostics::new();
    let tokens = Lexer::from_text(src).tokenize(&mut sink)?;
    Ok((tokens, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadrate_syntax::{builtin_names, reserved::keyword_names};

    fn kinds(input: &str) -> Vec<TokenKind> {
        let (tokens, diags) = tokenize(input).expect("Lexing should not fail");
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    fn lexemes(input: &str) -> Vec<(TokenKind, String)> {
        let (tokens, _) = tokenize(input).expect("Lexing should not fail");
        tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| (t.kind, t.lexeme))
            .collect()
    }

    fn op(o: Operator) -> TokenKind {
        TokenKind::Operator(o)
    }

    #[test]
    fn test_negative_literal_before_builtin() {
        assert_eq!(
            lexemes("-5 add"),
            vec![
                (TokenKind::Number, "-5".to_string()),
                (TokenKind::Builtin, "add".to_string()),
            ]
        );
    }

    #[test]
    fn test_minus_folds_only_when_adjacent_to_digit() {
        assert_eq!(
            kinds("5 -3 add"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Builtin, TokenKind::Eof]
        );
        assert_eq!(
            kinds("5 - 3"),
            vec![TokenKind::Number, op(Operator::Minus), TokenKind::Number, TokenKind::Eof]
        );
        assert_eq!(kinds("-"), vec![op(Operator::Minus), TokenKind::Eof]);
        assert_eq!(
            kinds("-x"),
            vec![op(Operator::Minus), TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_number_spans_whole_match() {
        for text in ["0", "42", "-7", "3.14", "-0.5", "-12.250", "007"] {
            let (tokens, diags) = tokenize(text).unwrap();
            assert!(diags.is_empty());
            assert_eq!(tokens.len(), 2, "{text}");
            assert_eq!(tokens[0].kind, TokenKind::Number);
            assert_eq!(tokens[0].lexeme, text);
            assert_eq!(tokens[0].span, Span::new(0, text.len(), 1, 1));
        }
    }

    #[test]
    fn test_dot_without_fraction_is_print() {
        assert_eq!(
            lexemes("5."),
            vec![
                (TokenKind::Number, "5".to_string()),
                (op(Operator::Dot), ".".to_string()),
            ]
        );
        assert_eq!(
            kinds("1.2.3"),
            vec![TokenKind::Number, op(Operator::Dot), TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_longest_match_punctuation() {
        assert_eq!(
            kinds(":: : -> -- - == = != <= < >= >"),
            vec![
                TokenKind::ColonColon,
                TokenKind::Colon,
                TokenKind::Arrow,
                TokenKind::DashDash,
                op(Operator::Minus),
                op(Operator::EqEq),
                TokenKind::Equal,
                op(Operator::NotEq),
                op(Operator::LessEq),
                op(Operator::Less),
                op(Operator::GreaterEq),
                op(Operator::Greater),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_signature_separator_before_negative_number() {
        assert_eq!(
            kinds("(a:float --b:float)"),
            vec![
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::DashDash,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("--5"),
            vec![TokenKind::DashDash, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_pointer_ops() {
        assert_eq!(
            kinds("@p @i @f !p !i !f"),
            vec![
                TokenKind::PointerOp(PointerOp::FetchPtr),
                TokenKind::PointerOp(PointerOp::FetchInt),
                TokenKind::PointerOp(PointerOp::FetchFloat),
                TokenKind::PointerOp(PointerOp::StorePtr),
                TokenKind::PointerOp(PointerOp::StoreInt),
                TokenKind::PointerOp(PointerOp::StoreFloat),
                TokenKind::Eof,
            ]
        );
        // `!` before a longer word is the not operator
        assert_eq!(
            kinds("!pending"),
            vec![op(Operator::Bang), TokenKind::Ident, TokenKind::Eof]
        );
        assert_eq!(kinds("!"), vec![op(Operator::Bang), TokenKind::Eof]);
    }

    #[test]
    fn test_lone_at_is_invalid() {
        let (tokens, diags) = tokenize("@x dup").unwrap();
        assert_eq!(diags.kinds().collect::<Vec<_>>(), [DiagnosticKind::InvalidCharacter]);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, [TokenKind::Ident, TokenKind::Builtin, TokenKind::Eof]);
    }

    #[test]
    fn test_every_reserved_word_is_classified() {
        for word in builtin_names() {
            assert_eq!(kinds(word), vec![TokenKind::Builtin, TokenKind::Eof], "{word}");
        }
        for word in keyword_names() {
            let k = kinds(word);
            assert!(k[0].is_keyword(), "{word} lexed as {:?}", k[0]);
        }
    }

    #[test]
    fn test_reserved_prefix_is_identifier() {
        assert_eq!(kinds("dupe"), vec![TokenKind::Ident, TokenKind::Eof]);
        assert_eq!(kinds("fn_"), vec![TokenKind::Ident, TokenKind::Eof]);
        assert_eq!(kinds("Add"), vec![TokenKind::Ident, TokenKind::Eof]);
        assert_eq!(kinds("add2"), vec![TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn test_strings_keep_raw_escapes() {
        let toks = lexemes(r#""a\"b\n" "x""#);
        assert_eq!(toks[0], (TokenKind::String, r#""a\"b\n""#.to_string()));
        assert_eq!(toks[1], (TokenKind::String, r#""x""#.to_string()));
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, diags) = tokenize("\"abc").unwrap();
        let d: Vec<_> = diags.iter().collect();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].kind, DiagnosticKind::UnterminatedString);
        assert_eq!(d[0].span.start, 0);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_trailing_backslash_is_unterminated() {
        let (_, diags) = tokenize("\"abc\\").unwrap();
        assert_eq!(diags.kinds().collect::<Vec<_>>(), [DiagnosticKind::UnterminatedString]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("dup // swap\n/* drop\n over */ rot"),
            vec![TokenKind::Builtin, TokenKind::Builtin, TokenKind::Eof]
        );
        // block comments do not nest
        assert_eq!(
            kinds("/* a /* b */ nip"),
            vec![TokenKind::Builtin, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_are_collected_on_request() {
        let src = "dup // twice  \r\n/* a\n b */ rot /* never";
        let mut sink = Diagnostics::new();
        let (tokens, comments) = Lexer::from_text(src)
            .tokenize_with_comments(&mut sink)
            .unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(sink.kinds().collect::<Vec<_>>(), [DiagnosticKind::UnterminatedComment]);
        let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["// twice", "/* a\n b */"]);
        assert_eq!(comments[0].span, Span::new(4, 12, 1, 5));
        assert_eq!(comments[1].span.line, 2);
    }

    #[test]
    fn test_unterminated_comment_truncates_stream() {
        let (tokens, diags) = tokenize("dup /* never closed\n swap").unwrap();
        let d: Vec<_> = diags.iter().collect();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].kind, DiagnosticKind::UnterminatedComment);
        assert_eq!(d[0].span.start, 4);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, [TokenKind::Builtin, TokenKind::Eof]);
        assert_eq!(tokens[1].span.start, 4);
    }

    #[test]
    fn test_invalid_characters_are_skipped_one_at_a_time() {
        let (tokens, diags) = tokenize("dup ## swap ü").unwrap();
        assert_eq!(diags.len(), 3);
        assert!(diags.kinds().all(|k| k == DiagnosticKind::InvalidCharacter));
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, [TokenKind::Builtin, TokenKind::Builtin, TokenKind::Eof]);
    }

    #[test]
    fn test_positions() {
        let (tokens, _) = tokenize("fn main {\n  1 print\n}").unwrap();
        let pos: Vec<_> = tokens.iter().map(|t| (t.span.line, t.span.col)).collect();
        assert_eq!(pos, [(1, 1), (1, 4), (1, 9), (2, 3), (2, 5), (3, 1), (3, 2)]);
        assert_eq!(tokens[4].span, Span::new(14, 19, 2, 5));
    }

    #[test]
    fn test_namespaced_call_and_locals() {
        assert_eq!(
            kinds("m::sin -> r $"),
            vec![
                TokenKind::Ident,
                TokenKind::ColonColon,
                TokenKind::Builtin,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::Dollar,
                TokenKind::Eof,
            ]
        );
    }
}
