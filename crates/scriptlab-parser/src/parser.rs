//! Core parser infrastructure: token cursor, error reporting, helpers.

use scriptlab_lexer::token::{Token, TokenKind};
use scriptlab_types::ast::{Ident, Program};
use scriptlab_types::{ErrorCode, ScriptError, ScriptErrors, SourceFile, Span, MAX_ERRORS};

/// Maximum combined statement/expression nesting depth.
pub const MAX_NESTING_DEPTH: u32 = 64;

/// The scriptlab parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and attempts recovery when possible.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// File name for error messages.
    file_name: String,
    /// Collected errors.
    errors: ScriptErrors,
    /// Current statement/expression nesting depth.
    pub(crate) depth: u32,
    /// Enclosing loops in the current function body.
    pub(crate) loop_depth: u32,
    /// Enclosing function bodies.
    pub(crate) function_depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    /// The AST, present only when no errors were reported.
    pub program: Option<Program>,
    pub errors: ScriptErrors,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        let mut tokens = tokens;
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or(Span::point(1, 1));
            tokens.push(Token::new(TokenKind::Eof, end));
        }
        Self {
            tokens,
            pos: 0,
            file_name: source_file.name.clone(),
            source_file,
            errors: ScriptErrors::empty(),
            depth: 0,
            loop_depth: 0,
            function_depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Current cursor position, used to detect lack of progress.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Returns `true` if the current token is the contextual word `of`.
    pub(crate) fn check_of(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Identifier(name) if name == "of")
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Whether a line break precedes the current token.
    pub(crate) fn newline_before(&self) -> bool {
        self.peek().newline_before
    }

    /// Returns `true` if the `(` at the cursor closes into a `=>`, i.e. the
    /// parenthesised text is an arrow-function parameter list.
    pub(crate) fn paren_starts_arrow(&self) -> bool {
        let mut depth = 0usize;
        let mut idx = self.pos;
        while let Some(token) = self.tokens.get(idx) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.tokens.get(idx + 1).is_some_and(|next| {
                            next.kind == TokenKind::FatArrow && !next.newline_before
                        });
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    // ── Statement Termination ─────────────────────────────────────────────────

    /// Finish a statement: an explicit `;`, or an implied one before `}`,
    /// end of input, or a token on a new line.
    pub(crate) fn consume_semicolon(&mut self) -> bool {
        if self.eat(&TokenKind::Semicolon) {
            return true;
        }
        if self.at_end() || self.check_exact(&TokenKind::RBrace) || self.newline_before() {
            return true;
        }
        self.error_unexpected();
        false
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_unexpected();
            None
        }
    }

    /// Expect an identifier token. Returns the name and span.
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    /// Expect an identifier or any keyword used as a property name.
    ///
    /// Keywords are valid after `.` (`promise.catch`) and as object keys
    /// (`{ new: 1 }`).
    pub(crate) fn expect_property_name(&mut self) -> Option<Ident> {
        let kind = self.peek_kind().clone();
        match &kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ if kind.is_keyword() => {
                let span = self.advance().span;
                Some(Ident::new(kind.to_string(), span))
            }
            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report the current token as unexpected, in the wording hosts expect.
    pub(crate) fn error_unexpected(&mut self) {
        let (code, message) = match self.peek_kind() {
            TokenKind::Eof => (ErrorCode::UNEXPECTED_END, "Unexpected end of input".to_string()),
            TokenKind::Identifier(name) => (
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Unexpected identifier '{name}'"),
            ),
            TokenKind::NumberLit(_) => (ErrorCode::UNEXPECTED_TOKEN, "Unexpected number".to_string()),
            TokenKind::StringLiteral(_) => {
                (ErrorCode::UNEXPECTED_TOKEN, "Unexpected string".to_string())
            }
            TokenKind::TemplateString(_) | TokenKind::TemplateStart(_) => (
                ErrorCode::UNEXPECTED_TOKEN,
                "Unexpected template string".to_string(),
            ),
            kind => (
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Unexpected token '{kind}'"),
            ),
        };
        self.error_at_current(code, message);
    }

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self
            .source_file
            .line(span.start_line)
            .unwrap_or("")
            .to_string();
        let error = ScriptError::new(&self.file_name, code, message, span, source_line);
        self.errors.push_error(error);
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    /// Enter one nesting level. Returns `false` (after reporting) when the
    /// limit is exceeded; the caller must still call [`Parser::leave`].
    pub(crate) fn enter(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            if self.depth == MAX_NESTING_DEPTH + 1 {
                self.error_at_current(
                    ErrorCode::STRUCTURAL_LIMIT_EXCEEDED,
                    format!("Maximum nesting depth of {MAX_NESTING_DEPTH} exceeded"),
                );
            }
            return false;
        }
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until we reach a synchronization point.
    /// Used after an error to resume at a known-good position.
    pub(crate) fn synchronize(&mut self, start: usize) {
        // Always make progress past the token that caused the error.
        if self.pos == start && !self.at_end() {
            self.advance();
        }
        while !self.at_end() {
            if self.eat(&TokenKind::Semicolon) {
                return;
            }
            // A new line usually starts a new statement
            if self.newline_before() {
                return;
            }
            match self.peek_kind() {
                TokenKind::Let
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::Function
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a `Program` AST.
    pub fn parse(mut self) -> ParseResult {
        let program = self.parse_program();
        let program = if self.errors.has_errors() {
            None
        } else {
            Some(program)
        };
        ParseResult {
            program,
            errors: self.errors,
        }
    }

    fn parse_program(&mut self) -> Program {
        let start = self.current_span();
        let mut body = Vec::new();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            let before = self.position();
            match self.parse_statement() {
                Some(stmt) => body.push(stmt),
                None => self.synchronize(before),
            }
        }
        let span = start.merge(self.current_span());
        Program { body, span }
    }
}
