//! Core scriptlab lexer: converts script text to a token stream.
//!
//! Features:
//! - Identifiers, keywords, numbers (decimal, exponent, hex/octal/binary)
//! - Single- and double-quoted strings with the usual escapes
//! - Template literals with `${expr}` interpolation via a mode stack
//! - `//` line comments and `/* */` block comments
//! - Line breaks recorded on the following token (`newline_before`) so the
//!   parser can terminate statements without semicolons
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use scriptlab_types::{ErrorCode, ScriptError, ScriptErrors, SourceFile, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// Lexer mode: tracks whether we're scanning code or template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Normal code scanning.
    Normal,
    /// Inside a template literal: scanning text until `` ` `` or `${`.
    Template,
    /// Inside a `${...}` interpolation expression. The `u32` tracks the
    /// brace depth so we know when the interpolation's closing `}` is reached.
    Interpolation { brace_depth: u32 },
}

/// The scriptlab lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text.
    source: &'src str,
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// File name (for errors).
    file_name: &'src str,
    /// Current byte offset into `source`. Always on a char boundary.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in chars).
    col: u32,
    /// A line break was skipped since the last emitted token.
    newline_pending: bool,
    /// Collected errors.
    errors: ScriptErrors,
    /// Mode stack for template interpolation.
    mode_stack: Vec<Mode>,
    /// Pending tokens to emit before the next scan (used for interpolation).
    pending: Vec<Token>,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: ScriptErrors,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            file_name: &source_file.name,
            pos: 0,
            line: 1,
            col: 1,
            newline_pending: false,
            errors: ScriptErrors::empty(),
            mode_stack: vec![Mode::Normal],
            pending: Vec::new(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.total_errors >= MAX_ERRORS {
                break;
            }

            // Drain any pending tokens first (e.g. InterpolationStart after TemplateStart)
            if let Some(pending) = self.pending.pop() {
                tokens.push(pending);
                continue;
            }

            let mut token = match self.current_mode() {
                Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
                Mode::Template => self.scan_template_continuation(),
            };
            token.newline_before = std::mem::take(&mut self.newline_pending);

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        // Ensure token stream always ends with Eof
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn source_line_at(&self, line: u32) -> String {
        self.source_file.line(line).unwrap_or("").to_string()
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_line_at(span.start_line);
        let err = ScriptError::new(self.file_name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace and comments, remembering whether a line break was crossed.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some('\n') => {
                    self.newline_pending = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    /// Skip a single-line comment (`// ...`), leaving the newline in place.
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip a block comment (`/* ... */`). Emits E102 if it never closes.
    fn skip_block_comment(&mut self) {
        let start_line = self.line;
        let start_col = self.col;
        // Consume `/*`
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "Unterminated comment",
                        span,
                    );
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some('\n') => {
                    self.newline_pending = true;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Normal-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in normal (non-template) mode.
    fn scan_normal(&mut self) -> Token {
        loop {
            self.skip_trivia();

            // If we've hit the error cap, stop immediately
            if self.errors.total_errors >= MAX_ERRORS || self.at_end() {
                if self.mode_stack.len() > 1 && self.errors.total_errors < MAX_ERRORS {
                    self.emit_error(
                        ErrorCode::UNEXPECTED_END,
                        "Unterminated template literal",
                        self.current_span(),
                    );
                }
                return Token::new(TokenKind::Eof, self.current_span());
            }

            if let Some(token) = self.scan_token() {
                return token;
            }
            // Unexpected character: error already recorded, keep scanning.
        }
    }

    fn scan_token(&mut self) -> Option<Token> {
        let start_line = self.line;
        let start_col = self.col;
        let start_pos = self.pos;
        let ch = self.advance()?;

        let kind = match ch {
            // ── String literals ──
            '"' | '\'' => return Some(self.scan_string(ch, start_line, start_col)),
            '`' => return Some(self.scan_template(start_line, start_col)),

            // ── Number literals ──
            '0'..='9' => return Some(self.scan_number(start_pos, start_line, start_col)),
            '.' if matches!(self.peek(), Some('0'..='9')) => {
                return Some(self.scan_number(start_pos, start_line, start_col))
            }

            // ── Identifiers & keywords ──
            c if is_ident_start(c) => {
                return Some(self.scan_identifier(start_pos, start_line, start_col))
            }

            // ── Operators ──
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    if self.eat('=') {
                        TokenKind::StarStarEq
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            // Comments were consumed by skip_trivia, so bare / is division
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else if self.eat('>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::BangEqEq
                    } else {
                        TokenKind::BangEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            '&' if self.peek() == Some('&') => {
                self.advance();
                if self.eat('=') {
                    TokenKind::AmpAmpEq
                } else {
                    TokenKind::AmpAmp
                }
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                if self.eat('=') {
                    TokenKind::PipePipeEq
                } else {
                    TokenKind::PipePipe
                }
            }
            '?' => {
                if self.eat('?') {
                    if self.eat('=') {
                        TokenKind::QuestionQuestionEq
                    } else {
                        TokenKind::QuestionQuestion
                    }
                } else if self.peek() == Some('.') && !matches!(self.peek_at(1), Some('0'..='9'))
                {
                    // `a?.5:1` is a conditional, not optional chaining
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }

            // ── Punctuation ──
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,

            '{' => {
                // If we're in interpolation mode, track brace depth
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                TokenKind::LBrace
            }

            '}' => {
                match self.mode_stack.last_mut() {
                    Some(Mode::Interpolation { brace_depth: 0 }) => {
                        // This `}` ends the interpolation: back to template text
                        self.pop_mode();
                        self.push_mode(Mode::Template);
                        TokenKind::InterpolationEnd
                    }
                    Some(Mode::Interpolation { brace_depth }) => {
                        *brace_depth -= 1;
                        TokenKind::RBrace
                    }
                    _ => TokenKind::RBrace,
                }
            }

            _ => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("Invalid or unexpected token '{ch}'"),
                    span,
                );
                return None;
            }
        };

        Some(Token::new(kind, self.span_from(start_line, start_col)))
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start_pos: usize, start_line: u32, start_col: u32) -> Token {
        let first = self.source[start_pos..].chars().next().unwrap_or('0');

        // Radix prefixes: 0x, 0o, 0b
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let digits_start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_digit(radix)) {
                    self.advance();
                }
                let span = self.span_from(start_line, start_col);
                let digits = &self.source[digits_start..self.pos];
                if digits.is_empty() {
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        "Invalid or unexpected token",
                        span,
                    );
                    return Token::new(TokenKind::NumberLit(0.0), span);
                }
                let value = digits
                    .chars()
                    .filter_map(|c| c.to_digit(radix))
                    .fold(0.0_f64, |acc, d| acc * radix as f64 + d as f64);
                return Token::new(TokenKind::NumberLit(value), span);
            }
        }

        // Integer part (first char already consumed; may have been `.`)
        if first != '.' {
            while let Some('0'..='9') = self.peek() {
                self.advance();
            }
            // Fraction
            if self.peek() == Some('.') && matches!(self.peek_at(1), Some('0'..='9')) {
                self.advance();
            } else if self.peek() == Some('.') && !matches!(self.peek_at(1), Some('.')) {
                // `1.` is a valid number; `1..toString()` is not supported
                self.advance();
            }
        }
        while let Some('0'..='9') = self.peek() {
            self.advance();
        }

        // Exponent
        if matches!(self.peek(), Some('e' | 'E')) {
            let has_digits = match self.peek_at(1) {
                Some('0'..='9') => true,
                Some('+' | '-') => matches!(self.peek_at(2), Some('0'..='9')),
                _ => false,
            };
            if has_digits {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                while let Some('0'..='9') = self.peek() {
                    self.advance();
                }
            }
        }

        let span = self.span_from(start_line, start_col);
        let text = &self.source[start_pos..self.pos];
        let value: f64 = text.parse().unwrap_or(f64::NAN);

        if matches!(self.peek(), Some(c) if is_ident_start(c)) {
            self.emit_error(
                ErrorCode::UNEXPECTED_CHARACTER,
                "Invalid or unexpected token",
                span,
            );
        }

        Token::new(TokenKind::NumberLit(value), span)
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start_pos: usize, start_line: u32, start_col: u32) -> Token {
        // First character was already consumed
        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }

        let span = self.span_from(start_line, start_col);
        let text = &self.source[start_pos..self.pos];

        let kind = TokenKind::from_keyword(text)
            .unwrap_or_else(|| TokenKind::Identifier(text.to_string()));

        Token::new(kind, span)
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a quoted string starting after the opening quote.
    fn scan_string(&mut self, quote: char, start_line: u32, start_col: u32) -> Token {
        let mut buf = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated string literal",
                        span,
                    );
                    return Token::new(TokenKind::StringLiteral(buf), span);
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return Token::new(
                        TokenKind::StringLiteral(buf),
                        self.span_from(start_line, start_col),
                    );
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Template literals & interpolation
    // ─────────────────────────────────────────────────────────────

    /// Scan a template literal starting after the opening backtick.
    /// Handles two cases:
    /// 1. Plain template (no interpolation) → `TemplateString`
    /// 2. Template with interpolation → `TemplateStart`, then mode switch
    fn scan_template(&mut self, start_line: u32, start_col: u32) -> Token {
        match self.scan_template_text(start_line, start_col) {
            TemplateStop::Closed(text) => Token::new(
                TokenKind::TemplateString(text),
                self.span_from(start_line, start_col),
            ),
            TemplateStop::Interpolation(text, interp_span) => {
                self.push_mode(Mode::Template);
                self.enter_interpolation(interp_span);
                Token::new(
                    TokenKind::TemplateStart(text),
                    self.span_from(start_line, start_col),
                )
            }
        }
    }

    /// Continue scanning template text after an interpolation ends.
    /// Called when we're in `Mode::Template`.
    fn scan_template_continuation(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        match self.scan_template_text(start_line, start_col) {
            TemplateStop::Closed(text) => {
                self.pop_mode();
                Token::new(
                    TokenKind::TemplateEnd(text),
                    self.span_from(start_line, start_col),
                )
            }
            TemplateStop::Interpolation(text, interp_span) => {
                self.enter_interpolation(interp_span);
                Token::new(
                    TokenKind::TemplatePart(text),
                    self.span_from(start_line, start_col),
                )
            }
        }
    }

    /// Replace the current template mode with an interpolation and queue the
    /// `InterpolationStart` token so it appears after the text token.
    fn enter_interpolation(&mut self, span: Span) {
        self.pop_mode();
        self.push_mode(Mode::Interpolation { brace_depth: 0 });
        self.pending
            .push(Token::new(TokenKind::InterpolationStart, span));
    }

    fn scan_template_text(&mut self, start_line: u32, start_col: u32) -> TemplateStop {
        let mut buf = String::new();

        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_END,
                        "Unterminated template literal",
                        span,
                    );
                    return TemplateStop::Closed(buf);
                }
                Some('`') => {
                    self.advance();
                    return TemplateStop::Closed(buf);
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    let line = self.line;
                    let col = self.col;
                    self.advance(); // consume '$'
                    self.advance(); // consume '{'
                    return TemplateStop::Interpolation(buf, self.span_from(line, col));
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    /// Scan an escape sequence starting at the `\`.
    /// Returns the unescaped character, or `None` for a line continuation or
    /// an invalid sequence (error emitted).
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // consume the '\'

        match self.advance() {
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('r') => Some('\r'),
            Some('b') => Some('\u{8}'),
            Some('f') => Some('\u{c}'),
            Some('v') => Some('\u{b}'),
            Some('0') if !matches!(self.peek(), Some('0'..='9')) => Some('\0'),
            Some('x') => self.scan_hex_escape(2, start_line, start_col),
            Some('u') => {
                if self.eat('{') {
                    let digits_start = self.pos;
                    while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                        self.advance();
                    }
                    let digits = self.source[digits_start..self.pos].to_string();
                    let closed = self.eat('}');
                    let decoded = u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32);
                    match decoded {
                        Some(c) if closed => Some(c),
                        _ => self.invalid_escape(start_line, start_col),
                    }
                } else {
                    self.scan_hex_escape(4, start_line, start_col)
                }
            }
            // Line continuation
            Some('\n') => None,
            // `\"`, `\\`, `\'`, `` \` ``, `\$` and any other char stand for themselves
            Some(ch) => Some(ch),
            None => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNTERMINATED_STRING,
                    "Unexpected end of input in escape sequence",
                    span,
                );
                None
            }
        }
    }

    fn scan_hex_escape(&mut self, len: usize, start_line: u32, start_col: u32) -> Option<char> {
        let digits_start = self.pos;
        for _ in 0..len {
            if matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance();
            } else {
                return self.invalid_escape(start_line, start_col);
            }
        }
        let digits = &self.source[digits_start..self.pos];
        match u32::from_str_radix(digits, 16).ok().and_then(char::from_u32) {
            Some(c) => Some(c),
            // Lone surrogates cannot be represented in a Rust string
            None => Some(char::REPLACEMENT_CHARACTER),
        }
    }

    fn invalid_escape(&mut self, start_line: u32, start_col: u32) -> Option<char> {
        let span = self.span_from(start_line, start_col);
        self.emit_error(
            ErrorCode::INVALID_ESCAPE,
            "Invalid Unicode escape sequence",
            span,
        );
        None
    }
}

/// Where a run of template text stopped.
enum TemplateStop {
    /// Closing backtick reached (or end of input).
    Closed(String),
    /// `${` reached; carries the text so far and the span of the `${`.
    Interpolation(String, Span),
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphanumeric()
}
