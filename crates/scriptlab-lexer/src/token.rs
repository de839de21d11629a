//! Token types for the scriptlab lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the tutorial script
//! language and [`Token`], which pairs a kind with a source [`Span`].

use scriptlab_types::Span;
use std::fmt;

/// All reserved words of the script language.
///
/// `of` is deliberately absent: it is contextual and only meaningful inside
/// a `for (… of …)` header, so the lexer emits it as an identifier.
pub const ALL_KEYWORDS: &[&str] = &[
    // Declarations (4)
    "let", "const", "var", "function",
    // Control flow (12)
    "if", "else", "for", "while", "do", "break", "continue", "return", "throw", "try",
    "catch", "finally",
    // Operators (3)
    "typeof", "new", "in",
    // Literals (4)
    "true", "false", "null", "undefined",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
    /// Whether a line break separates this token from the previous one.
    /// Drives automatic statement termination in the parser.
    pub newline_before: bool,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            newline_before: false,
        }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the script language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Numeric literal: `42`, `3.14`, `1e3`, `0xff`
    NumberLit(f64),
    /// Single- or double-quoted string: `"hello"`, `'hi'`
    StringLiteral(String),
    /// Template literal with no interpolation: `` `plain` ``
    TemplateString(String),

    // ── Template Interpolation ───────────────────────────────

    /// Start of an interpolated template: text before the first `${`.
    TemplateStart(String),
    /// Text between a `}` and the next `${` inside a template.
    TemplatePart(String),
    /// End of an interpolated template: text after the last `}`.
    TemplateEnd(String),
    /// The `${` that opens an interpolation expression.
    InterpolationStart,
    /// The `}` that closes an interpolation expression.
    InterpolationEnd,

    // ── Identifiers ──────────────────────────────────────────

    /// User-defined identifier: `total`, `$el`, `_tmp`
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    Let,
    Const,
    Var,
    Function,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Return,
    Throw,
    Try,
    Catch,
    Finally,
    Typeof,
    New,
    In,
    True,
    False,
    Null,
    Undefined,

    // ── Operators ────────────────────────────────────────────

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!`
    Bang,
    /// `!=`
    BangEq,
    /// `!==`
    BangEqEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `??`
    QuestionQuestion,
    /// `?`
    Question,
    /// `?.`
    QuestionDot,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `**=`
    StarStarEq,
    /// `&&=`
    AmpAmpEq,
    /// `||=`
    PipePipeEq,
    /// `??=`
    QuestionQuestionEq,
    /// `=>`
    FatArrow,
    /// `...`
    DotDotDot,
    /// `.`
    Dot,

    // ── Punctuation ──────────────────────────────────────────

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,

    // ── Special ──────────────────────────────────────────────

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Look up a reserved word.
    pub fn from_keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "typeof" => TokenKind::Typeof,
            "new" => TokenKind::New,
            "in" => TokenKind::In,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "undefined" => TokenKind::Undefined,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns `true` for reserved words.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::Function
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::Typeof
                | TokenKind::New
                | TokenKind::In
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Undefined
        )
    }

    /// Returns `true` for tokens that open a template literal.
    pub fn is_template(&self) -> bool {
        matches!(
            self,
            TokenKind::TemplateString(_) | TokenKind::TemplateStart(_)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Literals
            TokenKind::NumberLit(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            TokenKind::StringLiteral(s) => write!(f, "\"{s}\""),
            TokenKind::TemplateString(s) => write!(f, "`{s}`"),
            TokenKind::TemplateStart(s) => write!(f, "`{s}${{"),
            TokenKind::TemplatePart(s) => write!(f, "}}{s}${{"),
            TokenKind::TemplateEnd(s) => write!(f, "}}{s}`"),
            TokenKind::InterpolationStart => f.write_str("${"),
            TokenKind::InterpolationEnd => f.write_str("}"),
            TokenKind::Identifier(name) => f.write_str(name),
            // Keywords
            TokenKind::Let => f.write_str("let"),
            TokenKind::Const => f.write_str("const"),
            TokenKind::Var => f.write_str("var"),
            TokenKind::Function => f.write_str("function"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::For => f.write_str("for"),
            TokenKind::While => f.write_str("while"),
            TokenKind::Do => f.write_str("do"),
            TokenKind::Break => f.write_str("break"),
            TokenKind::Continue => f.write_str("continue"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::Throw => f.write_str("throw"),
            TokenKind::Try => f.write_str("try"),
            TokenKind::Catch => f.write_str("catch"),
            TokenKind::Finally => f.write_str("finally"),
            TokenKind::Typeof => f.write_str("typeof"),
            TokenKind::New => f.write_str("new"),
            TokenKind::In => f.write_str("in"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Null => f.write_str("null"),
            TokenKind::Undefined => f.write_str("undefined"),
            // Operators
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::StarStar => f.write_str("**"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::PlusPlus => f.write_str("++"),
            TokenKind::MinusMinus => f.write_str("--"),
            TokenKind::Eq => f.write_str("="),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::EqEqEq => f.write_str("==="),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::BangEqEq => f.write_str("!=="),
            TokenKind::Less => f.write_str("<"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::AmpAmp => f.write_str("&&"),
            TokenKind::PipePipe => f.write_str("||"),
            TokenKind::QuestionQuestion => f.write_str("??"),
            TokenKind::Question => f.write_str("?"),
            TokenKind::QuestionDot => f.write_str("?."),
            TokenKind::PlusEq => f.write_str("+="),
            TokenKind::MinusEq => f.write_str("-="),
            TokenKind::StarEq => f.write_str("*="),
            TokenKind::SlashEq => f.write_str("/="),
            TokenKind::PercentEq => f.write_str("%="),
            TokenKind::StarStarEq => f.write_str("**="),
            TokenKind::AmpAmpEq => f.write_str("&&="),
            TokenKind::PipePipeEq => f.write_str("||="),
            TokenKind::QuestionQuestionEq => f.write_str("??="),
            TokenKind::FatArrow => f.write_str("=>"),
            TokenKind::DotDotDot => f.write_str("..."),
            TokenKind::Dot => f.write_str("."),
            // Punctuation
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Semicolon => f.write_str(";"),
            // Special
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keyword_recognises_all() {
        for &kw in ALL_KEYWORDS {
            assert!(
                TokenKind::from_keyword(kw).is_some(),
                "from_keyword should recognise '{kw}'"
            );
        }
    }

    #[test]
    fn test_from_keyword_returns_none_for_identifiers() {
        for name in ["foo", "of", "console", "log", "Let", "NULL", "async"] {
            assert!(
                TokenKind::from_keyword(name).is_none(),
                "from_keyword should not recognise '{name}'"
            );
        }
    }

    #[test]
    fn test_is_keyword_false_for_non_keywords() {
        let kinds = [
            TokenKind::NumberLit(42.0),
            TokenKind::StringLiteral("hi".into()),
            TokenKind::Identifier("foo".into()),
            TokenKind::Plus,
            TokenKind::FatArrow,
            TokenKind::Eof,
            TokenKind::InterpolationStart,
        ];
        for kind in &kinds {
            assert!(!kind.is_keyword(), "is_keyword should be false for {kind:?}");
        }
    }

    #[test]
    fn test_token_construction() {
        let span = Span::new(1, 1, 1, 3);
        let token = Token::new(TokenKind::Let, span);
        assert_eq!(token.kind, TokenKind::Let);
        assert_eq!(token.span, span);
        assert!(!token.newline_before);
        assert!(token.is_keyword());
    }

    #[test]
    fn test_display_roundtrip_keywords() {
        for &kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw).unwrap();
            assert_eq!(kind.to_string(), kw);
        }
    }

    #[test]
    fn test_display_operators_and_literals() {
        assert_eq!(TokenKind::EqEqEq.to_string(), "===");
        assert_eq!(TokenKind::QuestionDot.to_string(), "?.");
        assert_eq!(TokenKind::FatArrow.to_string(), "=>");
        assert_eq!(TokenKind::NumberLit(42.0).to_string(), "42");
        assert_eq!(TokenKind::NumberLit(2.5).to_string(), "2.5");
        assert_eq!(TokenKind::StringLiteral("hi".into()).to_string(), "\"hi\"");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
    }
}
