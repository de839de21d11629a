//! Lexer tests.
//!
//! Covers: keywords, operators, literals (number, string, template),
//! comments, line-break tracking, UTF-8 handling, error recovery and
//! determinism.

use scriptlab_lexer::{Lexer, Token, TokenKind, ALL_KEYWORDS};
use scriptlab_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    tokens(source)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Lex and return every token including Eof.
fn tokens(source: &str) -> Vec<Token> {
    let sf = SourceFile::new("test.js", source);
    Lexer::new(&sf).lex().tokens
}

/// Lex and return the error count.
fn error_count(source: &str) -> usize {
    let sf = SourceFile::new("test.js", source);
    Lexer::new(&sf).lex().errors.total_errors
}

/// Lex and return the first error code.
fn first_error_code(source: &str) -> Option<ErrorCode> {
    let sf = SourceFile::new("test.js", source);
    Lexer::new(&sf).lex().errors.first().map(|e| e.code)
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Keywords & identifiers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_all_keywords_lex_as_keywords() {
    for &kw in ALL_KEYWORDS {
        let result = kinds(kw);
        assert_eq!(result.len(), 1, "keyword '{kw}' should be a single token");
        assert!(result[0].is_keyword(), "'{kw}' should lex as a keyword");
    }
}

#[test]
fn test_of_is_contextual_identifier() {
    assert_eq!(kinds("of"), vec![ident("of")]);
}

#[test]
fn test_identifier_characters() {
    assert_eq!(
        kinds("$el _tmp camelCase x1"),
        vec![ident("$el"), ident("_tmp"), ident("camelCase"), ident("x1")]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(kinds("letter"), vec![ident("letter")]);
    assert_eq!(kinds("iffy"), vec![ident("iffy")]);
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_equality_operators_longest_match() {
    assert_eq!(
        kinds("= == === != !== !"),
        vec![
            TokenKind::Eq,
            TokenKind::EqEq,
            TokenKind::EqEqEq,
            TokenKind::BangEq,
            TokenKind::BangEqEq,
            TokenKind::Bang
        ]
    );
}

#[test]
fn test_arithmetic_and_update_operators() {
    assert_eq!(
        kinds("+ ++ += - -- -= * ** *= **= / /= % %="),
        vec![
            TokenKind::Plus,
            TokenKind::PlusPlus,
            TokenKind::PlusEq,
            TokenKind::Minus,
            TokenKind::MinusMinus,
            TokenKind::MinusEq,
            TokenKind::Star,
            TokenKind::StarStar,
            TokenKind::StarEq,
            TokenKind::StarStarEq,
            TokenKind::Slash,
            TokenKind::SlashEq,
            TokenKind::Percent,
            TokenKind::PercentEq,
        ]
    );
}

#[test]
fn test_logical_operators() {
    assert_eq!(
        kinds("&& || ?? &&= ||= ??= ? ?."),
        vec![
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
            TokenKind::QuestionQuestion,
            TokenKind::AmpAmpEq,
            TokenKind::PipePipeEq,
            TokenKind::QuestionQuestionEq,
            TokenKind::Question,
            TokenKind::QuestionDot,
        ]
    );
}

#[test]
fn test_arrow_and_spread() {
    assert_eq!(
        kinds("(...xs) => xs"),
        vec![
            TokenKind::LParen,
            TokenKind::DotDotDot,
            ident("xs"),
            TokenKind::RParen,
            TokenKind::FatArrow,
            ident("xs"),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Numbers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_number_forms() {
    assert_eq!(
        kinds("42 3.14 1e3 2.5E-2 0xff 0b101 0o17"),
        vec![
            TokenKind::NumberLit(42.0),
            TokenKind::NumberLit(3.14),
            TokenKind::NumberLit(1000.0),
            TokenKind::NumberLit(0.025),
            TokenKind::NumberLit(255.0),
            TokenKind::NumberLit(5.0),
            TokenKind::NumberLit(15.0),
        ]
    );
}

#[test]
fn test_number_followed_by_identifier_is_error() {
    assert_eq!(
        first_error_code("3abc"),
        Some(ErrorCode::UNEXPECTED_CHARACTER)
    );
}

// ─────────────────────────────────────────────────────────────────────
// Strings
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_both_quote_styles() {
    assert_eq!(
        kinds(r#""double" 'single'"#),
        vec![
            TokenKind::StringLiteral("double".into()),
            TokenKind::StringLiteral("single".into()),
        ]
    );
}

#[test]
fn test_escape_sequences() {
    assert_eq!(
        kinds(r#""a\nb\t\"c\"\\ \x41B\u{1F600} \q""#),
        vec![TokenKind::StringLiteral(
            "a\nb\t\"c\"\\ AB\u{1F600} q".into()
        )]
    );
}

#[test]
fn test_quote_of_other_kind_needs_no_escape() {
    assert_eq!(
        kinds(r#"'say "hi"'"#),
        vec![TokenKind::StringLiteral("say \"hi\"".into())]
    );
}

#[test]
fn test_unterminated_string_at_newline() {
    assert_eq!(
        first_error_code("\"abc\nlog(1)"),
        Some(ErrorCode::UNTERMINATED_STRING)
    );
}

#[test]
fn test_invalid_unicode_escape() {
    assert_eq!(first_error_code(r#""\uZZ""#), Some(ErrorCode::INVALID_ESCAPE));
}

#[test]
fn test_utf8_string_content_preserved() {
    assert_eq!(
        kinds("\"héllo 🎉 wörld\""),
        vec![TokenKind::StringLiteral("héllo 🎉 wörld".into())]
    );
}

#[test]
fn test_utf8_columns_count_chars() {
    let toks = tokens("\"🎉\" x");
    // `"🎉"` occupies columns 1..=3, the space is 4, `x` is 5
    assert_eq!(toks[1].kind, ident("x"));
    assert_eq!(toks[1].span.start_col, 5);
}

// ─────────────────────────────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_plain_template() {
    assert_eq!(
        kinds("`hello`"),
        vec![TokenKind::TemplateString("hello".into())]
    );
}

#[test]
fn test_template_with_interpolation() {
    assert_eq!(
        kinds("`a ${x} b ${y + 1} c`"),
        vec![
            TokenKind::TemplateStart("a ".into()),
            TokenKind::InterpolationStart,
            ident("x"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplatePart(" b ".into()),
            TokenKind::InterpolationStart,
            ident("y"),
            TokenKind::Plus,
            TokenKind::NumberLit(1.0),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd(" c".into()),
        ]
    );
}

#[test]
fn test_template_with_object_literal_inside_interpolation() {
    assert_eq!(
        kinds("`${ {a: 1}.a }`"),
        vec![
            TokenKind::TemplateStart(String::new()),
            TokenKind::InterpolationStart,
            TokenKind::LBrace,
            ident("a"),
            TokenKind::Colon,
            TokenKind::NumberLit(1.0),
            TokenKind::RBrace,
            TokenKind::Dot,
            ident("a"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd(String::new()),
        ]
    );
}

#[test]
fn test_nested_template() {
    assert_eq!(
        kinds("`x${`y${z}`}`"),
        vec![
            TokenKind::TemplateStart("x".into()),
            TokenKind::InterpolationStart,
            TokenKind::TemplateStart("y".into()),
            TokenKind::InterpolationStart,
            ident("z"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd(String::new()),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd(String::new()),
        ]
    );
}

#[test]
fn test_template_spans_lines() {
    assert_eq!(
        kinds("`line1\nline2`"),
        vec![TokenKind::TemplateString("line1\nline2".into())]
    );
}

#[test]
fn test_unterminated_template() {
    assert_eq!(first_error_code("`abc"), Some(ErrorCode::UNEXPECTED_END));
    assert!(error_count("`abc ${x") > 0);
}

// ─────────────────────────────────────────────────────────────────────
// Comments & line breaks
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("a // trailing\n/* block\ncomment */ b"),
        vec![ident("a"), ident("b")]
    );
}

#[test]
fn test_unterminated_block_comment() {
    assert_eq!(
        first_error_code("a /* never closed"),
        Some(ErrorCode::UNTERMINATED_COMMENT)
    );
}

#[test]
fn test_newline_before_flag() {
    let toks = tokens("a\nb c\n\n// x\nd");
    let flags: Vec<(TokenKind, bool)> = toks
        .into_iter()
        .map(|t| (t.kind, t.newline_before))
        .collect();
    assert_eq!(
        flags,
        vec![
            (ident("a"), false),
            (ident("b"), true),
            (ident("c"), false),
            (ident("d"), true),
            (TokenKind::Eof, false),
        ]
    );
}

#[test]
fn test_newline_inside_block_comment_counts() {
    let toks = tokens("a /*\n*/ b");
    assert!(toks[1].newline_before);
}

#[test]
fn test_spans_track_lines_and_columns() {
    let toks = tokens("let x = 1\n  log(x)");
    let log = &toks[4];
    assert_eq!(log.kind, ident("log"));
    assert_eq!(log.span.start_line, 2);
    assert_eq!(log.span.start_col, 3);
    assert_eq!(log.span.end_col, 5);
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unexpected_character_recovers() {
    assert_eq!(kinds("a # b"), vec![ident("a"), ident("b")]);
    assert_eq!(error_count("a # b"), 1);
}

#[test]
fn test_error_cap_stops_lexing() {
    let source = "#".repeat(50);
    let sf = SourceFile::new("test.js", source);
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.errors.errors.len(), scriptlab_types::MAX_ERRORS);
    assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}

#[test]
fn test_lexing_is_deterministic() {
    let source = "const greet = (name) => `Hello, ${name}!`\nconsole.log(greet(\"🌍\"))";
    let first = tokens(source);
    for _ in 0..100 {
        assert_eq!(tokens(source), first);
    }
}
