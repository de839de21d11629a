//! Syntax highlighting for the tutorial editor.
//!
//! One left-to-right pass classifies the script into spans; each span is
//! rendered exactly once. Comments and strings are claimed before words,
//! so keywords inside them are never wrapped.

use std::fmt::Write as _;

const KEYWORDS: &[&str] = &[
    "let", "const", "var", "function", "return", "if", "else", "for", "while",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Keyword,
    /// Double-quoted string, quotes included.
    String,
    /// A standalone run of ASCII digits.
    Number,
    /// `//` through the end of the line.
    Comment,
    Plain,
}

impl TokenClass {
    /// CSS class used by the HTML renderer.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            TokenClass::Keyword => Some("code-keyword"),
            TokenClass::String => Some("code-string"),
            TokenClass::Number => Some("code-number"),
            TokenClass::Comment => Some("code-comment"),
            TokenClass::Plain => None,
        }
    }

    fn ansi_style(self) -> Option<&'static str> {
        match self {
            TokenClass::Keyword => Some("\x1b[1;35m"),
            TokenClass::String => Some("\x1b[32m"),
            TokenClass::Number => Some("\x1b[33m"),
            TokenClass::Comment => Some("\x1b[2;37m"),
            TokenClass::Plain => None,
        }
    }
}

/// A classified slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub class: TokenClass,
    pub text: &'a str,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Split `source` into classified segments covering the whole input.
/// Adjacent plain text is merged into one segment.
pub fn tokenize(source: &str) -> Vec<Segment<'_>> {
    let bytes = source.as_bytes();
    let mut spans: Vec<(TokenClass, usize, usize)> = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let rest = &source[pos..];
        let (class, len) = if rest.starts_with("//") {
            (TokenClass::Comment, rest.find('\n').unwrap_or(rest.len()))
        } else if bytes[pos] == b'"' {
            match rest[1..].find('"') {
                Some(close) => (TokenClass::String, close + 2),
                None => (TokenClass::Plain, 1),
            }
        } else if is_word_byte(bytes[pos]) {
            let len = rest
                .bytes()
                .position(|b| !is_word_byte(b))
                .unwrap_or(rest.len());
            let word = &rest[..len];
            let class = if KEYWORDS.contains(&word) {
                TokenClass::Keyword
            } else if word.bytes().all(|b| b.is_ascii_digit()) {
                TokenClass::Number
            } else {
                TokenClass::Plain
            };
            (class, len)
        } else {
            let len = rest.chars().next().map_or(1, char::len_utf8);
            (TokenClass::Plain, len)
        };
        match spans.last_mut() {
            Some((TokenClass::Plain, _, end)) if class == TokenClass::Plain => *end += len,
            _ => spans.push((class, pos, pos + len)),
        }
        pos += len;
    }
    spans
        .into_iter()
        .map(|(class, start, end)| Segment {
            class,
            text: &source[start..end],
        })
        .collect()
}

/// Escape text for an HTML text node.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `source` as HTML with `<span class="code-…">` wrappers.
pub fn highlight(source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    for segment in tokenize(source) {
        let text = escape_html(segment.text);
        match segment.class.css_class() {
            Some(class) => {
                let _ = write!(out, r#"<span class="{class}">{text}</span>"#);
            }
            None => out.push_str(&text),
        }
    }
    out
}

/// Render `source` with ANSI colours for a terminal.
pub fn highlight_ansi(source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    for segment in tokenize(source) {
        match segment.class.ansi_style() {
            Some(style) => {
                out.push_str(style);
                out.push_str(segment.text);
                out.push_str("\x1b[0m");
            }
            None => out.push_str(segment.text),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(source: &str) -> Vec<(TokenClass, &str)> {
        tokenize(source)
            .into_iter()
            .map(|s| (s.class, s.text))
            .collect()
    }

    #[test]
    fn test_segments_cover_input() {
        let source = "let x = \"hi\"; // done\nwhile (x) {}";
        let joined: String = tokenize(source).iter().map(|s| s.text).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            classes("const n = 42"),
            vec![
                (TokenClass::Keyword, "const"),
                (TokenClass::Plain, " n = "),
                (TokenClass::Number, "42"),
            ]
        );
    }

    #[test]
    fn test_numbers_need_word_boundaries() {
        assert_eq!(classes("x1"), vec![(TokenClass::Plain, "x1")]);
        assert_eq!(
            classes("1.5"),
            vec![
                (TokenClass::Number, "1"),
                (TokenClass::Plain, "."),
                (TokenClass::Number, "5"),
            ]
        );
    }

    #[test]
    fn test_keywords_inside_strings_and_comments_stay_plain() {
        assert_eq!(
            highlight(r#"log("if let")"#),
            r#"log(<span class="code-string">"if let"</span>)"#
        );
        assert_eq!(
            highlight("x // return 1"),
            r#"x <span class="code-comment">// return 1</span>"#
        );
    }

    #[test]
    fn test_keyword_prefix_is_not_a_keyword() {
        assert_eq!(classes("letter"), vec![(TokenClass::Plain, "letter")]);
        assert_eq!(classes("format"), vec![(TokenClass::Plain, "format")]);
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(
            highlight("if (a < b && c) \"<b>\""),
            "<span class=\"code-keyword\">if</span> (a &lt; b &amp;&amp; c) \
             <span class=\"code-string\">\"&lt;b&gt;\"</span>"
        );
    }

    #[test]
    fn test_unterminated_string_is_plain() {
        assert_eq!(
            highlight("\"open 1"),
            "\"open <span class=\"code-number\">1</span>"
        );
    }

    #[test]
    fn test_ansi() {
        assert_eq!(highlight_ansi("var"), "\x1b[1;35mvar\x1b[0m");
        assert_eq!(highlight_ansi("x"), "x");
    }
}
