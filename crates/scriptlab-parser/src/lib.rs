//! scriptlab parser: converts a token stream into an AST.

mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING_DEPTH};

use scriptlab_lexer::Lexer;
use scriptlab_types::SourceFile;

/// Lex and parse a script in one step.
///
/// Lexer errors come first in the returned error list; the program is only
/// present when neither stage reported anything.
pub fn parse_script(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file).parse();
    if lexed.errors.has_errors() {
        let mut errors = lexed.errors;
        errors.extend(result.errors);
        result.errors = errors;
        result.program = None;
    }
    result
}
