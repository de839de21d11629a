//! Parser tests.
//!
//! Covers: declarations, control flow, expression precedence, functions and
//! arrows, object/array literals, templates, statement termination across
//! line breaks, error reporting and recovery, and determinism.

use scriptlab_lexer::Lexer;
use scriptlab_parser::{parse_script, ParseResult, Parser, MAX_NESTING_DEPTH};
use scriptlab_types::ast::*;
use scriptlab_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Parse source and return the result (program + errors).
fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("test.js", source);
    let lex = Lexer::new(&sf).lex();
    Parser::new(lex.tokens, &sf).parse()
}

/// Parse source and return the program, panicking if there are errors.
fn parse_ok(source: &str) -> Program {
    let result = parse(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.program.expect("no program returned")
}

/// Parse source and return the error codes.
fn error_codes(source: &str) -> Vec<ErrorCode> {
    parse(source).errors.errors.iter().map(|e| e.code).collect()
}

/// Parse source and return the first error message.
fn first_error(source: &str) -> String {
    parse(source)
        .errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_default()
}

/// Parse a single expression statement and return its expression.
fn expr(source: &str) -> Expr {
    let prog = parse_ok(source);
    assert_eq!(prog.body.len(), 1, "expected exactly one statement");
    match prog.body.into_iter().next() {
        Some(Stmt::Expr(stmt)) => stmt.expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

fn binary_op(expr: &Expr) -> BinOp {
    match &expr.kind {
        ExprKind::Binary { op, .. } => *op,
        other => panic!("expected binary expression, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_let_const_var_declarations() {
    let prog = parse_ok("let a = 1\nconst b = 'x'; var c, d = 2");
    assert_eq!(prog.body.len(), 3);
    match &prog.body[2] {
        Stmt::VarDecl(decl) => {
            assert_eq!(decl.kind, DeclKind::Var);
            assert_eq!(decl.declarators.len(), 2);
            assert!(decl.declarators[0].init.is_none());
            assert_eq!(decl.declarators[1].name.name, "d");
        }
        other => panic!("expected var declaration, got {other:?}"),
    }
}

#[test]
fn test_const_requires_initializer() {
    assert_eq!(error_codes("const x"), vec![ErrorCode::MISSING_INITIALIZER]);
    assert_eq!(first_error("const x"), "Missing initializer in const declaration");
}

#[test]
fn test_function_declaration() {
    let prog = parse_ok("function add(a, b = 2, ...rest) {\n  return a + b\n}");
    match &prog.body[0] {
        Stmt::Function(decl) => {
            assert_eq!(decl.name.as_ref().map(|n| n.name.as_str()), Some("add"));
            assert_eq!(decl.params.len(), 3);
            assert!(decl.params[1].default.is_some());
            assert!(decl.params[2].rest);
            assert!(!decl.is_arrow);
        }
        other => panic!("expected function declaration, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Control flow
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_if_else_chain() {
    let prog = parse_ok("if (a) log(1)\nelse if (b) { log(2) } else log(3)");
    match &prog.body[0] {
        Stmt::If(stmt) => {
            assert!(matches!(
                stmt.else_branch.as_deref(),
                Some(Stmt::If(inner)) if inner.else_branch.is_some()
            ));
        }
        other => panic!("expected if statement, got {other:?}"),
    }
}

#[test]
fn test_c_style_for() {
    let prog = parse_ok("for (let i = 0; i < 3; i++) { log(i) }");
    match &prog.body[0] {
        Stmt::For(stmt) => {
            assert!(matches!(stmt.init, Some(ForInit::VarDecl(_))));
            assert!(stmt.condition.is_some());
            assert!(stmt.update.is_some());
        }
        other => panic!("expected for statement, got {other:?}"),
    }
}

#[test]
fn test_empty_for_header() {
    let prog = parse_ok("for (;;) { break }");
    assert!(matches!(
        &prog.body[0],
        Stmt::For(ForStmt { init: None, condition: None, update: None, .. })
    ));
}

#[test]
fn test_for_of_and_for_in() {
    let prog = parse_ok("for (const x of xs) log(x)\nfor (key in obj) log(key)");
    match (&prog.body[0], &prog.body[1]) {
        (Stmt::ForEach(of), Stmt::ForEach(inn)) => {
            assert_eq!(of.kind, ForEachKind::Of);
            assert_eq!(of.decl, Some(DeclKind::Const));
            assert_eq!(of.binding.name, "x");
            assert_eq!(inn.kind, ForEachKind::In);
            assert_eq!(inn.decl, None);
        }
        other => panic!("expected two for-each loops, got {other:?}"),
    }
}

#[test]
fn test_while_and_do_while() {
    let prog = parse_ok("while (n > 0) n--\ndo { n++ } while (n < 3)");
    assert!(matches!(prog.body[0], Stmt::While(_)));
    assert!(matches!(prog.body[1], Stmt::DoWhile(_)));
}

#[test]
fn test_try_catch_finally() {
    let prog = parse_ok("try { risky() } catch (e) { log(e) } finally { done() }");
    match &prog.body[0] {
        Stmt::Try(stmt) => {
            let handler = stmt.handler.as_ref().expect("catch clause");
            assert_eq!(handler.param.as_ref().map(|p| p.name.as_str()), Some("e"));
            assert!(stmt.finalizer.is_some());
        }
        other => panic!("expected try statement, got {other:?}"),
    }
}

#[test]
fn test_try_without_handler_is_error() {
    assert_eq!(first_error("try { }"), "Missing catch or finally after try");
}

#[test]
fn test_break_outside_loop_is_error() {
    assert_eq!(error_codes("break"), vec![ErrorCode::ILLEGAL_JUMP]);
    assert_eq!(
        error_codes("while (true) { const f = () => { continue } }"),
        vec![ErrorCode::ILLEGAL_JUMP]
    );
}

#[test]
fn test_return_outside_function_is_error() {
    assert_eq!(first_error("return 1"), "Illegal return statement");
}

#[test]
fn test_return_without_value_before_newline() {
    let prog = parse_ok("function f() {\n  return\n  1\n}");
    match &prog.body[0] {
        Stmt::Function(decl) => match &decl.body {
            FunctionBody::Block(block) => {
                assert!(matches!(block.stmts[0], Stmt::Return(ReturnStmt { value: None, .. })));
                assert_eq!(block.stmts.len(), 2);
            }
            other => panic!("expected block body, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_prec_mul_binds_tighter_than_add() {
    let e = expr("1 + 2 * 3");
    assert_eq!(binary_op(&e), BinOp::Add);
    match &e.kind {
        ExprKind::Binary { right, .. } => assert_eq!(binary_op(right), BinOp::Mul),
        _ => unreachable!(),
    }
}

#[test]
fn test_prec_left_assoc_same_level() {
    let e = expr("10 - 4 - 3");
    match &e.kind {
        ExprKind::Binary { left, op, .. } => {
            assert_eq!(*op, BinOp::Sub);
            assert_eq!(binary_op(left), BinOp::Sub);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_exponent_is_right_assoc() {
    let e = expr("2 ** 3 ** 2");
    match &e.kind {
        ExprKind::Binary { left, right, op } => {
            assert_eq!(*op, BinOp::Pow);
            assert!(matches!(left.kind, ExprKind::NumberLit(n) if n == 2.0));
            assert_eq!(binary_op(right), BinOp::Pow);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_unary_before_exponent_is_error() {
    assert!(first_error("-2 ** 2").starts_with("Unary operator used immediately"));
    let _ = expr("(-2) ** 2");
}

#[test]
fn test_logical_and_nullish() {
    let e = expr("a ?? b || c && d");
    match &e.kind {
        ExprKind::Logical { op, right, .. } => {
            assert_eq!(*op, LogicalOp::Nullish);
            assert!(matches!(right.kind, ExprKind::Logical { op: LogicalOp::Or, .. }));
        }
        other => panic!("expected logical expression, got {other:?}"),
    }
}

#[test]
fn test_conditional_expression() {
    let e = expr("x > 1 ? 'big' : 'small'");
    assert!(matches!(e.kind, ExprKind::Conditional { .. }));
}

#[test]
fn test_assignment_is_right_assoc() {
    let e = expr("a = b = 3");
    match &e.kind {
        ExprKind::Assign { value, op, .. } => {
            assert_eq!(*op, AssignOp::Assign);
            assert!(matches!(value.kind, ExprKind::Assign { .. }));
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn test_compound_assignment_ops() {
    let e = expr("total += 5");
    assert!(matches!(
        e.kind,
        ExprKind::Assign { op: AssignOp::Compound(BinOp::Add), .. }
    ));
    let e = expr("name ??= 'anon'");
    assert!(matches!(
        e.kind,
        ExprKind::Assign { op: AssignOp::Logical(LogicalOp::Nullish), .. }
    ));
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(error_codes("1 = 2"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
    assert_eq!(error_codes("a?.b = 2"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
    assert_eq!(error_codes("f()++"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
}

#[test]
fn test_member_chain_and_calls() {
    let e = expr("console.log(items[0].name, ...rest)");
    match &e.kind {
        ExprKind::Call { callee, args, optional } => {
            assert!(!optional);
            assert!(matches!(callee.kind, ExprKind::Member { .. }));
            assert_eq!(args.len(), 2);
            assert!(matches!(args[1], Argument::Spread(_)));
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn test_optional_chaining_forms() {
    assert!(matches!(
        expr("a?.b").kind,
        ExprKind::Member { optional: true, .. }
    ));
    assert!(matches!(
        expr("a?.[0]").kind,
        ExprKind::Index { optional: true, .. }
    ));
    assert!(matches!(
        expr("a?.()").kind,
        ExprKind::Call { optional: true, .. }
    ));
}

#[test]
fn test_keyword_property_names() {
    let e = expr("promise.catch(handler)");
    match &e.kind {
        ExprKind::Call { callee, .. } => match &callee.kind {
            ExprKind::Member { property, .. } => assert_eq!(property.name, "catch"),
            other => panic!("expected member, got {other:?}"),
        },
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn test_new_expression() {
    let e = expr("new Error('boom')");
    match &e.kind {
        ExprKind::New { callee, args } => {
            assert!(matches!(&callee.kind, ExprKind::Identifier(name) if name == "Error"));
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected new expression, got {other:?}"),
    }
}

#[test]
fn test_prefix_and_postfix_update() {
    assert!(matches!(
        expr("++i").kind,
        ExprKind::Update { prefix: true, op: UpdateOp::Increment, .. }
    ));
    assert!(matches!(
        expr("i--").kind,
        ExprKind::Update { prefix: false, op: UpdateOp::Decrement, .. }
    ));
}

#[test]
fn test_typeof_operator() {
    assert!(matches!(
        expr("typeof x").kind,
        ExprKind::Unary { op: UnaryOp::Typeof, .. }
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Functions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_arrow_function_forms() {
    for source in ["x => x * 2", "(a, b) => a + b", "() => { return 1 }", "(a = 1) => a"] {
        let e = expr(source);
        match &e.kind {
            ExprKind::Function(decl) => assert!(decl.is_arrow, "{source}"),
            other => panic!("expected arrow for {source}, got {other:?}"),
        }
    }
}

#[test]
fn test_arrow_with_object_body_in_parens() {
    match expr("() => ({ a: 1 })").kind {
        ExprKind::Function(decl) => assert!(matches!(
            &decl.body,
            FunctionBody::Expr(body) if matches!(body.kind, ExprKind::Paren(_))
        )),
        other => panic!("expected arrow, got {other:?}"),
    }
}

#[test]
fn test_parenthesised_expression_is_not_arrow() {
    assert!(matches!(expr("(a + b) * 2").kind, ExprKind::Binary { .. }));
}

#[test]
fn test_function_expression_with_name() {
    match expr("(function fact(n) { return n })").kind {
        ExprKind::Paren(inner) => match &inner.kind {
            ExprKind::Function(decl) => {
                assert_eq!(decl.name.as_ref().map(|n| n.name.as_str()), Some("fact"));
                assert!(!decl.is_arrow);
            }
            other => panic!("expected function, got {other:?}"),
        },
        other => panic!("expected parenthesised function, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_array_literal_with_spread_and_trailing_comma() {
    match expr("[1, ...rest, 3,]").kind {
        ExprKind::ArrayLit(elements) => {
            assert_eq!(elements.len(), 3);
            assert!(matches!(elements[1], ArrayElement::Spread(_)));
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn test_object_literal_entries() {
    let prog = parse_ok("const o = { a: 1, 'b c': 2, 3: 'x', [k]: 4, name, greet() { return 1 }, ...extra }");
    let init = match &prog.body[0] {
        Stmt::VarDecl(decl) => decl.declarators[0].init.clone().expect("init"),
        other => panic!("expected declaration, got {other:?}"),
    };
    match init.kind {
        ExprKind::ObjectLit(entries) => {
            assert_eq!(entries.len(), 7);
            let keys: Vec<String> = entries
                .iter()
                .filter_map(|e| match e {
                    PropertyEntry::Field { key: PropertyKey::Named(k), .. } => Some(k.clone()),
                    _ => None,
                })
                .collect();
            assert_eq!(keys, vec!["a", "b c", "3", "name", "greet"]);
            assert!(matches!(entries[3], PropertyEntry::Field { key: PropertyKey::Computed(_), .. }));
            assert!(matches!(entries[6], PropertyEntry::Spread(_)));
        }
        other => panic!("expected object literal, got {other:?}"),
    }
}

#[test]
fn test_statement_block_vs_object_literal() {
    // A leading `{` opens a block
    let prog = parse_ok("{ let a = 1 }");
    assert!(matches!(prog.body[0], Stmt::Block(_)));
}

#[test]
fn test_template_literal_parts() {
    match expr("`Hello, ${name}! You are ${age + 1}.`").kind {
        ExprKind::TemplateLit(parts) => {
            assert_eq!(parts.len(), 5);
            assert!(matches!(&parts[0], TemplatePart::Literal(s) if s == "Hello, "));
            assert!(matches!(parts[1], TemplatePart::Expr(_)));
            assert!(matches!(&parts[4], TemplatePart::Literal(s) if s == "."));
        }
        other => panic!("expected template, got {other:?}"),
    }
}

#[test]
fn test_plain_template_is_string() {
    assert!(matches!(expr("`plain`").kind, ExprKind::StringLit(ref s) if s == "plain"));
}

// ─────────────────────────────────────────────────────────────────────
// Statement termination
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_newline_terminates_statements() {
    let prog = parse_ok("let a = 1\nlet b = 2\nlog(a + b)");
    assert_eq!(prog.body.len(), 3);
}

#[test]
fn test_same_line_statements_need_semicolon() {
    assert_eq!(first_error("let a = 1 let b = 2"), "Unexpected token 'let'");
    assert_eq!(parse_ok("let a = 1; let b = 2").body.len(), 2);
}

#[test]
fn test_method_chain_continues_across_lines() {
    let prog = parse_ok("items\n  .map(x => x * 2)\n  .filter(x => x > 2)");
    assert_eq!(prog.body.len(), 1);
}

#[test]
fn test_paren_on_new_line_starts_new_statement() {
    let prog = parse_ok("let a = b\n(log)(1)");
    assert_eq!(prog.body.len(), 2);
}

#[test]
fn test_postfix_update_on_new_line_applies_to_next() {
    let prog = parse_ok("a\n++b");
    assert_eq!(prog.body.len(), 2);
    match &prog.body[1] {
        Stmt::Expr(stmt) => assert!(matches!(
            stmt.expr.kind,
            ExprKind::Update { prefix: true, .. }
        )),
        other => panic!("expected expression, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Errors & recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unexpected_token_messages() {
    assert_eq!(first_error("log(1))"), "Unexpected token ')'");
    assert_eq!(first_error("let 5 = x"), "Unexpected number");
    assert_eq!(first_error("log(1"), "Unexpected end of input");
    assert_eq!(first_error("x y"), "Unexpected identifier 'y'");
}

#[test]
fn test_error_positions() {
    let result = parse("let a = 1\nlog(a))");
    let err = result.errors.first().expect("an error");
    assert_eq!(err.span.start_line, 2);
    assert_eq!(err.span.start_col, 7);
    assert_eq!(err.source_line, "log(a))");
    assert_eq!(err.to_string(), "Unexpected token ')' (2:7)");
}

#[test]
fn test_recovery_reports_multiple_errors() {
    let result = parse("let = 1\nlog(1))\nconst z");
    assert!(result.program.is_none());
    assert_eq!(result.errors.total_errors, 3);
}

#[test]
fn test_nesting_limit() {
    let source = format!("{}1{}", "(".repeat(150), ")".repeat(150));
    assert!(error_codes(&source).contains(&ErrorCode::STRUCTURAL_LIMIT_EXCEEDED));

    let ok = format!("{}1{}", "(".repeat(MAX_NESTING_DEPTH as usize / 4), ")".repeat(MAX_NESTING_DEPTH as usize / 4));
    parse_ok(&ok);
}

#[test]
fn test_parse_script_merges_lexer_errors() {
    let sf = SourceFile::new("test.js", "log(\"unterminated)\nlog(1))");
    let result = parse_script(&sf);
    assert!(result.program.is_none());
    assert_eq!(
        result.errors.first().map(|e| e.code),
        Some(ErrorCode::UNTERMINATED_STRING)
    );
}

#[test]
fn test_parse_script_ok() {
    let sf = SourceFile::new("test.js", "console.log(\"Hello, World!\");");
    let result = parse_script(&sf);
    assert!(!result.errors.has_errors());
    assert_eq!(result.program.map(|p| p.body.len()), Some(1));
}

#[test]
fn test_parsing_is_deterministic() {
    let source = "const nums = [1, 2, 3]\nconst doubled = nums.map(n => n * 2)\nconsole.log(`${doubled}`)";
    let first = format!("{:?}", parse_ok(source));
    for _ in 0..50 {
        assert_eq!(format!("{:?}", parse_ok(source)), first);
    }
}
