//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 12. `=`, `+=`, `&&=`, … (right-assoc), arrow functions
//! 11. `?:`
//! 10. `??`
//!  9. `||`
//!  8. `&&`
//!  7. `==`, `!=`, `===`, `!==`
//!  6. `<`, `>`, `<=`, `>=`
//!  5. `+`, `-`
//!  4. `*`, `/`, `%`
//!  3. `**` (right-assoc)
//!  2. unary `!`, `-`, `+`, `typeof`, prefix `++`/`--`, postfix `++`/`--`
//!  1. `.`, `?.`, `[]`, `()` (call), `new`

use std::rc::Rc;

use scriptlab_lexer::token::TokenKind;
use scriptlab_types::ast::*;
use scriptlab_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    /// `AssignExpr = ArrowFunction | ConditionalExpr [ AssignOp AssignExpr ]`
    pub(crate) fn parse_assignment(&mut self) -> Option<Expr> {
        if !self.enter() {
            self.leave();
            return None;
        }
        let result = self.parse_assignment_inner();
        self.leave();
        result
    }

    fn parse_assignment_inner(&mut self) -> Option<Expr> {
        let is_arrow = match self.peek_kind() {
            TokenKind::Identifier(_) => *self.look_ahead(1) == TokenKind::FatArrow,
            TokenKind::LParen => self.paren_starts_arrow(),
            _ => false,
        };
        if is_arrow {
            return self.parse_arrow_function();
        }

        let target = self.parse_conditional()?;
        let Some(op) = self.match_assign_op() else {
            return Some(target);
        };
        if !target.is_assignable() {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side in assignment",
                target.span,
            );
            return None;
        }
        self.advance(); // consume operator
        let value = self.parse_assignment()?;
        let span = target.span.merge(value.span);
        Some(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                op,
                value: Box::new(value),
            },
            span,
        ))
    }

    fn match_assign_op(&self) -> Option<AssignOp> {
        let op = match self.peek_kind() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Compound(BinOp::Add),
            TokenKind::MinusEq => AssignOp::Compound(BinOp::Sub),
            TokenKind::StarEq => AssignOp::Compound(BinOp::Mul),
            TokenKind::SlashEq => AssignOp::Compound(BinOp::Div),
            TokenKind::PercentEq => AssignOp::Compound(BinOp::Mod),
            TokenKind::StarStarEq => AssignOp::Compound(BinOp::Pow),
            TokenKind::AmpAmpEq => AssignOp::Logical(LogicalOp::And),
            TokenKind::PipePipeEq => AssignOp::Logical(LogicalOp::Or),
            TokenKind::QuestionQuestionEq => AssignOp::Logical(LogicalOp::Nullish),
            _ => return None,
        };
        Some(op)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `CondExpr = NullishExpr [ "?" AssignExpr ":" AssignExpr ]`
    fn parse_conditional(&mut self) -> Option<Expr> {
        let condition = self.parse_nullish()?;
        if !self.eat(&TokenKind::Question) {
            return Some(condition);
        }
        let then_expr = self.parse_assignment()?;
        self.expect(&TokenKind::Colon)?;
        let else_expr = self.parse_assignment()?;
        let span = condition.span.merge(else_expr.span);
        Some(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    /// `NullishExpr = OrExpr { "??" OrExpr }`
    fn parse_nullish(&mut self) -> Option<Expr> {
        let mut left = self.parse_or()?;
        while self.eat(&TokenKind::QuestionQuestion) {
            let right = self.parse_or()?;
            left = logical(left, LogicalOp::Nullish, right);
        }
        Some(left)
    }

    /// `OrExpr = AndExpr { "||" AndExpr }`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = logical(left, LogicalOp::Or, right);
        }
        Some(left)
    }

    /// `AndExpr = EqualityExpr { "&&" EqualityExpr }`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            left = logical(left, LogicalOp::And, right);
        }
        Some(left)
    }

    /// `EqualityExpr = RelExpr { ("==" | "!=" | "===" | "!==") RelExpr }`
    fn parse_equality(&mut self) -> Option<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::LooseEq,
                TokenKind::BangEq => BinOp::LooseNotEq,
                TokenKind::EqEqEq => BinOp::StrictEq,
                TokenKind::BangEqEq => BinOp::StrictNotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `RelExpr = AddExpr { ("<" | ">" | "<=" | ">=") AddExpr }`
    fn parse_relational(&mut self) -> Option<Expr> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinOp::Less,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_add()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> Option<Expr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `MulExpr = PowExpr { ("*" | "/" | "%") PowExpr }`
    fn parse_mul(&mut self) -> Option<Expr> {
        let mut left = self.parse_exponent()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_exponent()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `PowExpr = UnaryExpr [ "**" PowExpr ]`
    ///
    /// A bare unary operand on the left (`-2 ** 2`) is rejected as ambiguous.
    fn parse_exponent(&mut self) -> Option<Expr> {
        let starts_unary = matches!(
            self.peek_kind(),
            TokenKind::Bang | TokenKind::Minus | TokenKind::Plus | TokenKind::Typeof
        );
        let base = self.parse_unary()?;
        if !self.check_exact(&TokenKind::StarStar) {
            return Some(base);
        }
        if starts_unary {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                "Unary operator used immediately before exponentiation expression. \
                 Parenthesis must be used to disambiguate operator precedence",
            );
            return None;
        }
        self.advance(); // eat `**`
        let exponent = self.parse_exponent()?;
        Some(binary(base, BinOp::Pow, exponent))
    }

    /// `UnaryExpr = ( "!" | "-" | "+" | "typeof" ) UnaryExpr
    ///            | ( "++" | "--" ) UnaryExpr
    ///            | PostfixExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let target = self.parse_unary()?;
                if !target.is_assignable() {
                    self.error_at(
                        ErrorCode::INVALID_ASSIGNMENT_TARGET,
                        "Invalid left-hand side expression in prefix operation",
                        target.span,
                    );
                    return None;
                }
                let span = start.merge(target.span);
                return Some(Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: true,
                        target: Box::new(target),
                    },
                    span,
                ));
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `PostfixExpr = CallExpr [ "++" | "--" ]`: no line break before the operator.
    fn parse_postfix(&mut self) -> Option<Expr> {
        let expr = self.parse_call_member()?;
        let op = match self.peek_kind() {
            TokenKind::PlusPlus if !self.newline_before() => UpdateOp::Increment,
            TokenKind::MinusMinus if !self.newline_before() => UpdateOp::Decrement,
            _ => return Some(expr),
        };
        if !expr.is_assignable() {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side expression in postfix operation",
                expr.span,
            );
            return None;
        }
        self.advance();
        let span = expr.span.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Update {
                op,
                prefix: false,
                target: Box::new(expr),
            },
            span,
        ))
    }

    /// `CallExpr = ( NewExpr | PrimaryExpr ) { "." Name | "?." … | "[" Expr "]" | Args }`
    ///
    /// `(`, `[` and templates on a new line start a new statement instead of
    /// continuing the chain; `.` continues across lines.
    fn parse_call_member(&mut self) -> Option<Expr> {
        let mut expr = if self.check_exact(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance(); // eat `.`
                    let property = self.expect_property_name()?;
                    expr = member(expr, property, false);
                }
                TokenKind::QuestionDot => {
                    self.advance(); // eat `?.`
                    expr = match self.peek_kind() {
                        TokenKind::LParen => self.finish_call(expr, true)?,
                        TokenKind::LBracket => self.finish_index(expr, true)?,
                        _ => {
                            let property = self.expect_property_name()?;
                            member(expr, property, true)
                        }
                    };
                }
                TokenKind::LBracket if !self.newline_before() => {
                    expr = self.finish_index(expr, false)?;
                }
                TokenKind::LParen if !self.newline_before() => {
                    expr = self.finish_call(expr, false)?;
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn finish_call(&mut self, callee: Expr, optional: bool) -> Option<Expr> {
        let args = self.parse_arguments()?;
        let span = callee.span.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
                optional,
            },
            span,
        ))
    }

    fn finish_index(&mut self, object: Expr, optional: bool) -> Option<Expr> {
        self.advance(); // eat `[`
        let index = self.parse_expression()?;
        self.expect(&TokenKind::RBracket)?;
        let span = object.span.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
                optional,
            },
            span,
        ))
    }

    /// `new Callee[.name…] [ Args ]`
    fn parse_new(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `new`
        let mut callee = self.parse_primary()?;
        while self.eat(&TokenKind::Dot) {
            let property = self.expect_property_name()?;
            callee = member(callee, property, false);
        }
        let args = if self.check_exact(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// Parse a parenthesised argument list, including the parens.
    fn parse_arguments(&mut self) -> Option<Vec<Argument>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            if self.eat(&TokenKind::DotDotDot) {
                args.push(Argument::Spread(self.parse_assignment()?));
            } else {
                args.push(Argument::Positional(self.parse_assignment()?));
            }
            // Allow trailing comma before `)`
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a primary expression.
    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.peek_kind().clone() {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::NumberLit(n) => {
                self.advance();
                Some(Expr::new(ExprKind::NumberLit(n), start))
            }
            TokenKind::StringLiteral(s) | TokenKind::TemplateString(s) => {
                self.advance();
                Some(Expr::new(ExprKind::StringLit(s), start))
            }
            TokenKind::TemplateStart(s) => {
                self.advance();
                self.parse_template(s, start)
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(true), start))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(false), start))
            }
            TokenKind::Null => {
                self.advance();
                Some(Expr::new(ExprKind::NullLit, start))
            }
            TokenKind::Undefined => {
                self.advance();
                Some(Expr::new(ExprKind::UndefinedLit, start))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Some(Expr::new(ExprKind::Identifier(name), start))
            }

            // ── Collections ─────────────────────────────────────────────
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),

            // ── Grouping ────────────────────────────────────────────────
            TokenKind::LParen => {
                self.advance(); // eat `(`
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                let span = start.merge(self.previous_span());
                Some(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }

            // ── Function expression ─────────────────────────────────────
            TokenKind::Function => {
                self.advance(); // eat `function`
                let name = match self.peek_kind() {
                    TokenKind::Identifier(_) => self.expect_identifier(),
                    _ => None,
                };
                let decl = self.parse_function_rest(name, start)?;
                let span = decl.span;
                Some(Expr::new(ExprKind::Function(Rc::new(decl)), span))
            }

            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Functions
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `(params) { body }` after `function [name]`.
    pub(crate) fn parse_function_rest(&mut self, name: Option<Ident>, start: Span) -> Option<FunctionDecl> {
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_params()?;
        let body = self.parse_function_block()?;
        let span = start.merge(self.previous_span());
        Some(FunctionDecl {
            name,
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
            span,
        })
    }

    /// `x => body` or `(a, b = 1, ...rest) => body`
    fn parse_arrow_function(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let params = if self.eat(&TokenKind::LParen) {
            self.parse_params()?
        } else {
            let name = self.expect_identifier()?;
            vec![Param {
                name,
                default: None,
                rest: false,
            }]
        };
        self.expect(&TokenKind::FatArrow)?;

        let body = if self.check_exact(&TokenKind::LBrace) {
            FunctionBody::Block(self.parse_function_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_assignment()?))
        };
        let span = start.merge(self.previous_span());
        let decl = FunctionDecl {
            name: None,
            params,
            body,
            is_arrow: true,
            span,
        };
        Some(Expr::new(ExprKind::Function(Rc::new(decl)), span))
    }

    /// Parse a parameter list after the opening `(`, including the `)`.
    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            if self.eat(&TokenKind::DotDotDot) {
                let name = self.expect_identifier()?;
                params.push(Param {
                    name,
                    default: None,
                    rest: true,
                });
                // A rest parameter must be last
                if !self.check_exact(&TokenKind::RParen) {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "Rest parameter must be last formal parameter",
                    );
                    return None;
                }
                break;
            }
            let name = self.expect_identifier()?;
            let default = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            params.push(Param {
                name,
                default,
                rest: false,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(params)
    }

    /// Parse a function body block. `return` becomes legal and enclosing
    /// loops no longer accept `break`/`continue`.
    fn parse_function_block(&mut self) -> Option<Block> {
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = saved_loop_depth;
        body
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Literals
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `[expr, ...spread, ...]`
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `[`
        let mut elements = Vec::new();
        while !self.check_exact(&TokenKind::RBracket) {
            if self.eat(&TokenKind::DotDotDot) {
                elements.push(ArrayElement::Spread(self.parse_assignment()?));
            } else {
                elements.push(ArrayElement::Item(self.parse_assignment()?));
            }
            // Trailing comma
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ArrayLit(elements), span))
    }

    /// Parse `{ key: expr, shorthand, [computed]: expr, method() {}, ...spread }`
    fn parse_object_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `{`
        let mut entries = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            if self.eat(&TokenKind::DotDotDot) {
                entries.push(PropertyEntry::Spread(self.parse_assignment()?));
            } else {
                entries.push(self.parse_property()?);
            }
            // Trailing comma
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ObjectLit(entries), span))
    }

    fn parse_property(&mut self) -> Option<PropertyEntry> {
        let key_span = self.current_span();
        let (key, shorthand) = match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                (PropertyKey::Named(name.clone()), Some(name))
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                (PropertyKey::Named(s), None)
            }
            TokenKind::NumberLit(n) => {
                self.advance();
                (PropertyKey::Named(number_key(n)), None)
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.expect(&TokenKind::RBracket)?;
                (PropertyKey::Computed(Box::new(expr)), None)
            }
            kind if kind.is_keyword() => {
                self.advance();
                (PropertyKey::Named(kind.to_string()), None)
            }
            _ => {
                self.error_unexpected();
                return None;
            }
        };

        if self.eat(&TokenKind::Colon) {
            let value = self.parse_assignment()?;
            return Some(PropertyEntry::Field { key, value });
        }

        // Method shorthand: `name(params) { body }`
        if self.check_exact(&TokenKind::LParen) {
            let name = match &key {
                PropertyKey::Named(name) => Some(Ident::new(name.clone(), key_span)),
                PropertyKey::Computed(_) => None,
            };
            let decl = self.parse_function_rest(name, key_span)?;
            let span = decl.span;
            let value = Expr::new(ExprKind::Function(Rc::new(decl)), span);
            return Some(PropertyEntry::Field { key, value });
        }

        // Shorthand: `{ name }`
        match shorthand {
            Some(name)
                if self.check_exact(&TokenKind::Comma) || self.check_exact(&TokenKind::RBrace) =>
            {
                let value = Expr::new(ExprKind::Identifier(name), key_span);
                Some(PropertyEntry::Field { key, value })
            }
            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    /// Parse an interpolated template: `` `text ${expr} more ${expr} end` ``
    ///
    /// Called after the `TemplateStart` token has been consumed.
    fn parse_template(&mut self, start_text: String, start_span: Span) -> Option<Expr> {
        let mut parts = Vec::new();
        if !start_text.is_empty() {
            parts.push(TemplatePart::Literal(start_text));
        }
        loop {
            // Expect InterpolationStart: the `${`
            self.expect(&TokenKind::InterpolationStart)?;
            // Parse the interpolated expression
            let expr = self.parse_expression()?;
            parts.push(TemplatePart::Expr(expr));
            // Expect InterpolationEnd: the `}`
            self.expect(&TokenKind::InterpolationEnd)?;
            // What follows: TemplatePart (more interpolations) or TemplateEnd
            match self.peek_kind().clone() {
                TokenKind::TemplatePart(s) => {
                    self.advance();
                    if !s.is_empty() {
                        parts.push(TemplatePart::Literal(s));
                    }
                }
                TokenKind::TemplateEnd(s) => {
                    self.advance();
                    if !s.is_empty() {
                        parts.push(TemplatePart::Literal(s));
                    }
                    break;
                }
                _ => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_END,
                        "Unterminated template literal",
                    );
                    return None;
                }
            }
        }
        let span = start_span.merge(self.previous_span());
        Some(Expr::new(ExprKind::TemplateLit(parts), span))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Node builders
// ══════════════════════════════════════════════════════════════════════════════

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn member(object: Expr, property: Ident, optional: bool) -> Expr {
    let span = object.span.merge(property.span);
    Expr::new(
        ExprKind::Member {
            object: Box::new(object),
            property,
            optional,
        },
        span,
    )
}

/// Numeric object keys are stored as their canonical string form.
fn number_key(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}
