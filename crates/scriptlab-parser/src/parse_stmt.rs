//! Statement parsing.

use std::rc::Rc;

use crate::parser::Parser;
use scriptlab_lexer::token::TokenKind;
use scriptlab_types::ast::*;
use scriptlab_types::ErrorCode;

impl<'src> Parser<'src> {
    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            let before = self.position();
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(before),
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Block { stmts, span })
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        if !self.enter() {
            self.leave();
            return None;
        }
        let stmt = self.parse_statement_inner();
        self.leave();
        stmt
    }

    fn parse_statement_inner(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::Let | TokenKind::Const | TokenKind::Var => {
                let decl = self.parse_var_decl(true)?;
                self.consume_semicolon();
                Some(Stmt::VarDecl(decl))
            }
            TokenKind::Function => self.parse_function_decl(),
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Break | TokenKind::Continue => self.parse_jump_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Throw => self.parse_throw_stmt(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::Semicolon => {
                let span = self.advance().span;
                Some(Stmt::Empty(span))
            }
            _ => {
                // Expression statement
                let expr = self.parse_expression()?;
                let span = expr.span;
                if !self.consume_semicolon() {
                    return None;
                }
                Some(Stmt::Expr(ExprStmt { expr, span }))
            }
        }
    }

    /// Parse a sub-statement that forms the body of `if`, `while` or `for`.
    fn parse_body(&mut self) -> Option<Box<Stmt>> {
        if matches!(
            self.peek_kind(),
            TokenKind::Let | TokenKind::Const | TokenKind::Function
        ) {
            self.error_unexpected();
            return None;
        }
        self.parse_statement().map(Box::new)
    }

    /// Parse a loop body with the loop depth raised.
    fn parse_loop_body(&mut self) -> Option<Box<Stmt>> {
        self.loop_depth += 1;
        let body = self.parse_body();
        self.loop_depth -= 1;
        body
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// `let a = 1, b`: `require_init` enforces initialisers on `const`.
    pub(crate) fn parse_var_decl(&mut self, require_init: bool) -> Option<VarDecl> {
        let start = self.current_span();
        let kind = match self.advance().kind {
            TokenKind::Const => DeclKind::Const,
            TokenKind::Var => DeclKind::Var,
            _ => DeclKind::Let,
        };
        let mut declarators = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            declarators.push(self.parse_declarator_rest(kind, name, require_init)?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let span = start.merge(self.previous_span());
        Some(VarDecl {
            kind,
            declarators,
            span,
        })
    }

    /// Parse the optional `= init` after a declarator's name.
    fn parse_declarator_rest(
        &mut self,
        kind: DeclKind,
        name: Ident,
        require_init: bool,
    ) -> Option<Declarator> {
        let init = if self.eat(&TokenKind::Eq) {
            Some(self.parse_assignment()?)
        } else {
            if kind == DeclKind::Const && require_init {
                self.error_at(
                    ErrorCode::MISSING_INITIALIZER,
                    "Missing initializer in const declaration",
                    name.span,
                );
                return None;
            }
            None
        };
        let span = match &init {
            Some(expr) => name.span.merge(expr.span),
            None => name.span,
        };
        Some(Declarator { name, init, span })
    }

    /// `function name(params) { body }`
    fn parse_function_decl(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `function`
        let name = self.expect_identifier()?;
        let decl = self.parse_function_rest(Some(name), start)?;
        Some(Stmt::Function(Rc::new(decl)))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Control Flow
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a parenthesised condition: `( expr )`
    fn parse_condition(&mut self) -> Option<Expr> {
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        Some(condition)
    }

    /// `if (cond) stmt [else stmt]`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `if`
        let condition = self.parse_condition()?;
        let then_branch = self.parse_body()?;
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(self.parse_body()?)
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    /// `while (cond) stmt`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `while`
        let condition = self.parse_condition()?;
        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `do stmt while (cond)`
    fn parse_do_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `do`
        let body = self.parse_loop_body()?;
        self.expect(&TokenKind::While)?;
        let condition = self.parse_condition()?;
        // The trailing `;` is always optional after do-while
        self.eat(&TokenKind::Semicolon);
        let span = start.merge(self.previous_span());
        Some(Stmt::DoWhile(DoWhileStmt {
            body,
            condition,
            span,
        }))
    }

    /// `for (init; cond; update) stmt`, `for (x of xs) stmt`, `for (k in obj) stmt`
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `for`
        self.expect(&TokenKind::LParen)?;

        let init = match self.peek_kind() {
            TokenKind::Let | TokenKind::Const | TokenKind::Var => {
                let decl_start = self.current_span();
                let kind = match self.advance().kind {
                    TokenKind::Const => DeclKind::Const,
                    TokenKind::Var => DeclKind::Var,
                    _ => DeclKind::Let,
                };
                let binding = self.expect_identifier()?;
                if let Some(each) = self.eat_for_each_kind() {
                    return self.parse_for_each_rest(start, each, Some(kind), binding);
                }
                let mut declarators = vec![self.parse_declarator_rest(kind, binding, true)?];
                while self.eat(&TokenKind::Comma) {
                    let name = self.expect_identifier()?;
                    declarators.push(self.parse_declarator_rest(kind, name, true)?);
                }
                let span = decl_start.merge(self.previous_span());
                Some(ForInit::VarDecl(VarDecl {
                    kind,
                    declarators,
                    span,
                }))
            }
            TokenKind::Semicolon => None,
            TokenKind::Identifier(name)
                if matches!(self.look_ahead(1), TokenKind::In)
                    || matches!(self.look_ahead(1), TokenKind::Identifier(of) if of == "of") =>
            {
                let binding = Ident::new(name.clone(), self.current_span());
                self.advance();
                let each = self.eat_for_each_kind()?;
                return self.parse_for_each_rest(start, each, None, binding);
            }
            _ => Some(ForInit::Expr(self.parse_expression()?)),
        };
        self.expect(&TokenKind::Semicolon)?;

        let condition = if self.check_exact(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check_exact(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;

        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::For(ForStmt {
            init,
            condition,
            update,
            body,
            span,
        }))
    }

    fn eat_for_each_kind(&mut self) -> Option<ForEachKind> {
        if self.check_of() {
            self.advance();
            Some(ForEachKind::Of)
        } else if self.eat(&TokenKind::In) {
            Some(ForEachKind::In)
        } else {
            None
        }
    }

    fn parse_for_each_rest(
        &mut self,
        start: scriptlab_types::Span,
        kind: ForEachKind,
        decl: Option<DeclKind>,
        binding: Ident,
    ) -> Option<Stmt> {
        let iterable = self.parse_assignment()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::ForEach(ForEachStmt {
            kind,
            decl,
            binding,
            iterable,
            body,
            span,
        }))
    }

    /// `break` / `continue`
    fn parse_jump_stmt(&mut self) -> Option<Stmt> {
        let token = self.advance();
        let is_break = token.kind == TokenKind::Break;
        if self.loop_depth == 0 {
            let message = if is_break {
                "Illegal break statement"
            } else {
                "Illegal continue statement: no surrounding iteration statement"
            };
            self.error_at(ErrorCode::ILLEGAL_JUMP, message, token.span);
            return None;
        }
        self.consume_semicolon();
        Some(if is_break {
            Stmt::Break(token.span)
        } else {
            Stmt::Continue(token.span)
        })
    }

    /// `return [expr]`
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `return`
        if self.function_depth == 0 {
            self.error_at(ErrorCode::ILLEGAL_JUMP, "Illegal return statement", start);
            return None;
        }
        let value = if self.check_exact(&TokenKind::Semicolon)
            || self.check_exact(&TokenKind::RBrace)
            || self.at_end()
            || self.newline_before()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon();
        let span = start.merge(self.previous_span());
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `throw expr`
    fn parse_throw_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `throw`
        if self.newline_before() {
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "Illegal newline after throw");
            return None;
        }
        let value = self.parse_expression()?;
        self.consume_semicolon();
        let span = start.merge(self.previous_span());
        Some(Stmt::Throw(ThrowStmt { value, span }))
    }

    /// `try { } [catch [(e)] { }] [finally { }]`
    fn parse_try_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `try`
        let block = self.parse_block()?;

        let handler = if self.check_exact(&TokenKind::Catch) {
            let catch_start = self.advance().span;
            let param = if self.eat(&TokenKind::LParen) {
                let param = self.expect_identifier()?;
                self.expect(&TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            let span = catch_start.merge(body.span);
            Some(CatchClause { param, body, span })
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                "Missing catch or finally after try",
            );
            return None;
        }

        let span = start.merge(self.previous_span());
        Some(Stmt::Try(TryStmt {
            block,
            handler,
            finalizer,
            span,
        }))
    }
}
