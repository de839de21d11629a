//! AST node types for tutorial scripts.
//!
//! Every node carries a [`Span`] for error reporting.
//! Large recursive types are boxed to keep enum sizes reasonable.
//! Function nodes are reference-counted so closures can share them with
//! the tree they were parsed from.

use crate::Span;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete script: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VarDecl),
    /// `function name(params) { body }`: hoisted to the top of its block.
    Function(Rc<FunctionDecl>),
    Expr(ExprStmt),
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    ForEach(ForEachStmt),
    Break(Span),
    Continue(Span),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Try(TryStmt),
    /// A stray `;`.
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(d) => d.span,
            Stmt::Function(f) => f.span,
            Stmt::Expr(e) => e.span,
            Stmt::Block(b) => b.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::DoWhile(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::ForEach(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) | Stmt::Empty(span) => *span,
            Stmt::Return(s) => s.span,
            Stmt::Throw(s) => s.span,
            Stmt::Try(s) => s.span,
        }
    }
}

/// Declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

/// `let a = 1, b`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub init: Option<Expr>,
    pub span: Span,
}

/// `{ stmts... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStmt {
    pub body: Box<Stmt>,
    pub condition: Expr,
    pub span: Span,
}

/// `for (init; condition; update) body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<ForInit>,
    pub condition: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expr(Expr),
}

/// `for (const x of items)` / `for (const key in record)`
#[derive(Debug, Clone, PartialEq)]
pub struct ForEachStmt {
    pub kind: ForEachKind,
    /// `None` when the loop assigns to an existing binding: `for (x of xs)`.
    pub decl: Option<DeclKind>,
    pub binding: Ident,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForEachKind {
    Of,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub value: Expr,
    pub span: Span,
}

/// `try { } catch (e) { } finally { }`
#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub block: Block,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Ident>,
    pub body: Block,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// A function declaration, function expression or arrow function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Option<Ident>,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    pub is_arrow: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub default: Option<Expr>,
    /// `...rest`
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    /// Concise arrow body: `x => x * 2`
    Expr(Box<Expr>),
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Whether this expression can appear on the left of `=`, `++` or `--`.
    pub fn is_assignable(&self) -> bool {
        match &self.kind {
            ExprKind::Identifier(_) => true,
            ExprKind::Member { optional, .. } | ExprKind::Index { optional, .. } => !optional,
            ExprKind::Paren(inner) => inner.is_assignable(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    NumberLit(f64),
    StringLit(String),
    /// `` `text ${expr} more` ``
    TemplateLit(Vec<TemplatePart>),
    BoolLit(bool),
    NullLit,
    UndefinedLit,
    ArrayLit(Vec<ArrayElement>),
    ObjectLit(Vec<PropertyEntry>),

    // ── Names & access ──
    Identifier(String),
    /// `object.property` / `object?.property`
    Member {
        object: Box<Expr>,
        property: Ident,
        optional: bool,
    },
    /// `object[index]` / `object?.[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    /// `callee(args)` / `callee?.(args)`
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
        optional: bool,
    },
    /// `new Callee(args)`
    New {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },

    // ── Operators ──
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `++x`, `x--`
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// Short-circuiting `&&`, `||`, `??`
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// `cond ? a : b`
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },

    // ── Functions & grouping ──
    Function(Rc<FunctionDecl>),
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyEntry {
    /// `key: value`, `"key": value`, `[expr]: value` or shorthand `key`
    Field { key: PropertyKey, value: Expr },
    /// `...expr`
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Named(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::LooseEq => "==",
            BinOp::LooseNotEq => "!=",
            BinOp::StrictEq => "===",
            BinOp::StrictNotEq => "!==",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `typeof`
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=` and friends: the arithmetic operator applied before storing.
    Compound(BinOp),
    /// `&&=`, `||=`, `??=`
    Logical(LogicalOp),
}
