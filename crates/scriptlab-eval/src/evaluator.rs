//! Core expression and statement evaluator.

use crate::builtins;
use crate::capture::OutputCapture;
use crate::env::{Assign, BindingKind, Environment, Lookup, ScopeId};
use crate::error::{EvalError, EvalResult};
use crate::format;
use crate::heap::{FunctionKind, Heap, PropertyMap};
use crate::sandbox::CancelToken;
use crate::value::{as_index, canonical_index, number_to_string, string_to_number, HeapRef, Value};
use scriptlab_types::ast::*;
use std::cmp::Ordering;
use std::rc::Rc;
use std::time::Instant;

/// Gas consumed between cancellation and deadline checks.
const POLL_INTERVAL: u64 = 1024;

/// Longest string a script may build, in bytes.
pub const MAX_STRING_LENGTH: usize = 1 << 24;

/// Longest array a script may build.
pub const MAX_ARRAY_LENGTH: usize = 1 << 20;

/// Resource limits for one evaluation.
#[derive(Debug, Clone)]
pub struct EvalLimits {
    pub gas_limit: u64,
    pub max_call_depth: usize,
    pub max_heap_objects: usize,
    pub max_output_lines: usize,
    pub deadline: Option<Instant>,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            gas_limit: 10_000_000,
            max_call_depth: 256,
            max_heap_objects: 100_000,
            max_output_lines: 10_000,
            deadline: None,
        }
    }
}

/// How a statement finished.
#[derive(Debug)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// An assignable location.
enum Reference {
    Name(String),
    Property(Value, String),
    Element(Value, Value),
}

/// The core evaluator: walks AST nodes and produces Values.
pub struct Evaluator {
    pub(crate) heap: Heap,
    pub(crate) env: Environment,
    /// Captured `console.log` output.
    pub(crate) output: OutputCapture,
    /// Scope the evaluator is currently executing in.
    scope: ScopeId,
    /// Top-level script scope; undeclared assignments land here.
    global: ScopeId,
    /// Gas counter: limits total steps to prevent infinite loops.
    gas: u64,
    gas_limit: u64,
    call_depth: usize,
    max_call_depth: usize,
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
    /// xorshift state for `Math.random`; fixed seed keeps runs reproducible.
    pub(crate) rng_state: u64,
}

impl Evaluator {
    /// Create an evaluator with the given limits. Built-ins are installed
    /// by [`Evaluator::run`].
    pub fn new(limits: EvalLimits) -> Self {
        let env = Environment::new();
        let root = env.root();
        Self {
            heap: Heap::new(limits.max_heap_objects),
            env,
            output: OutputCapture::new(limits.max_output_lines),
            scope: root,
            global: root,
            gas: 0,
            gas_limit: limits.gas_limit,
            call_depth: 0,
            max_call_depth: limits.max_call_depth,
            deadline: limits.deadline,
            cancel: None,
            rng_state: 0x2545_F491_4F6C_DD1D,
        }
    }

    /// Poll `token` while evaluating.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Gas consumed so far.
    pub fn gas_used(&self) -> u64 {
        self.gas
    }

    /// Lines logged so far.
    pub fn output(&self) -> &[String] {
        self.output.lines()
    }

    pub fn into_output(self) -> Vec<String> {
        self.output.into_lines()
    }

    /// Consume one unit of gas. Returns error if exhausted, cancelled or
    /// past the deadline.
    pub(crate) fn tick(&mut self) -> EvalResult<()> {
        self.gas += 1;
        if self.gas > self.gas_limit {
            return Err(EvalError::GasExhausted(self.gas_limit));
        }
        if self.gas % POLL_INTERVAL == 0 {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Err(EvalError::Cancelled);
            }
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(EvalError::Timeout);
            }
        }
        Ok(())
    }

    /// Charge gas for bulk work done inside a built-in.
    pub(crate) fn charge(&mut self, units: usize) -> EvalResult<()> {
        self.gas = self.gas.saturating_add(units as u64);
        if self.gas > self.gas_limit {
            return Err(EvalError::GasExhausted(self.gas_limit));
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Program
    // ══════════════════════════════════════════════════════════════════════

    /// Install the built-ins and run a whole program.
    pub fn run(&mut self, program: &Program) -> EvalResult<()> {
        let root = self.env.root();
        builtins::install_globals(self, root)?;
        let global = self.env.push_scope(root, true);
        self.env.capture(global);
        self.env.define(global, "this", Value::Undefined, BindingKind::Var);
        self.global = global;
        self.scope = global;
        self.hoist_vars(&program.body, global);
        self.hoist_declarations(&program.body, global)?;
        self.exec_stmts(&program.body)?;
        Ok(())
    }

    /// Text used after `Error: ` when a fault ends the run.
    pub fn describe_error(&self, err: &EvalError) -> String {
        match err {
            EvalError::Thrown(value) => self.describe_thrown(value),
            other => other.to_string(),
        }
    }

    fn describe_thrown(&self, value: &Value) -> String {
        let message = match value {
            Value::Object(r) => self.heap.props(*r).and_then(|p| p.get("message")).cloned(),
            _ => None,
        };
        let rendered = match message {
            Some(message) => format::to_display_string(&self.heap, &message),
            None => format::display_value(&self.heap, value),
        };
        rendered.unwrap_or_else(|e| e.to_string())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Hoisting
    // ══════════════════════════════════════════════════════════════════════

    /// Declare every `var` reachable from `stmts` (not crossing function
    /// boundaries) as `undefined` in `scope`.
    fn hoist_vars(&mut self, stmts: &[Stmt], scope: ScopeId) {
        let mut names = Vec::new();
        collect_var_names(stmts, &mut names);
        for name in names {
            if !self.env.has_own(scope, name) {
                self.env.define(scope, name, Value::Undefined, BindingKind::Var);
            }
        }
    }

    /// Reserve `let`/`const` names and create function declarations at the
    /// top of a block.
    fn hoist_declarations(&mut self, stmts: &[Stmt], scope: ScopeId) -> EvalResult<()> {
        for stmt in stmts {
            match stmt {
                Stmt::VarDecl(decl) if decl.kind != DeclKind::Var => {
                    let kind = binding_kind(decl.kind);
                    for d in &decl.declarators {
                        if !self.env.declare_uninitialized(scope, &d.name.name, kind) {
                            return Err(EvalError::SyntaxError(format!(
                                "Identifier '{}' has already been declared",
                                d.name.name
                            )));
                        }
                    }
                }
                Stmt::Function(decl) => {
                    let func = self.make_closure(decl, None)?;
                    if let Some(name) = &decl.name {
                        self.env.define(scope, &name.name, func, BindingKind::Function);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> EvalResult<Flow> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run `stmts` in a fresh block scope (skipped when nothing is declared).
    fn exec_block(&mut self, stmts: &[Stmt]) -> EvalResult<Flow> {
        if !declares_lexically(stmts) {
            return self.exec_stmts(stmts);
        }
        let scope = self.env.push_scope(self.scope, false);
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = self
            .hoist_declarations(stmts, scope)
            .and_then(|()| self.exec_stmts(stmts));
        self.scope = saved;
        self.env.pop_scope(scope);
        result
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        self.tick()?;
        match stmt {
            Stmt::VarDecl(decl) => {
                self.exec_var_decl(decl)?;
                Ok(Flow::Normal)
            }
            // Created during hoisting.
            Stmt::Function(_) => Ok(Flow::Normal),
            Stmt::Expr(s) => {
                self.eval_expr(&s.expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Block(block) => self.exec_block(&block.stmts),
            Stmt::If(s) => {
                if self.eval_expr(&s.condition)?.is_truthy() {
                    self.exec_stmt(&s.then_branch)
                } else if let Some(else_branch) = &s.else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(s) => {
                loop {
                    self.tick()?;
                    if !self.eval_expr(&s.condition)?.is_truthy() {
                        break;
                    }
                    match self.exec_stmt(&s.body)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile(s) => {
                loop {
                    self.tick()?;
                    match self.exec_stmt(&s.body)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.eval_expr(&s.condition)?.is_truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For(s) => self.exec_for(s),
            Stmt::ForEach(s) => self.exec_for_each(s),
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Return(s) => {
                let value = match &s.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Throw(s) => {
                let value = self.eval_expr(&s.value)?;
                Err(EvalError::Thrown(value))
            }
            Stmt::Try(s) => self.exec_try(s),
            Stmt::Empty(_) => Ok(Flow::Normal),
        }
    }

    fn exec_var_decl(&mut self, decl: &VarDecl) -> EvalResult<()> {
        for d in &decl.declarators {
            let name = d.name.name.as_str();
            match decl.kind {
                DeclKind::Var => {
                    let scope = self.env.function_scope(self.scope);
                    match &d.init {
                        Some(init) => {
                            let value = self.eval_named(init, name)?;
                            self.env.define(scope, name, value, BindingKind::Var);
                        }
                        None if !self.env.has_own(scope, name) => {
                            self.env
                                .define(scope, name, Value::Undefined, BindingKind::Var);
                        }
                        None => {}
                    }
                }
                DeclKind::Let | DeclKind::Const => {
                    let value = match &d.init {
                        Some(init) => self.eval_named(init, name)?,
                        None => Value::Undefined,
                    };
                    self.env
                        .define(self.scope, name, value, binding_kind(decl.kind));
                }
            }
        }
        Ok(())
    }

    fn exec_for(&mut self, s: &ForStmt) -> EvalResult<Flow> {
        let outer = self.scope;
        let per_iteration =
            matches!(&s.init, Some(ForInit::VarDecl(d)) if d.kind != DeclKind::Var);
        let scope = self.env.push_scope(outer, false);
        self.scope = scope;
        let result = self.run_for(s, outer, per_iteration);
        let last = std::mem::replace(&mut self.scope, outer);
        self.env.pop_scope(last);
        result
    }

    fn run_for(&mut self, s: &ForStmt, outer: ScopeId, per_iteration: bool) -> EvalResult<Flow> {
        match &s.init {
            Some(ForInit::VarDecl(decl)) => self.exec_var_decl(decl)?,
            Some(ForInit::Expr(expr)) => {
                self.eval_expr(expr)?;
            }
            None => {}
        }
        loop {
            self.tick()?;
            if let Some(condition) = &s.condition {
                if !self.eval_expr(condition)?.is_truthy() {
                    break;
                }
            }
            match self.exec_stmt(&s.body)? {
                Flow::Break => break,
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Normal | Flow::Continue => {}
            }
            if per_iteration {
                // Each iteration gets its own copy of the loop variables so
                // closures created in the body keep that iteration's values.
                let bindings = self.env.own_bindings(self.scope);
                self.env.pop_scope(self.scope);
                let fresh = self.env.push_scope(outer, false);
                for (name, value, kind) in bindings {
                    self.env.define(fresh, &name, value, kind);
                }
                self.scope = fresh;
            }
            if let Some(update) = &s.update {
                self.eval_expr(update)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for_each(&mut self, s: &ForEachStmt) -> EvalResult<Flow> {
        let iterable = self.eval_expr(&s.iterable)?;
        match s.kind {
            ForEachKind::Of => match &iterable {
                Value::Array(r) => {
                    let mut index = 0;
                    // Length is re-read each step; the body may grow the array.
                    while let Some(item) = self.heap.array(*r).get(index).cloned() {
                        index += 1;
                        match self.for_each_iteration(s, item)? {
                            Flow::Break => break,
                            Flow::Return(v) => return Ok(Flow::Return(v)),
                            Flow::Normal | Flow::Continue => {}
                        }
                    }
                    Ok(Flow::Normal)
                }
                Value::String(text) => {
                    let items: Vec<Value> =
                        text.chars().map(|c| Value::String(c.to_string())).collect();
                    self.for_each_items(s, items)
                }
                other => Err(EvalError::type_error(format!(
                    "{} is not iterable",
                    self.describe_operand(&s.iterable, other)
                ))),
            },
            ForEachKind::In => {
                let keys = self
                    .own_keys(&iterable)
                    .into_iter()
                    .map(Value::String)
                    .collect();
                self.for_each_items(s, keys)
            }
        }
    }

    fn for_each_items(&mut self, s: &ForEachStmt, items: Vec<Value>) -> EvalResult<Flow> {
        for item in items {
            match self.for_each_iteration(s, item)? {
                Flow::Break => break,
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    fn for_each_iteration(&mut self, s: &ForEachStmt, item: Value) -> EvalResult<Flow> {
        self.tick()?;
        let name = s.binding.name.as_str();
        match s.decl {
            Some(DeclKind::Var) => {
                let scope = self.env.function_scope(self.scope);
                self.env.define(scope, name, item, BindingKind::Var);
                self.exec_stmt(&s.body)
            }
            Some(kind) => {
                let scope = self.env.push_scope(self.scope, false);
                self.env.define(scope, name, item, binding_kind(kind));
                let saved = std::mem::replace(&mut self.scope, scope);
                let result = self.exec_stmt(&s.body);
                self.scope = saved;
                self.env.pop_scope(scope);
                result
            }
            None => {
                self.assign_name(name, item)?;
                self.exec_stmt(&s.body)
            }
        }
    }

    fn exec_try(&mut self, s: &TryStmt) -> EvalResult<Flow> {
        let mut result = self.exec_block(&s.block.stmts);
        let caught = match (&s.handler, &result) {
            (Some(handler), Err(err)) if err.is_catchable() => Some((handler, err.clone())),
            _ => None,
        };
        if let Some((handler, err)) = caught {
            let thrown = self.error_to_value(err)?;
            result = self.exec_catch(handler, thrown);
        }
        if matches!(&result, Err(err) if !err.is_catchable()) {
            return result;
        }
        if let Some(finalizer) = &s.finalizer {
            match self.exec_block(&finalizer.stmts)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        result
    }

    fn exec_catch(&mut self, handler: &CatchClause, thrown: Value) -> EvalResult<Flow> {
        let Some(param) = &handler.param else {
            return self.exec_block(&handler.body.stmts);
        };
        let scope = self.env.push_scope(self.scope, false);
        self.env.define(scope, &param.name, thrown, BindingKind::Let);
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = self.exec_block(&handler.body.stmts);
        self.scope = saved;
        self.env.pop_scope(scope);
        result
    }

    /// The value a `catch` clause binds for an error.
    pub(crate) fn error_to_value(&mut self, err: EvalError) -> EvalResult<Value> {
        match err {
            EvalError::Thrown(value) => Ok(value),
            other => match other.error_name() {
                Some(name) => self.heap.alloc_error(name, &other.to_string()),
                None => Err(other),
            },
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value.
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.tick()?;
        match &expr.kind {
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NullLit => Ok(Value::Null),
            ExprKind::UndefinedLit => Ok(Value::Undefined),
            ExprKind::TemplateLit(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(s) => text.push_str(s),
                        TemplatePart::Expr(e) => {
                            let value = self.eval_expr(e)?;
                            let value = self.to_primitive(&value)?;
                            text.push_str(&self.to_string(&value)?);
                        }
                    }
                    check_string_length(&text)?;
                }
                Ok(Value::String(text))
            }
            ExprKind::ArrayLit(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    match element {
                        ArrayElement::Item(e) => items.push(self.eval_expr(e)?),
                        ArrayElement::Spread(e) => {
                            let value = self.eval_expr(e)?;
                            items.extend(self.spread_values(e, &value)?);
                        }
                    }
                }
                self.heap.alloc_array(items)
            }
            ExprKind::ObjectLit(entries) => self.eval_object(entries),
            ExprKind::Identifier(name) => self.lookup(name),
            ExprKind::Member { .. } | ExprKind::Index { .. } | ExprKind::Call { .. } => {
                Ok(self.eval_chain(expr)?.unwrap_or(Value::Undefined))
            }
            ExprKind::New { callee, args } => self.eval_new(callee, args),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Update {
                op,
                prefix,
                target,
            } => {
                let reference = self.resolve_reference(target)?;
                let old = self.read_reference(&reference)?;
                let old = self.to_number(&old)?;
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.write_reference(reference, Value::Number(new))?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            ExprKind::Binary { left, op, right } => {
                let lv = self.eval_expr(left)?;
                let rv = self.eval_expr(right)?;
                self.binary_op(*op, lv, rv)
            }
            ExprKind::Logical { left, op, right } => {
                let lv = self.eval_expr(left)?;
                if short_circuits(*op, &lv) {
                    Ok(lv)
                } else {
                    self.eval_expr(right)
                }
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                if self.eval_expr(condition)?.is_truthy() {
                    self.eval_expr(then_expr)
                } else {
                    self.eval_expr(else_expr)
                }
            }
            ExprKind::Assign { target, op, value } => self.eval_assign(target, *op, value),
            ExprKind::Function(decl) => self.eval_function_expr(decl, None),
            ExprKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    /// Evaluate `expr`, naming it `name` if it is an anonymous function.
    fn eval_named(&mut self, expr: &Expr, name: &str) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Function(decl) if decl.name.is_none() => {
                self.tick()?;
                self.eval_function_expr(decl, Some(name))
            }
            _ => self.eval_expr(expr),
        }
    }

    fn eval_function_expr(&mut self, decl: &Rc<FunctionDecl>, hint: Option<&str>) -> EvalResult<Value> {
        let Some(name) = &decl.name else {
            return self.make_closure(decl, hint);
        };
        // A named function expression sees its own name in a scope of its own.
        let scope = self.env.push_scope(self.scope, false);
        let saved = std::mem::replace(&mut self.scope, scope);
        let func = self.make_closure(decl, None);
        self.scope = saved;
        let func = func?;
        self.env
            .define(scope, &name.name, func.clone(), BindingKind::Function);
        Ok(func)
    }

    fn make_closure(&mut self, decl: &Rc<FunctionDecl>, hint: Option<&str>) -> EvalResult<Value> {
        self.env.capture(self.scope);
        let name = decl
            .name
            .as_ref()
            .map(|n| n.name.clone())
            .or_else(|| hint.map(str::to_string))
            .unwrap_or_default();
        self.heap.alloc_function(
            FunctionKind::Script {
                decl: Rc::clone(decl),
                scope: self.scope,
            },
            name,
        )
    }

    fn eval_object(&mut self, entries: &[PropertyEntry]) -> EvalResult<Value> {
        let mut props = PropertyMap::new();
        for entry in entries {
            match entry {
                PropertyEntry::Field { key, value } => {
                    let key = match key {
                        PropertyKey::Named(name) => name.clone(),
                        PropertyKey::Computed(expr) => {
                            let key = self.eval_expr(expr)?;
                            self.to_property_key(&key)?
                        }
                    };
                    let value = self.eval_named(value, &key)?;
                    props.set(key, value);
                }
                PropertyEntry::Spread(expr) => {
                    let source = self.eval_expr(expr)?;
                    for (key, value) in self.own_entries(&source) {
                        props.set(key, value);
                    }
                }
            }
        }
        self.heap.alloc_object(props)
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        match self.env.lookup(self.scope, name) {
            Lookup::Found(value) => Ok(value.clone()),
            Lookup::Uninitialized => Err(EvalError::reference_error(format!(
                "Cannot access '{name}' before initialization"
            ))),
            Lookup::Missing => Err(EvalError::reference_error(format!("{name} is not defined"))),
        }
    }

    fn assign_name(&mut self, name: &str, value: Value) -> EvalResult<()> {
        match self.env.assign(self.scope, name, value.clone()) {
            Assign::Done => Ok(()),
            Assign::Constant => Err(EvalError::type_error("Assignment to constant variable.")),
            Assign::Uninitialized => Err(EvalError::reference_error(format!(
                "Cannot access '{name}' before initialization"
            ))),
            Assign::Missing => {
                // Undeclared assignment creates a top-level variable.
                self.env.define(self.global, name, value, BindingKind::Var);
                Ok(())
            }
        }
    }

    // ── Member access & calls ────────────────────────────────────────────

    /// Evaluate a member/index/call chain. `None` means an optional link
    /// (`?.`) met `null`/`undefined` and the rest of the chain was skipped.
    fn eval_chain(&mut self, expr: &Expr) -> EvalResult<Option<Value>> {
        match &expr.kind {
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let Some(obj) = self.eval_chain_link(object)? else {
                    return Ok(None);
                };
                if *optional && obj.is_nullish() {
                    return Ok(None);
                }
                self.get_property(&obj, &property.name).map(Some)
            }
            ExprKind::Index {
                object,
                index,
                optional,
            } => {
                let Some(obj) = self.eval_chain_link(object)? else {
                    return Ok(None);
                };
                if *optional && obj.is_nullish() {
                    return Ok(None);
                }
                let key = self.eval_expr(index)?;
                self.get_indexed(&obj, &key).map(Some)
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => self.eval_call(callee, args, *optional),
            _ => self.eval_expr(expr).map(Some),
        }
    }

    fn eval_chain_link(&mut self, expr: &Expr) -> EvalResult<Option<Value>> {
        match &expr.kind {
            ExprKind::Member { .. } | ExprKind::Index { .. } | ExprKind::Call { .. } => {
                self.tick()?;
                self.eval_chain(expr)
            }
            _ => self.eval_expr(expr).map(Some),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Argument], optional: bool) -> EvalResult<Option<Value>> {
        // Method call: keep the receiver as `this` and dispatch built-in
        // methods without materialising a function value.
        let (receiver, key) = match &callee.kind {
            ExprKind::Member {
                object,
                property,
                optional: link_optional,
            } => {
                let Some(obj) = self.eval_chain_link(object)? else {
                    return Ok(None);
                };
                if *link_optional && obj.is_nullish() {
                    return Ok(None);
                }
                (obj, Value::String(property.name.clone()))
            }
            ExprKind::Index {
                object,
                index,
                optional: link_optional,
            } => {
                let Some(obj) = self.eval_chain_link(object)? else {
                    return Ok(None);
                };
                if *link_optional && obj.is_nullish() {
                    return Ok(None);
                }
                let key = self.eval_expr(index)?;
                (obj, key)
            }
            _ => {
                let Some(func) = self.eval_chain_link(callee)? else {
                    return Ok(None);
                };
                if optional && func.is_nullish() {
                    return Ok(None);
                }
                let args = self.eval_args(args)?;
                return self
                    .call_value(&func, Value::Undefined, args, callee)
                    .map(Some);
            }
        };

        if let Value::String(name) = &key {
            if builtins::is_builtin_method(&receiver, name) && !self.has_own_property(&receiver, name) {
                let args = self.eval_args(args)?;
                return builtins::call_method(self, receiver, name, args).map(Some);
            }
        }
        let func = self.get_indexed(&receiver, &key)?;
        if optional && func.is_nullish() {
            return Ok(None);
        }
        let args = self.eval_args(args)?;
        self.call_value(&func, receiver, args, callee).map(Some)
    }

    fn eval_args(&mut self, args: &[Argument]) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::Positional(e) => values.push(self.eval_expr(e)?),
                Argument::Spread(e) => {
                    let value = self.eval_expr(e)?;
                    values.extend(self.spread_values(e, &value)?);
                }
            }
        }
        Ok(values)
    }

    fn call_value(&mut self, func: &Value, this: Value, args: Vec<Value>, callee: &Expr) -> EvalResult<Value> {
        match func {
            Value::Function(r) => self.call_function(*r, this, args),
            _ => Err(EvalError::type_error(format!(
                "{} is not a function",
                expr_label(callee)
            ))),
        }
    }

    /// Call a function value with an explicit `this` and arguments.
    pub(crate) fn call_function(&mut self, r: HeapRef, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        self.tick()?;
        let kind = match self.heap.function(r) {
            Some(func) => func.kind.clone(),
            None => return Err(EvalError::type_error("value is not a function")),
        };
        match kind {
            FunctionKind::Native { module, name } => builtins::call_native(self, module, name, args),
            FunctionKind::BoundMethod { receiver, method } => {
                builtins::call_method(self, receiver, &method, args)
            }
            FunctionKind::Script { decl, scope } => self.call_script(&decl, scope, this, args),
        }
    }

    fn call_script(&mut self, decl: &Rc<FunctionDecl>, closure: ScopeId, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        if self.call_depth >= self.max_call_depth {
            return Err(EvalError::range_error("Maximum call stack size exceeded"));
        }
        self.call_depth += 1;
        let scope = self.env.push_scope(closure, true);
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = self.invoke(decl, this, args);
        self.scope = saved;
        self.env.pop_scope(scope);
        self.call_depth -= 1;
        result
    }

    fn invoke(&mut self, decl: &FunctionDecl, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        let scope = self.scope;
        if !decl.is_arrow {
            self.env.define(scope, "this", this, BindingKind::Param);
        }
        for (i, param) in decl.params.iter().enumerate() {
            let value = if param.rest {
                let rest = args.get(i..).map(<[Value]>::to_vec).unwrap_or_default();
                self.heap.alloc_array(rest)?
            } else {
                match args.get(i) {
                    Some(v) if *v != Value::Undefined => v.clone(),
                    _ => match &param.default {
                        Some(default) => self.eval_named(default, &param.name.name)?,
                        None => Value::Undefined,
                    },
                }
            };
            self.env
                .define(scope, &param.name.name, value, BindingKind::Param);
        }
        match &decl.body {
            FunctionBody::Expr(body) => self.eval_expr(body),
            FunctionBody::Block(block) => {
                self.hoist_vars(&block.stmts, scope);
                self.hoist_declarations(&block.stmts, scope)?;
                match self.exec_stmts(&block.stmts)? {
                    Flow::Return(value) => Ok(value),
                    _ => Ok(Value::Undefined),
                }
            }
        }
    }

    fn eval_new(&mut self, callee: &Expr, args: &[Argument]) -> EvalResult<Value> {
        let func = self.eval_expr(callee)?;
        let args = self.eval_args(args)?;
        let not_constructor =
            || EvalError::type_error(format!("{} is not a constructor", expr_label(callee)));
        let Value::Function(r) = func else {
            return Err(not_constructor());
        };
        let kind = match self.heap.function(r) {
            Some(f) => f.kind.clone(),
            None => return Err(not_constructor()),
        };
        match kind {
            FunctionKind::Native { module, name } if builtins::is_constructor(module, name) => {
                builtins::call_native(self, module, name, args)
            }
            FunctionKind::Script { decl, .. } if !decl.is_arrow => {
                let instance = self.heap.alloc_object(PropertyMap::new())?;
                let returned = self.call_function(r, instance.clone(), args)?;
                Ok(match returned {
                    Value::Object(_) | Value::Array(_) | Value::Function(_) => returned,
                    _ => instance,
                })
            }
            _ => Err(not_constructor()),
        }
    }

    // ── Properties ───────────────────────────────────────────────────────

    fn read_error(&self, obj: &Value, key: &str) -> EvalError {
        EvalError::type_error(format!(
            "Cannot read properties of {obj} (reading '{key}')"
        ))
    }

    pub(crate) fn has_own_property(&self, obj: &Value, key: &str) -> bool {
        match obj {
            Value::Object(r) | Value::Function(r) => {
                self.heap.props(*r).is_some_and(|p| p.contains(key))
            }
            _ => false,
        }
    }

    /// `obj.key`
    pub(crate) fn get_property(&mut self, obj: &Value, key: &str) -> EvalResult<Value> {
        match obj {
            Value::Undefined | Value::Null => Err(self.read_error(obj, key)),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Some(i) = canonical_index(key) {
                    return Ok(s
                        .chars()
                        .nth(i)
                        .map(|c| Value::String(c.to_string()))
                        .unwrap_or(Value::Undefined));
                }
                self.method_value(obj, key)
            }
            Value::Array(r) => {
                if key == "length" {
                    return Ok(Value::Number(self.heap.array(*r).len() as f64));
                }
                if let Some(i) = canonical_index(key) {
                    return Ok(self
                        .heap
                        .array(*r)
                        .get(i)
                        .cloned()
                        .unwrap_or(Value::Undefined));
                }
                self.method_value(obj, key)
            }
            Value::Object(r) | Value::Function(r) => {
                if let Some(value) = self.heap.props(*r).and_then(|p| p.get(key)) {
                    return Ok(value.clone());
                }
                if key == "name" {
                    if let Some(func) = self.heap.function(*r) {
                        return Ok(Value::String(func.name.clone()));
                    }
                }
                self.method_value(obj, key)
            }
            Value::Number(_) | Value::Bool(_) => self.method_value(obj, key),
        }
    }

    /// A built-in method read as a value, or `undefined`.
    fn method_value(&mut self, obj: &Value, key: &str) -> EvalResult<Value> {
        if builtins::is_builtin_method(obj, key) {
            self.heap.alloc_function(
                FunctionKind::BoundMethod {
                    receiver: obj.clone(),
                    method: key.to_string(),
                },
                key,
            )
        } else {
            Ok(Value::Undefined)
        }
    }

    /// `obj[key]`
    pub(crate) fn get_indexed(&mut self, obj: &Value, key: &Value) -> EvalResult<Value> {
        if let (Value::Array(r), Value::Number(n)) = (obj, key) {
            if let Some(i) = as_index(*n) {
                return Ok(self.heap.array(*r).get(i).cloned().unwrap_or(Value::Undefined));
            }
        }
        let key = self.to_property_key(key)?;
        self.get_property(obj, &key)
    }

    /// `obj.key = value`
    pub(crate) fn set_property(&mut self, obj: &Value, key: &str, value: Value) -> EvalResult<()> {
        match obj {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot set properties of {obj} (setting '{key}')"
            ))),
            Value::Array(r) => {
                if key == "length" {
                    let n = self.to_number(&value)?;
                    let len = as_index(n)
                        .filter(|len| *len <= MAX_ARRAY_LENGTH)
                        .ok_or_else(|| EvalError::range_error("Invalid array length"))?;
                    if let Some(items) = self.heap.array_mut(*r) {
                        items.resize(len, Value::Undefined);
                    }
                    Ok(())
                } else if let Some(i) = canonical_index(key) {
                    self.set_element(*r, i, value)
                } else {
                    Ok(())
                }
            }
            Value::Object(r) | Value::Function(r) => {
                if let Some(props) = self.heap.props_mut(*r) {
                    props.set(key, value);
                }
                Ok(())
            }
            // Writes to primitives are dropped.
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(()),
        }
    }

    fn set_element(&mut self, r: HeapRef, index: usize, value: Value) -> EvalResult<()> {
        if index >= MAX_ARRAY_LENGTH {
            return Err(EvalError::range_error("Invalid array length"));
        }
        if let Some(items) = self.heap.array_mut(r) {
            if index >= items.len() {
                items.resize(index + 1, Value::Undefined);
            }
            items[index] = value;
        }
        Ok(())
    }

    /// `obj[key] = value`
    fn set_indexed(&mut self, obj: &Value, key: &Value, value: Value) -> EvalResult<()> {
        if let (Value::Array(r), Value::Number(n)) = (obj, key) {
            if let Some(i) = as_index(*n) {
                return self.set_element(*r, i, value);
            }
        }
        let key = self.to_property_key(key)?;
        self.set_property(obj, &key, value)
    }

    /// Own enumerable keys, as `for…in` and `Object.keys` see them.
    pub(crate) fn own_keys(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Object(r) | Value::Function(r) => self
                .heap
                .props(*r)
                .map(|p| p.keys().map(str::to_string).collect())
                .unwrap_or_default(),
            Value::Array(r) => (0..self.heap.array(*r).len()).map(|i| i.to_string()).collect(),
            Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// Own key/value pairs, as object spread and `Object.entries` see them.
    pub(crate) fn own_entries(&self, value: &Value) -> Vec<(String, Value)> {
        match value {
            Value::Object(r) | Value::Function(r) => self
                .heap
                .props(*r)
                .map(|p| p.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
                .unwrap_or_default(),
            Value::Array(r) => self
                .heap
                .array(*r)
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
            Value::String(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn spread_values(&self, expr: &Expr, value: &Value) -> EvalResult<Vec<Value>> {
        match value {
            Value::Array(r) => Ok(self.heap.array(*r).to_vec()),
            Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
            other => Err(EvalError::type_error(format!(
                "{} is not iterable",
                self.describe_operand(expr, other)
            ))),
        }
    }

    /// Name an operand for an error message: its source text when it is a
    /// simple reference, otherwise its value.
    fn describe_operand(&self, expr: &Expr, value: &Value) -> String {
        match &expr.kind {
            ExprKind::Identifier(_) | ExprKind::Member { .. } => expr_label(expr),
            _ => match value {
                Value::Object(_) | Value::Array(_) | Value::Function(_) => {
                    "object".to_string()
                }
                primitive => primitive.to_string(),
            },
        }
    }

    // ── Assignment ───────────────────────────────────────────────────────

    fn eval_assign(&mut self, target: &Expr, op: AssignOp, value: &Expr) -> EvalResult<Value> {
        let reference = self.resolve_reference(target)?;
        let new = match op {
            AssignOp::Assign => match &reference {
                Reference::Name(name) => {
                    let name = name.clone();
                    self.eval_named(value, &name)?
                }
                _ => self.eval_expr(value)?,
            },
            AssignOp::Compound(bin) => {
                let current = self.read_reference(&reference)?;
                let rhs = self.eval_expr(value)?;
                self.binary_op(bin, current, rhs)?
            }
            AssignOp::Logical(logical) => {
                let current = self.read_reference(&reference)?;
                if short_circuits(logical, &current) {
                    return Ok(current);
                }
                match &reference {
                    Reference::Name(name) => {
                        let name = name.clone();
                        self.eval_named(value, &name)?
                    }
                    _ => self.eval_expr(value)?,
                }
            }
        };
        self.write_reference(reference, new.clone())?;
        Ok(new)
    }

    fn resolve_reference(&mut self, target: &Expr) -> EvalResult<Reference> {
        match &target.kind {
            ExprKind::Identifier(name) => Ok(Reference::Name(name.clone())),
            ExprKind::Member {
                object, property, ..
            } => {
                let obj = self.eval_expr(object)?;
                Ok(Reference::Property(obj, property.name.clone()))
            }
            ExprKind::Index { object, index, .. } => {
                let obj = self.eval_expr(object)?;
                let key = self.eval_expr(index)?;
                Ok(Reference::Element(obj, key))
            }
            ExprKind::Paren(inner) => self.resolve_reference(inner),
            _ => Err(EvalError::SyntaxError(
                "Invalid left-hand side in assignment".to_string(),
            )),
        }
    }

    fn read_reference(&mut self, reference: &Reference) -> EvalResult<Value> {
        match reference {
            Reference::Name(name) => self.lookup(name),
            Reference::Property(obj, key) => self.get_property(obj, key),
            Reference::Element(obj, key) => self.get_indexed(obj, key),
        }
    }

    fn write_reference(&mut self, reference: Reference, value: Value) -> EvalResult<()> {
        match reference {
            Reference::Name(name) => self.assign_name(&name, value),
            Reference::Property(obj, key) => self.set_property(&obj, &key, value),
            Reference::Element(obj, key) => self.set_indexed(&obj, &key, value),
        }
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        if op == UnaryOp::Typeof {
            // `typeof undeclared` is "undefined", not a ReferenceError.
            if let ExprKind::Identifier(name) = &operand.kind {
                if self.env.lookup(self.scope, name) == Lookup::Missing {
                    return Ok(Value::string("undefined"));
                }
            }
            let value = self.eval_expr(operand)?;
            return Ok(Value::string(value.type_of()));
        }
        let value = self.eval_expr(operand)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
            UnaryOp::Neg => Ok(Value::Number(-self.to_number(&value)?)),
            UnaryOp::Plus => Ok(Value::Number(self.to_number(&value)?)),
            UnaryOp::Typeof => Ok(Value::string(value.type_of())),
        }
    }

    pub(crate) fn binary_op(&mut self, op: BinOp, lv: Value, rv: Value) -> EvalResult<Value> {
        let number = |n: f64| -> EvalResult<Value> { Ok(Value::Number(n)) };
        match op {
            BinOp::Add => self.eval_add(lv, rv),
            BinOp::Sub => number(self.to_number(&lv)? - self.to_number(&rv)?),
            BinOp::Mul => number(self.to_number(&lv)? * self.to_number(&rv)?),
            BinOp::Div => number(self.to_number(&lv)? / self.to_number(&rv)?),
            BinOp::Mod => number(self.to_number(&lv)? % self.to_number(&rv)?),
            BinOp::Pow => number(js_pow(self.to_number(&lv)?, self.to_number(&rv)?)),
            BinOp::StrictEq => Ok(Value::Bool(lv.strict_equals(&rv))),
            BinOp::StrictNotEq => Ok(Value::Bool(!lv.strict_equals(&rv))),
            BinOp::LooseEq => Ok(Value::Bool(self.loose_equals(&lv, &rv)?)),
            BinOp::LooseNotEq => Ok(Value::Bool(!self.loose_equals(&lv, &rv)?)),
            BinOp::Less => {
                let ord = self.compare(&lv, &rv)?;
                Ok(Value::Bool(ord == Some(Ordering::Less)))
            }
            BinOp::Greater => {
                let ord = self.compare(&lv, &rv)?;
                Ok(Value::Bool(ord == Some(Ordering::Greater)))
            }
            BinOp::LessEq => {
                let ord = self.compare(&lv, &rv)?;
                Ok(Value::Bool(matches!(ord, Some(Ordering::Less | Ordering::Equal))))
            }
            BinOp::GreaterEq => {
                let ord = self.compare(&lv, &rv)?;
                Ok(Value::Bool(matches!(
                    ord,
                    Some(Ordering::Greater | Ordering::Equal)
                )))
            }
        }
    }

    fn eval_add(&mut self, lv: Value, rv: Value) -> EvalResult<Value> {
        let lv = self.to_primitive(&lv)?;
        let rv = self.to_primitive(&rv)?;
        match (&lv, &rv) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                let mut text = self.to_string(&lv)?;
                text.push_str(&self.to_string(&rv)?);
                check_string_length(&text)?;
                Ok(Value::String(text))
            }
            _ => Ok(Value::Number(self.to_number(&lv)? + self.to_number(&rv)?)),
        }
    }

    /// Relational comparison; `None` when either side is `NaN`.
    fn compare(&mut self, lv: &Value, rv: &Value) -> EvalResult<Option<Ordering>> {
        let lv = self.to_primitive(lv)?;
        let rv = self.to_primitive(rv)?;
        if let (Value::String(a), Value::String(b)) = (&lv, &rv) {
            return Ok(Some(a.cmp(b)));
        }
        let a = self.to_number(&lv)?;
        let b = self.to_number(&rv)?;
        Ok(a.partial_cmp(&b))
    }

    /// `==` with the usual coercions.
    fn loose_equals(&mut self, lv: &Value, rv: &Value) -> EvalResult<bool> {
        Ok(match (lv, rv) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Bool(b), other) | (other, Value::Bool(b)) => {
                let n = Value::Number(if *b { 1.0 } else { 0.0 });
                return self.loose_equals(&n, other);
            }
            (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
                *n == string_to_number(s)
            }
            (a, b) if a.heap_ref().is_some() != b.heap_ref().is_some() => {
                let a = self.to_primitive(a)?;
                let b = self.to_primitive(b)?;
                return self.loose_equals(&a, &b);
            }
            (a, b) => a.strict_equals(b),
        })
    }

    // ── Conversions ──────────────────────────────────────────────────────

    /// Objects with their own `toString` method convert through it.
    pub(crate) fn to_primitive(&mut self, value: &Value) -> EvalResult<Value> {
        if let Value::Object(r) = value {
            let method = self.heap.props(*r).and_then(|p| p.get("toString")).cloned();
            if let Some(Value::Function(f)) = method {
                let result = self.call_function(f, value.clone(), Vec::new())?;
                if result.heap_ref().is_some() {
                    return Err(EvalError::type_error("Cannot convert object to primitive value"));
                }
                return Ok(result);
            }
        }
        match value {
            Value::Array(_) | Value::Object(_) | Value::Function(_) => {
                Ok(Value::String(self.to_string(value)?))
            }
            primitive => Ok(primitive.clone()),
        }
    }

    pub(crate) fn to_number(&self, value: &Value) -> EvalResult<f64> {
        Ok(match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_string(value)?),
            Value::Object(_) | Value::Function(_) => f64::NAN,
        })
    }

    pub(crate) fn to_string(&self, value: &Value) -> EvalResult<String> {
        format::to_display_string(&self.heap, value)
    }

    pub(crate) fn to_property_key(&self, value: &Value) -> EvalResult<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(number_to_string(*n)),
            other => self.to_string(other),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn binding_kind(kind: DeclKind) -> BindingKind {
    match kind {
        DeclKind::Let => BindingKind::Let,
        DeclKind::Const => BindingKind::Const,
        DeclKind::Var => BindingKind::Var,
    }
}

/// Whether `left` alone decides the result of `left op right`.
fn short_circuits(op: LogicalOp, left: &Value) -> bool {
    match op {
        LogicalOp::And => !left.is_truthy(),
        LogicalOp::Or => left.is_truthy(),
        LogicalOp::Nullish => !left.is_nullish(),
    }
}

pub(crate) fn check_string_length(text: &str) -> EvalResult<()> {
    if text.len() > MAX_STRING_LENGTH {
        Err(EvalError::range_error("Invalid string length"))
    } else {
        Ok(())
    }
}

/// `**`: unlike `powf`, `1 ** NaN` and `1 ** Infinity` are `NaN`.
pub(crate) fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

/// Does this block declare anything that needs its own scope?
fn declares_lexically(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::VarDecl(decl) => decl.kind != DeclKind::Var,
        Stmt::Function(_) => true,
        _ => false,
    })
}

fn collect_var_names<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a str>) {
    for stmt in stmts {
        collect_var_names_in(stmt, out);
    }
}

fn collect_var_names_in<'a>(stmt: &'a Stmt, out: &mut Vec<&'a str>) {
    match stmt {
        Stmt::VarDecl(decl) if decl.kind == DeclKind::Var => {
            out.extend(decl.declarators.iter().map(|d| d.name.name.as_str()));
        }
        Stmt::Block(block) => collect_var_names(&block.stmts, out),
        Stmt::If(s) => {
            collect_var_names_in(&s.then_branch, out);
            if let Some(else_branch) = &s.else_branch {
                collect_var_names_in(else_branch, out);
            }
        }
        Stmt::While(s) => collect_var_names_in(&s.body, out),
        Stmt::DoWhile(s) => collect_var_names_in(&s.body, out),
        Stmt::For(s) => {
            if let Some(ForInit::VarDecl(decl)) = &s.init {
                if decl.kind == DeclKind::Var {
                    out.extend(decl.declarators.iter().map(|d| d.name.name.as_str()));
                }
            }
            collect_var_names_in(&s.body, out);
        }
        Stmt::ForEach(s) => {
            if s.decl == Some(DeclKind::Var) {
                out.push(s.binding.name.as_str());
            }
            collect_var_names_in(&s.body, out);
        }
        Stmt::Try(s) => {
            collect_var_names(&s.block.stmts, out);
            if let Some(handler) = &s.handler {
                collect_var_names(&handler.body.stmts, out);
            }
            if let Some(finalizer) = &s.finalizer {
                collect_var_names(&finalizer.stmts, out);
            }
        }
        _ => {}
    }
}

/// Source-like label for a callee in "is not a function" messages.
fn expr_label(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::Member {
            object, property, ..
        } => format!("{}.{}", expr_label(object), property.name),
        ExprKind::Index { object, index, .. } => {
            let key = match &index.kind {
                ExprKind::NumberLit(n) => number_to_string(*n),
                ExprKind::StringLit(s) => format!("\"{s}\""),
                ExprKind::Identifier(name) => name.clone(),
                _ => "...".to_string(),
            };
            format!("{}[{key}]", expr_label(object))
        }
        ExprKind::Call { callee, .. } => format!("{}(...)", expr_label(callee)),
        ExprKind::Paren(inner) => expr_label(inner),
        _ => "(intermediate value)".to_string(),
    }
}
