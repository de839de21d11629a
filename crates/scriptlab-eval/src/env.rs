//! Scoped variable environment for the scriptlab evaluator.
//!
//! Scopes live in an arena and point at their parent, so a closure can keep
//! its defining scope alive after the block that created it has finished.
//! Scopes that were never captured are popped as soon as they end.

use crate::value::Value;

/// Index of a scope in the [`Environment`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// How a binding was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Let,
    Const,
    Var,
    Function,
    Param,
}

#[derive(Debug, Clone)]
struct Binding {
    name: String,
    value: Value,
    kind: BindingKind,
    /// `false` between block entry and the `let`/`const` statement.
    initialized: bool,
}

#[derive(Debug, Clone)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: Vec<Binding>,
    /// Function bodies and the script top level hold `var` bindings.
    function_scope: bool,
    /// A closure refers to this scope, so it must outlive its block.
    captured: bool,
}

/// Outcome of a name lookup.
#[derive(Debug, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    /// Declared with `let`/`const` but not yet initialized.
    Uninitialized,
    Missing,
}

/// Outcome of an assignment to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assign {
    Done,
    Constant,
    Uninitialized,
    Missing,
}

/// Arena of lexical scopes.
///
/// Variables are looked up from the given scope outward through parents.
/// `define` always writes into the given scope; `assign` updates the first
/// scope on the chain where the name exists.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    /// Create an environment holding only the root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                bindings: Vec::new(),
                function_scope: true,
                captured: true,
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Number of scopes currently held.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Push a new scope whose parent is `parent`.
    pub fn push_scope(&mut self, parent: ScopeId, function_scope: bool) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            bindings: Vec::new(),
            function_scope,
            captured: false,
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// End a scope. It is released only when it is the newest scope and no
    /// closure captured it.
    pub fn pop_scope(&mut self, id: ScopeId) {
        if id.0 + 1 == self.scopes.len() && id.0 != 0 && !self.scopes[id.0].captured {
            self.scopes.pop();
        }
    }

    /// Mark a scope as referenced by a closure.
    pub fn capture(&mut self, id: ScopeId) {
        self.scopes[id.0].captured = true;
    }

    /// Nearest enclosing scope that holds `var` bindings.
    pub fn function_scope(&self, mut id: ScopeId) -> ScopeId {
        loop {
            let scope = &self.scopes[id.0];
            match scope.parent {
                Some(parent) if !scope.function_scope => id = parent,
                _ => return id,
            }
        }
    }

    fn find_own(&self, id: ScopeId, name: &str) -> Option<usize> {
        self.scopes[id.0].bindings.iter().position(|b| b.name == name)
    }

    /// Whether `name` is declared directly in `id`.
    pub fn has_own(&self, id: ScopeId, name: &str) -> bool {
        self.find_own(id, name).is_some()
    }

    /// Define an initialized binding in `id`, replacing any existing one.
    pub fn define(&mut self, id: ScopeId, name: &str, value: Value, kind: BindingKind) {
        let scope = &mut self.scopes[id.0];
        match scope.bindings.iter_mut().find(|b| b.name == name) {
            Some(binding) => {
                binding.value = value;
                binding.kind = kind;
                binding.initialized = true;
            }
            None => scope.bindings.push(Binding {
                name: name.to_string(),
                value,
                kind,
                initialized: true,
            }),
        }
    }

    /// Reserve a `let`/`const` name in `id` ahead of its declaration.
    /// Returns `false` if the name is already declared in that scope.
    pub fn declare_uninitialized(&mut self, id: ScopeId, name: &str, kind: BindingKind) -> bool {
        if self.has_own(id, name) {
            return false;
        }
        self.scopes[id.0].bindings.push(Binding {
            name: name.to_string(),
            value: Value::Undefined,
            kind,
            initialized: false,
        });
        true
    }

    /// Look a name up from `id` outward.
    pub fn lookup(&self, mut id: ScopeId, name: &str) -> Lookup<'_> {
        loop {
            let scope = &self.scopes[id.0];
            if let Some(binding) = scope.bindings.iter().find(|b| b.name == name) {
                return if binding.initialized {
                    Lookup::Found(&binding.value)
                } else {
                    Lookup::Uninitialized
                };
            }
            match scope.parent {
                Some(parent) => id = parent,
                None => return Lookup::Missing,
            }
        }
    }

    /// Update the nearest binding of `name` visible from `id`.
    pub fn assign(&mut self, mut id: ScopeId, name: &str, value: Value) -> Assign {
        loop {
            let parent = self.scopes[id.0].parent;
            if let Some(binding) = self.scopes[id.0]
                .bindings
                .iter_mut()
                .find(|b| b.name == name)
            {
                if !binding.initialized {
                    return Assign::Uninitialized;
                }
                if binding.kind == BindingKind::Const {
                    return Assign::Constant;
                }
                binding.value = value;
                return Assign::Done;
            }
            match parent {
                Some(parent) => id = parent,
                None => return Assign::Missing,
            }
        }
    }

    /// Snapshot of the bindings declared directly in `id`, used to give each
    /// loop iteration its own copy of the loop variables.
    pub fn own_bindings(&self, id: ScopeId) -> Vec<(String, Value, BindingKind)> {
        self.scopes[id.0]
            .bindings
            .iter()
            .filter(|b| b.initialized)
            .map(|b| (b.name.clone(), b.value.clone(), b.kind))
            .collect()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let mut env = Environment::new();
        let root = env.root();
        env.define(root, "x", Value::Number(1.0), BindingKind::Let);
        let inner = env.push_scope(root, false);
        assert_eq!(env.lookup(inner, "x"), Lookup::Found(&Value::Number(1.0)));
        assert_eq!(env.lookup(inner, "y"), Lookup::Missing);
    }

    #[test]
    fn test_shadowing_and_assign() {
        let mut env = Environment::new();
        let root = env.root();
        env.define(root, "x", Value::Number(1.0), BindingKind::Let);
        let inner = env.push_scope(root, false);
        env.define(inner, "x", Value::Number(2.0), BindingKind::Let);
        assert_eq!(env.assign(inner, "x", Value::Number(3.0)), Assign::Done);
        env.pop_scope(inner);
        assert_eq!(env.lookup(root, "x"), Lookup::Found(&Value::Number(1.0)));
    }

    #[test]
    fn test_const_and_uninitialized() {
        let mut env = Environment::new();
        let root = env.root();
        env.define(root, "k", Value::Null, BindingKind::Const);
        assert_eq!(env.assign(root, "k", Value::Null), Assign::Constant);
        assert!(env.declare_uninitialized(root, "later", BindingKind::Let));
        assert!(!env.declare_uninitialized(root, "later", BindingKind::Let));
        assert_eq!(env.lookup(root, "later"), Lookup::Uninitialized);
        assert_eq!(env.assign(root, "later", Value::Null), Assign::Uninitialized);
    }

    #[test]
    fn test_captured_scope_survives_pop() {
        let mut env = Environment::new();
        let root = env.root();
        let a = env.push_scope(root, false);
        env.capture(a);
        env.pop_scope(a);
        assert_eq!(env.len(), 2);
        let b = env.push_scope(root, false);
        env.pop_scope(b);
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_function_scope_lookup() {
        let mut env = Environment::new();
        let root = env.root();
        let func = env.push_scope(root, true);
        let block = env.push_scope(func, false);
        assert_eq!(env.function_scope(block), func);
        assert_eq!(env.function_scope(root), root);
    }
}
