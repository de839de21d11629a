//! Per-run object arena.
//!
//! Arrays, objects and functions are allocated here and referenced through
//! [`HeapRef`]. The arena lives exactly as long as one evaluation, so nothing
//! is ever freed individually; the allocation count is capped instead.

use crate::env::ScopeId;
use crate::error::{EvalError, EvalResult};
use crate::value::{HeapRef, Value};
use scriptlab_types::ast::FunctionDecl;
use std::rc::Rc;

/// String-keyed properties in enumeration order: array-index keys first,
/// ascending, then the other keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, Value)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or overwrite. A new index key slots in among the index keys;
    /// any other new key goes to the end.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *slot = value;
            return;
        }
        match array_index(&key) {
            Some(index) => {
                let at = self
                    .entries
                    .iter()
                    .position(|(k, _)| array_index(k).map_or(true, |other| other > index))
                    .unwrap_or(self.entries.len());
                self.entries.insert(at, (key, value));
            }
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The index a key names when it is a canonical array index (`"0"`, `"17"`;
/// not `"01"` or `"-1"`).
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|&n| n != u32::MAX)
}

/// Distinguishes plain records from error instances, which print and
/// serialize differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Plain,
    Error,
}

#[derive(Debug, Clone)]
pub struct ObjectData {
    pub class: ObjectClass,
    pub props: PropertyMap,
}

/// What a function value does when called.
#[derive(Debug, Clone)]
pub enum FunctionKind {
    /// A script-defined function or arrow, closed over `scope`.
    Script { decl: Rc<FunctionDecl>, scope: ScopeId },
    /// A built-in, dispatched by `module` and `name`.
    Native {
        module: &'static str,
        name: &'static str,
    },
    /// A built-in method read off a value without calling it, e.g.
    /// `const up = "x".toUpperCase`.
    BoundMethod { receiver: Value, method: String },
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub kind: FunctionKind,
    /// Display name; empty for anonymous functions.
    pub name: String,
    /// Static members, e.g. `Number.isInteger`.
    pub props: PropertyMap,
}

#[derive(Debug, Clone)]
pub enum HeapObject {
    Array(Vec<Value>),
    Object(ObjectData),
    Function(FunctionData),
}

/// The object arena.
#[derive(Debug)]
pub struct Heap {
    objects: Vec<HeapObject>,
    max_objects: usize,
}

impl Heap {
    pub fn new(max_objects: usize) -> Self {
        Self {
            objects: Vec::new(),
            max_objects,
        }
    }

    /// Number of live allocations.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn alloc(&mut self, object: HeapObject) -> EvalResult<HeapRef> {
        if self.objects.len() >= self.max_objects {
            return Err(EvalError::HeapLimitExceeded(self.max_objects));
        }
        self.objects.push(object);
        Ok(HeapRef(self.objects.len() - 1))
    }

    pub fn alloc_array(&mut self, items: Vec<Value>) -> EvalResult<Value> {
        self.alloc(HeapObject::Array(items)).map(Value::Array)
    }

    pub fn alloc_object(&mut self, props: PropertyMap) -> EvalResult<Value> {
        self.alloc(HeapObject::Object(ObjectData {
            class: ObjectClass::Plain,
            props,
        }))
        .map(Value::Object)
    }

    /// Allocate an error instance carrying `name` and `message`.
    pub fn alloc_error(&mut self, name: &str, message: &str) -> EvalResult<Value> {
        let mut props = PropertyMap::new();
        props.set("name", Value::string(name));
        props.set("message", Value::string(message));
        self.alloc(HeapObject::Object(ObjectData {
            class: ObjectClass::Error,
            props,
        }))
        .map(Value::Object)
    }

    pub fn alloc_function(&mut self, kind: FunctionKind, name: impl Into<String>) -> EvalResult<Value> {
        self.alloc(HeapObject::Function(FunctionData {
            kind,
            name: name.into(),
            props: PropertyMap::new(),
        }))
        .map(Value::Function)
    }

    pub fn get(&self, r: HeapRef) -> &HeapObject {
        &self.objects[r.0]
    }

    pub fn get_mut(&mut self, r: HeapRef) -> &mut HeapObject {
        &mut self.objects[r.0]
    }

    /// Elements of an array; empty for anything else.
    pub fn array(&self, r: HeapRef) -> &[Value] {
        match self.get(r) {
            HeapObject::Array(items) => items,
            _ => &[],
        }
    }

    pub fn array_mut(&mut self, r: HeapRef) -> Option<&mut Vec<Value>> {
        match self.get_mut(r) {
            HeapObject::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Own properties of an object or function.
    pub fn props(&self, r: HeapRef) -> Option<&PropertyMap> {
        match self.get(r) {
            HeapObject::Object(obj) => Some(&obj.props),
            HeapObject::Function(func) => Some(&func.props),
            HeapObject::Array(_) => None,
        }
    }

    pub fn props_mut(&mut self, r: HeapRef) -> Option<&mut PropertyMap> {
        match self.get_mut(r) {
            HeapObject::Object(obj) => Some(&mut obj.props),
            HeapObject::Function(func) => Some(&mut func.props),
            HeapObject::Array(_) => None,
        }
    }

    pub fn function(&self, r: HeapRef) -> Option<&FunctionData> {
        match self.get(r) {
            HeapObject::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn is_error(&self, r: HeapRef) -> bool {
        matches!(
            self.get(r),
            HeapObject::Object(ObjectData {
                class: ObjectClass::Error,
                ..
            })
        )
    }
}
