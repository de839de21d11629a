//! Value rendering: string conversion, log display and JSON.

use crate::error::{EvalError, EvalResult};
use crate::heap::{Heap, HeapObject, ObjectClass};
use crate::value::{HeapRef, Value};
use serde::Serialize;
use serde_json::Value as Json;

/// Nesting limit for rendering nested arrays and objects.
pub const MAX_RENDER_DEPTH: usize = 200;

fn too_deep() -> EvalError {
    EvalError::range_error("Maximum call stack size exceeded")
}

/// `[Function: name]` or `[Function (anonymous)]`.
pub fn function_label(heap: &Heap, r: HeapRef) -> String {
    match heap.function(r) {
        Some(func) if !func.name.is_empty() => format!("[Function: {}]", func.name),
        _ => "[Function (anonymous)]".to_string(),
    }
}

/// `Name: message` text of an error instance.
pub fn error_summary(heap: &Heap, r: HeapRef) -> String {
    let props = match heap.props(r) {
        Some(props) => props,
        None => return "Error".to_string(),
    };
    let name = match props.get("name") {
        Some(Value::String(s)) => s.clone(),
        _ => "Error".to_string(),
    };
    let message = match props.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Undefined) | None => String::new(),
        Some(other) => other.to_string(),
    };
    if message.is_empty() {
        name
    } else {
        format!("{name}: {message}")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// String conversion
// ══════════════════════════════════════════════════════════════════════════════

/// The string a value turns into under `+`, template interpolation and
/// `String(x)`: arrays join with `,`, plain objects are `[object Object]`.
pub fn to_display_string(heap: &Heap, value: &Value) -> EvalResult<String> {
    let mut seen = Vec::new();
    stringify(heap, value, &mut seen)
}

fn stringify(heap: &Heap, value: &Value, seen: &mut Vec<HeapRef>) -> EvalResult<String> {
    match value {
        Value::Array(r) => {
            if seen.contains(r) {
                return Ok(String::new());
            }
            if seen.len() >= MAX_RENDER_DEPTH {
                return Err(too_deep());
            }
            seen.push(*r);
            let mut parts = Vec::with_capacity(heap.array(*r).len());
            for item in heap.array(*r) {
                parts.push(match item {
                    Value::Undefined | Value::Null => String::new(),
                    other => stringify(heap, other, seen)?,
                });
            }
            seen.pop();
            Ok(parts.join(","))
        }
        Value::Object(r) if heap.is_error(*r) => Ok(error_summary(heap, *r)),
        Value::Object(_) => Ok("[object Object]".to_string()),
        Value::Function(r) => Ok(function_label(heap, *r)),
        primitive => Ok(primitive.to_string()),
    }
}

/// The text `console.log` prints for one argument. Error instances have no
/// enumerable properties, so they print as `{}` at any depth.
pub fn display_value(heap: &Heap, value: &Value) -> EvalResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Function(r) => Ok(function_label(heap, *r)),
        Value::Array(_) | Value::Object(_) => {
            let json = to_json(heap, value)?.unwrap_or(Json::Null);
            serde_json::to_string(&json).map_err(|e| EvalError::type_error(e.to_string()))
        }
        primitive => Ok(primitive.to_string()),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// JSON
// ══════════════════════════════════════════════════════════════════════════════

fn number_to_json(n: f64) -> Json {
    if !n.is_finite() {
        return Json::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Json::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .unwrap_or(Json::Null)
}

/// Convert a value to JSON. `None` means the value has no JSON form
/// (`undefined` or a function) and is skipped by the caller.
pub fn to_json(heap: &Heap, value: &Value) -> EvalResult<Option<Json>> {
    let mut seen = Vec::new();
    json_of(heap, value, &mut seen)
}

fn json_of(heap: &Heap, value: &Value, seen: &mut Vec<HeapRef>) -> EvalResult<Option<Json>> {
    let r = match value {
        Value::Undefined | Value::Function(_) => return Ok(None),
        Value::Null => return Ok(Some(Json::Null)),
        Value::Bool(b) => return Ok(Some(Json::Bool(*b))),
        Value::Number(n) => return Ok(Some(number_to_json(*n))),
        Value::String(s) => return Ok(Some(Json::String(s.clone()))),
        Value::Array(r) | Value::Object(r) => *r,
    };
    if seen.contains(&r) {
        return Err(EvalError::type_error("Converting circular structure to JSON"));
    }
    if seen.len() >= MAX_RENDER_DEPTH {
        return Err(too_deep());
    }
    seen.push(r);
    let json = match heap.get(r) {
        HeapObject::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(json_of(heap, item, seen)?.unwrap_or(Json::Null));
            }
            Json::Array(out)
        }
        HeapObject::Object(obj) if obj.class == ObjectClass::Error => {
            Json::Object(serde_json::Map::new())
        }
        HeapObject::Object(obj) => {
            let mut map = serde_json::Map::new();
            for (key, item) in obj.props.iter() {
                if let Some(json) = json_of(heap, item, seen)? {
                    map.insert(key.to_string(), json);
                }
            }
            Json::Object(map)
        }
        HeapObject::Function(_) => Json::Null,
    };
    seen.pop();
    Ok(Some(json))
}

/// `JSON.stringify(value, null, indent)`. An empty indent means compact.
pub fn json_stringify(heap: &Heap, value: &Value, indent: &str) -> EvalResult<Option<String>> {
    let json = match to_json(heap, value)? {
        Some(json) => json,
        None => return Ok(None),
    };
    if indent.is_empty() {
        return serde_json::to_string(&json)
            .map(Some)
            .map_err(|e| EvalError::type_error(e.to_string()));
    }
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    json.serialize(&mut ser)
        .map_err(|e| EvalError::type_error(e.to_string()))?;
    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| EvalError::type_error(e.to_string()))
}

/// Build a script value from parsed JSON, allocating arrays and objects.
pub fn from_json(heap: &mut Heap, json: Json) -> EvalResult<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::String(s),
        Json::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(from_json(heap, item)?);
            }
            heap.alloc_array(out)?
        }
        Json::Object(map) => {
            let mut props = crate::heap::PropertyMap::new();
            for (key, item) in map {
                let value = from_json(heap, item)?;
                props.set(key, value);
            }
            heap.alloc_object(props)?
        }
    })
}
