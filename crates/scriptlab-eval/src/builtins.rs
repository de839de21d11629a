//! Built-in globals and methods.
//!
//! Native functions are dispatched by `(module, name)` pairs recorded in
//! [`FunctionKind::Native`]. Methods on arrays, strings and numbers are not
//! heap objects at all: the evaluator routes `value.method(...)` straight to
//! [`call_method`].

use crate::env::{BindingKind, ScopeId};
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{check_string_length, js_pow, Evaluator, MAX_ARRAY_LENGTH, MAX_STRING_LENGTH};
use crate::format;
use crate::heap::{FunctionKind, PropertyMap};
use crate::value::{as_index, number_to_string, HeapRef, Value};
use std::cmp::Ordering;

const MATH_FUNCTIONS: &[&str] = &[
    "abs", "floor", "ceil", "round", "trunc", "sign", "sqrt", "cbrt", "pow", "min", "max",
    "random", "log", "log2", "log10", "exp", "sin", "cos", "tan", "asin", "acos", "atan",
    "atan2", "hypot",
];

const ARRAY_METHODS: &[&str] = &[
    "push", "pop", "shift", "unshift", "slice", "splice", "concat", "join", "indexOf",
    "lastIndexOf", "includes", "reverse", "map", "filter", "forEach", "reduce", "find",
    "findIndex", "some", "every", "sort", "flat", "fill", "at", "toString",
];

const STRING_METHODS: &[&str] = &[
    "toUpperCase", "toLowerCase", "trim", "trimStart", "trimEnd", "includes", "startsWith",
    "endsWith", "indexOf", "lastIndexOf", "slice", "substring", "split", "replace",
    "replaceAll", "repeat", "padStart", "padEnd", "charAt", "charCodeAt", "at", "concat",
    "toString",
];

const NUMBER_METHODS: &[&str] = &["toFixed", "toString"];
const BOOL_METHODS: &[&str] = &["toString"];
const OBJECT_METHODS: &[&str] = &["hasOwnProperty", "toString"];

const ERROR_CONSTRUCTORS: &[&str] = &[
    "Error",
    "TypeError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
];

/// Global functions that also work with `new`.
const CONSTRUCTORS: &[&str] = &["Array", "Object", "String", "Number", "Boolean"];

fn not_a_function(name: &str) -> EvalError {
    EvalError::type_error(format!("{name} is not a function"))
}

fn invalid_array_length() -> EvalError {
    EvalError::range_error("Invalid array length")
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn number_arg(ev: &Evaluator, args: &[Value], index: usize) -> EvalResult<f64> {
    ev.to_number(&arg(args, index))
}

/// ToIntegerOrInfinity: `NaN` becomes 0, fractions truncate.
fn integer_arg(ev: &Evaluator, args: &[Value], index: usize) -> EvalResult<f64> {
    let n = number_arg(ev, args, index)?;
    Ok(if n.is_nan() { 0.0 } else { n.trunc() })
}

/// A start/end argument that counts from the end when negative.
fn relative_index(ev: &Evaluator, value: Option<&Value>, len: usize, default: usize) -> EvalResult<usize> {
    let n = match value {
        None | Some(Value::Undefined) => return Ok(default),
        Some(v) => ev.to_number(v)?,
    };
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    Ok(if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    })
}

/// A position argument clamped into `0..=len`.
fn clamp_index(ev: &Evaluator, value: Option<&Value>, len: usize, default: usize) -> EvalResult<usize> {
    let n = match value {
        None | Some(Value::Undefined) => return Ok(default),
        Some(v) => ev.to_number(v)?,
    };
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    Ok(n.clamp(0.0, len as f64) as usize)
}

fn callable(value: Option<&Value>) -> EvalResult<HeapRef> {
    match value {
        Some(Value::Function(r)) => Ok(*r),
        Some(other) => Err(EvalError::type_error(format!("{other} is not a function"))),
        None => Err(EvalError::type_error("undefined is not a function")),
    }
}

fn require_object_coercible(value: &Value) -> EvalResult<()> {
    if value.is_nullish() {
        Err(EvalError::type_error(
            "Cannot convert undefined or null to object",
        ))
    } else {
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Installation
// ══════════════════════════════════════════════════════════════════════════════

fn native(ev: &mut Evaluator, module: &'static str, name: &'static str) -> EvalResult<Value> {
    ev.heap.alloc_function(FunctionKind::Native { module, name }, name)
}

/// A global function carrying static members, e.g. `Number.isInteger`.
fn constructor(ev: &mut Evaluator, name: &'static str, statics: &[&'static str]) -> EvalResult<Value> {
    let ctor = native(ev, "global", name)?;
    if let Some(r) = ctor.heap_ref() {
        for member in statics {
            let func = native(ev, name, *member)?;
            if let Some(props) = ev.heap.props_mut(r) {
                props.set(*member, func);
            }
        }
    }
    Ok(ctor)
}

/// Define the built-in globals in `scope`. The only capability exposed is
/// logging: `console.log` and its alias `log` are the same function.
pub(crate) fn install_globals(ev: &mut Evaluator, scope: ScopeId) -> EvalResult<()> {
    let mut globals: Vec<(&str, Value)> = Vec::new();

    let log = native(ev, "console", "log")?;
    let mut console = PropertyMap::new();
    console.set("log", log.clone());
    globals.push(("console", ev.heap.alloc_object(console)?));
    globals.push(("log", log));

    let mut math = PropertyMap::new();
    for name in MATH_FUNCTIONS {
        math.set(*name, native(ev, "Math", *name)?);
    }
    for (name, value) in [
        ("PI", std::f64::consts::PI),
        ("E", std::f64::consts::E),
        ("SQRT2", std::f64::consts::SQRT_2),
        ("LN2", std::f64::consts::LN_2),
        ("LN10", std::f64::consts::LN_10),
    ] {
        math.set(name, Value::Number(value));
    }
    globals.push(("Math", ev.heap.alloc_object(math)?));

    let mut json = PropertyMap::new();
    json.set("stringify", native(ev, "JSON", "stringify")?);
    json.set("parse", native(ev, "JSON", "parse")?);
    globals.push(("JSON", ev.heap.alloc_object(json)?));

    globals.push((
        "Object",
        constructor(
            ev,
            "Object",
            &["keys", "values", "entries", "assign", "fromEntries", "freeze"],
        )?,
    ));
    globals.push(("Array", constructor(ev, "Array", &["isArray", "from", "of"])?));
    globals.push(("String", constructor(ev, "String", &[])?));
    globals.push(("Boolean", constructor(ev, "Boolean", &[])?));

    let number = constructor(
        ev,
        "Number",
        &["isInteger", "isFinite", "isNaN", "isSafeInteger", "parseFloat", "parseInt"],
    )?;
    let constants = [
        ("MAX_SAFE_INTEGER", 9_007_199_254_740_991.0),
        ("MIN_SAFE_INTEGER", -9_007_199_254_740_991.0),
        ("EPSILON", f64::EPSILON),
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("NaN", f64::NAN),
    ];
    if let Some(r) = number.heap_ref() {
        if let Some(props) = ev.heap.props_mut(r) {
            for (name, value) in constants {
                props.set(name, Value::Number(value));
            }
        }
    }
    globals.push(("Number", number));

    for name in ["parseInt", "parseFloat", "isNaN", "isFinite"] {
        globals.push((name, native(ev, "global", name)?));
    }
    for name in ERROR_CONSTRUCTORS {
        globals.push((*name, native(ev, "global", *name)?));
    }
    globals.push(("NaN", Value::Number(f64::NAN)));
    globals.push(("Infinity", Value::Number(f64::INFINITY)));

    for (name, value) in globals {
        ev.env.define(scope, name, value, BindingKind::Var);
    }
    Ok(())
}

/// Whether `new` accepts this native function.
pub(crate) fn is_constructor(module: &str, name: &str) -> bool {
    module == "global" && (ERROR_CONSTRUCTORS.contains(&name) || CONSTRUCTORS.contains(&name))
}

// ══════════════════════════════════════════════════════════════════════════════
// Native functions
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) fn call_native(ev: &mut Evaluator, module: &str, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    match module {
        "console" => console_log(ev, &args),
        "Math" => math_function(ev, name, &args),
        "JSON" => json_function(ev, name, &args),
        "Object" => object_static(ev, name, &args),
        "Array" => array_static(ev, name, args),
        "Number" => number_static(ev, name, &args),
        _ => global_function(ev, name, args),
    }
}

fn console_log(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Value> {
    let mut parts = Vec::with_capacity(args.len());
    for value in args {
        parts.push(format::display_value(&ev.heap, value)?);
    }
    ev.output.push(parts.join(" "))?;
    Ok(Value::Undefined)
}

fn math_function(ev: &mut Evaluator, name: &str, args: &[Value]) -> EvalResult<Value> {
    let x = number_arg(ev, args, 0)?;
    let result = match name {
        "abs" => x.abs(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => js_round(x),
        "trunc" => x.trunc(),
        "sign" => {
            if x.is_nan() || x == 0.0 {
                x
            } else {
                x.signum()
            }
        }
        "sqrt" => x.sqrt(),
        "cbrt" => x.cbrt(),
        "log" => x.ln(),
        "log2" => x.log2(),
        "log10" => x.log10(),
        "exp" => x.exp(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        "atan2" => x.atan2(number_arg(ev, args, 1)?),
        "pow" => js_pow(x, number_arg(ev, args, 1)?),
        "hypot" => {
            let mut acc = 0.0_f64;
            for value in args {
                acc = acc.hypot(ev.to_number(value)?);
            }
            acc
        }
        "min" => min_max(ev, args, false)?,
        "max" => min_max(ev, args, true)?,
        "random" => next_random(ev),
        _ => return Err(not_a_function(name)),
    };
    Ok(Value::Number(result))
}

/// Round half up, as `Math.round` does (`-2.5` rounds to `-2`).
fn js_round(x: f64) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

fn min_max(ev: &Evaluator, args: &[Value], pick_max: bool) -> EvalResult<f64> {
    let mut result = if pick_max {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    };
    for value in args {
        let n = ev.to_number(value)?;
        if n.is_nan() {
            return Ok(f64::NAN);
        }
        if (pick_max && n > result) || (!pick_max && n < result) {
            result = n;
        }
    }
    Ok(result)
}

/// xorshift64* in `[0, 1)`.
fn next_random(ev: &mut Evaluator) -> f64 {
    let mut x = ev.rng_state;
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    ev.rng_state = x;
    (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
}

fn json_function(ev: &mut Evaluator, name: &str, args: &[Value]) -> EvalResult<Value> {
    match name {
        "stringify" => {
            let indent = match arg(args, 2) {
                Value::Number(n) => " ".repeat(n.clamp(0.0, 10.0) as usize),
                Value::String(s) => s.chars().take(10).collect(),
                _ => String::new(),
            };
            let text = format::json_stringify(&ev.heap, &arg(args, 0), &indent)?;
            Ok(text.map(Value::String).unwrap_or(Value::Undefined))
        }
        "parse" => {
            let text = ev.to_string(&arg(args, 0))?;
            let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
                EvalError::SyntaxError(format!(
                    "Unexpected token in JSON at line {} column {}",
                    e.line(),
                    e.column()
                ))
            })?;
            format::from_json(&mut ev.heap, json)
        }
        _ => Err(not_a_function(name)),
    }
}

fn object_static(ev: &mut Evaluator, name: &str, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    match name {
        "keys" | "values" | "entries" => {
            require_object_coercible(&target)?;
            let entries = ev.own_entries(&target);
            ev.charge(entries.len())?;
            let mut items = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                items.push(match name {
                    "keys" => Value::String(key),
                    "values" => value,
                    _ => ev.heap.alloc_array(vec![Value::String(key), value])?,
                });
            }
            ev.heap.alloc_array(items)
        }
        "assign" => {
            require_object_coercible(&target)?;
            for source in args.iter().skip(1) {
                for (key, value) in ev.own_entries(source) {
                    ev.set_property(&target, &key, value)?;
                }
            }
            Ok(target)
        }
        "fromEntries" => {
            let pairs = match &target {
                Value::Array(r) => ev.heap.array(*r).to_vec(),
                other => return Err(EvalError::type_error(format!("{other} is not iterable"))),
            };
            let mut props = PropertyMap::new();
            for pair in pairs {
                let (key, value) = match &pair {
                    Value::Array(r) => {
                        let items = ev.heap.array(*r);
                        (arg(items, 0), arg(items, 1))
                    }
                    _ => {
                        return Err(EvalError::type_error(
                            "Iterator value is not an entry object",
                        ))
                    }
                };
                props.set(ev.to_property_key(&key)?, value);
            }
            ev.heap.alloc_object(props)
        }
        // Objects are never frozen; the call just hands its argument back.
        "freeze" => Ok(target),
        _ => Err(not_a_function(name)),
    }
}

fn array_static(ev: &mut Evaluator, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    match name {
        "isArray" => Ok(Value::Bool(matches!(args.first(), Some(Value::Array(_))))),
        "of" => ev.heap.alloc_array(args),
        "from" => {
            let source = arg(&args, 0);
            let items = match &source {
                Value::Array(r) => ev.heap.array(*r).to_vec(),
                Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
                Value::Object(_) => {
                    let len = ev.get_property(&source, "length")?;
                    let len = as_index(ev.to_number(&len)?).unwrap_or(0);
                    if len > MAX_ARRAY_LENGTH {
                        return Err(invalid_array_length());
                    }
                    ev.charge(len)?;
                    let mut items = Vec::with_capacity(len);
                    for i in 0..len {
                        items.push(ev.get_property(&source, &i.to_string())?);
                    }
                    items
                }
                _ => Vec::new(),
            };
            ev.charge(items.len())?;
            let items = match args.get(1) {
                Some(Value::Function(f)) => {
                    let mut mapped = Vec::with_capacity(items.len());
                    for (i, item) in items.into_iter().enumerate() {
                        mapped.push(ev.call_function(
                            *f,
                            Value::Undefined,
                            vec![item, Value::Number(i as f64)],
                        )?);
                    }
                    mapped
                }
                _ => items,
            };
            ev.heap.alloc_array(items)
        }
        _ => Err(not_a_function(name)),
    }
}

fn number_static(ev: &mut Evaluator, name: &str, args: &[Value]) -> EvalResult<Value> {
    let number = match args.first() {
        Some(Value::Number(n)) => Some(*n),
        _ => None,
    };
    let result = match name {
        "isInteger" => number.is_some_and(|n| n.is_finite() && n.fract() == 0.0),
        "isSafeInteger" => number
            .is_some_and(|n| n.is_finite() && n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0),
        "isFinite" => number.is_some_and(f64::is_finite),
        "isNaN" => number.is_some_and(f64::is_nan),
        "parseFloat" | "parseInt" => return global_function(ev, name, args.to_vec()),
        _ => return Err(not_a_function(name)),
    };
    Ok(Value::Bool(result))
}

fn global_function(ev: &mut Evaluator, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    match name {
        "parseInt" => {
            let text = ev.to_string(&arg(&args, 0))?;
            Ok(Value::Number(parse_int(ev, &text, &arg(&args, 1))?))
        }
        "parseFloat" => {
            let text = ev.to_string(&arg(&args, 0))?;
            Ok(Value::Number(parse_float(&text)))
        }
        "isNaN" => Ok(Value::Bool(number_arg(ev, &args, 0)?.is_nan())),
        "isFinite" => Ok(Value::Bool(number_arg(ev, &args, 0)?.is_finite())),
        "String" => match args.first() {
            Some(value) => {
                let value = ev.to_primitive(value)?;
                Ok(Value::String(ev.to_string(&value)?))
            }
            None => Ok(Value::string("")),
        },
        "Number" => match args.first() {
            Some(value) => Ok(Value::Number(ev.to_number(value)?)),
            None => Ok(Value::Number(0.0)),
        },
        "Boolean" => Ok(Value::Bool(arg(&args, 0).is_truthy())),
        "Array" => {
            if let (1, Some(Value::Number(n))) = (args.len(), args.first()) {
                let len = as_index(*n)
                    .filter(|len| *len <= MAX_ARRAY_LENGTH)
                    .ok_or_else(invalid_array_length)?;
                ev.charge(len)?;
                return ev.heap.alloc_array(vec![Value::Undefined; len]);
            }
            ev.heap.alloc_array(args)
        }
        "Object" => match args.first() {
            Some(value @ (Value::Object(_) | Value::Array(_) | Value::Function(_))) => {
                Ok(value.clone())
            }
            _ => ev.heap.alloc_object(PropertyMap::new()),
        },
        _ => {
            let Some(ctor) = ERROR_CONSTRUCTORS.iter().find(|c| **c == name) else {
                return Err(not_a_function(name));
            };
            let message = match args.first() {
                None | Some(Value::Undefined) => String::new(),
                Some(value) => ev.to_string(value)?,
            };
            ev.heap.alloc_error(ctor, &message)
        }
    }
}

fn parse_int(ev: &Evaluator, text: &str, radix: &Value) -> EvalResult<f64> {
    let mut radix = match radix {
        Value::Undefined => 0,
        other => {
            let n = ev.to_number(other)?;
            if n.is_finite() {
                n.trunc() as i64
            } else {
                0
            }
        }
    };
    let trimmed = text.trim_start();
    let (sign, mut digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if radix == 0 || radix == 16 {
        if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            digits = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return Ok(f64::NAN);
    }
    let radix = radix as u32;
    let mut value = 0.0_f64;
    let mut any = false;
    for digit in digits.chars().map_while(|c| c.to_digit(radix)) {
        value = value * f64::from(radix) + f64::from(digit);
        any = true;
    }
    Ok(if any { sign * value } else { f64::NAN })
}

/// Longest numeric prefix of `text`, or `NaN`.
fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let (sign, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if body.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }
    let bytes = body.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    let mut end = digits_from(0);
    let mut seen_digit = end > 0;
    if bytes.get(end) == Some(&b'.') {
        let after = digits_from(end + 1);
        seen_digit |= after > end + 1;
        end = after;
    }
    if !seen_digit {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut j = end + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            end = exp_end;
        }
    }
    body[..end]
        .parse::<f64>()
        .map(|v| sign * v)
        .unwrap_or(f64::NAN)
}

// ══════════════════════════════════════════════════════════════════════════════
// Methods
// ══════════════════════════════════════════════════════════════════════════════

/// Whether `receiver` has a built-in method called `name`.
pub(crate) fn is_builtin_method(receiver: &Value, name: &str) -> bool {
    let table = match receiver {
        Value::Array(_) => ARRAY_METHODS,
        Value::String(_) => STRING_METHODS,
        Value::Number(_) => NUMBER_METHODS,
        Value::Bool(_) => BOOL_METHODS,
        Value::Object(_) | Value::Function(_) => OBJECT_METHODS,
        Value::Undefined | Value::Null => return false,
    };
    table.contains(&name)
}

/// Call built-in method `name` on `receiver`.
pub(crate) fn call_method(ev: &mut Evaluator, receiver: Value, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    match &receiver {
        Value::Array(r) => array_method(ev, *r, &receiver, name, args),
        Value::String(s) => string_method(ev, s, name, &args),
        Value::Number(n) => number_method(ev, *n, name, &args),
        Value::Bool(b) if name == "toString" => Ok(Value::String(b.to_string())),
        Value::Object(_) | Value::Function(_) => object_method(ev, &receiver, name, &args),
        _ => Err(not_a_function(name)),
    }
}

fn object_method(ev: &mut Evaluator, this: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    match name {
        "hasOwnProperty" => {
            let key = ev.to_property_key(&arg(args, 0))?;
            Ok(Value::Bool(ev.has_own_property(this, &key)))
        }
        "toString" => Ok(Value::String(ev.to_string(this)?)),
        _ => Err(not_a_function(name)),
    }
}

// ── Arrays ───────────────────────────────────────────────────────────────

fn elements(ev: &mut Evaluator, r: HeapRef) -> EvalResult<&mut Vec<Value>> {
    ev.heap
        .array_mut(r)
        .ok_or_else(|| EvalError::type_error("receiver is not an array"))
}

fn array_method(ev: &mut Evaluator, r: HeapRef, this: &Value, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let len = ev.heap.array(r).len();
    match name {
        "push" | "unshift" => {
            if len + args.len() > MAX_ARRAY_LENGTH {
                return Err(invalid_array_length());
            }
            let items = elements(ev, r)?;
            if name == "push" {
                items.extend(args);
            } else {
                items.splice(0..0, args);
            }
            Ok(Value::Number(items.len() as f64))
        }
        "pop" => Ok(elements(ev, r)?.pop().unwrap_or(Value::Undefined)),
        "shift" => {
            let items = elements(ev, r)?;
            Ok(if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            })
        }
        "slice" => {
            let start = relative_index(ev, args.first(), len, 0)?;
            let end = relative_index(ev, args.get(1), len, len)?;
            let out = if start < end {
                ev.heap.array(r)[start..end].to_vec()
            } else {
                Vec::new()
            };
            ev.charge(out.len())?;
            ev.heap.alloc_array(out)
        }
        "splice" => {
            let start = relative_index(ev, args.first(), len, 0)?;
            let delete = match args.get(1) {
                None => len - start,
                Some(v) => {
                    let n = ev.to_number(v)?;
                    if n.is_nan() {
                        0
                    } else {
                        n.trunc().clamp(0.0, (len - start) as f64) as usize
                    }
                }
            };
            let inserts: Vec<Value> = args.into_iter().skip(2).collect();
            if len - delete + inserts.len() > MAX_ARRAY_LENGTH {
                return Err(invalid_array_length());
            }
            let removed: Vec<Value> = elements(ev, r)?
                .splice(start..start + delete, inserts)
                .collect();
            ev.heap.alloc_array(removed)
        }
        "concat" => {
            let mut out = ev.heap.array(r).to_vec();
            for value in &args {
                match value {
                    Value::Array(other) => out.extend_from_slice(ev.heap.array(*other)),
                    other => out.push(other.clone()),
                }
            }
            if out.len() > MAX_ARRAY_LENGTH {
                return Err(invalid_array_length());
            }
            ev.charge(out.len())?;
            ev.heap.alloc_array(out)
        }
        "join" => {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(v) => ev.to_string(v)?,
            };
            ev.charge(len)?;
            let items = ev.heap.array(r).to_vec();
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(match item {
                    Value::Undefined | Value::Null => String::new(),
                    other => ev.to_string(other)?,
                });
            }
            let joined = parts.join(&separator);
            check_string_length(&joined)?;
            Ok(Value::String(joined))
        }
        "indexOf" | "includes" => {
            let target = arg(&args, 0);
            let from = relative_index(ev, args.get(1), len, 0)?;
            let items = ev.heap.array(r);
            if name == "includes" {
                // SameValueZero: NaN finds NaN.
                let found = items[from..].iter().any(|item| match (item, &target) {
                    (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
                    (a, b) => a.strict_equals(b),
                });
                Ok(Value::Bool(found))
            } else {
                let found = items[from..].iter().position(|item| item.strict_equals(&target));
                Ok(Value::Number(found.map_or(-1.0, |i| (i + from) as f64)))
            }
        }
        "lastIndexOf" => {
            let target = arg(&args, 0);
            let last = match args.get(1) {
                None => len,
                Some(v) => {
                    let n = ev.to_number(v)?;
                    let n = if n.is_nan() { 0.0 } else { n.trunc() };
                    let n = if n < 0.0 { len as f64 + n } else { n.min(len as f64 - 1.0) };
                    if n < 0.0 {
                        return Ok(Value::Number(-1.0));
                    }
                    n as usize + 1
                }
            };
            let items = ev.heap.array(r);
            let found = items[..last.min(len)]
                .iter()
                .rposition(|item| item.strict_equals(&target));
            Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
        }
        "reverse" => {
            elements(ev, r)?.reverse();
            Ok(this.clone())
        }
        "map" | "filter" | "forEach" | "find" | "findIndex" | "some" | "every" => {
            iterate(ev, r, this, name, &args)
        }
        "reduce" => {
            let callback = callable(args.first())?;
            let mut index = 0;
            let mut acc = match args.get(1) {
                Some(init) => init.clone(),
                None => {
                    let Some(first) = ev.heap.array(r).first().cloned() else {
                        return Err(EvalError::type_error(
                            "Reduce of empty array with no initial value",
                        ));
                    };
                    index = 1;
                    first
                }
            };
            while index < len {
                let Some(item) = ev.heap.array(r).get(index).cloned() else {
                    break;
                };
                acc = ev.call_function(
                    callback,
                    Value::Undefined,
                    vec![acc, item, Value::Number(index as f64), this.clone()],
                )?;
                index += 1;
            }
            Ok(acc)
        }
        "sort" => {
            let comparator = match args.first() {
                None | Some(Value::Undefined) => None,
                Some(Value::Function(f)) => Some(*f),
                Some(_) => {
                    return Err(EvalError::type_error(
                        "The comparison function must be either a function or undefined",
                    ))
                }
            };
            let items = ev.heap.array(r).to_vec();
            ev.charge(items.len())?;
            let (defined, undefined): (Vec<Value>, Vec<Value>) =
                items.into_iter().partition(|v| *v != Value::Undefined);
            let mut sorted = merge_sort(ev, defined, comparator)?;
            sorted.extend(undefined);
            *elements(ev, r)? = sorted;
            Ok(this.clone())
        }
        "flat" => {
            let depth = match args.first() {
                None | Some(Value::Undefined) => 1.0,
                Some(v) => {
                    let n = ev.to_number(v)?;
                    if n.is_nan() {
                        0.0
                    } else {
                        n.min(format::MAX_RENDER_DEPTH as f64)
                    }
                }
            };
            let mut out = Vec::new();
            let mut visited = 0;
            flatten(ev, r, depth, &mut out, &mut visited)?;
            ev.charge(visited)?;
            ev.heap.alloc_array(out)
        }
        "fill" => {
            let value = arg(&args, 0);
            let start = relative_index(ev, args.get(1), len, 0)?;
            let end = relative_index(ev, args.get(2), len, len)?;
            if start < end {
                ev.charge(end - start)?;
                for slot in &mut elements(ev, r)?[start..end] {
                    *slot = value.clone();
                }
            }
            Ok(this.clone())
        }
        "at" => {
            let n = integer_arg(ev, &args, 0)?;
            let index = if n < 0.0 { len as f64 + n } else { n };
            Ok(as_index(index)
                .and_then(|i| ev.heap.array(r).get(i).cloned())
                .unwrap_or(Value::Undefined))
        }
        "toString" => Ok(Value::String(ev.to_string(this)?)),
        _ => Err(not_a_function(name)),
    }
}

/// The callback-driven iteration methods.
fn iterate(ev: &mut Evaluator, r: HeapRef, this: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    let callback = callable(args.first())?;
    let len = ev.heap.array(r).len();
    let mut collected = Vec::new();
    for i in 0..len {
        let Some(item) = ev.heap.array(r).get(i).cloned() else {
            break;
        };
        let result = ev.call_function(
            callback,
            Value::Undefined,
            vec![item.clone(), Value::Number(i as f64), this.clone()],
        )?;
        match name {
            "map" => collected.push(result),
            "filter" if result.is_truthy() => collected.push(item),
            "find" if result.is_truthy() => return Ok(item),
            "findIndex" if result.is_truthy() => return Ok(Value::Number(i as f64)),
            "some" if result.is_truthy() => return Ok(Value::Bool(true)),
            "every" if !result.is_truthy() => return Ok(Value::Bool(false)),
            _ => {}
        }
    }
    match name {
        "map" | "filter" => ev.heap.alloc_array(collected),
        "findIndex" => Ok(Value::Number(-1.0)),
        "some" => Ok(Value::Bool(false)),
        "every" => Ok(Value::Bool(true)),
        _ => Ok(Value::Undefined),
    }
}

/// Stable merge sort with a comparator that may run script code.
fn merge_sort(ev: &mut Evaluator, mut items: Vec<Value>, comparator: Option<HeapRef>) -> EvalResult<Vec<Value>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(ev, items, comparator)?;
    let right = merge_sort(ev, right, comparator)?;
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => sort_compare(ev, b, a, comparator)? == Ordering::Less,
            _ => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        out.extend(next);
    }
    out.extend(left);
    out.extend(right);
    Ok(out)
}

fn sort_compare(ev: &mut Evaluator, a: &Value, b: &Value, comparator: Option<HeapRef>) -> EvalResult<Ordering> {
    match comparator {
        Some(f) => {
            let result = ev.call_function(f, Value::Undefined, vec![a.clone(), b.clone()])?;
            let n = ev.to_number(&result)?;
            Ok(if n < 0.0 {
                Ordering::Less
            } else if n > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            })
        }
        None => {
            let a = ev.to_string(a)?;
            let b = ev.to_string(b)?;
            Ok(a.cmp(&b))
        }
    }
}

fn flatten(ev: &Evaluator, r: HeapRef, depth: f64, out: &mut Vec<Value>, visited: &mut usize) -> EvalResult<()> {
    for item in ev.heap.array(r) {
        *visited += 1;
        if *visited > MAX_ARRAY_LENGTH {
            return Err(invalid_array_length());
        }
        match item {
            Value::Array(inner) if depth >= 1.0 => flatten(ev, *inner, depth - 1.0, out, visited)?,
            other => out.push(other.clone()),
        }
    }
    Ok(())
}

// ── Strings ──────────────────────────────────────────────────────────────

fn chars_value(chars: &[char]) -> Value {
    Value::String(chars.iter().collect())
}

fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

fn rfind_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// String methods index by character, not by byte.
fn string_method(ev: &mut Evaluator, s: &str, name: &str, args: &[Value]) -> EvalResult<Value> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let needle = || -> EvalResult<Vec<char>> { Ok(ev.to_string(&arg(args, 0))?.chars().collect()) };
    let result = match name {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "trimStart" => Value::string(s.trim_start()),
        "trimEnd" => Value::string(s.trim_end()),
        "includes" => {
            let needle = needle()?;
            let from = clamp_index(ev, args.get(1), len, 0)?;
            Value::Bool(find_chars(&chars, &needle, from).is_some())
        }
        "startsWith" => {
            let needle = needle()?;
            let from = clamp_index(ev, args.get(1), len, 0)?;
            Value::Bool(chars[from..].starts_with(&needle))
        }
        "endsWith" => {
            let needle = needle()?;
            let end = clamp_index(ev, args.get(1), len, len)?;
            Value::Bool(chars[..end].ends_with(&needle))
        }
        "indexOf" => {
            let needle = needle()?;
            let from = clamp_index(ev, args.get(1), len, 0)?;
            Value::Number(find_chars(&chars, &needle, from).map_or(-1.0, |i| i as f64))
        }
        "lastIndexOf" => {
            let needle = needle()?;
            Value::Number(rfind_chars(&chars, &needle).map_or(-1.0, |i| i as f64))
        }
        "slice" => {
            let start = relative_index(ev, args.first(), len, 0)?;
            let end = relative_index(ev, args.get(1), len, len)?;
            if start < end {
                chars_value(&chars[start..end])
            } else {
                Value::string("")
            }
        }
        "substring" => {
            let a = clamp_index(ev, args.first(), len, 0)?;
            let b = clamp_index(ev, args.get(1), len, len)?;
            chars_value(&chars[a.min(b)..a.max(b)])
        }
        "split" => return split(ev, s, args),
        "replace" => return replace(ev, s, false, args),
        "replaceAll" => return replace(ev, s, true, args),
        "repeat" => {
            let n = integer_arg(ev, args, 0)?;
            if n < 0.0 || n.is_infinite() {
                return Err(EvalError::range_error(format!(
                    "Invalid count value: {}",
                    number_to_string(n)
                )));
            }
            let count = n as usize;
            if s.len().saturating_mul(count) > MAX_STRING_LENGTH {
                return Err(EvalError::range_error("Invalid string length"));
            }
            Value::String(s.repeat(count))
        }
        "padStart" | "padEnd" => {
            let target = integer_arg(ev, args, 0)?;
            if target <= len as f64 {
                return Ok(Value::string(s));
            }
            let filler: Vec<char> = match args.get(1) {
                None | Some(Value::Undefined) => vec![' '],
                Some(v) => ev.to_string(v)?.chars().collect(),
            };
            if filler.is_empty() {
                return Ok(Value::string(s));
            }
            if target > MAX_STRING_LENGTH as f64 {
                return Err(EvalError::range_error("Invalid string length"));
            }
            let padding: String = filler.iter().cycle().take(target as usize - len).collect();
            Value::String(if name == "padStart" {
                padding + s
            } else {
                format!("{s}{padding}")
            })
        }
        "charAt" | "charCodeAt" | "at" => {
            let n = integer_arg(ev, args, 0)?;
            let index = if name == "at" && n < 0.0 {
                len as f64 + n
            } else {
                n
            };
            let found = as_index(index).and_then(|i| chars.get(i)).copied();
            match (name, found) {
                ("charCodeAt", Some(c)) => Value::Number(f64::from(u32::from(c))),
                ("charCodeAt", None) => Value::Number(f64::NAN),
                (_, Some(c)) => Value::String(c.to_string()),
                ("charAt", None) => Value::string(""),
                (_, None) => Value::Undefined,
            }
        }
        "concat" => {
            let mut out = s.to_string();
            for value in args {
                out.push_str(&ev.to_string(value)?);
                check_string_length(&out)?;
            }
            Value::String(out)
        }
        "toString" => Value::string(s),
        _ => return Err(not_a_function(name)),
    };
    Ok(result)
}

fn split(ev: &mut Evaluator, s: &str, args: &[Value]) -> EvalResult<Value> {
    let limit = match args.get(1) {
        None | Some(Value::Undefined) => usize::MAX,
        Some(v) => {
            let n = ev.to_number(v)?;
            if n.is_nan() {
                0
            } else {
                n.trunc().max(0.0) as usize
            }
        }
    };
    let parts: Vec<Value> = match args.first() {
        None | Some(Value::Undefined) => vec![Value::string(s)],
        Some(separator) => {
            let separator = ev.to_string(separator)?;
            if separator.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(separator.as_str()).map(Value::string).collect()
            }
        }
    };
    ev.charge(parts.len())?;
    ev.heap.alloc_array(parts.into_iter().take(limit).collect())
}

/// `replace`/`replaceAll` with a string pattern. A function replacement is
/// called as `fn(match, offset, whole)`; a string replacement is inserted
/// literally.
fn replace(ev: &mut Evaluator, s: &str, all: bool, args: &[Value]) -> EvalResult<Value> {
    let pattern = ev.to_string(&arg(args, 0))?;
    let replacement = arg(args, 1);
    let fixed = match &replacement {
        Value::Function(_) => None,
        other => Some(ev.to_string(other)?),
    };
    let mut out = String::new();
    let mut last = 0;
    let mut search_from = 0;
    while let Some(found) = s[search_from..].find(pattern.as_str()).map(|i| i + search_from) {
        out.push_str(&s[last..found]);
        match (&fixed, &replacement) {
            (Some(text), _) => out.push_str(text),
            (None, Value::Function(f)) => {
                let offset = s[..found].chars().count();
                let piece = ev.call_function(
                    *f,
                    Value::Undefined,
                    vec![
                        Value::String(pattern.clone()),
                        Value::Number(offset as f64),
                        Value::string(s),
                    ],
                )?;
                out.push_str(&ev.to_string(&piece)?);
            }
            (None, _) => {}
        }
        check_string_length(&out)?;
        last = found + pattern.len();
        if !all {
            break;
        }
        search_from = if pattern.is_empty() {
            // Empty patterns match between every pair of characters.
            match s[found..].chars().next() {
                Some(c) => found + c.len_utf8(),
                None => break,
            }
        } else {
            last
        };
    }
    out.push_str(&s[last..]);
    check_string_length(&out)?;
    Ok(Value::String(out))
}

// ── Numbers ──────────────────────────────────────────────────────────────

fn number_method(ev: &mut Evaluator, n: f64, name: &str, args: &[Value]) -> EvalResult<Value> {
    match name {
        "toFixed" => {
            let digits = integer_arg(ev, args, 0)?;
            if !(0.0..=100.0).contains(&digits) {
                return Err(EvalError::range_error(
                    "toFixed() digits argument must be between 0 and 100",
                ));
            }
            Ok(Value::String(to_fixed(n, digits as usize)))
        }
        "toString" => match args.first() {
            None | Some(Value::Undefined) => Ok(Value::String(number_to_string(n))),
            Some(_) => {
                let radix = integer_arg(ev, args, 0)?;
                if !(2.0..=36.0).contains(&radix) {
                    return Err(EvalError::range_error(
                        "toString() radix must be between 2 and 36",
                    ));
                }
                Ok(Value::String(to_radix_string(n, radix as u32)))
            }
        },
        _ => Err(not_a_function(name)),
    }
}

/// Fixed-point text with ties rounded away from zero.
fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return number_to_string(n);
    }
    // Enough extra digits that the tail decides the rounding exactly.
    let exact = format!("{:.*}", digits + 30, n.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .collect();
    let mut int_len = int_part.len();
    if frac_part.as_bytes().get(digits).is_some_and(|d| *d >= b'5') {
        let mut i = kept.len();
        loop {
            if i == 0 {
                kept.insert(0, b'1');
                int_len += 1;
                break;
            }
            i -= 1;
            if kept[i] == b'9' {
                kept[i] = b'0';
            } else {
                kept[i] += 1;
                break;
            }
        }
    }
    let mut out = String::with_capacity(kept.len() + 2);
    if n < 0.0 {
        out.push('-');
    }
    for (i, byte) in kept.iter().enumerate() {
        if i == int_len {
            out.push('.');
        }
        out.push(char::from(*byte));
    }
    out
}

fn to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }
    let base = f64::from(radix);
    let mut int = n.abs().trunc();
    let mut frac = n.abs().fract();
    let mut digits = Vec::new();
    loop {
        let d = (int % base) as u32;
        digits.push(char::from_digit(d, radix).unwrap_or('0'));
        int = (int / base).trunc();
        if int < 1.0 {
            break;
        }
    }
    if n < 0.0 {
        digits.push('-');
    }
    digits.reverse();
    let mut out: String = digits.into_iter().collect();
    if frac > 0.0 {
        out.push('.');
        for _ in 0..52 {
            frac *= base;
            let d = frac.trunc() as u32;
            out.push(char::from_digit(d, radix).unwrap_or('0'));
            frac -= frac.trunc();
            if frac == 0.0 {
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_rounds_ties_up() {
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(3.14159, 2), "3.14");
        assert_eq!(to_fixed(9.999, 2), "10.00");
        assert_eq!(to_fixed(-1.25, 1), "-1.3");
        assert_eq!(to_fixed(42.0, 0), "42");
    }

    #[test]
    fn test_to_radix_string() {
        assert_eq!(to_radix_string(255.0, 16), "ff");
        assert_eq!(to_radix_string(5.0, 2), "101");
        assert_eq!(to_radix_string(-8.0, 8), "-10");
        assert_eq!(to_radix_string(0.5, 2), "0.1");
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("3.5px"), 3.5);
        assert_eq!(parse_float("  -2e3x"), -2000.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float(".5"), 0.5);
        assert!(parse_float("px").is_nan());
        assert_eq!(parse_float("Infinityx"), f64::INFINITY);
    }

    #[test]
    fn test_js_round() {
        assert_eq!(js_round(2.5), 3.0);
        assert_eq!(js_round(-2.5), -2.0);
        assert_eq!(js_round(2.4), 2.0);
        assert_eq!(js_round(0.49999999999999994), 0.0);
    }

    #[test]
    fn test_find_chars() {
        let hay: Vec<char> = "héllo héllo".chars().collect();
        let needle: Vec<char> = "llo".chars().collect();
        assert_eq!(find_chars(&hay, &needle, 0), Some(2));
        assert_eq!(find_chars(&hay, &needle, 3), Some(8));
        assert_eq!(rfind_chars(&hay, &needle), Some(8));
        assert_eq!(find_chars(&hay, &[], 4), Some(4));
    }

    #[test]
    fn test_method_tables() {
        assert!(is_builtin_method(&Value::string("x"), "padStart"));
        assert!(!is_builtin_method(&Value::string("x"), "push"));
        assert!(!is_builtin_method(&Value::Null, "toString"));
        assert!(is_constructor("global", "TypeError"));
        assert!(!is_constructor("Math", "abs"));
    }
}
