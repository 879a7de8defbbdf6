//! Script values and coercions.
//!
//! Values follow the dynamic typing rules scripts expect: loose truthiness,
//! number/string coercion for arithmetic, and reference identity for arrays,
//! objects and functions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::common::error::ScriptError;
use crate::script::ast::FunctionDef;
use crate::script::scope::Env;

/// Nesting depth past which stringification gives up on a structure.
const MAX_STRUCTURE_DEPTH: usize = 64;

/// A dynamically typed script value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    Function(Rc<Closure>),
    Native(Native),
}

/// Insertion-ordered property bag.
#[derive(Debug, Clone, Default)]
pub struct Object {
    props: Vec<(String, Value)>,
}

impl Object {
    pub const fn new() -> Self {
        Self { props: Vec::new() }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        match self.props.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.props.push((key.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

/// A script function together with the scope it was created in.
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub env: Env,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.def.name)
            .field("params", &self.def.params)
            .finish_non_exhaustive()
    }
}

/// Functions implemented in Rust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Native {
    /// Peripheral capability dispatched to the host by name.
    Host(Rc<str>),
    /// Pure library function.
    Builtin(Builtin),
    /// Function that needs the running engine (timers, clock).
    Runtime(Runtime),
}

/// Pure library functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Floor,
    Ceil,
    Round,
    Trunc,
    Abs,
    Sign,
    Min,
    Max,
    Pow,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Log,
    Exp,
    JsonStringify,
    ParseInt,
    ParseFloat,
    IsNaN,
    IsFinite,
    String,
    Number,
    Boolean,
}

/// Engine-level functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    SetInterval,
    SetTimeout,
    ClearTimer,
    DateNow,
}

impl Value {
    pub fn str(text: impl Into<Rc<str>>) -> Self {
        Self::Str(text.into())
    }

    pub fn array(items: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(object: Object) -> Self {
        Self::Object(Rc::new(RefCell::new(object)))
    }

    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Native(_))
    }

    /// Boolean coercion.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Function(_) | Self::Native(_) => true,
        }
    }

    /// Numeric coercion.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::Str(s) => string_to_number(s),
            Self::Array(items) => {
                let items = items.borrow();
                match items.as_slice() {
                    [] => 0.0,
                    [single] => single.to_number(),
                    _ => f64::NAN,
                }
            }
            Self::Object(_) | Self::Function(_) | Self::Native(_) => f64::NAN,
        }
    }

    /// String coercion, as used by `+`, `String(x)` and peripheral text arguments.
    pub fn to_js_string(&self) -> String {
        self.to_js_string_at(0)
    }

    fn to_js_string_at(&self, depth: usize) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Str(s) => s.to_string(),
            Self::Array(items) => {
                if depth >= MAX_STRUCTURE_DEPTH {
                    return String::new();
                }
                items
                    .borrow()
                    .iter()
                    .map(|item| {
                        if item.is_nullish() {
                            String::new()
                        } else {
                            item.to_js_string_at(depth + 1)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            }
            Self::Object(_) => "[object Object]".to_string(),
            Self::Function(closure) => format!(
                "function {}() {{ [code] }}",
                closure.def.name.as_deref().unwrap_or("")
            ),
            Self::Native(_) => "function () { [native code] }".to_string(),
        }
    }

    /// Text reported when this value escapes as an uncaught throw.
    pub fn thrown_message(&self) -> String {
        if let Self::Object(object) = self {
            let object = object.borrow();
            if let Some(message) = object.get("message") {
                return match object.get("name") {
                    Some(name) => format!("{}: {}", name.to_js_string(), message.to_js_string()),
                    None => message.to_js_string(),
                };
            }
        }
        self.to_js_string()
    }

    /// Result of the `typeof` operator.
    pub const fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Null | Self::Array(_) | Self::Object(_) => "object",
            Self::Function(_) | Self::Native(_) => "function",
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Native(a), Self::Native(b)) => a == b,
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Self::Number(_), Self::Str(_))
            | (Self::Str(_), Self::Number(_))
            | (Self::Bool(_), _)
            | (_, Self::Bool(_)) => self.to_number() == other.to_number(),
            (Self::Array(_) | Self::Object(_), Self::Str(_) | Self::Number(_))
            | (Self::Str(_) | Self::Number(_), Self::Array(_) | Self::Object(_)) => {
                let (object, primitive) = if matches!(self, Self::Array(_) | Self::Object(_)) {
                    (self, other)
                } else {
                    (other, self)
                };
                Self::str(object.to_js_string()).loose_equals(primitive)
            }
            _ => self.strict_equals(other),
        }
    }

    /// ToInt32: wraps the truncated number into the signed 32-bit range.
    pub fn to_int32(&self) -> i32 {
        to_uint32(self.to_number()) as i32
    }

    /// ToUint32: wraps the truncated number into the unsigned 32-bit range.
    pub fn to_uint32(&self) -> u32 {
        to_uint32(self.to_number())
    }

    /// Interprets the value as a non-negative integer index.
    ///
    /// Returns `None` for fractions, negatives, NaN and non-numbers.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Number(n) if n.is_finite() && *n >= 0.0 && n.fract() == 0.0 => {
                Some(*n as usize)
            }
            _ => None,
        }
    }

    /// Converts to JSON. `Ok(None)` means the value is skipped (functions, `undefined`).
    pub fn to_json(&self) -> Result<Option<serde_json::Value>, ScriptError> {
        self.to_json_at(0)
    }

    fn to_json_at(&self, depth: usize) -> Result<Option<serde_json::Value>, ScriptError> {
        if depth > MAX_STRUCTURE_DEPTH {
            return Err(ScriptError::Type(
                "Converting circular structure to JSON".to_string(),
            ));
        }
        let json = match self {
            Self::Undefined | Self::Function(_) | Self::Native(_) => return Ok(None),
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Str(s) => serde_json::Value::String(s.to_string()),
            Self::Array(items) => {
                let items = items.borrow();
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    out.push(item.to_json_at(depth + 1)?.unwrap_or(serde_json::Value::Null));
                }
                serde_json::Value::Array(out)
            }
            Self::Object(object) => {
                let object = object.borrow();
                let mut map = serde_json::Map::new();
                for (key, value) in object.iter() {
                    if let Some(json) = value.to_json_at(depth + 1)? {
                        let _ = map.insert(key.to_string(), json);
                    }
                }
                serde_json::Value::Object(map)
            }
        };
        Ok(Some(json))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s.into())
    }
}

fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Parses numeric string content: decimal, `0x`/`0b` prefixed, or `Infinity`.
fn string_to_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    let radix = |prefix: &[&str], radix: u32| {
        prefix
            .iter()
            .find_map(|p| text.strip_prefix(p))
            .map(|digits| u64::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64))
    };
    if let Some(n) = radix(&["0x", "0X"], 16).or_else(|| radix(&["0b", "0B"], 2)) {
        return n;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let well_formed = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !well_formed {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

/// Formats a number the way scripts print it: integers without a fraction,
/// `NaN`, `Infinity`, and exponent notation outside `[1e-6, 1e21)`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{n:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    if n.fract() == 0.0 {
        return format!("{n:.0}");
    }
    n.to_string()
}
