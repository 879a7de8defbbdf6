//! Standard library available to scripts.
//!
//! Provides the global namespace (`Math`, `JSON`, `Date`, conversion functions,
//! timers), plus the string, number and array methods that do not take
//! callbacks. Callback-taking array methods live in the interpreter.

use std::rc::Rc;

use crate::common::error::ScriptError;
use crate::script::scope::Env;
use crate::script::value::{format_number, Builtin, Native, Object, Runtime, Value};

/// Longest string a script may build.
pub const MAX_STRING_LENGTH: usize = 1 << 24;

/// Longest array a script may build.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

type Result<T> = std::result::Result<T, ScriptError>;

/// Populates a fresh global scope with the standard library and the host's capabilities.
///
/// Dotted capability names (`console.log`) are installed as members of a
/// namespace object.
pub fn install(globals: &Env, capabilities: &[&'static str]) {
    let math = [
        ("floor", Builtin::Floor),
        ("ceil", Builtin::Ceil),
        ("round", Builtin::Round),
        ("trunc", Builtin::Trunc),
        ("abs", Builtin::Abs),
        ("sign", Builtin::Sign),
        ("min", Builtin::Min),
        ("max", Builtin::Max),
        ("pow", Builtin::Pow),
        ("sqrt", Builtin::Sqrt),
        ("sin", Builtin::Sin),
        ("cos", Builtin::Cos),
        ("tan", Builtin::Tan),
        ("log", Builtin::Log),
        ("exp", Builtin::Exp),
    ];
    let mut math_object = Object::new();
    for (name, builtin) in math {
        math_object.set(name, Value::Native(Native::Builtin(builtin)));
    }
    math_object.set("PI", Value::Number(std::f64::consts::PI));
    math_object.set("E", Value::Number(std::f64::consts::E));
    globals.declare("Math", Value::object(math_object), false);

    let mut json = Object::new();
    json.set("stringify", Value::Native(Native::Builtin(Builtin::JsonStringify)));
    globals.declare("JSON", Value::object(json), false);

    let mut date = Object::new();
    date.set("now", Value::Native(Native::Runtime(Runtime::DateNow)));
    globals.declare("Date", Value::object(date), false);

    let functions = [
        ("parseInt", Native::Builtin(Builtin::ParseInt)),
        ("parseFloat", Native::Builtin(Builtin::ParseFloat)),
        ("isNaN", Native::Builtin(Builtin::IsNaN)),
        ("isFinite", Native::Builtin(Builtin::IsFinite)),
        ("String", Native::Builtin(Builtin::String)),
        ("Number", Native::Builtin(Builtin::Number)),
        ("Boolean", Native::Builtin(Builtin::Boolean)),
        ("setInterval", Native::Runtime(Runtime::SetInterval)),
        ("setTimeout", Native::Runtime(Runtime::SetTimeout)),
        ("clearInterval", Native::Runtime(Runtime::ClearTimer)),
        ("clearTimeout", Native::Runtime(Runtime::ClearTimer)),
    ];
    for (name, native) in functions {
        globals.declare(name, Value::Native(native), true);
    }
    globals.declare("NaN", Value::Number(f64::NAN), false);
    globals.declare("Infinity", Value::Number(f64::INFINITY), false);

    for &name in capabilities {
        let function = Value::Native(Native::Host(Rc::from(name)));
        match name.split_once('.') {
            Some((namespace, member)) => {
                let target = match globals.lookup(namespace) {
                    Some(Value::Object(object)) => object,
                    _ => {
                        let object = Value::object(Object::new());
                        globals.declare(namespace, object.clone(), false);
                        match object {
                            Value::Object(object) => object,
                            _ => continue,
                        }
                    }
                };
                target.borrow_mut().set(member, function);
            }
            None => globals.declare(name, function, true),
        }
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn num(args: &[Value], index: usize) -> f64 {
    args.get(index).map_or(f64::NAN, Value::to_number)
}

/// Calls a pure library function.
pub fn call(builtin: Builtin, args: &[Value]) -> Result<Value> {
    let n = num(args, 0);
    let value = match builtin {
        Builtin::Floor => Value::Number(n.floor()),
        Builtin::Ceil => Value::Number(n.ceil()),
        Builtin::Round => Value::Number(round_half_up(n)),
        Builtin::Trunc => Value::Number(n.trunc()),
        Builtin::Abs => Value::Number(n.abs()),
        Builtin::Sign => Value::Number(if n.is_nan() || n == 0.0 { n } else { n.signum() }),
        Builtin::Min => Value::Number(fold_numbers(args, f64::INFINITY, f64::min)),
        Builtin::Max => Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)),
        Builtin::Pow => Value::Number(pow(n, num(args, 1))),
        Builtin::Sqrt => Value::Number(n.sqrt()),
        Builtin::Sin => Value::Number(n.sin()),
        Builtin::Cos => Value::Number(n.cos()),
        Builtin::Tan => Value::Number(n.tan()),
        Builtin::Log => Value::Number(n.ln()),
        Builtin::Exp => Value::Number(n.exp()),
        Builtin::JsonStringify => json_stringify(args)?,
        Builtin::ParseInt => Value::Number(parse_int(&arg(args, 0).to_js_string(), args.get(1))),
        Builtin::ParseFloat => Value::Number(parse_float(&arg(args, 0).to_js_string())),
        Builtin::IsNaN => Value::Bool(n.is_nan()),
        Builtin::IsFinite => Value::Bool(n.is_finite()),
        Builtin::String => match args.first() {
            Some(value) => Value::str(value.to_js_string()),
            None => Value::str(""),
        },
        Builtin::Number => Value::Number(args.first().map_or(0.0, Value::to_number)),
        Builtin::Boolean => Value::Bool(args.first().is_some_and(Value::truthy)),
    };
    Ok(value)
}

/// `Math.round`: halves round towards positive infinity.
fn round_half_up(n: f64) -> f64 {
    let floor = n.floor();
    if n - floor >= 0.5 { floor + 1.0 } else { floor }
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

pub(crate) fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() {
        return f64::NAN;
    }
    base.powf(exponent)
}

fn json_stringify(args: &[Value]) -> Result<Value> {
    let Some(json) = arg(args, 0).to_json()? else {
        return Ok(Value::Undefined);
    };
    let indent = args.get(2).map_or(0.0, Value::to_number);
    let text = if indent >= 1.0 {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    text.map(Value::from)
        .map_err(|err| ScriptError::Type(err.to_string()))
}

/// `parseInt`: leading integer digits in the given radix, `NaN` if there are none.
pub fn parse_int(text: &str, radix: Option<&Value>) -> f64 {
    let text = text.trim_start();
    let (negative, text) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut radix = radix.map_or(0, Value::to_int32);
    let mut digits = text;
    if radix == 0 || radix == 16 {
        if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            digits = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let radix = radix.unsigned_abs();
    let mut value = 0.0_f64;
    let mut any = false;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        value = value.mul_add(f64::from(radix), f64::from(digit));
        any = true;
    }
    if !any {
        return f64::NAN;
    }
    if negative { -value } else { value }
}

/// `parseFloat`: the longest decimal prefix, `NaN` if there is none.
pub fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if text[end..].starts_with("Infinity") {
        return if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    let int_end = digits_from(end);
    let mut mantissa_end = int_end;
    if bytes.get(int_end) == Some(&b'.') {
        mantissa_end = digits_from(int_end + 1);
    }
    let has_digits = int_end > end || mantissa_end > int_end + 1;
    if !has_digits {
        return f64::NAN;
    }
    end = mantissa_end;

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    text[..end].trim_end_matches('.').parse::<f64>().unwrap_or(f64::NAN)
}

/// Calls a non-callback method on a primitive or array receiver.
///
/// Returns `None` if the receiver has no such method.
pub fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Option<Result<Value>> {
    match receiver {
        Value::Str(s) => string_method(s, name, args),
        Value::Number(n) => number_method(*n, name, args),
        Value::Array(items) => array_method(items, name, args),
        _ => None,
    }
}

/// Resolves a relative index argument (negative counts from the end) into `0..=len`.
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    let Some(value) = value.filter(|v| !matches!(v, Value::Undefined)) else {
        return default;
    };
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

/// Clamps an index argument into `0..=len` (negatives become 0).
fn clamped_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    let Some(value) = value.filter(|v| !matches!(v, Value::Undefined)) else {
        return default;
    };
    let n = value.to_number();
    if n.is_nan() || n <= 0.0 {
        return 0;
    }
    n.trunc().min(len as f64) as usize
}

fn check_length(len: usize) -> Result<()> {
    if len > MAX_STRING_LENGTH {
        return Err(ScriptError::Range("Invalid string length".to_string()));
    }
    Ok(())
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Option<Result<Value>> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let text_arg = |i: usize| arg(args, i).to_js_string();

    let value = match name {
        "charAt" => {
            let i = clamped_index(args.first(), len, 0);
            Value::str(chars.get(i).map(char::to_string).unwrap_or_default())
        }
        "charCodeAt" => {
            let i = clamped_index(args.first(), len, 0);
            Value::Number(chars.get(i).map_or(f64::NAN, |&c| f64::from(u32::from(c))))
        }
        "indexOf" => {
            let needle: Vec<char> = text_arg(0).chars().collect();
            let from = clamped_index(args.get(1), len, 0);
            let found = (from..=len.saturating_sub(needle.len()))
                .find(|&i| chars[i..].starts_with(&needle));
            Value::Number(found.map_or(-1.0, |i| i as f64))
        }
        "includes" => Value::Bool(s.contains(text_arg(0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(text_arg(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text_arg(0).as_str())),
        "substring" => {
            let start = clamped_index(args.first(), len, 0);
            let end = clamped_index(args.get(1), len, len);
            let (start, end) = if start > end { (end, start) } else { (start, end) };
            Value::str(chars[start..end].iter().collect::<String>())
        }
        "slice" => {
            let start = relative_index(args.first(), len, 0);
            let end = relative_index(args.get(1), len, len);
            let text: String = if start < end {
                chars[start..end].iter().collect()
            } else {
                String::new()
            };
            Value::str(text)
        }
        "toUpperCase" => Value::str(s.to_uppercase()),
        "toLowerCase" => Value::str(s.to_lowercase()),
        "trim" => Value::str(s.trim()),
        "padStart" | "padEnd" => {
            let target = clamped_index(args.first(), MAX_STRING_LENGTH + 1, 0);
            if let Err(err) = check_length(target) {
                return Some(Err(err));
            }
            let fill = match args.get(1) {
                Some(Value::Undefined) | None => " ".to_string(),
                Some(value) => value.to_js_string(),
            };
            if target <= len || fill.is_empty() {
                Value::str(s)
            } else {
                let padding: String = fill.chars().cycle().take(target - len).collect();
                if name == "padStart" {
                    Value::str(padding + s)
                } else {
                    Value::str(format!("{s}{padding}"))
                }
            }
        }
        "repeat" => {
            let count = num(args, 0);
            if count < 0.0 || count.is_infinite() {
                return Some(Err(ScriptError::Range(format!(
                    "Invalid count value: {}",
                    format_number(count)
                ))));
            }
            let count = if count.is_nan() { 0 } else { count as usize };
            if let Err(err) = check_length(len.saturating_mul(count)) {
                return Some(Err(err));
            }
            Value::str(s.repeat(count))
        }
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::str(s)],
                Some(sep) => {
                    let sep = sep.to_js_string();
                    if sep.is_empty() {
                        chars.iter().map(|c| Value::str(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::from).collect()
                    }
                }
            };
            Value::array(parts)
        }
        "concat" => {
            let mut out = s.to_string();
            for value in args {
                out.push_str(&value.to_js_string());
            }
            if let Err(err) = check_length(out.len()) {
                return Some(Err(err));
            }
            Value::str(out)
        }
        "replace" => Value::str(s.replacen(text_arg(0).as_str(), &text_arg(1), 1)),
        "toString" => Value::str(s),
        _ => return None,
    };
    Some(Ok(value))
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Option<Result<Value>> {
    let value = match name {
        "toFixed" => {
            let digits = num(args, 0);
            let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
            if !(0.0..=100.0).contains(&digits) {
                return Some(Err(ScriptError::Range(
                    "toFixed() digits argument must be between 0 and 100".to_string(),
                )));
            }
            Value::str(to_fixed(n, digits as usize))
        }
        "toString" => match args.first().map(Value::to_int32) {
            None | Some(10) => Value::str(format_number(n)),
            Some(radix @ 2..=36) => Value::str(to_radix_string(n, radix.unsigned_abs())),
            Some(_) => {
                return Some(Err(ScriptError::Range(
                    "toString() radix must be between 2 and 36".to_string(),
                )));
            }
        },
        _ => return None,
    };
    Some(Ok(value))
}

/// `Number.prototype.toFixed`: exact ties round away from zero.
pub fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    if n.abs() >= 1e21 {
        return format_number(n);
    }
    let magnitude = n.abs();
    let scale = 10f64.powi(digits as i32);
    let scaled = magnitude * scale;
    let body = if scaled.fract() == 0.5 && scaled < 4_503_599_627_370_496.0 {
        format!("{:.*}", digits, (scaled.floor() + 1.0) / scale)
    } else {
        format!("{magnitude:.digits$}")
    };
    if n < 0.0 { format!("-{body}") } else { body }
}

fn to_radix_string(n: f64, radix: u32) -> String {
    if !n.is_finite() || n.fract() != 0.0 || n.abs() > 9_007_199_254_740_992.0 {
        return format_number(n);
    }
    let mut value = n.abs() as u64;
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = (value % u64::from(radix)) as u32;
        digits.push(char::from_digit(digit, radix).unwrap_or('0'));
        value /= u64::from(radix);
    }
    if n < 0.0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

fn array_method(
    items: &Rc<std::cell::RefCell<Vec<Value>>>,
    name: &str,
    args: &[Value],
) -> Option<Result<Value>> {
    let value = match name {
        "push" => {
            let mut items = items.borrow_mut();
            if items.len() + args.len() > MAX_ARRAY_LENGTH {
                return Some(Err(ScriptError::Range("Invalid array length".to_string())));
            }
            items.extend(args.iter().cloned());
            Value::Number(items.len() as f64)
        }
        "pop" => items.borrow_mut().pop().unwrap_or_default(),
        "shift" => {
            let mut items = items.borrow_mut();
            if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            }
        }
        "unshift" => {
            let mut items = items.borrow_mut();
            if items.len() + args.len() > MAX_ARRAY_LENGTH {
                return Some(Err(ScriptError::Range("Invalid array length".to_string())));
            }
            let _ = items.splice(0..0, args.iter().cloned());
            Value::Number(items.len() as f64)
        }
        "join" => {
            let sep = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(sep) => sep.to_js_string(),
            };
            let text = items
                .borrow()
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_js_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(&sep);
            if let Err(err) = check_length(text.len()) {
                return Some(Err(err));
            }
            Value::str(text)
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let position = items.borrow().iter().position(|item| item.strict_equals(&needle));
            Value::Number(position.map_or(-1.0, |i| i as f64))
        }
        "includes" => {
            let needle = arg(args, 0);
            let found = items.borrow().iter().any(|item| {
                item.strict_equals(&needle)
                    || matches!((item, &needle), (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan())
            });
            Value::Bool(found)
        }
        "slice" => {
            let items = items.borrow();
            let len = items.len();
            let start = relative_index(args.first(), len, 0);
            let end = relative_index(args.get(1), len, len);
            let slice = if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            };
            Value::array(slice)
        }
        "reverse" => {
            items.borrow_mut().reverse();
            Value::Array(Rc::clone(items))
        }
        "concat" => {
            let mut out = items.borrow().clone();
            for value in args {
                match value {
                    Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            if out.len() > MAX_ARRAY_LENGTH {
                return Some(Err(ScriptError::Range("Invalid array length".to_string())));
            }
            Value::array(out)
        }
        "toString" => Value::str(Value::Array(Rc::clone(items)).to_js_string()),
        _ => return None,
    };
    Some(Ok(value))
}
