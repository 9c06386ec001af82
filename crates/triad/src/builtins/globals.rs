//! Global functions and bindings that live directly on the global object
//! rather than on any built-in's prototype (spec §6 "Global object";
//! supplemented per SPEC_FULL.md §3 from `test_global.cpp`).

use super::{define_hidden, global_binding, native_fn};
use crate::{evaluator::Evaluator, exception::RunResult, heap::{Heap, HeapId}, value::Value, version::Version};

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Undefined)
}

pub(super) fn install(heap: &mut Heap, version: Version, function_prototype: HeapId, global: HeapId) {
    let writable = !version.globals_are_read_only();
    define_hidden(heap, global, "undefined", Value::Undefined, writable);
    define_hidden(heap, global, "NaN", Value::Number(f64::NAN), writable);
    define_hidden(heap, global, "Infinity", Value::Number(f64::INFINITY), writable);

    let f = native_fn(heap, function_prototype, "eval", 1, eval);
    global_binding(heap, global, "eval", Value::Object(f), true);
    let f = native_fn(heap, function_prototype, "parseInt", 2, parse_int);
    global_binding(heap, global, "parseInt", Value::Object(f), true);
    let f = native_fn(heap, function_prototype, "parseFloat", 1, parse_float);
    global_binding(heap, global, "parseFloat", Value::Object(f), true);
    let f = native_fn(heap, function_prototype, "isNaN", 1, is_nan);
    global_binding(heap, global, "isNaN", Value::Object(f), true);
    let f = native_fn(heap, function_prototype, "isFinite", 1, is_finite);
    global_binding(heap, global, "isFinite", Value::Object(f), true);
    let f = native_fn(heap, function_prototype, "escape", 1, escape);
    global_binding(heap, global, "escape", Value::Object(f), true);
    let f = native_fn(heap, function_prototype, "unescape", 1, unescape);
    global_binding(heap, global, "unescape", Value::Object(f), true);

    if version.has_v3_syntax() {
        let f = native_fn(heap, function_prototype, "encodeURI", 1, encode_uri);
        global_binding(heap, global, "encodeURI", Value::Object(f), true);
        let f = native_fn(heap, function_prototype, "encodeURIComponent", 1, encode_uri_component);
        global_binding(heap, global, "encodeURIComponent", Value::Object(f), true);
        let f = native_fn(heap, function_prototype, "decodeURI", 1, decode_uri);
        global_binding(heap, global, "decodeURI", Value::Object(f), true);
        let f = native_fn(heap, function_prototype, "decodeURIComponent", 1, decode_uri_component);
        global_binding(heap, global, "decodeURIComponent", Value::Object(f), true);
    }
}

/// Global `eval`: compiles and runs `source` as a program in the calling
/// realm (spec §6). Direct vs. indirect `eval` scoping distinctions are not
/// modeled; every call runs in the global scope, matching the simplified
/// single-realm host this crate presents.
fn eval(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let v = arg(args, 0);
    let Value::Str(sid) = v else {
        return Ok(v);
    };
    let source = ev.read_string(sid);
    let program = crate::parser::parse_program(&source, ev.version()).map_err(|e| ev.throw_syntax(e.message))?;
    ev.run_program(&program).map_err(|e| crate::exception::RunError { value: e.value, stack: e.stack })
}

fn parse_int(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let sid = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(sid);
    let s = s.trim_start();
    let (neg, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let radix_arg = match arg(args, 1) {
        Value::Undefined => 0,
        v => ev.to_number(v)? as i64 as u32,
    };
    let (radix, digits) = if radix_arg == 16 || (radix_arg == 0 && (s.starts_with("0x") || s.starts_with("0X"))) {
        (16, s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s))
    } else if radix_arg == 0 && ev.version().infers_octal() && s.starts_with('0') && s.len() > 1 {
        (8, &s[1..])
    } else if radix_arg == 0 {
        (10, s)
    } else {
        (radix_arg, s)
    };
    if !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    let valid_len = digits.chars().take_while(|c| c.to_digit(radix).is_some()).count();
    if valid_len == 0 {
        return Ok(Value::Number(f64::NAN));
    }
    let mut n = 0.0f64;
    for c in digits[..valid_len].chars() {
        n = n * radix as f64 + c.to_digit(radix).unwrap() as f64;
    }
    Ok(Value::Number(if neg { -n } else { n }))
}

fn parse_float(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let sid = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(sid);
    let s = s.trim_start();
    let mut end = 0;
    let bytes = s.as_bytes();
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    if end == digits_start || (end == digits_start + 1 && bytes.get(digits_start) == Some(&b'.')) {
        if s.starts_with("Infinity") || s.starts_with("+Infinity") {
            return Ok(Value::Number(f64::INFINITY));
        }
        if s.starts_with("-Infinity") {
            return Ok(Value::Number(f64::NEG_INFINITY));
        }
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(s[..end].parse().unwrap_or(f64::NAN)))
}

fn is_nan(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let n = ev.to_number(arg(args, 0))?;
    Ok(Value::Boolean(n.is_nan()))
}

fn is_finite(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let n = ev.to_number(arg(args, 0))?;
    Ok(Value::Boolean(n.is_finite()))
}

const UNESCAPED: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789@*_+-./";

fn escape(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let sid = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(sid);
    let mut out = String::new();
    for c in s.chars() {
        if UNESCAPED.contains(c) {
            out.push(c);
        } else {
            let cp = c as u32;
            if cp <= 0xff {
                out.push_str(&format!("%{cp:02X}"));
            } else {
                out.push_str(&format!("%u{cp:04X}"));
            }
        }
    }
    Ok(ev.string_value(&out))
}

fn unescape(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let sid = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(sid);
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '%' && i + 1 < chars.len() && chars[i + 1] == 'u' && i + 5 < chars.len() {
            if let Ok(cp) = u32::from_str_radix(&chars[i + 2..i + 6].iter().collect::<String>(), 16) {
                if let Some(c) = char::from_u32(cp) {
                    out.push(c);
                    i += 6;
                    continue;
                }
            }
        }
        if chars[i] == '%' && i + 2 < chars.len() {
            if let Ok(cp) = u32::from_str_radix(&chars[i + 1..i + 3].iter().collect::<String>(), 16) {
                if let Some(c) = char::from_u32(cp) {
                    out.push(c);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    Ok(ev.string_value(&out))
}

const URI_UNRESERVED: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.!~*'()";
const URI_RESERVED: &str = ";/?:@&=+$,#";

fn percent_encode(s: &str, keep_reserved: bool) -> String {
    let mut out = String::new();
    for b in s.bytes() {
        let c = b as char;
        if URI_UNRESERVED.contains(c) || (keep_reserved && URI_RESERVED.contains(c)) {
            out.push(c);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(b) = u8::from_str_radix(&s[i + 1..i + 3], 16) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn encode_uri(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let sid = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(sid);
    Ok(ev.string_value(&percent_encode(&s, true)))
}

fn encode_uri_component(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let sid = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(sid);
    Ok(ev.string_value(&percent_encode(&s, false)))
}

fn decode_uri(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let sid = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(sid);
    Ok(ev.string_value(&percent_decode(&s)))
}

fn decode_uri_component(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let sid = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(sid);
    Ok(ev.string_value(&percent_decode(&s)))
}
