//! `String` constructor and `String.prototype` (spec §4.4; supplemented per
//! SPEC_FULL.md §3 from `test_string_object.cpp`).

use super::{global_binding, link_ctor_proto, method, native_fn_ctor, require_class};
use crate::{
    evaluator::Evaluator,
    exception::RunResult,
    heap::{Heap, HeapId},
    object::{ClassTag, InternalSlots},
    value::Value,
    version::Version,
};

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Undefined)
}

pub(super) fn install(
    heap: &mut Heap,
    version: Version,
    _object_prototype: HeapId,
    function_prototype: HeapId,
    string_prototype: HeapId,
    global: HeapId,
) {
    let ctor = native_fn_ctor(heap, function_prototype, "String", 1, call, Some(construct));
    link_ctor_proto(heap, ctor, string_prototype);
    method(heap, function_prototype, ctor, "fromCharCode", 1, from_char_code);

    method(heap, function_prototype, string_prototype, "toString", 0, to_string);
    method(heap, function_prototype, string_prototype, "valueOf", 0, to_string);
    method(heap, function_prototype, string_prototype, "charAt", 1, char_at);
    method(heap, function_prototype, string_prototype, "charCodeAt", 1, char_code_at);
    method(heap, function_prototype, string_prototype, "indexOf", 1, index_of);
    method(heap, function_prototype, string_prototype, "lastIndexOf", 1, last_index_of);
    method(heap, function_prototype, string_prototype, "slice", 2, slice);
    method(heap, function_prototype, string_prototype, "substring", 2, substring);
    method(heap, function_prototype, string_prototype, "split", 2, split);
    method(heap, function_prototype, string_prototype, "replace", 2, replace);
    method(heap, function_prototype, string_prototype, "toLowerCase", 0, to_lower_case);
    method(heap, function_prototype, string_prototype, "toUpperCase", 0, to_upper_case);
    method(heap, function_prototype, string_prototype, "concat", 1, concat);
    if version.has_accessors() {
        method(heap, function_prototype, string_prototype, "trim", 0, trim);
    }

    global_binding(heap, global, "String", Value::Object(ctor), true);
}

fn call(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    match args.first() {
        Some(v) => {
            let id = ev.to_string_value(*v)?;
            Ok(Value::Str(id))
        }
        None => Ok(ev.string_value("")),
    }
}

fn construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
    let sid = match args.first() {
        Some(v) => ev.to_string_value(*v)?,
        None => ev.alloc_string(""),
    };
    let proto = Some(ev.realm.string_prototype);
    Ok(Value::Object(ev.alloc_object_with(ClassTag::String, proto, InternalSlots::StringBox(sid))))
}

fn from_char_code(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let mut units = Vec::with_capacity(args.len());
    for a in args {
        let n = ev.to_number(*a)?;
        units.push(n as u32 as u16);
    }
    Ok(Value::Str(ev.heap.make_string(units)))
}

/// Unwraps `this` to a primitive UTF-16 unit vector, whether it's a
/// primitive string or a boxed `String` object (spec §4.4 "class-coerced
/// `this` validation").
fn this_units(ev: &mut Evaluator, this: Value) -> RunResult<Vec<u16>> {
    match this {
        Value::Str(id) => Ok(ev.heap.str_units(id).to_vec()),
        Value::Object(_) => {
            let id = require_class(ev, this, ClassTag::String, "String.prototype method")?;
            let InternalSlots::StringBox(sid) = ev.heap.obj(id).internal else {
                return Err(ev.throw_type("String.prototype method called on incompatible receiver"));
            };
            Ok(ev.heap.str_units(sid).to_vec())
        }
        _ => {
            let id = ev.to_string_value(this)?;
            Ok(ev.heap.str_units(id).to_vec())
        }
    }
}

fn to_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    Ok(Value::Str(ev.heap.make_string(units)))
}

fn char_at(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let idx = ev.to_number(arg(args, 0))?;
    if idx < 0.0 || idx >= units.len() as f64 || idx.is_nan() {
        return Ok(ev.string_value(""));
    }
    Ok(Value::Str(ev.heap.make_string(vec![units[idx as usize]])))
}

fn char_code_at(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let idx = ev.to_number(arg(args, 0))?;
    if idx < 0.0 || idx >= units.len() as f64 || idx.is_nan() {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(units[idx as usize] as f64))
}

fn index_of(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let search_id = ev.to_string_value(arg(args, 0))?;
    let search = ev.heap.str_units(search_id).to_vec();
    let start = match arg(args, 1) {
        Value::Undefined => 0,
        v => (ev.to_number(v)?.max(0.0) as usize).min(units.len()),
    };
    Ok(Value::Number(find_subsequence(&units, &search, start).map_or(-1.0, |i| i as f64)))
}

fn last_index_of(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let search_id = ev.to_string_value(arg(args, 0))?;
    let search = ev.heap.str_units(search_id).to_vec();
    let mut best: Option<usize> = None;
    let mut start = 0;
    while let Some(i) = find_subsequence(&units, &search, start) {
        best = Some(i);
        start = i + 1;
    }
    Ok(Value::Number(best.map_or(-1.0, |i| i as f64)))
}

fn find_subsequence(hay: &[u16], needle: &[u16], start: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(start.min(hay.len()));
    }
    if start > hay.len() || needle.len() > hay.len() - start {
        return None;
    }
    (start..=hay.len() - needle.len()).find(|&i| &hay[i..i + needle.len()] == needle)
}

fn clamp(n: f64, len: usize) -> usize {
    if n.is_nan() || n < 0.0 {
        0
    } else if n > len as f64 {
        len
    } else {
        n as usize
    }
}

fn slice(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let len = units.len();
    let clamp_signed = |n: f64| -> usize {
        if n.is_nan() {
            0
        } else if n < 0.0 {
            ((len as f64 + n).max(0.0)) as usize
        } else {
            (n as usize).min(len)
        }
    };
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => clamp_signed(ev.to_number(v)?),
    };
    let end = match arg(args, 1) {
        Value::Undefined => len,
        v => clamp_signed(ev.to_number(v)?),
    };
    if start >= end {
        return Ok(ev.string_value(""));
    }
    Ok(Value::Str(ev.heap.make_string(units[start..end].to_vec())))
}

fn substring(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let len = units.len();
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => clamp(ev.to_number(v)?, len),
    };
    let end = match arg(args, 1) {
        Value::Undefined => len,
        v => clamp(ev.to_number(v)?, len),
    };
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    Ok(Value::Str(ev.heap.make_string(units[lo..hi].to_vec())))
}

fn split(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let sep = arg(args, 0);
    if sep.is_undefined() {
        let whole = ev.heap.make_string(units);
        return Ok(Value::Object(ev.alloc_array(&[Value::Str(whole)])));
    }
    let sep_id = ev.to_string_value(sep)?;
    let sep_units = ev.heap.str_units(sep_id).to_vec();
    let mut pieces = Vec::new();
    if sep_units.is_empty() {
        for u in &units {
            pieces.push(Value::Str(ev.heap.make_string(vec![*u])));
        }
    } else {
        let mut start = 0usize;
        while let Some(i) = find_subsequence(&units, &sep_units, start) {
            pieces.push(Value::Str(ev.heap.make_string(units[start..i].to_vec())));
            start = i + sep_units.len();
        }
        pieces.push(Value::Str(ev.heap.make_string(units[start..].to_vec())));
    }
    Ok(Value::Object(ev.alloc_array(&pieces)))
}

fn replace(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let search_id = ev.to_string_value(arg(args, 0))?;
    let search = ev.heap.str_units(search_id).to_vec();
    let replacement_id = ev.to_string_value(arg(args, 1))?;
    let replacement = ev.heap.str_units(replacement_id).to_vec();
    match find_subsequence(&units, &search, 0) {
        Some(i) if !search.is_empty() || units.is_empty() => {
            let mut out = units[..i].to_vec();
            out.extend_from_slice(&replacement);
            out.extend_from_slice(&units[i + search.len()..]);
            Ok(Value::Str(ev.heap.make_string(out)))
        }
        _ => Ok(Value::Str(ev.heap.make_string(units))),
    }
}

fn to_lower_case(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let s = crate::coerce::from_utf16_lossy(&units).to_lowercase();
    Ok(ev.string_value(&s))
}

fn to_upper_case(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let s = crate::coerce::from_utf16_lossy(&units).to_uppercase();
    Ok(ev.string_value(&s))
}

fn concat(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let mut units = this_units(ev, this)?;
    for a in args {
        let id = ev.to_string_value(*a)?;
        units.extend_from_slice(ev.heap.str_units(id));
    }
    Ok(Value::Str(ev.heap.make_string(units)))
}

fn trim(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let units = this_units(ev, this)?;
    let s = crate::coerce::from_utf16_lossy(&units);
    Ok(ev.string_value(s.trim()))
}
