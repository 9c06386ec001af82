//! `Array` constructor and `Array.prototype` (spec §4.4, §8 "`Array` length
//! semantics"; supplemented per SPEC_FULL.md §3 from `test_array_object.cpp`).

use super::{global_binding, link_ctor_proto, method, native_fn_ctor};
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
    object_prototype: HeapId,
    function_prototype: HeapId,
    array_prototype: HeapId,
    global: HeapId,
) {
    let _ = object_prototype;
    let ctor = native_fn_ctor(heap, function_prototype, "Array", 1, call, Some(construct));
    link_ctor_proto(heap, ctor, array_prototype);

    method(heap, function_prototype, array_prototype, "toString", 0, to_string);
    method(heap, function_prototype, array_prototype, "join", 1, join);
    method(heap, function_prototype, array_prototype, "reverse", 0, reverse);
    method(heap, function_prototype, array_prototype, "sort", 1, sort);
    method(heap, function_prototype, array_prototype, "concat", 1, concat);
    method(heap, function_prototype, array_prototype, "push", 1, push);
    method(heap, function_prototype, array_prototype, "pop", 0, pop);
    method(heap, function_prototype, array_prototype, "shift", 0, shift);
    method(heap, function_prototype, array_prototype, "unshift", 1, unshift);
    method(heap, function_prototype, array_prototype, "slice", 2, slice);
    method(heap, function_prototype, array_prototype, "splice", 2, splice);
    if version.has_v3_syntax() {
        method(heap, function_prototype, array_prototype, "indexOf", 1, index_of);
        method(heap, function_prototype, array_prototype, "lastIndexOf", 1, last_index_of);
    }

    global_binding(heap, global, "Array", Value::Object(ctor), true);
}

fn call(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    construct(ev, args)
}

/// `new Array(...)`: one numeric argument sets the length (spec §8
/// boundary behavior: `new Array(42.5)` throws `RangeError`); any other
/// argument count/shape becomes the literal element list.
fn construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
    if args.len() == 1 {
        if let Value::Number(n) = args[0] {
            if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                return Err(ev.throw_range("Invalid array length"));
            }
            let id = ev.alloc_array(&[]);
            if let InternalSlots::Array { length } = &mut ev.heap.obj_mut(id).internal {
                *length = n as u32;
            }
            return Ok(Value::Object(id));
        }
    }
    Ok(Value::Object(ev.alloc_array(args)))
}

fn array_len(ev: &mut Evaluator, id: HeapId) -> RunResult<u32> {
    let v = ev.get(id, "length")?;
    ev.to_uint32(v)
}

fn array_elem(ev: &mut Evaluator, id: HeapId, i: u32) -> RunResult<Value> {
    ev.get(id, &i.to_string())
}

fn array_set(ev: &mut Evaluator, id: HeapId, i: u32, v: Value) -> RunResult<()> {
    ev.put(id, &i.to_string(), v, false)
}

fn array_set_len(ev: &mut Evaluator, id: HeapId, n: u32) -> RunResult<()> {
    ev.put(id, "length", Value::Number(n as f64), false)
}

fn this_object(ev: &mut Evaluator, this: Value) -> RunResult<HeapId> {
    match this {
        Value::Object(id) => Ok(id),
        other => ev.to_object(other),
    }
}

fn to_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    join(ev, this, &[])
}

fn join(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let sep = match arg(args, 0) {
        Value::Undefined => ",".to_string(),
        other => {
            let sid = ev.to_string_value(other)?;
            ev.read_string(sid)
        }
    };
    let len = array_len(ev, id)?;
    let mut parts = Vec::with_capacity(len as usize);
    for i in 0..len {
        let v = array_elem(ev, id, i)?;
        parts.push(if v.is_nullish() { String::new() } else { ev.to_display_string(v) });
    }
    Ok(ev.string_value(&parts.join(&sep)))
}

fn reverse(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    let mut elems = Vec::with_capacity(len as usize);
    for i in 0..len {
        elems.push(array_elem(ev, id, i)?);
    }
    elems.reverse();
    for (i, v) in elems.into_iter().enumerate() {
        array_set(ev, id, i as u32, v)?;
    }
    Ok(Value::Object(id))
}

/// `Array.prototype.sort`: lexicographic by default ToString comparison
/// when no comparator is supplied, matching the ES3 default; with a
/// comparator, calls it left-to-right per pair the same way the sort
/// algorithm requests.
fn sort(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    let mut elems = Vec::with_capacity(len as usize);
    for i in 0..len {
        elems.push(array_elem(ev, id, i)?);
    }
    let comparator = arg(args, 0);
    let mut err = None;
    // Insertion sort: stable and keeps comparator call order predictable,
    // which matters because user comparators can have observable
    // side effects (spec §4.3 "order of evaluation... strictly left to
    // right").
    for i in 1..elems.len() {
        let mut j = i;
        while j > 0 {
            let less = if err.is_some() {
                false
            } else {
                match compare(ev, comparator, elems[j - 1], elems[j]) {
                    Ok(v) => v > 0.0,
                    Err(e) => {
                        err = Some(e);
                        false
                    }
                }
            };
            if !less {
                break;
            }
            elems.swap(j - 1, j);
            j -= 1;
        }
    }
    if let Some(e) = err {
        return Err(e);
    }
    for (i, v) in elems.into_iter().enumerate() {
        array_set(ev, id, i as u32, v)?;
    }
    Ok(Value::Object(id))
}

fn compare(ev: &mut Evaluator, comparator: Value, a: Value, b: Value) -> RunResult<f64> {
    if let Value::Object(fid) = comparator {
        if ev.heap.obj(fid).is_callable() {
            let r = ev.call_object(fid, Value::Undefined, &[a, b])?;
            return ev.to_number(r);
        }
    }
    let as_ = ev.to_string_value(a)?;
    let bs = ev.to_string_value(b)?;
    Ok(match ev.heap.str_units(as_).cmp(ev.heap.str_units(bs)) {
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => 0.0,
        std::cmp::Ordering::Greater => 1.0,
    })
}

fn concat(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let mut out = Vec::new();
    let len = array_len(ev, id)?;
    for i in 0..len {
        out.push(array_elem(ev, id, i)?);
    }
    for a in args {
        match a {
            Value::Object(oid) if ev.heap.obj(*oid).class == ClassTag::Array => {
                let l = array_len(ev, *oid)?;
                for i in 0..l {
                    out.push(array_elem(ev, *oid, i)?);
                }
            }
            other => out.push(*other),
        }
    }
    Ok(Value::Object(ev.alloc_array(&out)))
}

fn push(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let mut len = array_len(ev, id)?;
    for a in args {
        array_set(ev, id, len, *a)?;
        len += 1;
    }
    array_set_len(ev, id, len)?;
    Ok(Value::Number(len as f64))
}

fn pop(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    if len == 0 {
        return Ok(Value::Undefined);
    }
    let last = array_elem(ev, id, len - 1)?;
    ev.delete(id, &(len - 1).to_string(), false)?;
    array_set_len(ev, id, len - 1)?;
    Ok(last)
}

fn shift(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    if len == 0 {
        return Ok(Value::Undefined);
    }
    let first = array_elem(ev, id, 0)?;
    for i in 1..len {
        let v = array_elem(ev, id, i)?;
        array_set(ev, id, i - 1, v)?;
    }
    ev.delete(id, &(len - 1).to_string(), false)?;
    array_set_len(ev, id, len - 1)?;
    Ok(first)
}

fn unshift(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    let n = args.len() as u32;
    let mut i = len;
    while i > 0 {
        let v = array_elem(ev, id, i - 1)?;
        array_set(ev, id, i - 1 + n, v)?;
        i -= 1;
    }
    for (j, a) in args.iter().enumerate() {
        array_set(ev, id, j as u32, *a)?;
    }
    array_set_len(ev, id, len + n)?;
    Ok(Value::Number((len + n) as f64))
}

/// Normalizes a possibly-negative, possibly-fractional `start`/`end`
/// argument to an in-bounds index, ES3-style.
fn clamp_index(n: f64, len: u32) -> u32 {
    let len_f = len as f64;
    let n = if n.is_nan() { 0.0 } else { n };
    let n = if n < 0.0 { (len_f + n).max(0.0) } else { n.min(len_f) };
    n as u32
}

fn slice(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => clamp_index(ev.to_number(v)?, len),
    };
    let end = match arg(args, 1) {
        Value::Undefined => len,
        v => clamp_index(ev.to_number(v)?, len),
    };
    let mut out = Vec::new();
    let mut i = start;
    while i < end {
        out.push(array_elem(ev, id, i)?);
        i += 1;
    }
    Ok(Value::Object(ev.alloc_array(&out)))
}

fn splice(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => clamp_index(ev.to_number(v)?, len),
    };
    let delete_count = match arg(args, 1) {
        Value::Undefined => len - start,
        v => (ev.to_number(v)?.max(0.0) as u32).min(len - start),
    };
    let mut elems = Vec::with_capacity(len as usize);
    for i in 0..len {
        elems.push(array_elem(ev, id, i)?);
    }
    let removed: Vec<Value> = elems.splice(start as usize..(start + delete_count) as usize, args.iter().skip(2).copied()).collect();
    for (i, v) in elems.iter().enumerate() {
        array_set(ev, id, i as u32, *v)?;
    }
    array_set_len(ev, id, elems.len() as u32)?;
    Ok(Value::Object(ev.alloc_array(&removed)))
}

fn index_of(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    let target = arg(args, 0);
    let start = match arg(args, 1) {
        Value::Undefined => 0,
        v => clamp_index(ev.to_number(v)?, len),
    };
    for i in start..len {
        let v = array_elem(ev, id, i)?;
        if ev.strict_equals(v, target) {
            return Ok(Value::Number(i as f64));
        }
    }
    Ok(Value::Number(-1.0))
}

fn last_index_of(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = this_object(ev, this)?;
    let len = array_len(ev, id)?;
    if len == 0 {
        return Ok(Value::Number(-1.0));
    }
    let target = arg(args, 0);
    let mut i = len;
    while i > 0 {
        i -= 1;
        let v = array_elem(ev, id, i)?;
        if ev.strict_equals(v, target) {
            return Ok(Value::Number(i as f64));
        }
    }
    Ok(Value::Number(-1.0))
}
