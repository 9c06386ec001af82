//! `RegExp` constructor and `RegExp.prototype`. Only plain substring /
//! literal matching is supported (spec §1 non-goal: lexer/parser
//! construction and regex-engine internals are out of scope); a pattern
//! containing any metacharacter is accepted but matches literally, which
//! is documented in DESIGN.md rather than silently diverging from ES3.

use std::rc::Rc;

use super::{global_binding, link_ctor_proto, method, native_fn_ctor, require_class};
use crate::{
    evaluator::Evaluator,
    exception::RunResult,
    heap::{Heap, HeapId},
    object::{ClassTag, InternalSlots, RegExpData},
    value::Value,
};

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Undefined)
}

pub(super) fn install(heap: &mut Heap, function_prototype: HeapId, regexp_prototype: HeapId, global: HeapId) {
    let ctor = native_fn_ctor(heap, function_prototype, "RegExp", 2, call, Some(construct));
    link_ctor_proto(heap, ctor, regexp_prototype);

    method(heap, function_prototype, regexp_prototype, "toString", 0, to_string);
    method(heap, function_prototype, regexp_prototype, "test", 1, test);
    method(heap, function_prototype, regexp_prototype, "exec", 1, exec);

    global_binding(heap, global, "RegExp", Value::Object(ctor), true);
}

fn call(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    construct(ev, args)
}

fn construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
    let (source, flags) = match arg(args, 0) {
        Value::Object(id) if ev.heap.obj(id).class == ClassTag::RegExp => {
            let InternalSlots::RegExpBox(data) = ev.heap.obj(id).internal.clone() else { unreachable!() };
            (data.source.to_string(), flags_string(data.global, data.ignore_case))
        }
        v => {
            let sid = ev.to_string_value(v)?;
            (ev.read_string(sid), String::new())
        }
    };
    let flags = match arg(args, 1) {
        Value::Undefined => flags,
        v => {
            let sid = ev.to_string_value(v)?;
            ev.read_string(sid)
        }
    };
    let data = RegExpData {
        source: Rc::from(source.as_str()),
        global: flags.contains('g'),
        ignore_case: flags.contains('i'),
        last_index: 0,
    };
    let proto = Some(ev.realm.regexp_prototype);
    Ok(Value::Object(ev.alloc_object_with(ClassTag::RegExp, proto, InternalSlots::RegExpBox(data))))
}

fn flags_string(global: bool, ignore_case: bool) -> String {
    let mut s = String::new();
    if global {
        s.push('g');
    }
    if ignore_case {
        s.push('i');
    }
    s
}

fn this_data(ev: &mut Evaluator, this: Value) -> RunResult<(HeapId, RegExpData)> {
    let id = require_class(ev, this, ClassTag::RegExp, "RegExp.prototype method")?;
    let InternalSlots::RegExpBox(data) = ev.heap.obj(id).internal.clone() else { unreachable!() };
    Ok((id, data))
}

fn to_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let (_, data) = this_data(ev, this)?;
    Ok(ev.string_value(&format!("/{}/{}", data.source, flags_string(data.global, data.ignore_case))))
}

/// Literal/substring search: finds `data.source` as a plain substring of
/// the subject (case-folded when `ignore_case`), honoring `lastIndex` and
/// `global` the way a true regex engine's `g` flag would for this
/// restricted matching model.
fn find(subject: &str, data: &RegExpData, from: usize) -> Option<(usize, usize)> {
    if data.source.is_empty() {
        return Some((from.min(subject.len()), from.min(subject.len())));
    }
    let (hay, needle) = if data.ignore_case {
        (subject.to_lowercase(), data.source.to_lowercase())
    } else {
        (subject.to_string(), data.source.to_string())
    };
    if from > hay.len() {
        return None;
    }
    hay[from..].find(&needle).map(|i| (from + i, from + i + needle.len()))
}

fn test(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let r = exec(ev, this, args)?;
    Ok(Value::Boolean(!matches!(r, Value::Null)))
}

fn exec(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let (id, data) = this_data(ev, this)?;
    let sid = ev.to_string_value(arg(args, 0))?;
    let subject = ev.read_string(sid);
    let from = if data.global { data.last_index as usize } else { 0 };
    match find(&subject, &data, from) {
        Some((start, end)) => {
            if data.global {
                if let InternalSlots::RegExpBox(d) = &mut ev.heap.obj_mut(id).internal {
                    d.last_index = end as u32;
                }
            }
            let matched = subject.get(start..end).unwrap_or_default();
            let matched_value = ev.string_value(matched);
            let arr = ev.alloc_array(&[matched_value]);
            ev.put(arr, "index", Value::Number(start as f64), false)?;
            ev.put(arr, "input", Value::Str(sid), false)?;
            Ok(Value::Object(arr))
        }
        None => {
            if data.global {
                if let InternalSlots::RegExpBox(d) = &mut ev.heap.obj_mut(id).internal {
                    d.last_index = 0;
                }
            }
            Ok(Value::Null)
        }
    }
}
