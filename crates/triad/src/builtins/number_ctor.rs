//! `Number` constructor and `Number.prototype` (spec §4.4).

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
    _version: Version,
    _object_prototype: HeapId,
    function_prototype: HeapId,
    number_prototype: HeapId,
    global: HeapId,
) {
    let ctor = native_fn_ctor(heap, function_prototype, "Number", 1, call, Some(construct));
    link_ctor_proto(heap, ctor, number_prototype);

    super::define_hidden(heap, ctor, "MAX_VALUE", Value::Number(f64::MAX), false);
    super::define_hidden(heap, ctor, "MIN_VALUE", Value::Number(f64::MIN_POSITIVE), false);
    super::define_hidden(heap, ctor, "NaN", Value::Number(f64::NAN), false);
    super::define_hidden(heap, ctor, "POSITIVE_INFINITY", Value::Number(f64::INFINITY), false);
    super::define_hidden(heap, ctor, "NEGATIVE_INFINITY", Value::Number(f64::NEG_INFINITY), false);

    method(heap, function_prototype, number_prototype, "toString", 1, to_string);
    method(heap, function_prototype, number_prototype, "valueOf", 0, value_of);
    method(heap, function_prototype, number_prototype, "toFixed", 1, to_fixed);

    global_binding(heap, global, "Number", Value::Object(ctor), true);
}

fn call(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    match args.first() {
        Some(v) => Ok(Value::Number(ev.to_number(*v)?)),
        None => Ok(Value::Number(0.0)),
    }
}

fn construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
    let n = match args.first() {
        Some(v) => ev.to_number(*v)?,
        None => 0.0,
    };
    let proto = Some(ev.realm.number_prototype);
    Ok(Value::Object(ev.alloc_object_with(ClassTag::Number, proto, InternalSlots::NumberBox(n))))
}

fn this_number(ev: &mut Evaluator, this: Value) -> RunResult<f64> {
    match this {
        Value::Number(n) => Ok(n),
        Value::Object(_) => {
            let id = require_class(ev, this, ClassTag::Number, "Number.prototype method")?;
            let InternalSlots::NumberBox(n) = ev.heap.obj(id).internal else {
                return Err(ev.throw_type("Number.prototype method called on incompatible receiver"));
            };
            Ok(n)
        }
        _ => ev.to_number(this),
    }
}

fn to_string(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let n = this_number(ev, this)?;
    let radix = match arg(args, 0) {
        Value::Undefined => 10,
        v => ev.to_number(v)? as u32,
    };
    if radix == 10 {
        return Ok(ev.string_value(&crate::coerce::format_number(n)));
    }
    if !(2..=36).contains(&radix) {
        return Err(ev.throw_range("toString() radix must be between 2 and 36"));
    }
    Ok(ev.string_value(&to_radix_string(n, radix)))
}

fn to_radix_string(n: f64, radix: u32) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let neg = n < 0.0;
    let mut int_part = n.abs().trunc() as u64;
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut digits = Vec::new();
    if int_part == 0 {
        digits.push(b'0');
    }
    while int_part > 0 {
        digits.push(DIGITS[(int_part % radix as u64) as usize]);
        int_part /= radix as u64;
    }
    digits.reverse();
    let mut s = String::from_utf8(digits).unwrap();
    if neg {
        s.insert(0, '-');
    }
    s
}

fn value_of(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    Ok(Value::Number(this_number(ev, this)?))
}

fn to_fixed(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let n = this_number(ev, this)?;
    let digits = match arg(args, 0) {
        Value::Undefined => 0,
        v => ev.to_number(v)? as usize,
    };
    if digits > 20 {
        return Err(ev.throw_range("toFixed() digits argument must be between 0 and 20"));
    }
    if n.is_nan() {
        return Ok(ev.string_value("NaN"));
    }
    Ok(ev.string_value(&format!("{n:.digits$}")))
}
