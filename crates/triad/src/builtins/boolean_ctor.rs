//! `Boolean` constructor and `Boolean.prototype` (spec §4.4).

use super::{global_binding, link_ctor_proto, method, native_fn_ctor, require_class};
use crate::{
    evaluator::Evaluator,
    exception::RunResult,
    heap::{Heap, HeapId},
    object::{ClassTag, InternalSlots},
    value::Value,
};

pub(super) fn install(heap: &mut Heap, function_prototype: HeapId, boolean_prototype: HeapId, global: HeapId) {
    let ctor = native_fn_ctor(heap, function_prototype, "Boolean", 1, call, Some(construct));
    link_ctor_proto(heap, ctor, boolean_prototype);

    method(heap, function_prototype, boolean_prototype, "toString", 0, to_string);
    method(heap, function_prototype, boolean_prototype, "valueOf", 0, value_of);

    global_binding(heap, global, "Boolean", Value::Object(ctor), true);
}

fn call(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let b = args.first().is_some_and(|v| ev.to_boolean_full(*v));
    Ok(Value::Boolean(b))
}

fn construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
    let b = args.first().is_some_and(|v| ev.to_boolean_full(*v));
    let proto = Some(ev.realm.boolean_prototype);
    Ok(Value::Object(ev.alloc_object_with(ClassTag::Boolean, proto, InternalSlots::BooleanBox(b))))
}

fn this_bool(ev: &mut Evaluator, this: Value) -> RunResult<bool> {
    match this {
        Value::Boolean(b) => Ok(b),
        Value::Object(_) => {
            let id = require_class(ev, this, ClassTag::Boolean, "Boolean.prototype method")?;
            let InternalSlots::BooleanBox(b) = ev.heap.obj(id).internal else {
                return Err(ev.throw_type("Boolean.prototype method called on incompatible receiver"));
            };
            Ok(b)
        }
        _ => Err(ev.throw_type("Boolean.prototype method called on incompatible receiver")),
    }
}

fn to_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let b = this_bool(ev, this)?;
    Ok(ev.string_value(if b { "true" } else { "false" }))
}

fn value_of(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    Ok(Value::Boolean(this_bool(ev, this)?))
}
