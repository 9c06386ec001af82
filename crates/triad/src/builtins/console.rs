//! The `console` object (spec §4.4 built-ins list). A plain object, never
//! constructed or called, whose methods are a thin host-printing surface
//! over `ToString` — the same minimal role `Math` plays for numeric
//! functions, just for diagnostic output instead of computation.

use super::{global_binding, method};
use crate::{evaluator::Evaluator, exception::RunResult, heap::{Heap, HeapId}, object::ClassTag, value::Value};

pub(super) fn install(heap: &mut Heap, function_prototype: HeapId, object_prototype: HeapId, global: HeapId) {
    let console = super::alloc_object(heap, ClassTag::Object, Some(object_prototype));

    method(heap, function_prototype, console, "log", 0, log);
    method(heap, function_prototype, console, "info", 0, log);
    method(heap, function_prototype, console, "warn", 0, warn);
    method(heap, function_prototype, console, "error", 0, warn);

    global_binding(heap, global, "console", Value::Object(console), true);
}

fn join_args(ev: &mut Evaluator, args: &[Value]) -> String {
    args.iter().map(|v| ev.to_display_string(*v)).collect::<Vec<_>>().join(" ")
}

fn log(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    println!("{}", join_args(ev, args));
    Ok(Value::Undefined)
}

fn warn(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    eprintln!("{}", join_args(ev, args));
    Ok(Value::Undefined)
}
