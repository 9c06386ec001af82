//! `Function` constructor and `Function.prototype` (spec §4.4).

use super::{global_binding, link_ctor_proto, method, native_fn_ctor};
use crate::{evaluator::Evaluator, exception::RunResult, heap::{Heap, HeapId}, value::Value, version::Version};

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Undefined)
}

pub(super) fn install(heap: &mut Heap, _version: Version, function_prototype: HeapId, global: HeapId) {
    let ctor = native_fn_ctor(heap, function_prototype, "Function", 1, call, Some(construct));
    link_ctor_proto(heap, ctor, function_prototype);

    method(heap, function_prototype, function_prototype, "toString", 0, to_string);
    method(heap, function_prototype, function_prototype, "call", 1, call_method);
    method(heap, function_prototype, function_prototype, "apply", 2, apply_method);

    global_binding(heap, global, "Function", Value::Object(ctor), true);
}

fn to_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let Value::Object(id) = this else {
        return Err(ev.throw_type("Function.prototype.toString called on non-function"));
    };
    if !ev.heap.obj(id).is_callable() {
        return Err(ev.throw_type("Function.prototype.toString called on non-function"));
    }
    let name = ev.heap.obj(id).as_callable().map(|c| c.name().to_string()).unwrap_or_default();
    Ok(ev.string_value(&format!("function {name}() {{ [native or script code] }}")))
}

fn call_method(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let new_this = arg(args, 0);
    let rest = if args.is_empty() { &[][..] } else { &args[1..] };
    ev.call_value(this, new_this, rest)
}

fn apply_method(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let new_this = arg(args, 0);
    let arg_array = arg(args, 1);
    let arg_vals = match arg_array {
        Value::Undefined | Value::Null => Vec::new(),
        Value::Object(arr_id) => {
            let len = ev.to_uint32(ev.get(arr_id, "length")?)?;
            let mut out = Vec::with_capacity(len as usize);
            for i in 0..len {
                out.push(ev.get(arr_id, &i.to_string())?);
            }
            out
        }
        _ => return Err(ev.throw_type("Function.prototype.apply: arguments list must be an array")),
    };
    ev.call_value(this, new_this, &arg_vals)
}

/// `new Function(p1, p2, ..., body)` (spec §4.4, ambient supplement): the
/// last argument is the body source, every earlier argument a
/// comma-joined parameter list, compiled the same way `eval` compiles
/// source (spec §6 global `eval`).
fn construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
    let mut parts = Vec::new();
    for a in args {
        let id = ev.to_string_value(*a)?;
        parts.push(ev.read_string(id));
    }
    let body = parts.pop().unwrap_or_default();
    let params = parts.join(",");
    let source = format!("(function ({params}) {{\n{body}\n}})");
    let program = crate::parser::parse_program(&source, ev.version())
        .map_err(|e| ev.throw_syntax(e.message))?;
    ev.run_program(&program).map_err(|e| crate::exception::RunError { value: e.value, stack: e.stack })
}

fn call(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    construct(ev, args)
}
