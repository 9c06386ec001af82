//! `Error` and its six built-in subtypes (spec §7 Taxonomy). `install`
//! returns the `(ExcType, HeapId)` table [`crate::evaluator::Evaluator`]
//! consults whenever it throws an internal error of a given kind.

use std::rc::Rc;

use super::{alloc_object, define_hidden, global_binding, link_ctor_proto, method, native_fn_ctor};
use crate::{
    evaluator::Evaluator,
    exception::{ExcType, RunResult},
    heap::{Heap, HeapId},
    object::{ClassTag, InternalSlots},
    property::{Attrs, Property, Slot},
    value::Value,
    version::Version,
};

pub(super) fn install(
    heap: &mut Heap,
    version: Version,
    function_prototype: HeapId,
    error_prototype: HeapId,
    global: HeapId,
) -> Vec<(ExcType, HeapId)> {
    define_hidden(heap, error_prototype, "name", Value::Str(super::make_string(heap, "Error")), true);
    define_hidden(heap, error_prototype, "message", Value::Str(super::make_string(heap, "")), true);
    method(heap, function_prototype, error_prototype, "toString", 0, to_string);

    let error_ctor = native_fn_ctor(heap, function_prototype, "Error", 1, call_error, Some(construct_error));
    link_ctor_proto(heap, error_ctor, error_prototype);
    global_binding(heap, global, "Error", Value::Object(error_ctor), true);

    let mut table = vec![(ExcType::Error, error_prototype)];
    install_sub(heap, version, function_prototype, error_prototype, global, &mut table, ExcType::EvalError, "EvalError", call_eval_error, construct_eval_error);
    install_sub(heap, version, function_prototype, error_prototype, global, &mut table, ExcType::RangeError, "RangeError", call_range_error, construct_range_error);
    install_sub(
        heap,
        version,
        function_prototype,
        error_prototype,
        global,
        &mut table,
        ExcType::ReferenceError,
        "ReferenceError",
        call_reference_error,
        construct_reference_error,
    );
    install_sub(heap, version, function_prototype, error_prototype, global, &mut table, ExcType::SyntaxError, "SyntaxError", call_syntax_error, construct_syntax_error);
    install_sub(heap, version, function_prototype, error_prototype, global, &mut table, ExcType::TypeError, "TypeError", call_type_error, construct_type_error);
    install_sub(heap, version, function_prototype, error_prototype, global, &mut table, ExcType::URIError, "URIError", call_uri_error, construct_uri_error);
    table
}

#[allow(clippy::too_many_arguments)]
fn install_sub(
    heap: &mut Heap,
    version: Version,
    function_prototype: HeapId,
    error_prototype: HeapId,
    global: HeapId,
    table: &mut Vec<(ExcType, HeapId)>,
    kind: ExcType,
    name: &'static str,
    call: crate::function::NativeFn,
    construct: crate::function::NativeConstructFn,
) {
    let proto = alloc_object(heap, ClassTag::Error, Some(error_prototype));
    define_hidden(heap, proto, "name", Value::Str(super::make_string(heap, name)), true);
    let ctor = native_fn_ctor(heap, function_prototype, name, 1, call, Some(construct));
    link_ctor_proto(heap, ctor, proto);
    if version.has_v3_syntax() || kind == ExcType::SyntaxError {
        global_binding(heap, global, name, Value::Object(ctor), true);
    }
    table.push((kind, proto));
}

fn to_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let Value::Object(id) = this else {
        return Err(ev.throw_type("Error.prototype.toString called on non-object"));
    };
    let name = ev.get(id, "name")?;
    let name = ev.to_display_string(name);
    let message = ev.get(id, "message")?;
    let message = ev.to_display_string(message);
    if message.is_empty() {
        Ok(ev.string_value(&name))
    } else {
        Ok(ev.string_value(&format!("{name}: {message}")))
    }
}

fn build(ev: &mut Evaluator, args: &[Value], kind: ExcType) -> RunResult<Value> {
    let proto = ev.realm.error_prototype_for(kind);
    let id = ev.alloc_object_with(ClassTag::Error, Some(proto), InternalSlots::None);
    if let Some(v) = args.first() {
        let msg_id = ev.to_string_value(*v)?;
        ev.heap
            .obj_mut(id)
            .properties
            .set(Rc::from("message"), Slot::new(Property::data(Value::Str(msg_id), true), Attrs::HIDDEN_CONFIGURABLE));
    }
    Ok(Value::Object(id))
}

macro_rules! error_pair {
    ($call:ident, $construct:ident, $kind:expr) => {
        fn $construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
            build(ev, args, $kind)
        }
        fn $call(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
            build(ev, args, $kind)
        }
    };
}

error_pair!(call_error, construct_error, ExcType::Error);
error_pair!(call_eval_error, construct_eval_error, ExcType::EvalError);
error_pair!(call_range_error, construct_range_error, ExcType::RangeError);
error_pair!(call_reference_error, construct_reference_error, ExcType::ReferenceError);
error_pair!(call_syntax_error, construct_syntax_error, ExcType::SyntaxError);
error_pair!(call_type_error, construct_type_error, ExcType::TypeError);
error_pair!(call_uri_error, construct_uri_error, ExcType::URIError);
