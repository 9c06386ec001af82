//! The built-in constructor framework (spec §4.4) and global-object
//! initialization (spec §4.4 "Every built-in... is constructed during
//! global-object initialization").
//!
//! `install` runs once, before an [`crate::evaluator::Evaluator`] exists, so
//! every helper in this module works directly against a [`Heap`] rather than
//! through the evaluator's allocation helpers (which need `&mut Evaluator`
//! for things like tracing). The per-method native bodies registered here
//! *do* run with a live `&mut Evaluator` (see [`crate::function::NativeFn`])
//! and use its coercion/object-model methods freely, matching spec §4.4's
//! "automatic ToNumber / ToString / ToObject coercions at the boundary".

mod array_ctor;
mod boolean_ctor;
mod console;
mod date_ctor;
mod error_ctor;
mod function_ctor;
mod globals;
mod math_obj;
mod number_ctor;
mod object_ctor;
mod regexp_ctor;
mod string_ctor;

use std::rc::Rc;

use crate::{
    evaluator::{Evaluator, Realm},
    function::{Callable, NativeConstructFn, NativeFn},
    heap::{Heap, HeapData, HeapId},
    object::{ClassTag, InternalSlots, ObjectData, RegExpData},
    property::{Attrs, Property, Slot},
    value::Value,
    version::Version,
};

pub(crate) fn make_string(heap: &mut Heap, s: &str) -> HeapId {
    heap.make_string(crate::coerce::to_utf16(s))
}

pub(crate) fn alloc_object(heap: &mut Heap, class: ClassTag, proto: Option<HeapId>) -> HeapId {
    heap.allocate(HeapData::Obj(ObjectData::new(class, proto)))
}

pub(crate) fn alloc_object_with(heap: &mut Heap, class: ClassTag, proto: Option<HeapId>, internal: InternalSlots) -> HeapId {
    heap.allocate(HeapData::Obj(ObjectData::with_internal(class, proto, internal)))
}

/// A present-but-hidden own property, matching `DontEnum | DontDelete` on
/// native slots across all three dialects (spec §4.4).
pub(crate) fn define_hidden(heap: &mut Heap, obj: HeapId, key: &str, value: Value, writable: bool) {
    heap.obj_mut(obj).properties.set(Rc::from(key), Slot::new(Property::data(value, writable), Attrs::HIDDEN));
}

/// An ordinary, fully-mutable own property (used for things like array
/// literal elements built up at install time, rarely needed here).
pub(crate) fn define_enumerable(heap: &mut Heap, obj: HeapId, key: &str, value: Value, writable: bool) {
    heap.obj_mut(obj).properties.set(Rc::from(key), Slot::new(Property::data(value, writable), Attrs::DEFAULT));
}

/// Registers a native function object with the usual function attributes:
/// non-enumerable `length` and `name` (spec §4.4 "the usual function
/// attributes (non-enumerable `prototype` etc.)").
pub(crate) fn native_fn(heap: &mut Heap, function_prototype: HeapId, name: &'static str, length: u32, call: NativeFn) -> HeapId {
    native_fn_ctor(heap, function_prototype, name, length, call, None)
}

pub(crate) fn native_fn_ctor(
    heap: &mut Heap,
    function_prototype: HeapId,
    name: &'static str,
    length: u32,
    call: NativeFn,
    construct: Option<NativeConstructFn>,
) -> HeapId {
    let id = alloc_object_with(
        heap,
        ClassTag::Function,
        Some(function_prototype),
        InternalSlots::Function(Callable::Native { name, length, call, construct }),
    );
    define_hidden(heap, id, "length", Value::Number(length as f64), false);
    let name_val = Value::Str(make_string(heap, name));
    define_hidden(heap, id, "name", name_val, false);
    id
}

/// Installs `name` on `target` as a hidden method backed by `call`.
pub(crate) fn method(heap: &mut Heap, function_prototype: HeapId, target: HeapId, name: &'static str, length: u32, call: NativeFn) {
    let f = native_fn(heap, function_prototype, name, length, call);
    define_hidden(heap, target, name, Value::Object(f), true);
}

/// Wires up a constructor/prototype pair: `ctor.prototype = proto`,
/// `proto.constructor = ctor`, both hidden (spec §3 invariant: "A
/// function's `prototype` property and its prototype's `constructor`
/// property are mutually linked on creation").
pub(crate) fn link_ctor_proto(heap: &mut Heap, ctor: HeapId, proto: HeapId) {
    define_hidden(heap, ctor, "prototype", Value::Object(proto), false);
    define_hidden(heap, proto, "constructor", Value::Object(ctor), true);
}

/// Installs a global binding: a named property directly on the global
/// object, hidden like every other built-in slot.
pub(crate) fn global_binding(heap: &mut Heap, global: HeapId, name: &'static str, value: Value, writable: bool) {
    define_hidden(heap, global, name, value, writable);
}

/// Builds every well-known object and wires them onto a fresh global object
/// (spec §4.4, §6 "Global object").
pub(crate) fn install(heap: &mut Heap, version: Version) -> Realm {
    let object_prototype = alloc_object(heap, ClassTag::Object, None);

    let function_prototype = alloc_object_with(
        heap,
        ClassTag::Function,
        Some(object_prototype),
        InternalSlots::Function(Callable::Native { name: "", length: 0, call: noop_call, construct: None }),
    );
    define_hidden(heap, function_prototype, "length", Value::Number(0.0), false);

    let empty_str = make_string(heap, "");
    let array_prototype = alloc_object_with(heap, ClassTag::Array, Some(object_prototype), InternalSlots::Array { length: 0 });
    let string_prototype = alloc_object_with(heap, ClassTag::String, Some(object_prototype), InternalSlots::StringBox(empty_str));
    let boolean_prototype = alloc_object_with(heap, ClassTag::Boolean, Some(object_prototype), InternalSlots::BooleanBox(false));
    let number_prototype = alloc_object_with(heap, ClassTag::Number, Some(object_prototype), InternalSlots::NumberBox(0.0));
    let date_prototype = alloc_object_with(heap, ClassTag::Date, Some(object_prototype), InternalSlots::DateBox(f64::NAN));
    let regexp_prototype = alloc_object_with(
        heap,
        ClassTag::RegExp,
        Some(object_prototype),
        InternalSlots::RegExpBox(RegExpData { source: Rc::from(""), global: false, ignore_case: false, last_index: 0 }),
    );
    let error_prototype = alloc_object(heap, ClassTag::Error, Some(object_prototype));

    let global = alloc_object(heap, ClassTag::Global, Some(object_prototype));

    object_ctor::install(heap, version, object_prototype, function_prototype, global);
    function_ctor::install(heap, version, function_prototype, global);
    array_ctor::install(heap, version, object_prototype, function_prototype, array_prototype, global);
    string_ctor::install(heap, version, object_prototype, function_prototype, string_prototype, global);
    number_ctor::install(heap, version, object_prototype, function_prototype, number_prototype, global);
    boolean_ctor::install(heap, function_prototype, boolean_prototype, global);
    date_ctor::install(heap, version, function_prototype, date_prototype, global);
    regexp_ctor::install(heap, function_prototype, regexp_prototype, global);
    let error_sub_prototypes = error_ctor::install(heap, version, function_prototype, error_prototype, global);
    math_obj::install(heap, function_prototype, object_prototype, global);
    console::install(heap, function_prototype, object_prototype, global);
    globals::install(heap, version, function_prototype, global);

    Realm {
        global,
        object_prototype,
        function_prototype,
        array_prototype,
        string_prototype,
        boolean_prototype,
        number_prototype,
        date_prototype,
        regexp_prototype,
        error_prototype,
        error_sub_prototypes,
    }
}

fn noop_call(_ev: &mut Evaluator, _this: Value, _args: &[Value]) -> crate::exception::RunResult<Value> {
    Ok(Value::Undefined)
}

/// Shared "class-coerced `this`" check (spec §4.4): used by every
/// prototype method that only makes sense against its own class or a boxed
/// primitive of that class.
pub(crate) fn require_class(ev: &mut Evaluator, this: Value, class: ClassTag, what: &str) -> crate::exception::RunResult<HeapId> {
    if let Value::Object(id) = this {
        if ev.heap.obj(id).class == class {
            return Ok(id);
        }
    }
    Err(ev.throw_type(format!("{what} called on incompatible receiver")))
}
