//! `Object` constructor and `Object.prototype` (spec §4.4; supplemented
//! per SPEC_FULL.md §3 from `test_object_object.cpp`).

use std::rc::Rc;

use super::{global_binding, link_ctor_proto, method, native_fn_ctor};
use crate::{
    evaluator::Evaluator,
    exception::RunResult,
    heap::{Heap, HeapId},
    object::ClassTag,
    property::{Attrs, Property, Slot},
    value::Value,
    version::Version,
};

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Undefined)
}

pub(super) fn install(heap: &mut Heap, version: Version, object_prototype: HeapId, function_prototype: HeapId, global: HeapId) {
    let ctor = native_fn_ctor(heap, function_prototype, "Object", 1, call, Some(construct));
    link_ctor_proto(heap, ctor, object_prototype);

    method(heap, function_prototype, object_prototype, "toString", 0, to_string);
    method(heap, function_prototype, object_prototype, "toLocaleString", 0, to_string);
    method(heap, function_prototype, object_prototype, "valueOf", 0, value_of);
    method(heap, function_prototype, object_prototype, "hasOwnProperty", 1, has_own_property);
    method(heap, function_prototype, object_prototype, "propertyIsEnumerable", 1, property_is_enumerable);
    method(heap, function_prototype, object_prototype, "isPrototypeOf", 1, is_prototype_of);

    if version.has_accessors() {
        method(heap, function_prototype, ctor, "keys", 1, keys);
        method(heap, function_prototype, ctor, "getPrototypeOf", 1, get_prototype_of);
        method(heap, function_prototype, ctor, "getOwnPropertyNames", 1, get_own_property_names);
        method(heap, function_prototype, ctor, "defineProperty", 3, define_property);
        method(heap, function_prototype, ctor, "create", 2, create);
    }

    global_binding(heap, global, "Object", Value::Object(ctor), true);
}

fn call(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    construct(ev, args)
}

fn construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
    let v = arg(args, 0);
    match v {
        Value::Undefined | Value::Null => Ok(Value::Object(ev.alloc_plain_object())),
        Value::Object(_) => Ok(v),
        _ => Ok(Value::Object(ev.to_object(v)?)),
    }
}

fn to_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let class_name = match this {
        Value::Object(id) => ev.heap.obj(id).class.name(),
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        _ => "Object",
    };
    Ok(ev.string_value(&format!("[object {class_name}]")))
}

fn value_of(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    match this {
        Value::Object(_) => Ok(this),
        other => Ok(Value::Object(ev.to_object(other)?)),
    }
}

fn has_own_property(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let key_id = ev.to_string_value(arg(args, 0))?;
    let key = ev.read_string(key_id);
    let id = ev.to_object(this)?;
    let own = ev.heap.obj(id).properties.contains(&key)
        || (matches!(ev.heap.obj(id).internal, crate::object::InternalSlots::Array { .. }) && key == "length");
    Ok(Value::Boolean(own))
}

fn property_is_enumerable(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let key_id = ev.to_string_value(arg(args, 0))?;
    let key = ev.read_string(key_id);
    let id = ev.to_object(this)?;
    let enumerable = ev.heap.obj(id).properties.get(&key).is_some_and(|s| s.attrs.enumerable);
    Ok(Value::Boolean(enumerable))
}

fn is_prototype_of(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let Value::Object(this_id) = this else {
        return Ok(Value::Boolean(false));
    };
    let Value::Object(mut cur) = arg(args, 0) else {
        return Ok(Value::Boolean(false));
    };
    loop {
        match ev.heap.obj(cur).prototype {
            Some(p) => {
                if p == this_id {
                    return Ok(Value::Boolean(true));
                }
                cur = p;
            }
            None => return Ok(Value::Boolean(false)),
        }
    }
}

fn keys(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let Value::Object(id) = arg(args, 0) else {
        return Err(ev.throw_type("Object.keys called on non-object"));
    };
    let own_keys: Vec<Rc<str>> = ev
        .heap
        .obj(id)
        .properties
        .own_keys()
        .cloned()
        .filter(|k| ev.heap.obj(id).properties.get(k).is_some_and(|s| s.attrs.enumerable))
        .collect();
    let values: Vec<Value> = own_keys.iter().map(|k| ev.string_value(k)).collect();
    Ok(Value::Object(ev.alloc_array(&values)))
}

fn get_own_property_names(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let Value::Object(id) = arg(args, 0) else {
        return Err(ev.throw_type("Object.getOwnPropertyNames called on non-object"));
    };
    let own_keys: Vec<Rc<str>> = ev.heap.obj(id).properties.own_keys().cloned().collect();
    let values: Vec<Value> = own_keys.iter().map(|k| ev.string_value(k)).collect();
    Ok(Value::Object(ev.alloc_array(&values)))
}

fn get_prototype_of(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let Value::Object(id) = arg(args, 0) else {
        return Err(ev.throw_type("Object.getPrototypeOf called on non-object"));
    };
    Ok(match ev.heap.obj(id).prototype {
        Some(p) => Value::Object(p),
        None => Value::Null,
    })
}

/// `Object.defineProperty` (V5 only): redefines an own property subject to
/// the ES5.1 §8.12.9 validity lattice (spec §9 Open Question (b)). We
/// follow the table precisely for the cases this engine can observe:
/// a non-configurable property rejects any attribute-changing
/// redefinition except widening `writable: true -> false` is also
/// rejected once non-configurable, and the data/accessor kind cannot
/// change once non-configurable.
fn define_property(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let Value::Object(id) = arg(args, 0) else {
        return Err(ev.throw_type("Object.defineProperty called on non-object"));
    };
    let key_id = ev.to_string_value(arg(args, 1))?;
    let key = ev.read_string(key_id);
    let Value::Object(desc_id) = arg(args, 2) else {
        return Err(ev.throw_type("Property description must be an object"));
    };

    let has = |ev: &mut Evaluator, k: &str| ev.has(desc_id, k);
    let get_prop = |ev: &mut Evaluator, k: &str| -> RunResult<Value> { ev.get(desc_id, k) };

    let existing = ev.heap.obj(id).properties.get(&key).cloned();
    let is_accessor_desc = has(ev, "get") || has(ev, "set");

    if let Some(slot) = &existing {
        if !slot.attrs.configurable {
            // Only a value change on an already-writable data property is
            // permitted once non-configurable; everything else is rejected.
            let compatible = match &slot.prop {
                Property::Data { writable: true, .. } if !is_accessor_desc => {
                    if has(ev, "writable") {
                        let w = get_prop(ev, "writable")?;
                        !matches!(w, Value::Boolean(false))
                    } else {
                        true
                    }
                }
                _ => false,
            };
            if !compatible {
                return Err(ev.throw_type(format!("Cannot redefine property: '{key}'")));
            }
        }
    }

    let enumerable = if has(ev, "enumerable") {
        let v = get_prop(ev, "enumerable")?;
        ev.to_boolean_full(v)
    } else {
        existing.as_ref().is_some_and(|s| s.attrs.enumerable)
    };
    let configurable = if has(ev, "configurable") {
        let v = get_prop(ev, "configurable")?;
        ev.to_boolean_full(v)
    } else {
        existing.as_ref().is_some_and(|s| s.attrs.configurable)
    };
    let attrs = Attrs { enumerable, configurable };

    let prop = if is_accessor_desc {
        let get = if has(ev, "get") { Some(get_prop(ev, "get")?) } else { None };
        let set = if has(ev, "set") { Some(get_prop(ev, "set")?) } else { None };
        Property::Accessor { get, set }
    } else {
        let value = if has(ev, "value") { get_prop(ev, "value")? } else { Value::Undefined };
        let writable = if has(ev, "writable") {
            let v = get_prop(ev, "writable")?;
            ev.to_boolean_full(v)
        } else {
            false
        };
        Property::Data { value, writable }
    };
    ev.heap.obj_mut(id).properties.set(Rc::from(key.as_str()), Slot::new(prop, attrs));
    Ok(Value::Object(id))
}

fn create(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let proto = match arg(args, 0) {
        Value::Object(p) => Some(p),
        Value::Null => None,
        _ => return Err(ev.throw_type("Object prototype may only be an Object or null")),
    };
    let id = ev.alloc_object_with(ClassTag::Object, proto, crate::object::InternalSlots::None);
    if let Value::Object(props) = arg(args, 1) {
        let keys: Vec<Rc<str>> = ev.heap.obj(props).properties.own_keys().cloned().collect();
        for k in keys {
            let desc = ev.get(props, &k)?;
            let key_value = ev.string_value(&k);
            define_property(ev, Value::Undefined, &[Value::Object(id), key_value, desc])?;
        }
    }
    Ok(Value::Object(id))
}
