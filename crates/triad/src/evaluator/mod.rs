//! The evaluator (spec §4.2 Object model, §4.3 Evaluator).
//!
//! `Evaluator` owns the heap and all evaluator-visible state: the well-known
//! prototype objects, the live call stack (used both for `this`-binding and
//! as GC roots), and the tracer. The object-model virtual dispatch described
//! in spec §4.2 — `get`/`put`/`has`/`delete`/`define`/`enumerate`/
//! `default_value`, plus `call`/`construct` — lives here rather than on
//! `ObjectData` because several overrides (accessor invocation, `Array`
//! length magic, `arguments` aliasing, calling into script code at all)
//! need a `&mut Evaluator` to run script callbacks.

mod expr;
mod operators;
mod stmt;

use std::rc::Rc;

use crate::{
    ast::{Program, Span},
    coerce,
    completion::Completion,
    exception::{EvalException, ExcType, RunError, RunResult, StackFrame},
    function::{Callable, NativeConstructFn, NativeFn, ScriptFunctionData},
    heap::{Heap, HeapData, HeapId},
    object::{ClassTag, InternalSlots, ObjectData},
    property::{Attrs, Property, PropertyTable, Slot},
    reference::{Base, Reference},
    scope::ScopeChain,
    tracer::{NoopTracer, VmTracer},
    value::Value,
    version::Version,
};

/// Collection runs once this many allocations have happened since the last
/// pass, unless an embedder overrides it.
const DEFAULT_GC_THRESHOLD: u32 = 4096;

/// The well-known objects installed once at startup (spec §4.4: "Every
/// built-in... is constructed during global-object initialization").
pub(crate) struct Realm {
    pub global: HeapId,
    pub object_prototype: HeapId,
    pub function_prototype: HeapId,
    pub array_prototype: HeapId,
    pub string_prototype: HeapId,
    pub boolean_prototype: HeapId,
    pub number_prototype: HeapId,
    pub date_prototype: HeapId,
    pub regexp_prototype: HeapId,
    pub error_prototype: HeapId,
    pub error_sub_prototypes: Vec<(ExcType, HeapId)>,
}

impl Realm {
    pub(crate) fn error_prototype_for(&self, kind: ExcType) -> HeapId {
        self.error_sub_prototypes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .unwrap_or(self.error_prototype)
    }
}

/// One call-stack entry: what the evaluator needs to know about a live
/// function activation to build `this`, resolve `arguments`, and form GC
/// roots (spec §3 Activation object).
pub(crate) struct Frame {
    pub activation: HeapId,
    pub this_value: Value,
    pub strict: bool,
    pub function_name: Rc<str>,
}

pub struct Evaluator {
    pub(crate) heap: Heap,
    pub(crate) realm: Realm,
    pub(crate) version: Version,
    pub(crate) scope: ScopeChain,
    pub(crate) frames: Vec<Frame>,
    pub(crate) tracer: Box<dyn VmTracer>,
    pub(crate) file_name: Rc<str>,
    pub(crate) gc_threshold: u32,
}

impl Evaluator {
    pub(crate) fn new(version: Version, file_name: Rc<str>, tracer: Box<dyn VmTracer>) -> Self {
        let mut heap = Heap::new();
        let realm = crate::builtins::install(&mut heap, version);
        let scope = ScopeChain::global(realm.global);
        Evaluator {
            heap,
            realm,
            version,
            scope,
            frames: Vec::new(),
            tracer,
            file_name,
            gc_threshold: DEFAULT_GC_THRESHOLD,
        }
    }

    pub(crate) fn with_default_tracer(version: Version, file_name: Rc<str>) -> Self {
        Self::new(version, file_name, Box::new(NoopTracer))
    }

    pub(crate) fn with_limits(
        version: Version,
        file_name: Rc<str>,
        tracer: Box<dyn VmTracer>,
        limits: crate::resource::ResourceLimits,
    ) -> Self {
        let mut heap = match limits.heap.max_objects {
            Some(max) => Heap::with_object_limit(max),
            None => Heap::new(),
        };
        let realm = crate::builtins::install(&mut heap, version);
        let scope = ScopeChain::global(realm.global);
        Evaluator {
            heap,
            realm,
            version,
            scope,
            frames: Vec::new(),
            tracer,
            file_name,
            gc_threshold: limits.gc_threshold.unwrap_or(DEFAULT_GC_THRESHOLD),
        }
    }

    pub(crate) fn version(&self) -> Version {
        self.version
    }

    pub(crate) fn heap_stats(&self) -> crate::heap::HeapStats {
        self.heap.stats()
    }

    // ---- roots & collection --------------------------------------------

    fn gather_roots(&self, extra: &[Value]) -> Vec<HeapId> {
        let mut roots = Vec::with_capacity(self.frames.len() * 2 + self.scope.as_ids().len() + extra.len() + 4);
        roots.push(self.realm.global);
        roots.extend_from_slice(self.scope.as_ids());
        for f in &self.frames {
            roots.push(f.activation);
            f.this_value.trace(&mut roots);
        }
        for v in extra {
            v.trace(&mut roots);
        }
        roots
    }

    /// Called between statements (spec §4.1 step 1: safepoints). Expression
    /// evaluation never calls this directly; see [`Heap::push_temp_root`]
    /// for the RAII-ish escape hatch used for sub-expression temporaries.
    pub(crate) fn maybe_collect(&mut self) {
        if self.heap.should_collect(self.gc_threshold) {
            let before = self.heap.stats().live_objects;
            let roots = self.gather_roots(&[]);
            self.heap.collect(&roots);
            self.heap.clear_temp_roots();
            let after = self.heap.stats().live_objects;
            self.tracer.on_gc(before, after);
        }
    }

    // ---- allocation helpers ---------------------------------------------

    pub(crate) fn alloc_string(&mut self, s: &str) -> HeapId {
        self.heap.make_string(coerce::to_utf16(s))
    }

    pub(crate) fn string_value(&mut self, s: &str) -> Value {
        Value::Str(self.alloc_string(s))
    }

    pub(crate) fn alloc_plain_object(&mut self) -> HeapId {
        let proto = Some(self.realm.object_prototype);
        self.heap.allocate(HeapData::Obj(ObjectData::new(ClassTag::Object, proto)))
    }

    pub(crate) fn alloc_object_with(&mut self, class: ClassTag, prototype: Option<HeapId>, internal: InternalSlots) -> HeapId {
        self.heap.allocate(HeapData::Obj(ObjectData::with_internal(class, prototype, internal)))
    }

    pub(crate) fn alloc_array(&mut self, elements: &[Value]) -> HeapId {
        let proto = Some(self.realm.array_prototype);
        let id = self.alloc_object_with(ClassTag::Array, proto, InternalSlots::Array { length: elements.len() as u32 });
        for (i, v) in elements.iter().enumerate() {
            let key: Rc<str> = Rc::from(i.to_string());
            self.heap.obj_mut(id).properties.set(key, Slot::new(Property::data(*v, true), Attrs::DEFAULT));
        }
        id
    }

    pub(crate) fn make_native_function(&mut self, name: &'static str, length: u32, call: NativeFn) -> HeapId {
        self.make_native_function_ctor(name, length, call, None)
    }

    pub(crate) fn make_native_function_ctor(
        &mut self,
        name: &'static str,
        length: u32,
        call: NativeFn,
        construct: Option<NativeConstructFn>,
    ) -> HeapId {
        let proto = Some(self.realm.function_prototype);
        let id =
            self.alloc_object_with(ClassTag::Function, proto, InternalSlots::Function(Callable::Native { name, length, call, construct }));
        let len_val = Value::Number(length as f64);
        self.heap.obj_mut(id).properties.set(Rc::from("length"), Slot::new(Property::data(len_val, false), Attrs::HIDDEN));
        let name_val = self.string_value(name);
        self.heap.obj_mut(id).properties.set(Rc::from("name"), Slot::new(Property::data(name_val, false), Attrs::HIDDEN));
        id
    }

    pub(crate) fn make_script_function(&mut self, data: ScriptFunctionData) -> RunResult<HeapId> {
        let proto = Some(self.realm.function_prototype);
        let length = data.params.len() as u32;
        let name = data.name.clone();
        let id = self.alloc_object_with(ClassTag::Function, proto, InternalSlots::Function(Callable::Script(data)));
        let len_val = Value::Number(length as f64);
        self.heap.obj_mut(id).properties.set(Rc::from("length"), Slot::new(Property::data(len_val, false), Attrs::HIDDEN));
        let name_val = self.string_value(name.as_deref().unwrap_or(""));
        self.heap.obj_mut(id).properties.set(Rc::from("name"), Slot::new(Property::data(name_val, false), Attrs::HIDDEN));

        let fn_proto_obj = self.alloc_plain_object();
        self.heap.obj_mut(id).properties.set(Rc::from("prototype"), Slot::new(Property::data(Value::Object(fn_proto_obj), true), Attrs::HIDDEN));
        self.heap.obj_mut(fn_proto_obj).properties.set(
            Rc::from("constructor"),
            Slot::new(Property::data(Value::Object(id), true), Attrs::HIDDEN),
        );
        Ok(id)
    }

    // ---- errors -----------------------------------------------------------

    pub(crate) fn throw_type(&mut self, msg: impl Into<String>) -> RunError {
        self.make_error(ExcType::TypeError, msg)
    }

    pub(crate) fn throw_range(&mut self, msg: impl Into<String>) -> RunError {
        self.make_error(ExcType::RangeError, msg)
    }

    pub(crate) fn throw_reference(&mut self, msg: impl Into<String>) -> RunError {
        self.make_error(ExcType::ReferenceError, msg)
    }

    pub(crate) fn throw_syntax(&mut self, msg: impl Into<String>) -> RunError {
        self.make_error(ExcType::SyntaxError, msg)
    }

    pub(crate) fn throw_uri(&mut self, msg: impl Into<String>) -> RunError {
        self.make_error(ExcType::URIError, msg)
    }

    pub(crate) fn make_error(&mut self, kind: ExcType, msg: impl Into<String>) -> RunError {
        let msg = msg.into();
        let visible = kind.visible_name(self.version.has_v3_syntax());
        let proto = self.realm.error_prototype_for(kind);
        let id = self.alloc_object_with(ClassTag::Error, Some(proto), InternalSlots::None);
        let name_val = self.string_value(visible);
        let msg_val = self.string_value(&msg);
        self.heap.obj_mut(id).properties.set(Rc::from("name"), Slot::new(Property::data(name_val, true), Attrs::DEFAULT));
        self.heap.obj_mut(id).properties.set(Rc::from("message"), Slot::new(Property::data(msg_val, true), Attrs::DEFAULT));
        RunError::new(Value::Object(id))
    }

    /// Stringifies a thrown value as `"<Name>: <Message>"` (spec §6), for
    /// building an [`EvalException`] at the top level. Falls back to
    /// `ToString` on any other thrown value.
    pub(crate) fn format_error_header(&mut self, v: Value) -> String {
        if let Value::Object(id) = v {
            if self.heap.obj(id).class == ClassTag::Error {
                let name = self
                    .get(id, "name")
                    .ok()
                    .map(|v| self.to_display_string(v))
                    .unwrap_or_else(|| "Error".to_string());
                let message = self
                    .get(id, "message")
                    .ok()
                    .map(|v| self.to_display_string(v))
                    .unwrap_or_default();
                return if message.is_empty() { name } else { format!("{name}: {message}") };
            }
        }
        self.to_display_string(v)
    }

    pub(crate) fn to_display_string(&mut self, v: Value) -> String {
        match self.to_string_value(v) {
            Ok(s) => self.read_string(s),
            Err(_) => "<error converting to string>".to_string(),
        }
    }

    /// Public wrapper used by [`crate::Runner::run`] to stringify a
    /// script's completion value the way a REPL would print it.
    pub(crate) fn to_display_string_pub(&mut self, v: Value) -> String {
        self.to_display_string(v)
    }

    pub(crate) fn read_string(&self, id: HeapId) -> String {
        coerce::from_utf16_lossy(self.heap.str_units(id))
    }

    // ---- top level ----------------------------------------------------

    /// Runs a parsed program to completion, returning the value of its
    /// final expression statement (mirroring a REPL's implicit result) or
    /// `undefined`. Any uncaught throw is rendered into an
    /// [`EvalException`].
    pub fn run_program(&mut self, program: &Program) -> Result<Value, EvalException> {
        self.apply_hoisting(&program.hoisted_vars, &program.hoisted_functions, self.scope.global_object());
        let mut last = Value::Undefined;
        for s in &program.body {
            match self.run_statement(s) {
                Ok(c) => last = c.value,
                Err(e) => {
                    let value = e.value;
                    let stack = e.stack;
                    return Err(EvalException { value, stack });
                }
            }
        }
        Ok(last)
    }

    fn apply_hoisting(&mut self, vars: &[Rc<str>], funcs: &[(Rc<str>, Rc<crate::ast::FunctionBody>)], target: HeapId) {
        for name in vars {
            if !self.heap.obj(target).properties.contains(name) {
                self.heap.obj_mut(target).properties.set(name.clone(), Slot::new(Property::data(Value::Undefined, true), Attrs::DEFAULT));
            }
        }
        for (name, body) in funcs {
            let scope_ids = self.scope.as_ids().to_vec();
            let data = ScriptFunctionData {
                name: Some(name.clone()),
                params: body.params.clone(),
                body: body.clone(),
                scope: scope_ids,
                strict: body.strict,
            };
            if let Ok(fn_id) = self.make_script_function(data) {
                self.heap
                    .obj_mut(target)
                    .properties
                    .set(name.clone(), Slot::new(Property::data(Value::Object(fn_id), true), Attrs::DEFAULT));
            }
        }
    }

    pub(crate) fn push_frame_span(&mut self, err: &mut RunError, span: Span) {
        err.push_frame(self.file_name.clone(), span);
    }

    // ---- object model: spec §4.2 ---------------------------------------

    /// `get(o, key)`. Walks the prototype chain; a class-specific override
    /// (`Array.length`, boxed-`String` index access, `arguments` aliasing)
    /// is consulted before falling back to the generic property walk.
    pub(crate) fn get(&mut self, o: HeapId, key: &str) -> RunResult<Value> {
        if let Some(v) = self.get_override(o, key)? {
            return Ok(v);
        }
        let mut cur = Some(o);
        while let Some(id) = cur {
            let found = {
                let obj = self.heap.obj(id);
                obj.properties.get(key).map(|slot| match &slot.prop {
                    Property::Data { value, .. } => Ok(*value),
                    Property::Accessor { get, .. } => Err(*get),
                })
            };
            match found {
                Some(Ok(value)) => return Ok(value),
                Some(Err(getter)) => {
                    return match getter {
                        Some(g) => self.call_value(g, Value::Object(o), &[]),
                        None => Ok(Value::Undefined),
                    };
                }
                None => {
                    cur = self.heap.obj(id).prototype;
                }
            }
        }
        Ok(Value::Undefined)
    }

    /// Class-specific read overrides. Returns `Ok(None)` to fall through to
    /// the ordinary property walk.
    fn get_override(&mut self, o: HeapId, key: &str) -> RunResult<Option<Value>> {
        let obj = self.heap.obj(o);
        match (&obj.internal, obj.class) {
            (InternalSlots::Array { length }, _) if key == "length" => Ok(Some(Value::Number(*length as f64))),
            (InternalSlots::StringBox(s), ClassTag::String) => {
                let s = *s;
                if key == "length" {
                    return Ok(Some(Value::Number(self.heap.str_units(s).len() as f64)));
                }
                if self.version.string_index_reads_char() {
                    if let Ok(idx) = key.parse::<usize>() {
                        let units = self.heap.str_units(s);
                        if idx < units.len() {
                            let ch = units[idx];
                            return Ok(Some(self.string_value_from_units(&[ch])));
                        }
                        return Ok(Some(Value::Undefined));
                    }
                }
                Ok(None)
            }
            (InternalSlots::Arguments(Some(alias)), _) => {
                if let Ok(idx) = key.parse::<usize>() {
                    if idx < alias.param_names.len() {
                        let activation = alias.activation;
                        let name = alias.param_names[idx].clone();
                        return Ok(Some(self.get(activation, &name)?));
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn string_value_from_units(&mut self, units: &[u16]) -> Value {
        Value::Str(self.heap.make_string(units.to_vec()))
    }

    /// `put(o, key, v, throw_on_fail)` (spec §4.2).
    pub(crate) fn put(&mut self, o: HeapId, key: &str, v: Value, throw_on_fail: bool) -> RunResult<()> {
        if self.put_override(o, key, v)? {
            return Ok(());
        }
        // Walk the chain looking for an existing accessor or read-only data
        // property that this write must respect.
        enum Found {
            Accessor(Option<Value>),
            Data { writable: bool, is_own: bool },
        }
        let mut cur = Some(o);
        while let Some(id) = cur {
            let found = {
                let obj = self.heap.obj(id);
                obj.properties.get(key).map(|slot| match &slot.prop {
                    Property::Accessor { set, .. } => Found::Accessor(*set),
                    Property::Data { writable, .. } => Found::Data { writable: *writable, is_own: id == o },
                })
            };
            match found {
                Some(Found::Accessor(setter)) => {
                    return match setter {
                        Some(s) => {
                            self.call_value(s, Value::Object(o), &[v])?;
                            Ok(())
                        }
                        None => {
                            if throw_on_fail {
                                Err(self.throw_type("Cannot set property of object which has only a getter"))
                            } else {
                                Ok(())
                            }
                        }
                    };
                }
                Some(Found::Data { writable, is_own }) => {
                    if !writable {
                        return if throw_on_fail {
                            Err(self.throw_type(format!("Cannot assign to read only property '{key}'")))
                        } else {
                            Ok(())
                        };
                    }
                    if is_own {
                        break;
                    }
                    break;
                }
                None => {
                    cur = self.heap.obj(id).prototype;
                }
            }
        }
        self.heap.obj_mut(o).properties.set(Rc::from(key), Slot::new(Property::data(v, true), Attrs::DEFAULT));
        Ok(())
    }

    fn put_override(&mut self, o: HeapId, key: &str, v: Value) -> RunResult<bool> {
        let array_len = match &self.heap.obj(o).internal {
            InternalSlots::Array { length } => Some(*length),
            _ => None,
        };
        if let Some(cur_len) = array_len {
            if key == "length" {
                let new_len = self.to_uint32(v)?;
                let exact = self.to_number(v)?;
                if exact != new_len as f64 {
                    return Err(self.throw_range("Invalid array length"));
                }
                self.set_array_length(o, new_len);
                return Ok(true);
            }
            if let Ok(idx) = key.parse::<u32>() {
                if idx >= cur_len {
                    if let InternalSlots::Array { length } = &mut self.heap.obj_mut(o).internal {
                        *length = idx + 1;
                    }
                }
            }
        }
        let alias_hit = match &self.heap.obj(o).internal {
            InternalSlots::Arguments(Some(alias)) => key.parse::<usize>().ok().filter(|i| *i < alias.param_names.len()).map(|idx| (alias.activation, alias.param_names[idx].clone())),
            _ => None,
        };
        if let Some((activation, name)) = alias_hit {
            self.put(activation, &name, v, false)?;
        }
        Ok(false)
    }

    fn set_array_length(&mut self, o: HeapId, new_len: u32) {
        let keys: Vec<Rc<str>> = self.heap.obj(o).properties.own_keys().cloned().collect();
        for k in keys {
            if let Ok(idx) = k.parse::<u32>() {
                if idx >= new_len {
                    self.heap.obj_mut(o).properties.remove(&k);
                }
            }
        }
        if let InternalSlots::Array { length } = &mut self.heap.obj_mut(o).internal {
            *length = new_len;
        }
    }

    /// `has(o, key)`.
    pub(crate) fn has(&self, o: HeapId, key: &str) -> bool {
        if matches!(self.heap.obj(o).internal, InternalSlots::Array { .. }) && key == "length" {
            return true;
        }
        let mut cur = Some(o);
        while let Some(id) = cur {
            let obj = self.heap.obj(id);
            if obj.properties.contains(key) {
                return true;
            }
            cur = obj.prototype;
        }
        false
    }

    /// `delete(o, key, throw_on_fail)`.
    pub(crate) fn delete(&mut self, o: HeapId, key: &str, throw_on_fail: bool) -> RunResult<bool> {
        let obj = self.heap.obj(o);
        match obj.properties.get(key) {
            None => Ok(true),
            Some(slot) => {
                if !slot.attrs.configurable && self.version.has_accessors() {
                    return if throw_on_fail {
                        Err(self.throw_type(format!("Cannot delete property '{key}'")))
                    } else {
                        Ok(false)
                    };
                }
                self.heap.obj_mut(o).properties.remove(key);
                Ok(true)
            }
        }
    }

    /// `enumerate(o)` (spec §4.2, §8 invariant on enumeration order):
    /// own enumerable keys in insertion order, then the prototype's
    /// enumeration with already-seen keys (own or inherited) skipped.
    pub(crate) fn enumerate(&self, o: HeapId) -> Vec<Rc<str>> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        let mut cur = Some(o);
        while let Some(id) = cur {
            let obj = self.heap.obj(id);
            for key in obj.properties.own_keys() {
                if seen.insert(key.clone()) {
                    if obj.properties.get(key).is_some_and(|s| s.attrs.enumerable) {
                        out.push(key.clone());
                    }
                }
            }
            cur = obj.prototype;
        }
        out
    }

    /// `default_value(o, hint)` (spec §4.2): tries `valueOf`/`toString` (or
    /// the reverse order for the `"string"`/Date-default hint), in each
    /// case only if the property resolves to something callable.
    pub(crate) fn default_value(&mut self, o: HeapId, hint_string_first: bool) -> RunResult<Value> {
        let order: [&str; 2] = if hint_string_first { ["toString", "valueOf"] } else { ["valueOf", "toString"] };
        for method in order {
            let f = self.get(o, method)?;
            if let Value::Object(fid) = f {
                if self.heap.obj(fid).is_callable() {
                    let result = self.call_value(f, Value::Object(o), &[])?;
                    if !result.is_object() {
                        return Ok(result);
                    }
                }
            }
        }
        Err(self.throw_type("Cannot convert object to primitive value"))
    }

    // ---- calling ---------------------------------------------------------

    pub(crate) fn call_value(&mut self, f: Value, this: Value, args: &[Value]) -> RunResult<Value> {
        let Value::Object(fid) = f else {
            return Err(self.throw_type("value is not a function"));
        };
        self.call_object(fid, this, args)
    }

    pub(crate) fn call_object(&mut self, fid: HeapId, this: Value, args: &[Value]) -> RunResult<Value> {
        let callable = match self.heap.obj(fid).as_callable() {
            Some(c) => c.clone(),
            None => return Err(self.throw_type("value is not a function")),
        };
        match callable {
            Callable::Native { name, call, .. } => {
                self.tracer.on_call_enter(name);
                let result = call(self, this, args);
                self.tracer.on_call_exit(name);
                result
            }
            Callable::Script(data) => self.call_script(fid, &data, this, args),
        }
    }

    fn call_script(&mut self, fid: HeapId, data: &ScriptFunctionData, this: Value, args: &[Value]) -> RunResult<Value> {
        let name = data.name.clone().unwrap_or_else(|| Rc::from(""));
        self.tracer.on_call_enter(&name);

        let activation = self.alloc_plain_object();
        // Bind formal parameters by position (spec §4.3 Function call step 2).
        for (i, p) in data.params.iter().enumerate() {
            let v = args.get(i).copied().unwrap_or(Value::Undefined);
            self.heap.obj_mut(activation).properties.set(p.clone(), Slot::new(Property::data(v, true), Attrs::DEFAULT));
        }

        // Construct `arguments` (spec §3 Arguments object, §4.5).
        let arguments_class = if self.version.has_v5_syntax() { ClassTag::Arguments } else { ClassTag::Object };
        let alias = if data.strict {
            None
        } else {
            Some(crate::object::ArgumentsAlias { activation, param_names: data.params.clone() })
        };
        let args_proto = Some(self.realm.object_prototype);
        let args_obj = self.alloc_object_with(arguments_class, args_proto, InternalSlots::Arguments(alias));
        for (i, v) in args.iter().enumerate() {
            let key: Rc<str> = Rc::from(i.to_string());
            self.heap.obj_mut(args_obj).properties.set(key, Slot::new(Property::data(*v, true), Attrs::DEFAULT));
        }
        let len_val = Value::Number(args.len() as f64);
        self.heap.obj_mut(args_obj).properties.set(Rc::from("length"), Slot::new(Property::data(len_val, true), Attrs::HIDDEN));
        let callee_val = Value::Object(fid);
        self.heap.obj_mut(args_obj).properties.set(Rc::from("callee"), Slot::new(Property::data(callee_val, true), Attrs::HIDDEN));
        self.heap.obj_mut(activation).properties.set(
            Rc::from("arguments"),
            Slot::new(Property::data(Value::Object(args_obj), true), Attrs::HIDDEN),
        );

        // Hoist inner function decls and vars onto the activation (step 4).
        self.apply_hoisting(&data.body.hoisted_vars, &data.body.hoisted_functions, activation);

        // Compose the call-time scope chain (step 5).
        let call_scope = ScopeChain::with_activation(&data.scope, activation);
        let saved_scope = std::mem::replace(&mut self.scope, call_scope);
        self.frames.push(Frame { activation, this_value: this, strict: data.strict, function_name: name.clone() });

        let mut result = Ok(Value::Undefined);
        for s in &data.body.body {
            match self.run_statement(s) {
                Ok(c) => {
                    if c.kind == crate::completion::CompletionKind::Return {
                        result = Ok(c.value);
                        break;
                    }
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        self.frames.pop();
        self.scope = saved_scope;
        self.tracer.on_call_exit(&name);
        result
    }

    /// `new F(args)` (spec §4.3 Constructor call).
    pub(crate) fn construct(&mut self, fid: HeapId, args: &[Value]) -> RunResult<Value> {
        let callable = match self.heap.obj(fid).as_callable() {
            Some(c) => c.clone(),
            None => return Err(self.throw_type("value is not a constructor")),
        };
        if !callable.is_constructable() {
            return Err(self.throw_type("value is not a constructor"));
        }
        if let Callable::Native { construct: Some(ctor), .. } = callable {
            return ctor(self, args);
        }
        let proto_val = self.get(fid, "prototype")?;
        let proto = match proto_val {
            Value::Object(p) => Some(p),
            _ => Some(self.realm.object_prototype),
        };
        let new_obj = self.alloc_plain_object();
        self.heap.obj_mut(new_obj).prototype = proto;
        let this = Value::Object(new_obj);
        let result = self.call_object(fid, this, args)?;
        Ok(if result.is_object() { result } else { this })
    }

    // ---- identifier resolution (spec §4.5) --------------------------------

    pub(crate) fn resolve_identifier(&self, name: &Rc<str>) -> Reference {
        for id in self.scope.iter_head_to_tail() {
            if self.has(id, name) {
                return Reference::new(Base::Object(id), name.clone());
            }
        }
        Reference::unresolvable(name.clone())
    }

    pub(crate) fn get_value_ref(&mut self, r: &Reference) -> RunResult<Value> {
        match r.base {
            Base::Unresolvable => Err(self.throw_reference(format!("{} is not defined", r.name))),
            Base::Object(id) => self.get(id, &r.name),
        }
    }

    pub(crate) fn put_value_ref(&mut self, r: &Reference, v: Value) -> RunResult<()> {
        match r.base {
            Base::Unresolvable => {
                let strict = self.frames.last().is_some_and(|f| f.strict);
                if strict {
                    Err(self.throw_reference(format!("{} is not defined", r.name)))
                } else {
                    let global = self.scope.global_object();
                    self.heap.obj_mut(global).properties.set(r.name.clone(), Slot::new(Property::data(v, true), Attrs::DEFAULT));
                    Ok(())
                }
            }
            Base::Object(id) => {
                let strict = self.frames.last().is_some_and(|f| f.strict);
                self.put(id, &r.name, v, strict)
            }
        }
    }

    pub(crate) fn current_this(&self) -> Value {
        self.frames.last().map(|f| f.this_value).unwrap_or(Value::Object(self.realm.global))
    }

    pub(crate) fn current_strict(&self) -> bool {
        self.frames.last().is_some_and(|f| f.strict)
    }

    // ---- coercions (spec §4.3, §4.4) --------------------------------------

    pub(crate) fn to_primitive(&mut self, v: Value, hint_string: bool) -> RunResult<Value> {
        match v {
            Value::Object(id) => self.default_value(id, hint_string),
            other => Ok(other),
        }
    }

    pub(crate) fn to_number(&mut self, v: Value) -> RunResult<f64> {
        Ok(match v {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => n,
            Value::Str(id) => {
                let s = self.read_string(id);
                coerce::parse_numeric_literal(&s).unwrap_or(if s.trim().is_empty() { 0.0 } else { f64::NAN })
            }
            Value::Object(_) => {
                let prim = self.to_primitive(v, false)?;
                self.to_number(prim)?
            }
        })
    }

    pub(crate) fn to_int32(&mut self, v: Value) -> RunResult<i32> {
        let n = self.to_number(v)?;
        Ok(coerce::to_int32(n))
    }

    pub(crate) fn to_uint32(&mut self, v: Value) -> RunResult<u32> {
        let n = self.to_number(v)?;
        Ok(coerce::to_uint32(n))
    }

    pub(crate) fn to_string_value(&mut self, v: Value) -> RunResult<HeapId> {
        match v {
            Value::Str(id) => Ok(id),
            Value::Object(_) => {
                let prim = self.to_primitive(v, true)?;
                self.to_string_value(prim)
            }
            other => {
                let s = match other {
                    Value::Undefined => "undefined".to_string(),
                    Value::Null => "null".to_string(),
                    Value::Boolean(b) => b.to_string(),
                    Value::Number(n) => coerce::format_number(n),
                    _ => unreachable!(),
                };
                Ok(self.alloc_string(&s))
            }
        }
    }

    pub(crate) fn to_boolean_full(&mut self, v: Value) -> bool {
        match v {
            Value::Str(id) => !self.heap.str_units(id).is_empty(),
            other => other.to_boolean(),
        }
    }

    /// `ToObject`, needed by `with`, `for-in`, and boxed-primitive method
    /// dispatch (e.g. `"abc".length`).
    pub(crate) fn to_object(&mut self, v: Value) -> RunResult<HeapId> {
        match v {
            Value::Object(id) => Ok(id),
            Value::Str(id) => {
                let proto = Some(self.realm.string_prototype);
                Ok(self.alloc_object_with(ClassTag::String, proto, InternalSlots::StringBox(id)))
            }
            Value::Number(n) => {
                let proto = Some(self.realm.number_prototype);
                Ok(self.alloc_object_with(ClassTag::Number, proto, InternalSlots::NumberBox(n)))
            }
            Value::Boolean(b) => {
                let proto = Some(self.realm.boolean_prototype);
                Ok(self.alloc_object_with(ClassTag::Boolean, proto, InternalSlots::BooleanBox(b)))
            }
            Value::Undefined | Value::Null => Err(self.throw_type("Cannot convert undefined or null to object")),
        }
    }

    /// `typeof`, including the heap-aware `"function"` case spec §8 calls
    /// out as part of the universal invariant.
    pub(crate) fn type_of(&self, v: Value) -> &'static str {
        match v {
            Value::Object(id) => {
                if self.heap.obj(id).is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
            other => other.type_of_primitive().unwrap(),
        }
    }
}
