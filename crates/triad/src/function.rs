//! Function objects: closures over scripted bodies, and native callables
//! contributed by the built-in constructor framework (spec §4.4).

use std::rc::Rc;

use crate::{
    ast::FunctionBody,
    exception::RunResult,
    evaluator::Evaluator,
    heap::HeapId,
    property::PropKey,
    value::Value,
};

/// A native function implementing a plain call. `this` has already been
/// coerced per the built-in's class-check rules (spec §4.4); `args` is the
/// raw argument list (no `arguments`-object aliasing applies to natives).
pub(crate) type NativeFn = fn(&mut Evaluator, Value, &[Value]) -> RunResult<Value>;

/// A native constructor invoked for `new F(...)`. Natives that need
/// class-specific allocation (`Array`, `Date`, `RegExp`, boxed primitives)
/// implement this instead of relying on the generic `new` algorithm (spec
/// §4.3 "Constructor call"), which only applies to scripted functions and
/// natives that don't provide one.
pub(crate) type NativeConstructFn = fn(&mut Evaluator, &[Value]) -> RunResult<Value>;

/// A scripted function's closure: captured lexical scope plus everything
/// needed to build a fresh activation on each call (spec §4.3 "Function
/// call").
#[derive(Debug, Clone)]
pub(crate) struct ScriptFunctionData {
    pub name: Option<Rc<str>>,
    pub params: Vec<PropKey>,
    pub body: Rc<FunctionBody>,
    /// The lexical outer scope chain captured at definition time. The
    /// callee's activation object is prepended to this at call time (spec
    /// §3 Activation object, §4.3 step 5).
    pub scope: Vec<HeapId>,
    pub strict: bool,
}

/// Either half of the call/construct virtual dispatch table for
/// `ClassTag::Function` objects (spec §4.2).
#[derive(Debug, Clone)]
pub(crate) enum Callable {
    Script(ScriptFunctionData),
    Native {
        name: &'static str,
        length: u32,
        call: NativeFn,
        construct: Option<NativeConstructFn>,
    },
}

impl Callable {
    pub(crate) fn is_constructable(&self) -> bool {
        match self {
            Callable::Script(_) => true,
            Callable::Native { construct, .. } => construct.is_some(),
        }
    }

    pub(crate) fn declared_length(&self) -> u32 {
        match self {
            Callable::Script(f) => f.params.len() as u32,
            Callable::Native { length, .. } => *length,
        }
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            Callable::Script(f) => f.name.as_deref().unwrap_or(""),
            Callable::Native { name, .. } => name,
        }
    }
}
