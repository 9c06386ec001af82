//! Object representation (spec §3 Object).
//!
//! `ObjectData` is the heap payload shared by every class. Class-specific
//! behavior (spec §9 "polymorphic object behavior... expressed as a fixed
//! capability table attached to each class tag rather than by inheritance")
//! lives in [`InternalSlots`]; the actual `get`/`put`/`has`/`delete` virtual
//! dispatch that *reads* those slots lives on [`crate::evaluator::Evaluator`]
//! because several overrides (accessor invocation, `Array.length`,
//! `arguments` aliasing) need to call back into the evaluator.

use std::rc::Rc;

use crate::{
    function::Callable,
    heap::HeapId,
    property::{PropKey, PropertyTable},
};

/// The fixed set of internal class tags (spec §3 Object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassTag {
    Object,
    Function,
    Array,
    String,
    Boolean,
    Number,
    Date,
    RegExp,
    Error,
    Arguments,
    Global,
    Math,
}

impl ClassTag {
    pub(crate) fn name(self) -> &'static str {
        match self {
            ClassTag::Object => "Object",
            ClassTag::Function => "Function",
            ClassTag::Array => "Array",
            ClassTag::String => "String",
            ClassTag::Boolean => "Boolean",
            ClassTag::Number => "Number",
            ClassTag::Date => "Date",
            ClassTag::RegExp => "RegExp",
            ClassTag::Error => "Error",
            ClassTag::Arguments => "Arguments",
            ClassTag::Global => "global",
            ClassTag::Math => "Math",
        }
    }
}

/// A simple (non-regex-engine) pattern used by the `RegExp` built-in. True
/// pattern compilation is out of scope per spec.md §1 ("source tokenization
/// and parsing" and built-in library internals are external collaborators);
/// we support plain substring/literal matching, documented in DESIGN.md.
#[derive(Debug, Clone)]
pub(crate) struct RegExpData {
    pub source: Rc<str>,
    pub global: bool,
    pub ignore_case: bool,
    pub last_index: u32,
}

/// The `arguments` object's index-aliasing table (spec §3 Arguments object,
/// §4.5). `None` under V5 strict functions, where the hooks are not
/// installed and indexed properties behave as plain data.
#[derive(Debug, Clone)]
pub(crate) struct ArgumentsAlias {
    /// The activation object whose parameter slots are aliased.
    pub activation: HeapId,
    /// Parameter names in declaration order; index `i` aliases
    /// `param_names[i]` on `activation` for `i < param_names.len()`.
    pub param_names: Vec<PropKey>,
}

/// Class-specific payload attached to an object, read by the virtual
/// dispatch table on [`crate::evaluator::Evaluator`].
#[derive(Debug, Clone)]
pub(crate) enum InternalSlots {
    None,
    Function(Callable),
    /// Array elements live as ordinary indexed data properties in the
    /// property table; only `length` needs a dedicated slot because
    /// writing it must delete every own index `>= length` (spec §8).
    Array { length: u32 },
    /// A boxed primitive string (`new String(...)`); holds the primitive's
    /// heap string id so indexed access and `.length` don't need to
    /// restringify a property lookup.
    StringBox(HeapId),
    BooleanBox(bool),
    NumberBox(f64),
    /// Milliseconds since the epoch; `NaN` marks an invalid Date.
    DateBox(f64),
    RegExpBox(RegExpData),
    /// Aliasing hooks for non-strict `arguments` objects.
    Arguments(Option<ArgumentsAlias>),
}

/// An object on the heap.
#[derive(Debug, Clone)]
pub(crate) struct ObjectData {
    pub class: ClassTag,
    pub prototype: Option<HeapId>,
    /// Meaningful only from V5 onward (spec §3); pre-V5 objects are always
    /// logically extensible and nothing consults this field.
    pub extensible: bool,
    pub properties: PropertyTable,
    pub internal: InternalSlots,
}

impl ObjectData {
    pub(crate) fn new(class: ClassTag, prototype: Option<HeapId>) -> Self {
        ObjectData {
            class,
            prototype,
            extensible: true,
            properties: PropertyTable::new(),
            internal: InternalSlots::None,
        }
    }

    pub(crate) fn with_internal(class: ClassTag, prototype: Option<HeapId>, internal: InternalSlots) -> Self {
        let mut o = Self::new(class, prototype);
        o.internal = internal;
        o
    }

    pub(crate) fn is_callable(&self) -> bool {
        matches!(self.internal, InternalSlots::Function(_))
    }

    pub(crate) fn as_callable(&self) -> Option<&Callable> {
        match &self.internal {
            InternalSlots::Function(c) => Some(c),
            _ => None,
        }
    }

    /// Appends the heap ids this object directly references: its
    /// prototype, every property value/getter/setter that is itself an
    /// object, and anything named by its internal slots.
    pub(crate) fn trace(&self, out: &mut Vec<HeapId>) {
        if let Some(p) = self.prototype {
            out.push(p);
        }
        for key in self.properties.own_keys() {
            let slot = self.properties.get(key).expect("key came from own_keys");
            match &slot.prop {
                crate::property::Property::Data { value, .. } => value.trace(out),
                crate::property::Property::Accessor { get, set } => {
                    if let Some(v) = get {
                        v.trace(out);
                    }
                    if let Some(v) = set {
                        v.trace(out);
                    }
                }
            }
        }
        match &self.internal {
            InternalSlots::Function(Callable::Script(f)) => {
                out.extend_from_slice(&f.scope);
            }
            InternalSlots::StringBox(id) => out.push(*id),
            InternalSlots::Arguments(Some(alias)) => out.push(alias.activation),
            _ => {}
        }
    }
}
