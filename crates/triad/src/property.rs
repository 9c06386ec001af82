//! Property tables and property attributes (spec §3 Property, §4.2).
//!
//! A property is either a data property or an accessor property; both carry
//! the shared `enumerable`/`configurable` bits. Pre-V5 dialects only ever
//! see three hidden flags (`ReadOnly`, `DontEnum`, `DontDelete`); we still
//! store the unified four-bit shape internally and simply never surface
//! `configurable`-dependent behavior (accessors, `defineProperty`) before
//! V5. This keeps one representation instead of two, at the cost of a few
//! fields that are meaningless pre-V5 — the same trade the teacher made by
//! keeping one `Value` enum instead of splitting immediate/heap
//! representations per-version.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

/// An object property key. Always a string in every dialect covered here
/// (no `Symbol` type exists in V1/V3/V5).
pub(crate) type PropKey = Rc<str>;

/// Either half of the data/accessor union (spec §3 Property).
#[derive(Debug, Clone)]
pub(crate) enum Property {
    Data { value: Value, writable: bool },
    /// `get`/`set` are `None` when only one half of the pair was supplied;
    /// `Value::Undefined` is used for "no getter"/"no setter" results,
    /// matching the ES5.1 description of absent accessor functions.
    Accessor { get: Option<Value>, set: Option<Value> },
}

impl Property {
    pub(crate) fn data(value: Value, writable: bool) -> Self {
        Property::Data { value, writable }
    }

    pub(crate) fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor { .. })
    }
}

/// The enumerable/configurable bits shared by both property kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Attrs {
    pub enumerable: bool,
    pub configurable: bool,
}

impl Attrs {
    /// The default attribute set for a property created by an ordinary
    /// assignment (spec §4.2 `put`): `{writable, enumerable, configurable} =
    /// {true, true, true}` (writability lives on `Property::Data` itself).
    pub(crate) const DEFAULT: Attrs = Attrs {
        enumerable: true,
        configurable: true,
    };

    /// Used for built-in methods and constructor slots: present, but
    /// hidden from `for-in` and not deletable, matching `DontEnum |
    /// DontDelete` on native properties across all three dialects.
    pub(crate) const HIDDEN: Attrs = Attrs {
        enumerable: false,
        configurable: false,
    };

    /// Hidden, but still deletable/redefinable (used sparingly; most
    /// built-in slots use `HIDDEN`).
    pub(crate) const HIDDEN_CONFIGURABLE: Attrs = Attrs {
        enumerable: false,
        configurable: true,
    };
}

#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub prop: Property,
    pub attrs: Attrs,
}

impl Slot {
    pub(crate) fn new(prop: Property, attrs: Attrs) -> Self {
        Slot { prop, attrs }
    }
}

/// An object's own properties, in insertion order.
///
/// Insertion order is preserved and used directly for enumeration (spec
/// §9 design note): V3+ enumerates in strict insertion order, and we adopt
/// the same policy for V1 rather than emulating V1's hash-ordered array
/// enumeration quirk — the spec explicitly sanctions this simplification
/// ("implementers preferring a single policy should adopt insertion order
/// and skip the V1-specific test").
#[derive(Debug, Default)]
pub(crate) struct PropertyTable {
    map: IndexMap<PropKey, Slot>,
}

impl PropertyTable {
    pub(crate) fn new() -> Self {
        PropertyTable { map: IndexMap::new() }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Slot> {
        self.map.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Slot> {
        self.map.get_mut(key)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts or overwrites a slot, preserving the original insertion
    /// position if the key already existed (matching `IndexMap::insert`).
    pub(crate) fn set(&mut self, key: PropKey, slot: Slot) {
        self.map.insert(key, slot);
    }

    /// Removes an own property unconditionally. Callers must first check
    /// `configurable` themselves (spec §4.2 `delete`); this is the raw
    /// storage operation.
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        self.map.shift_remove(key).is_some()
    }

    /// Own keys in insertion order, including non-enumerable ones (used by
    /// `Object.getOwnPropertyNames`-style reflection and by `delete`/`get`).
    pub(crate) fn own_keys(&self) -> impl Iterator<Item = &PropKey> {
        self.map.keys()
    }

    /// Own *enumerable* keys in insertion order (spec §4.2 `enumerate`,
    /// first half of the concatenation).
    pub(crate) fn own_enumerable_keys(&self) -> impl Iterator<Item = &PropKey> {
        self.map.iter().filter(|(_, s)| s.attrs.enumerable).map(|(k, _)| k)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
