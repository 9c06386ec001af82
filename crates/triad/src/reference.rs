//! References: the transient `(base, name)` pairs produced by evaluating
//! identifiers and member expressions (spec §3 Reference, GLOSSARY).
//!
//! References are never stored on the heap; they live only as intermediate
//! results inside expression evaluation, which is why this type borrows
//! nothing from the heap itself — it just names a base and a key.

use crate::{heap::HeapId, property::PropKey};

/// The base of a reference: either a real object, or the sentinel that
/// means "no object in the scope chain had this name" (spec §3).
#[derive(Debug, Clone, Copy)]
pub(crate) enum Base {
    Object(HeapId),
    Unresolvable,
}

/// A `(base, name)` pair (spec §3 Reference, §4.3 `GetValue`/`PutValue`).
#[derive(Debug, Clone)]
pub(crate) struct Reference {
    pub base: Base,
    pub name: PropKey,
}

impl Reference {
    pub(crate) fn new(base: Base, name: PropKey) -> Self {
        Reference { base, name }
    }

    pub(crate) fn unresolvable(name: PropKey) -> Self {
        Reference { base: Base::Unresolvable, name }
    }

    pub(crate) fn is_unresolvable(&self) -> bool {
        matches!(self.base, Base::Unresolvable)
    }
}
