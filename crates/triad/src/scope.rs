//! The scope chain (spec §3 "Scope chain", §4.5).
//!
//! A scope chain is just an ordered list of objects; resolving an
//! identifier is ordinary property lookup against each object in turn.
//! `with` and `catch` push an object at the head for their lexical extent;
//! the tail is always the global object.

use crate::heap::HeapId;

/// Innermost-first ordering is modeled by storing the head as the *last*
/// `Vec` element, so `with`/`catch` scopes push/pop like a stack and
/// `iter_head_to_tail` just reverses.
#[derive(Debug, Clone)]
pub(crate) struct ScopeChain(Vec<HeapId>);

impl ScopeChain {
    /// A scope chain consisting only of the global object (spec §3: the
    /// tail is always the global object; a chain is never empty).
    pub(crate) fn global(global: HeapId) -> Self {
        ScopeChain(vec![global])
    }

    /// Builds the call-time scope chain: the callee's captured lexical
    /// outer chain with the fresh activation object prepended at the head
    /// (spec §4.3 step 5).
    pub(crate) fn with_activation(outer: &[HeapId], activation: HeapId) -> Self {
        let mut v = Vec::with_capacity(outer.len() + 1);
        v.extend_from_slice(outer);
        v.push(activation);
        ScopeChain(v)
    }

    pub(crate) fn push(&mut self, obj: HeapId) {
        self.0.push(obj);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }

    pub(crate) fn head(&self) -> HeapId {
        *self.0.last().expect("scope chain is never empty")
    }

    pub(crate) fn global_object(&self) -> HeapId {
        self.0[0]
    }

    /// Walks head-to-tail, as spec §4.5's `resolve_identifier` requires.
    pub(crate) fn iter_head_to_tail(&self) -> impl Iterator<Item = HeapId> + '_ {
        self.0.iter().rev().copied()
    }

    pub(crate) fn as_ids(&self) -> &[HeapId] {
        &self.0
    }
}
