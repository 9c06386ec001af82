//! The garbage-collected heap (spec §4.1).
//!
//! A non-moving, mark-and-sweep collector over a `Vec`-backed arena. Object
//! identity is a slot index (`HeapId`); slots are never relocated, so a
//! `HeapId` observed before a collection remains valid after one as long as
//! the object it names was reachable from the root set passed to
//! [`Heap::collect`].
//!
//! Unlike a copying collector, we don't need handle-indirection to survive a
//! collection — we only need to make sure every object that must outlive a
//! collection is *named* in the root set at the moment `collect` runs. The
//! evaluator only calls `collect` between statements (see
//! [`crate::evaluator::Evaluator::run_statement`]), so no expression
//! temporary that isn't reachable from the scope chain, the call stack, or
//! the transient root stack below can be silently swept out from under it.

use std::fmt;

use crate::object::ObjectData;

/// Identifies a single heap slot. Stable across collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(u32);

impl HeapId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for HeapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The data an arena slot holds. Every variant exposes its outbound
/// references through [`HeapData::trace`] so the collector can walk the
/// object graph without knowing the concrete shape of each class.
#[derive(Debug)]
pub(crate) enum HeapData {
    /// An immutable sequence of UTF-16-ish code units (spec §3 String).
    Str(Box<[u16]>),
    /// A regular or class-tagged object (spec §3 Object).
    Obj(ObjectData),
}

impl HeapData {
    pub(crate) fn as_obj(&self) -> &ObjectData {
        match self {
            HeapData::Obj(o) => o,
            HeapData::Str(_) => panic!("heap slot is a string, not an object"),
        }
    }

    pub(crate) fn as_obj_mut(&mut self) -> &mut ObjectData {
        match self {
            HeapData::Obj(o) => o,
            HeapData::Str(_) => panic!("heap slot is a string, not an object"),
        }
    }

    pub(crate) fn as_str(&self) -> &[u16] {
        match self {
            HeapData::Str(s) => s,
            HeapData::Obj(_) => panic!("heap slot is an object, not a string"),
        }
    }

    /// Appends every `HeapId` this value directly holds onto `out`. Used by
    /// the collector's mark phase; see spec §4.1 "expose a `trace(visitor)`
    /// operation that forwards visits to every outbound reference".
    fn trace(&self, out: &mut Vec<HeapId>) {
        match self {
            HeapData::Str(_) => {}
            HeapData::Obj(obj) => obj.trace(out),
        }
    }

    fn class_name(&self) -> &'static str {
        match self {
            HeapData::Str(_) => "Str",
            HeapData::Obj(obj) => obj.class.name(),
        }
    }
}

/// Snapshot of heap occupancy, exposed for leak-detection tests (spec §4.1
/// `use_ratio`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeapStats {
    pub live_objects: usize,
    pub free_slots: usize,
    pub total_slots: usize,
}

impl HeapStats {
    pub fn use_ratio(&self) -> f64 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.live_objects as f64 / self.total_slots as f64
        }
    }
}

/// The garbage-collected arena.
pub(crate) struct Heap {
    entries: Vec<Option<HeapData>>,
    free_list: Vec<u32>,
    /// Transient roots pushed by the evaluator around an allocation whose
    /// only reference lives in a Rust-stack temporary mid-expression (spec
    /// §4.1 "scoped local roots established by host code through an
    /// RAII-style handle"). Reset at every statement boundary.
    temp_roots: Vec<HeapId>,
    /// Soft cap used only by tests/embedders that want deterministic OOM
    /// behavior. `None` means unbounded (the default).
    max_objects: Option<usize>,
    allocations_since_collect: u32,
}

impl Heap {
    pub(crate) fn new() -> Self {
        Heap {
            entries: Vec::new(),
            free_list: Vec::new(),
            temp_roots: Vec::new(),
            max_objects: None,
            allocations_since_collect: 0,
        }
    }

    pub(crate) fn with_object_limit(max_objects: usize) -> Self {
        let mut h = Self::new();
        h.max_objects = Some(max_objects);
        h
    }

    /// Allocates `data` and returns its identity.
    ///
    /// Per spec §4.1, allocation never fails observably at the script
    /// level: if a configured object limit is exceeded the host aborts
    /// rather than returning an error a script could catch.
    pub(crate) fn allocate(&mut self, data: HeapData) -> HeapId {
        self.allocations_since_collect += 1;
        if let Some(slot) = self.free_list.pop() {
            self.entries[slot as usize] = Some(data);
            return HeapId(slot);
        }
        if let Some(max) = self.max_objects {
            let live = self.entries.len() - self.free_list.len();
            if live >= max {
                // Deliberately not a catchable error: an embedder that sets
                // an object limit is asking for a hard stop, not a
                // recoverable script-level condition.
                abort_out_of_memory(max);
            }
        }
        let id = HeapId(self.entries.len() as u32);
        self.entries.push(Some(data));
        id
    }

    pub(crate) fn make_string(&mut self, units: Vec<u16>) -> HeapId {
        self.allocate(HeapData::Str(units.into_boxed_slice()))
    }

    pub(crate) fn get(&self, id: HeapId) -> &HeapData {
        self.entries[id.index()]
            .as_ref()
            .expect("use of a HeapId after it was swept")
    }

    pub(crate) fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.entries[id.index()]
            .as_mut()
            .expect("use of a HeapId after it was swept")
    }

    pub(crate) fn obj(&self, id: HeapId) -> &ObjectData {
        self.get(id).as_obj()
    }

    pub(crate) fn obj_mut(&mut self, id: HeapId) -> &mut ObjectData {
        self.get_mut(id).as_obj_mut()
    }

    pub(crate) fn str_units(&self, id: HeapId) -> &[u16] {
        self.get(id).as_str()
    }

    /// Pushes a transient root. Pair with [`Heap::pop_temp_root`] around any
    /// span of code where an allocated object is held only by a Rust local
    /// while further allocating/calling code runs.
    pub(crate) fn push_temp_root(&mut self, id: HeapId) {
        self.temp_roots.push(id);
    }

    pub(crate) fn pop_temp_root(&mut self) {
        self.temp_roots.pop();
    }

    /// Clears the transient root stack. Called by the evaluator at every
    /// statement boundary, since no expression temporary needs to survive
    /// past the statement that produced it.
    pub(crate) fn clear_temp_roots(&mut self) {
        self.temp_roots.clear();
    }

    pub(crate) fn temp_roots(&self) -> &[HeapId] {
        &self.temp_roots
    }

    /// Runs mark-and-sweep collection.
    ///
    /// `extra_roots` is the evaluator-supplied root set: the global object,
    /// every activation object on the live call stack, and the pending
    /// exception (if any) being propagated through `finally` blocks. The
    /// heap's own transient root stack is unioned in automatically.
    pub(crate) fn collect(&mut self, extra_roots: &[HeapId]) {
        let mut work_list: Vec<HeapId> = Vec::with_capacity(extra_roots.len() + self.temp_roots.len());
        work_list.extend_from_slice(extra_roots);
        work_list.extend_from_slice(&self.temp_roots);

        let mut marked = vec![false; self.entries.len()];
        while let Some(id) = work_list.pop() {
            let idx = id.index();
            if idx >= marked.len() || marked[idx] {
                continue;
            }
            marked[idx] = true;
            if let Some(data) = &self.entries[idx] {
                data.trace(&mut work_list);
            }
        }

        for (idx, slot) in self.entries.iter_mut().enumerate() {
            if slot.is_some() && !marked[idx] {
                *slot = None;
                self.free_list.push(idx as u32);
            }
        }
        self.allocations_since_collect = 0;
    }

    /// Whether enough allocations have happened since the last collection
    /// to make another pass worthwhile. A simple counter threshold; the
    /// teacher's `may_have_cycles` refinement (skip GC entirely until a
    /// container first stores a reference to another heap object) is not
    /// reproduced here — see DESIGN.md.
    pub(crate) fn should_collect(&self, threshold: u32) -> bool {
        self.allocations_since_collect >= threshold
    }

    pub(crate) fn stats(&self) -> HeapStats {
        let free = self.free_list.len();
        let total = self.entries.len();
        HeapStats {
            live_objects: total - free,
            free_slots: free,
            total_slots: total,
        }
    }

    #[cfg(test)]
    pub(crate) fn stats_by_class(&self) -> std::collections::BTreeMap<&'static str, usize> {
        let mut map = std::collections::BTreeMap::new();
        for slot in &self.entries {
            if let Some(data) = slot {
                *map.entry(data.class_name()).or_insert(0) += 1;
            }
        }
        map
    }
}

#[cold]
fn abort_out_of_memory(limit: usize) -> ! {
    eprintln!("fatal: heap object limit ({limit}) exceeded; aborting");
    std::process::abort()
}
