//! Resource configuration (spec §4.1 heap limits; ambient per SPEC_FULL.md
//! §2). Mirrors the teacher's `resource.rs` split between a heap-side limit
//! (`HeapLimits`) and the evaluator-side knob that decides how often to
//! re-check it (`ResourceLimits`), rather than a single flat struct, so an
//! embedder can reuse `HeapLimits` on its own if it ever drives the heap
//! without a full `Evaluator`.

/// Bounds on the garbage-collected arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapLimits {
    /// Hard cap on live objects. `None` means unbounded, the default.
    /// Exceeding this aborts the process (spec §4.1: allocation never fails
    /// observably at the script level).
    pub max_objects: Option<usize>,
}

impl HeapLimits {
    pub fn unbounded() -> Self {
        HeapLimits { max_objects: None }
    }

    pub fn bounded(max_objects: usize) -> Self {
        HeapLimits { max_objects: Some(max_objects) }
    }
}

/// Top-level embedder configuration for a [`crate::Runner`]/[`crate::Evaluator`].
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub heap: HeapLimits,
    /// Allocations between GC safepoint passes (spec §4.1 step 1). `None`
    /// keeps the evaluator's built-in default.
    pub gc_threshold: Option<u32>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits { heap: HeapLimits::unbounded(), gc_threshold: None }
    }
}
