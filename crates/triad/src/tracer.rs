//! Execution tracing (ambient "logging" concern; see SPEC_FULL.md §2).
//!
//! A trait-based hook system mirroring the teacher's `tracer.rs`: a
//! [`NoopTracer`] compiles away entirely via monomorphization, while
//! [`StderrTracer`] prints a human-readable execution log. No external
//! logging crate is introduced — the teacher hand-rolls this rather than
//! pulling in one, and we follow the same approach.

use crate::ast::Span;

/// Hook points the evaluator calls at key execution events.
pub trait VmTracer {
    fn on_statement(&mut self, _span: Span) {}
    fn on_call_enter(&mut self, _callee_name: &str) {}
    fn on_call_exit(&mut self, _callee_name: &str) {}
    fn on_throw(&mut self, _span: Span) {}
    fn on_gc(&mut self, _live_before: usize, _live_after: usize) {}
}

/// Zero-cost production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

/// Human-readable execution log to stderr, useful when debugging a script
/// or this crate itself.
#[derive(Debug, Default)]
pub struct StderrTracer {
    depth: usize,
}

impl StderrTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VmTracer for StderrTracer {
    fn on_statement(&mut self, span: Span) {
        eprintln!("{}stmt @ {}:{}", "  ".repeat(self.depth), span.start.line, span.start.col);
    }

    fn on_call_enter(&mut self, callee_name: &str) {
        eprintln!("{}-> call {callee_name}", "  ".repeat(self.depth));
        self.depth += 1;
    }

    fn on_call_exit(&mut self, callee_name: &str) {
        self.depth = self.depth.saturating_sub(1);
        eprintln!("{}<- return {callee_name}", "  ".repeat(self.depth));
    }

    fn on_throw(&mut self, span: Span) {
        eprintln!("{}!! throw @ {}:{}", "  ".repeat(self.depth), span.start.line, span.start.col);
    }

    fn on_gc(&mut self, live_before: usize, live_after: usize) {
        eprintln!("gc: {live_before} -> {live_after} live objects");
    }
}
