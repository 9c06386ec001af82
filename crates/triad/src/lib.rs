//! `triad`: a tree-walking evaluator, runtime object model and
//! garbage-collected heap for an early-generation ECMAScript-like scripting
//! language, gated across three dialects (V1/V3/V5).
//!
//! Lexing and parsing are ambient front-end concerns (see `SPEC_FULL.md`
//! §1-2); the crate's core is the evaluator, the heap, and the object model
//! built on top of it. [`Runner`] ties the three together for a host that
//! just wants to feed source text in and get a result or a formatted
//! exception back.

mod ast;
mod builtins;
mod coerce;
mod completion;
mod evaluator;
mod exception;
mod function;
mod heap;
mod hoist;
mod lexer;
mod object;
mod parser;
mod property;
mod reference;
mod resource;
mod scope;
mod tracer;
mod value;
mod version;

use std::rc::Rc;

pub use evaluator::Evaluator;
pub use exception::{EvalException, ParseError, StackFrame};
pub use heap::HeapStats;
pub use resource::{HeapLimits, ResourceLimits};
pub use tracer::{NoopTracer, StderrTracer, VmTracer};
pub use version::{Strict, Version};

/// Runs a script end to end: parse, then evaluate, against a single
/// [`Evaluator`] instance. This is the one entry point a host embedding this
/// crate needs for the common "run a file, get a result" case; finer control
/// (custom tracer, resource limits, calling back into a live evaluator
/// across multiple `run` calls) goes through [`Evaluator`] and
/// [`parser::parse_program`] directly.
pub struct Runner {
    evaluator: Evaluator,
}

impl Runner {
    pub fn new(version: Version, file_name: impl Into<Rc<str>>) -> Self {
        Runner { evaluator: Evaluator::with_default_tracer(version, file_name.into()) }
    }

    pub fn with_tracer(version: Version, file_name: impl Into<Rc<str>>, tracer: Box<dyn VmTracer>) -> Self {
        Runner { evaluator: Evaluator::new(version, file_name.into(), tracer) }
    }

    pub fn with_limits(version: Version, file_name: impl Into<Rc<str>>, limits: ResourceLimits) -> Self {
        Runner { evaluator: Evaluator::with_limits(version, file_name.into(), Box::new(tracer::NoopTracer), limits) }
    }

    /// Parses `source` under this runner's configured dialect and evaluates
    /// it against the live evaluator (so top-level `var`/`function`
    /// bindings from a previous call remain visible to the next one, like a
    /// REPL session).
    pub fn run(&mut self, source: &str) -> Result<RunOutcome, RunFailure> {
        let version = self.evaluator.version();
        let program = parser::parse_program(source, version).map_err(RunFailure::Parse)?;
        match self.evaluator.run_program(&program) {
            Ok(value) => Ok(RunOutcome { display: self.evaluator.to_display_string_pub(value) }),
            Err(e) => {
                let header = self.evaluator.format_error_header(e.value);
                Err(RunFailure::Eval(e.format(&header)))
            }
        }
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.evaluator.heap_stats()
    }
}

/// The successful result of [`Runner::run`]: the script's completion value,
/// already stringified the way a REPL or CLI driver would print it.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub display: String,
}

/// Either half of what can go wrong running a script: a parse-time syntax
/// error, or a fully formatted uncaught-exception report (spec §6).
#[derive(Debug, Clone)]
pub enum RunFailure {
    Parse(ParseError),
    Eval(String),
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunFailure::Parse(e) => write!(f, "{e}"),
            RunFailure::Eval(s) => f.write_str(s),
        }
    }
}

impl std::error::Error for RunFailure {}
