//! Error taxonomy and the `Result` type used by every fallible core
//! operation (spec §7 Error Handling Design).

use std::fmt;

use strum::{Display, EnumString};

use crate::{ast::Span, value::Value};

/// The built-in error classes (spec §7 "Taxonomy").
///
/// V1 collapses everything below `SyntaxError` into a single generic
/// runtime-exception kind at the script-constructor level: only `Error`
/// and `SyntaxError` are reachable as global constructors pre-V3, even
/// though the evaluator still tags internal failures with the precise
/// variant for diagnostic purposes. See DESIGN.md for this resolution of
/// the "(V3+)" taxonomy note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub(crate) enum ExcType {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    URIError,
}

impl ExcType {
    /// The constructor name this exception type reduces to under `version`.
    pub(crate) fn visible_name(self, has_v3: bool) -> &'static str {
        if has_v3 || self == ExcType::Error || self == ExcType::SyntaxError {
            match self {
                ExcType::Error => "Error",
                ExcType::EvalError => "EvalError",
                ExcType::RangeError => "RangeError",
                ExcType::ReferenceError => "ReferenceError",
                ExcType::SyntaxError => "SyntaxError",
                ExcType::TypeError => "TypeError",
                ExcType::URIError => "URIError",
            }
        } else {
            "Error"
        }
    }
}

/// One frame of the uncaught-exception stack (spec §6 error message
/// format): `<file>:<line>:<col>-<line>:<col>`.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub file: std::rc::Rc<str>,
    pub span: Span,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.file, self.span.start.line, self.span.start.col, self.span.end.line, self.span.end.col
        )
    }
}

/// A fully-formed host-level exception: the thrown script value plus the
/// captured position stack (spec §6 "host-level exception (`eval_exception`)
/// carries the script-level error object plus the captured source-position
/// stack").
#[derive(Debug)]
pub struct EvalException {
    pub value: Value,
    /// Most-recent-call-first, matching the order frames are pushed while
    /// unwinding.
    pub stack: Vec<StackFrame>,
}

impl EvalException {
    /// Renders `"<Name>: <Message>"` followed by the newline-joined stack,
    /// given a way to stringify the thrown value (callers hold the heap
    /// needed to do that, so this takes the pre-rendered header).
    pub fn format(&self, header: &str) -> String {
        let mut out = header.to_string();
        for frame in &self.stack {
            out.push('\n');
            out.push_str(&frame.to_string());
        }
        out
    }
}

/// The error type threaded through every fallible core operation.
///
/// A `RunError` always represents a script-level `throw` (including ones
/// raised by built-ins enforcing their own type checks); there is no
/// separate "internal error" variant; see spec §7 "Propagation": errors
/// from native code are observable script-side exactly as script-raised
/// throws.
#[derive(Debug)]
pub(crate) struct RunError {
    pub value: Value,
    pub stack: Vec<StackFrame>,
}

impl RunError {
    pub(crate) fn new(value: Value) -> Self {
        RunError { value, stack: Vec::new() }
    }

    pub(crate) fn push_frame(&mut self, file: std::rc::Rc<str>, span: Span) {
        self.stack.push(StackFrame { file, span });
    }
}

pub(crate) type RunResult<T> = Result<T, RunError>;

/// A parse-time failure (spec §7: "a syntax-exception kind for parse
/// failures"). Kept separate from `RunError` because the lexer/parser run
/// before any heap or evaluator exists to host a script-level exception
/// object.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyntaxError: {} ({}:{}-{}:{})",
            self.message, self.span.start.line, self.span.start.col, self.span.end.line, self.span.end.col
        )
    }
}

impl std::error::Error for ParseError {}
