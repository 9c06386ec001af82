//! The `Math` object (spec §4.4; supplemented per SPEC_FULL.md §3 from
//! `test_math_object.cpp`). Unlike the other built-ins, `Math` is a plain
//! object, never constructed or called.

use super::{define_hidden, global_binding, method};
use crate::{evaluator::Evaluator, exception::RunResult, heap::{Heap, HeapId}, object::ClassTag, value::Value};

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Undefined)
}

pub(super) fn install(heap: &mut Heap, function_prototype: HeapId, object_prototype: HeapId, global: HeapId) {
    let math = super::alloc_object(heap, ClassTag::Math, Some(object_prototype));

    define_hidden(heap, math, "E", Value::Number(std::f64::consts::E), false);
    define_hidden(heap, math, "LN10", Value::Number(std::f64::consts::LN_10), false);
    define_hidden(heap, math, "LN2", Value::Number(std::f64::consts::LN_2), false);
    define_hidden(heap, math, "LOG2E", Value::Number(std::f64::consts::LOG2_E), false);
    define_hidden(heap, math, "LOG10E", Value::Number(std::f64::consts::LOG10_E), false);
    define_hidden(heap, math, "PI", Value::Number(std::f64::consts::PI), false);
    define_hidden(heap, math, "SQRT1_2", Value::Number(std::f64::consts::FRAC_1_SQRT_2), false);
    define_hidden(heap, math, "SQRT2", Value::Number(std::f64::consts::SQRT_2), false);

    method(heap, function_prototype, math, "abs", 1, abs);
    method(heap, function_prototype, math, "floor", 1, floor);
    method(heap, function_prototype, math, "ceil", 1, ceil);
    method(heap, function_prototype, math, "round", 1, round);
    method(heap, function_prototype, math, "max", 2, max);
    method(heap, function_prototype, math, "min", 2, min);
    method(heap, function_prototype, math, "pow", 2, pow);
    method(heap, function_prototype, math, "sqrt", 1, sqrt);
    method(heap, function_prototype, math, "random", 0, random);
    method(heap, function_prototype, math, "log", 1, log);
    method(heap, function_prototype, math, "exp", 1, exp);
    method(heap, function_prototype, math, "sin", 1, sin);
    method(heap, function_prototype, math, "cos", 1, cos);
    method(heap, function_prototype, math, "tan", 1, tan);
    method(heap, function_prototype, math, "atan2", 2, atan2);

    global_binding(heap, global, "Math", Value::Object(math), true);
}

macro_rules! unary_fn {
    ($name:ident, $op:expr) => {
        fn $name(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
            let n = ev.to_number(arg(args, 0))?;
            let f: fn(f64) -> f64 = $op;
            Ok(Value::Number(f(n)))
        }
    };
}

unary_fn!(abs, f64::abs);
unary_fn!(floor, f64::floor);
unary_fn!(ceil, f64::ceil);
unary_fn!(sqrt, f64::sqrt);
unary_fn!(log, f64::ln);
unary_fn!(exp, f64::exp);
unary_fn!(sin, f64::sin);
unary_fn!(cos, f64::cos);
unary_fn!(tan, f64::tan);

/// Rounds half-up (toward positive infinity on a tie), matching the ES3
/// `Math.round` definition rather than Rust's round-half-away-from-zero.
fn round(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let n = ev.to_number(arg(args, 0))?;
    Ok(Value::Number((n + 0.5).floor()))
}

fn max(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let mut best = f64::NEG_INFINITY;
    for a in args {
        let n = ev.to_number(*a)?;
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if n > best {
            best = n;
        }
    }
    Ok(Value::Number(best))
}

fn min(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let mut best = f64::INFINITY;
    for a in args {
        let n = ev.to_number(*a)?;
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if n < best {
            best = n;
        }
    }
    Ok(Value::Number(best))
}

fn pow(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let base = ev.to_number(arg(args, 0))?;
    let exponent = ev.to_number(arg(args, 1))?;
    Ok(Value::Number(base.powf(exponent)))
}

fn atan2(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let y = ev.to_number(arg(args, 0))?;
    let x = ev.to_number(arg(args, 1))?;
    Ok(Value::Number(y.atan2(x)))
}

/// A host-provided source of randomness (spec §4.4 host interface); not
/// reproducible across runs, matching `Math.random`'s own non-goal of
/// determinism.
fn random(_ev: &mut Evaluator, _this: Value, _args: &[Value]) -> RunResult<Value> {
    use rand::Rng;
    Ok(Value::Number(rand::thread_rng().gen::<f64>()))
}
