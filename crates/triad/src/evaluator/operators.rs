//! Binary operator semantics (spec §4.3: "binary operator semantics follow
//! the reference of §11 of the language's V3 specification").
//!
//! Every operator here receives already-evaluated operands — left-to-right
//! evaluation of the operands themselves happened in
//! [`super::expr::Evaluator::eval_expr_value`] — but the *coercions* a
//! given operator performs (`ToPrimitive`, `ToNumber`) still have to run in
//! left-to-right order among themselves, since those can invoke script
//! `valueOf`/`toString` methods with observable side effects (spec §4.3
//! "the tests rely on observing the `valueOf` call order").

use crate::{ast::BinOp, exception::RunResult, object::ClassTag, value::Value};

use super::Evaluator;

impl Evaluator {
    pub(crate) fn binary_op(&mut self, op: BinOp, l: Value, r: Value) -> RunResult<Value> {
        match op {
            BinOp::Add => self.op_add(l, r),
            BinOp::Sub => self.op_numeric(l, r, |a, b| a - b),
            BinOp::Mul => self.op_numeric(l, r, |a, b| a * b),
            BinOp::Div => self.op_numeric(l, r, |a, b| a / b),
            BinOp::Mod => self.op_numeric(l, r, |a, b| a % b),
            BinOp::Lt => Ok(Value::Boolean(self.abstract_less_than(l, r)?.unwrap_or(false))),
            BinOp::Gt => Ok(Value::Boolean(self.abstract_less_than(r, l)?.unwrap_or(false))),
            BinOp::Le => Ok(Value::Boolean(!self.abstract_less_than(r, l)?.unwrap_or(true))),
            BinOp::Ge => Ok(Value::Boolean(!self.abstract_less_than(l, r)?.unwrap_or(true))),
            BinOp::Eq => Ok(Value::Boolean(self.abstract_equals(l, r)?)),
            BinOp::Ne => Ok(Value::Boolean(!self.abstract_equals(l, r)?)),
            BinOp::StrictEq => Ok(Value::Boolean(self.strict_equals(l, r))),
            BinOp::StrictNe => Ok(Value::Boolean(!self.strict_equals(l, r))),
            BinOp::BitAnd => self.op_int32(l, r, |a, b| a & b),
            BinOp::BitOr => self.op_int32(l, r, |a, b| a | b),
            BinOp::BitXor => self.op_int32(l, r, |a, b| a ^ b),
            BinOp::Shl => {
                let a = self.to_int32(l)?;
                let b = self.to_uint32(r)? & 31;
                Ok(Value::Number((a << b) as f64))
            }
            BinOp::Shr => {
                let a = self.to_int32(l)?;
                let b = self.to_uint32(r)? & 31;
                Ok(Value::Number((a >> b) as f64))
            }
            BinOp::UShr => {
                let a = self.to_uint32(l)?;
                let b = self.to_uint32(r)? & 31;
                Ok(Value::Number((a >> b) as f64))
            }
            BinOp::In => self.op_in(l, r),
            BinOp::InstanceOf => self.op_instance_of(l, r),
        }
    }

    /// Whether `v`'s `ToPrimitive` should default to the string hint. Only
    /// `Date` objects override the otherwise-number-like default (spec
    /// §4.2 `default_value`: "`string` or `Date` default: toString then
    /// valueOf").
    fn default_hint_is_string(&self, v: Value) -> bool {
        matches!(v, Value::Object(id) if self.heap.obj(id).class == ClassTag::Date)
    }

    /// `+` (spec §4.3): string concatenation if either operand, after
    /// `ToPrimitive` with its default hint, is a string; otherwise numeric
    /// addition. Operands are primitived left-to-right.
    fn op_add(&mut self, l: Value, r: Value) -> RunResult<Value> {
        let l_hint = self.default_hint_is_string(l);
        let lp = self.to_primitive(l, l_hint)?;
        let r_hint = self.default_hint_is_string(r);
        let rp = self.to_primitive(r, r_hint)?;
        if matches!(lp, Value::Str(_)) || matches!(rp, Value::Str(_)) {
            let ls = self.to_string_value(lp)?;
            let rs = self.to_string_value(rp)?;
            let mut units = self.heap.str_units(ls).to_vec();
            units.extend_from_slice(self.heap.str_units(rs));
            return Ok(Value::Str(self.heap.make_string(units)));
        }
        let ln = self.to_number(lp)?;
        let rn = self.to_number(rp)?;
        Ok(Value::Number(ln + rn))
    }

    fn op_numeric(&mut self, l: Value, r: Value, f: impl Fn(f64, f64) -> f64) -> RunResult<Value> {
        let ln = self.to_number(l)?;
        let rn = self.to_number(r)?;
        Ok(Value::Number(f(ln, rn)))
    }

    fn op_int32(&mut self, l: Value, r: Value, f: impl Fn(i32, i32) -> i32) -> RunResult<Value> {
        let la = self.to_int32(l)?;
        let rb = self.to_int32(r)?;
        Ok(Value::Number(f(la, rb) as f64))
    }

    /// Abstract relational comparison (spec §4.3, §8 boundary behavior:
    /// "all comparisons with `NaN` are false"). Returns `None` when the
    /// comparison is undefined (either side is `NaN`); callers map that to
    /// `false` for `<`/`>` directly, and to `false` (not `true`) for the
    /// negated `<=`/`>=` forms, matching ECMA's `!(y<x)` definition.
    fn abstract_less_than(&mut self, l: Value, r: Value) -> RunResult<Option<bool>> {
        let lp = self.to_primitive(l, false)?;
        let rp = self.to_primitive(r, false)?;
        if let (Value::Str(a), Value::Str(b)) = (lp, rp) {
            return Ok(Some(self.heap.str_units(a) < self.heap.str_units(b)));
        }
        let ln = self.to_number(lp)?;
        let rn = self.to_number(rp)?;
        if ln.is_nan() || rn.is_nan() {
            return Ok(None);
        }
        Ok(Some(ln < rn))
    }

    /// Abstract equality comparison (`==`/`!=`), ES3 §11.9.3.
    pub(crate) fn abstract_equals(&mut self, a: Value, b: Value) -> RunResult<bool> {
        use Value::{Boolean, Null, Number, Object, Str, Undefined};
        match (a, b) {
            (Undefined, Undefined) | (Null, Null) | (Undefined, Null) | (Null, Undefined) => Ok(true),
            (Number(x), Number(y)) => Ok(x == y),
            (Str(x), Str(y)) => Ok(self.heap.str_units(x) == self.heap.str_units(y)),
            (Boolean(x), Boolean(y)) => Ok(x == y),
            (Object(x), Object(y)) => Ok(x == y),
            (Number(_), Str(_)) => {
                let bn = self.to_number(b)?;
                self.abstract_equals(a, Value::Number(bn))
            }
            (Str(_), Number(_)) => {
                let an = self.to_number(a)?;
                self.abstract_equals(Value::Number(an), b)
            }
            (Boolean(_), _) => {
                let an = self.to_number(a)?;
                self.abstract_equals(Value::Number(an), b)
            }
            (_, Boolean(_)) => {
                let bn = self.to_number(b)?;
                self.abstract_equals(a, Value::Number(bn))
            }
            (Number(_) | Str(_), Object(_)) => {
                let bp = self.to_primitive(b, false)?;
                self.abstract_equals(a, bp)
            }
            (Object(_), Number(_) | Str(_)) => {
                let ap = self.to_primitive(a, false)?;
                self.abstract_equals(ap, b)
            }
            _ => Ok(false),
        }
    }

    /// Strict equality (`===`/`!==`): compares types first (spec §4.3).
    pub(crate) fn strict_equals(&self, a: Value, b: Value) -> bool {
        use Value::{Boolean, Null, Number, Object, Str, Undefined};
        match (a, b) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Boolean(x), Boolean(y)) => x == y,
            (Number(x), Number(y)) => x == y,
            (Str(x), Str(y)) => self.heap.str_units(x) == self.heap.str_units(y),
            (Object(x), Object(y)) => x == y,
            _ => false,
        }
    }

    fn op_in(&mut self, l: Value, r: Value) -> RunResult<Value> {
        let Value::Object(oid) = r else {
            return Err(self.throw_type("Cannot use 'in' operator to search for a key in a non-object"));
        };
        let key_id = self.to_string_value(l)?;
        let key = self.read_string(key_id);
        Ok(Value::Boolean(self.has(oid, &key)))
    }

    fn op_instance_of(&mut self, l: Value, r: Value) -> RunResult<Value> {
        let Value::Object(fid) = r else {
            return Err(self.throw_type("Right-hand side of 'instanceof' is not callable"));
        };
        if !self.heap.obj(fid).is_callable() {
            return Err(self.throw_type("Right-hand side of 'instanceof' is not callable"));
        }
        let Value::Object(mut cur) = l else {
            return Ok(Value::Boolean(false));
        };
        let proto_val = self.get(fid, "prototype")?;
        let Value::Object(target_proto) = proto_val else {
            return Err(self.throw_type("Function has non-object prototype in instanceof check"));
        };
        loop {
            match self.heap.obj(cur).prototype {
                Some(p) => {
                    if p == target_proto {
                        return Ok(Value::Boolean(true));
                    }
                    cur = p;
                }
                None => return Ok(Value::Boolean(false)),
            }
        }
    }
}
