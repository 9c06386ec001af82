//! Expression evaluation (spec §4.3 "Expressions produce either a value or
//! a reference").

use std::rc::Rc;

use super::Evaluator;
use crate::{
    ast::{AssignOp, Expr, ExprKind, Literal, ObjectProp, PropKeyNode, UnaryOp, UpdateOp},
    exception::RunResult,
    object::{ClassTag, InternalSlots},
    property::{Attrs, Property, Slot},
    reference::{Base, Reference},
    value::Value,
};

/// Either half of spec §4.3's value-or-reference duality. Only
/// [`ExprKind::Identifier`] and [`ExprKind::Member`] ever produce a
/// `Reference`; everything else evaluates straight to a `Value`.
pub(crate) enum EvalResult {
    Value(Value),
    Ref(Reference),
}

impl EvalResult {
    fn into_value(self, ev: &mut Evaluator) -> RunResult<Value> {
        match self {
            EvalResult::Value(v) => Ok(v),
            EvalResult::Ref(r) => ev.get_value_ref(&r),
        }
    }
}

impl Evaluator {
    /// `GetValue` applied to whatever `e` evaluates to (spec §4.3).
    pub(crate) fn eval_expr(&mut self, e: &Expr) -> RunResult<Value> {
        let r = self.eval_expr_result(e)?;
        r.into_value(self)
    }

    /// Evaluates `e`, keeping a `Reference` alive when the expression is one
    /// of the l-value-producing kinds. Used by `delete`, `typeof`,
    /// assignment targets and `++`/`--`.
    pub(crate) fn eval_expr_result(&mut self, e: &Expr) -> RunResult<EvalResult> {
        match &e.kind {
            ExprKind::Identifier(name) => Ok(EvalResult::Ref(self.resolve_identifier(name))),
            ExprKind::Member { object, property, computed } => {
                let obj_val = self.eval_expr(object)?;
                let key = self.member_key(property, *computed)?;
                let base_obj = self.to_object(obj_val)?;
                Ok(EvalResult::Ref(Reference::new(Base::Object(base_obj), key)))
            }
            _ => Ok(EvalResult::Value(self.eval_expr_value(e)?)),
        }
    }

    fn member_key(&mut self, property: &Expr, computed: bool) -> RunResult<Rc<str>> {
        if !computed {
            if let ExprKind::Literal(Literal::String(s)) = &property.kind {
                return Ok(s.clone());
            }
        }
        let v = self.eval_expr(property)?;
        let id = self.to_string_value(v)?;
        Ok(Rc::from(self.read_string(id).as_str()))
    }

    fn eval_expr_value(&mut self, e: &Expr) -> RunResult<Value> {
        match &e.kind {
            ExprKind::Literal(lit) => Ok(self.eval_literal(lit)),
            ExprKind::Regex { source, global, ignore_case } => self.eval_regex_literal(source, *global, *ignore_case),
            ExprKind::This => Ok(self.current_this()),
            ExprKind::ArrayLiteral(items) => self.eval_array_literal(items),
            ExprKind::ObjectLiteral(props) => self.eval_object_literal(props),
            ExprKind::Function(body) => {
                let scope_ids = self.scope.as_ids().to_vec();
                let data = crate::function::ScriptFunctionData {
                    name: body.name.clone(),
                    params: body.params.clone(),
                    body: body.clone(),
                    scope: scope_ids,
                    strict: body.strict || self.current_strict(),
                };
                let id = self.make_script_function(data)?;
                Ok(Value::Object(id))
            }
            ExprKind::New { callee, args } => {
                let callee_val = self.eval_expr(callee)?;
                let Value::Object(fid) = callee_val else {
                    return Err(self.throw_type("not a constructor"));
                };
                let arg_vals = self.eval_args(args)?;
                self.construct(fid, &arg_vals)
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args),
            ExprKind::Update { op, prefix, target } => self.eval_update(*op, *prefix, target),
            ExprKind::Unary { op, arg } => self.eval_unary(*op, arg),
            ExprKind::Binary { op, left, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                self.binary_op(*op, l, r)
            }
            ExprKind::Logical { op, left, right } => self.eval_logical(*op, left, right),
            ExprKind::Conditional { test, cons, alt } => {
                let t = self.eval_expr(test)?;
                if self.to_boolean_full(t) {
                    self.eval_expr(cons)
                } else {
                    self.eval_expr(alt)
                }
            }
            ExprKind::Assign { op, target, value } => self.eval_assign(*op, target, value),
            ExprKind::Sequence(items) => {
                let mut last = Value::Undefined;
                for item in items {
                    last = self.eval_expr(item)?;
                }
                Ok(last)
            }
            ExprKind::Identifier(_) | ExprKind::Member { .. } => {
                let r = self.eval_expr_result(e)?;
                r.into_value(self)
            }
        }
    }

    fn eval_literal(&mut self, lit: &Literal) -> Value {
        match lit {
            Literal::Undefined => Value::Undefined,
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Boolean(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => self.string_value(s),
        }
    }

    fn eval_regex_literal(&mut self, source: &str, global: bool, ignore_case: bool) -> RunResult<Value> {
        let proto = Some(self.realm.regexp_prototype);
        let data = crate::object::RegExpData { source: Rc::from(source), global, ignore_case, last_index: 0 };
        let id = self.alloc_object_with(ClassTag::RegExp, proto, InternalSlots::RegExpBox(data));
        Ok(Value::Object(id))
    }

    fn eval_array_literal(&mut self, items: &[Option<Expr>]) -> RunResult<Value> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(match item {
                Some(e) => self.eval_expr(e)?,
                None => Value::Undefined,
            });
        }
        Ok(Value::Object(self.alloc_array(&values)))
    }

    fn eval_object_literal(&mut self, props: &[ObjectProp]) -> RunResult<Value> {
        let id = self.alloc_plain_object();
        self.heap.push_temp_root(id);
        let result = (|| -> RunResult<()> {
            for prop in props {
                match prop {
                    ObjectProp::Data { key, value } => {
                        let key = self.prop_key_name(key)?;
                        let v = self.eval_expr(value)?;
                        self.heap.obj_mut(id).properties.set(key, Slot::new(Property::data(v, true), Attrs::DEFAULT));
                    }
                    ObjectProp::Getter { key, body } => {
                        let key = self.prop_key_name(key)?;
                        let f = self.make_accessor_fn(body)?;
                        self.merge_accessor(id, key, Some(f), None);
                    }
                    ObjectProp::Setter { key, body } => {
                        let key = self.prop_key_name(key)?;
                        let f = self.make_accessor_fn(body)?;
                        self.merge_accessor(id, key, None, Some(f));
                    }
                }
            }
            Ok(())
        })();
        self.heap.pop_temp_root();
        result?;
        Ok(Value::Object(id))
    }

    fn make_accessor_fn(&mut self, body: &Rc<crate::ast::FunctionBody>) -> RunResult<Value> {
        let scope_ids = self.scope.as_ids().to_vec();
        let data = crate::function::ScriptFunctionData {
            name: None,
            params: body.params.clone(),
            body: body.clone(),
            scope: scope_ids,
            strict: body.strict,
        };
        Ok(Value::Object(self.make_script_function(data)?))
    }

    fn merge_accessor(&mut self, id: crate::heap::HeapId, key: Rc<str>, get: Option<Value>, set: Option<Value>) {
        let existing = self.heap.obj(id).properties.get(&key).and_then(|s| match &s.prop {
            Property::Accessor { get, set } => Some((*get, *set)),
            _ => None,
        });
        let (mut g, mut s) = existing.unwrap_or((None, None));
        if get.is_some() {
            g = get;
        }
        if set.is_some() {
            s = set;
        }
        self.heap.obj_mut(id).properties.set(key, Slot::new(Property::Accessor { get: g, set: s }, Attrs::DEFAULT));
    }

    fn prop_key_name(&mut self, key: &PropKeyNode) -> RunResult<Rc<str>> {
        Ok(match key {
            PropKeyNode::Ident(n) => n.clone(),
            PropKeyNode::String(s) => s.clone(),
            PropKeyNode::Number(n) => Rc::from(crate::coerce::format_number(*n).as_str()),
        })
    }

    fn eval_args(&mut self, args: &[Expr]) -> RunResult<Vec<Value>> {
        let mut out = Vec::with_capacity(args.len());
        for a in args {
            out.push(self.eval_expr(a)?);
        }
        Ok(out)
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> RunResult<Value> {
        // `this` is the member expression's base object when calling a
        // method (`o.f()`); otherwise `undefined`, per ordinary scoped-call
        // semantics.
        let (callee_val, this_val) = match &callee.kind {
            ExprKind::Member { object, property, computed } => {
                let obj_val = self.eval_expr(object)?;
                let key = self.member_key(property, *computed)?;
                let base_obj = self.to_object(obj_val)?;
                let f = self.get(base_obj, &key)?;
                (f, obj_val)
            }
            ExprKind::Identifier(name) => {
                let r = self.resolve_identifier(name);
                let f = self.get_value_ref(&r)?;
                (f, Value::Undefined)
            }
            _ => (self.eval_expr(callee)?, Value::Undefined),
        };
        let arg_vals = self.eval_args(args)?;
        let Value::Object(fid) = callee_val else {
            return Err(self.throw_type(format!("{} is not a function", self.describe_value(callee_val))));
        };
        if !self.heap.obj(fid).is_callable() {
            return Err(self.throw_type(format!("{} is not a function", self.describe_value(callee_val))));
        }
        self.call_object(fid, this_val, &arg_vals)
    }

    /// Renders a value for the exact `"<repr> is not a function"` message
    /// required by the seed scenario in spec §8.
    fn describe_value(&mut self, v: Value) -> String {
        match v {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => crate::coerce::format_number(n),
            Value::Str(id) => self.read_string(id),
            Value::Object(_) => "object".to_string(),
        }
    }

    fn eval_update(&mut self, op: UpdateOp, prefix: bool, target: &Expr) -> RunResult<Value> {
        let r = match self.eval_expr_result(target)? {
            EvalResult::Ref(r) => r,
            EvalResult::Value(_) => return Err(self.throw_reference("Invalid left-hand side in assignment")),
        };
        let old = self.get_value_ref(&r)?;
        let old_num = self.to_number(old)?;
        let new_num = match op {
            UpdateOp::Inc => old_num + 1.0,
            UpdateOp::Dec => old_num - 1.0,
        };
        self.put_value_ref(&r, Value::Number(new_num))?;
        Ok(Value::Number(if prefix { new_num } else { old_num }))
    }

    fn eval_unary(&mut self, op: UnaryOp, arg: &Expr) -> RunResult<Value> {
        if op == UnaryOp::Delete {
            return match self.eval_expr_result(arg)? {
                EvalResult::Ref(Reference { base: Base::Object(o), name }) => Ok(Value::Boolean(self.delete(o, &name, self.current_strict())?)),
                EvalResult::Ref(Reference { base: Base::Unresolvable, .. }) => Ok(Value::Boolean(true)),
                EvalResult::Value(_) => Ok(Value::Boolean(true)),
            };
        }
        if op == UnaryOp::TypeOf {
            return match self.eval_expr_result(arg)? {
                EvalResult::Ref(r) if r.is_unresolvable() => Ok(self.string_value("undefined")),
                other => {
                    let v = other.into_value(self)?;
                    Ok(self.string_value(self.type_of(v)))
                }
            };
        }
        let v = self.eval_expr(arg)?;
        match op {
            UnaryOp::Minus => Ok(Value::Number(-self.to_number(v)?)),
            UnaryOp::Plus => Ok(Value::Number(self.to_number(v)?)),
            UnaryOp::Not => Ok(Value::Boolean(!self.to_boolean_full(v))),
            UnaryOp::BitNot => Ok(Value::Number(!self.to_int32(v)? as f64)),
            UnaryOp::Void => Ok(Value::Undefined),
            UnaryOp::TypeOf | UnaryOp::Delete => unreachable!(),
        }
    }

    fn eval_logical(&mut self, op: crate::ast::LogicalOp, left: &Expr, right: &Expr) -> RunResult<Value> {
        let l = self.eval_expr(left)?;
        match op {
            crate::ast::LogicalOp::And => {
                if self.to_boolean_full(l) {
                    self.eval_expr(right)
                } else {
                    Ok(l)
                }
            }
            crate::ast::LogicalOp::Or => {
                if self.to_boolean_full(l) {
                    Ok(l)
                } else {
                    self.eval_expr(right)
                }
            }
        }
    }

    fn eval_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr) -> RunResult<Value> {
        let r = match self.eval_expr_result(target)? {
            EvalResult::Ref(r) => r,
            EvalResult::Value(_) => return Err(self.throw_reference("Invalid left-hand side in assignment")),
        };
        let new_val = match op {
            AssignOp::Assign => self.eval_expr(value)?,
            AssignOp::Compound(bin_op) => {
                let old = self.get_value_ref(&r)?;
                let rhs = self.eval_expr(value)?;
                self.binary_op(bin_op, old, rhs)?
            }
        };
        self.put_value_ref(&r, new_val)?;
        Ok(new_val)
    }
}
