//! Statement execution and completion composition (spec §4.3 "Statements").

use std::rc::Rc;

use super::Evaluator;
use crate::{
    ast::{CatchClause, ForInTarget, ForInit, Stmt, StmtKind, SwitchCase},
    completion::{Completion, CompletionKind},
    exception::{RunError, RunResult},
    function::ScriptFunctionData,
    object::{ClassTag, InternalSlots},
    property::{Attrs, Property, Slot},
    value::Value,
};

/// What a loop should do after classifying the completion its body just
/// produced against the labels that directly target it (spec §4.3 "break
/// L and continue L produce targeted completions that unwind until an
/// iteration/switch statement with matching label consumes them").
enum LoopControl {
    Proceed(Value),
    Stop(Value),
    Propagate(Completion),
}

fn classify_loop(c: Completion, labels: &[Rc<str>]) -> LoopControl {
    let targets_here = |target: &Option<Rc<str>>| target.is_none() || target.as_ref().is_some_and(|t| labels.contains(t));
    let v = c.value;
    match c.kind {
        CompletionKind::Normal => LoopControl::Proceed(v),
        CompletionKind::Break if targets_here(&c.target) => LoopControl::Stop(v),
        CompletionKind::Continue if targets_here(&c.target) => LoopControl::Proceed(v),
        CompletionKind::Break | CompletionKind::Continue | CompletionKind::Return => LoopControl::Propagate(c),
    }
}

impl Evaluator {
    /// Runs one statement, maintaining the GC safepoint (spec §4.1 step 1)
    /// and building the uncaught-exception position stack (spec §6) as an
    /// error unwinds back out through every enclosing statement.
    pub(crate) fn run_statement(&mut self, s: &Stmt) -> RunResult<Completion> {
        self.maybe_collect();
        self.tracer.on_statement(s.span);
        match self.run_statement_inner(s) {
            Ok(c) => Ok(c),
            Err(mut e) => {
                self.tracer.on_throw(s.span);
                self.push_frame_span(&mut e, s.span);
                Err(e)
            }
        }
    }

    fn run_statement_inner(&mut self, s: &Stmt) -> RunResult<Completion> {
        match &s.kind {
            StmtKind::Empty | StmtKind::Debugger => Ok(Completion::empty()),
            StmtKind::Block(body) => self.run_block_stmts(body),
            StmtKind::VarDecl(decls) => {
                for d in decls {
                    if let Some(init) = &d.init {
                        let v = self.eval_expr(init)?;
                        let r = self.resolve_identifier(&d.name);
                        self.put_value_ref(&r, v)?;
                    }
                }
                Ok(Completion::empty())
            }
            StmtKind::FunctionDecl { name, body } => {
                let fid = self.make_nested_function(name.clone(), body)?;
                let r = self.resolve_identifier(name);
                self.put_value_ref(&r, Value::Object(fid))?;
                Ok(Completion::empty())
            }
            StmtKind::Expr(e) => Ok(Completion::normal(self.eval_expr(e)?)),
            StmtKind::If { test, cons, alt } => {
                let t = self.eval_expr(test)?;
                if self.to_boolean_full(t) {
                    self.run_statement(cons)
                } else if let Some(alt) = alt {
                    self.run_statement(alt)
                } else {
                    Ok(Completion::empty())
                }
            }
            StmtKind::Break(label) => Ok(Completion::break_(label.clone())),
            StmtKind::Continue(label) => Ok(Completion::continue_(label.clone())),
            StmtKind::Return(e) => {
                let v = match e {
                    Some(e) => self.eval_expr(e)?,
                    None => Value::Undefined,
                };
                Ok(Completion::return_(v))
            }
            StmtKind::With { object, body } => {
                let v = self.eval_expr(object)?;
                let oid = self.to_object(v)?;
                self.scope.push(oid);
                let result = self.run_statement(body);
                self.scope.pop();
                result
            }
            StmtKind::Throw(e) => {
                let v = self.eval_expr(e)?;
                Err(RunError::new(v))
            }
            StmtKind::Try { block, handler, finalizer } => {
                self.run_try(block, handler.as_ref(), finalizer.as_deref())
            }
            StmtKind::Labeled { label, body } => self.run_labeled(label, body),
            StmtKind::While { test, body } => self.run_while(test, body, &[]),
            StmtKind::DoWhile { body, test } => self.run_do_while(body, test, &[]),
            StmtKind::For { init, test, update, body } => self.run_for(init, test, update, body, &[]),
            StmtKind::ForIn { decl, object, body } => self.run_for_in(decl, object, body, &[]),
            StmtKind::Switch { discriminant, cases } => self.run_switch(discriminant, cases, &[]),
        }
    }

    fn make_nested_function(&mut self, name: Rc<str>, body: &Rc<crate::ast::FunctionBody>) -> RunResult<crate::heap::HeapId> {
        let scope_ids = self.scope.as_ids().to_vec();
        let data = ScriptFunctionData {
            name: Some(name),
            params: body.params.clone(),
            body: body.clone(),
            scope: scope_ids,
            strict: body.strict || self.current_strict(),
        };
        self.make_script_function(data)
    }

    /// Block completion composition (spec §4.3): "the last non-normal
    /// completion, or the normal completion carrying the last value
    /// produced".
    pub(crate) fn run_block_stmts(&mut self, stmts: &[Stmt]) -> RunResult<Completion> {
        let mut result = Completion::empty();
        for s in stmts {
            let c = self.run_statement(s)?;
            if c.is_abrupt() {
                return Ok(c);
            }
            result = c;
        }
        Ok(result)
    }

    /// Resolves stacked labels (`a: b: for(...)`) once, then dispatches to
    /// the label-aware loop/switch runner, or an ordinary nested statement.
    fn run_labeled(&mut self, label: &Rc<str>, body: &Stmt) -> RunResult<Completion> {
        let mut labels = vec![label.clone()];
        let mut cur = body;
        while let StmtKind::Labeled { label: inner, body: inner_body } = &cur.kind {
            labels.push(inner.clone());
            cur = inner_body;
        }
        let c = self.run_with_labels(cur, &labels)?;
        if c.kind == CompletionKind::Break && c.target.as_ref().is_some_and(|t| labels.contains(t)) {
            return Ok(Completion::normal(Value::Undefined));
        }
        Ok(c)
    }

    fn run_with_labels(&mut self, s: &Stmt, labels: &[Rc<str>]) -> RunResult<Completion> {
        match &s.kind {
            StmtKind::While { test, body } => self.run_while(test, body, labels),
            StmtKind::DoWhile { body, test } => self.run_do_while(body, test, labels),
            StmtKind::For { init, test, update, body } => self.run_for(init, test, update, body, labels),
            StmtKind::ForIn { decl, object, body } => self.run_for_in(decl, object, body, labels),
            StmtKind::Switch { discriminant, cases } => self.run_switch(discriminant, cases, labels),
            _ => self.run_statement(s),
        }
    }

    fn run_while(&mut self, test: &crate::ast::Expr, body: &Stmt, labels: &[Rc<str>]) -> RunResult<Completion> {
        let mut last = Value::Undefined;
        loop {
            let t = self.eval_expr(test)?;
            if !self.to_boolean_full(t) {
                break;
            }
            let c = self.run_statement(body)?;
            match classify_loop(c, labels) {
                LoopControl::Proceed(v) => {
                    if !v.is_undefined() {
                        last = v;
                    }
                }
                LoopControl::Stop(v) => {
                    if !v.is_undefined() {
                        last = v;
                    }
                    break;
                }
                LoopControl::Propagate(c) => return Ok(c),
            }
        }
        Ok(Completion::normal(last))
    }

    fn run_do_while(&mut self, body: &Stmt, test: &crate::ast::Expr, labels: &[Rc<str>]) -> RunResult<Completion> {
        let mut last = Value::Undefined;
        loop {
            let c = self.run_statement(body)?;
            match classify_loop(c, labels) {
                LoopControl::Proceed(v) => {
                    if !v.is_undefined() {
                        last = v;
                    }
                }
                LoopControl::Stop(v) => {
                    if !v.is_undefined() {
                        last = v;
                    }
                    break;
                }
                LoopControl::Propagate(c) => return Ok(c),
            }
            let t = self.eval_expr(test)?;
            if !self.to_boolean_full(t) {
                break;
            }
        }
        Ok(Completion::normal(last))
    }

    fn run_for(
        &mut self,
        init: &Option<ForInit>,
        test: &Option<crate::ast::Expr>,
        update: &Option<crate::ast::Expr>,
        body: &Stmt,
        labels: &[Rc<str>],
    ) -> RunResult<Completion> {
        match init {
            Some(ForInit::VarDecl(decls)) => {
                for d in decls {
                    if let Some(e) = &d.init {
                        let v = self.eval_expr(e)?;
                        let r = self.resolve_identifier(&d.name);
                        self.put_value_ref(&r, v)?;
                    }
                }
            }
            Some(ForInit::Expr(e)) => {
                self.eval_expr(e)?;
            }
            None => {}
        }
        let mut last = Value::Undefined;
        loop {
            if let Some(test) = test {
                let t = self.eval_expr(test)?;
                if !self.to_boolean_full(t) {
                    break;
                }
            }
            let c = self.run_statement(body)?;
            match classify_loop(c, labels) {
                LoopControl::Proceed(v) => {
                    if !v.is_undefined() {
                        last = v;
                    }
                }
                LoopControl::Stop(v) => {
                    if !v.is_undefined() {
                        last = v;
                    }
                    break;
                }
                LoopControl::Propagate(c) => return Ok(c),
            }
            if let Some(update) = update {
                self.eval_expr(update)?;
            }
        }
        Ok(Completion::normal(last))
    }

    /// `for (v in obj) S` / `for (var v [= e1] in obj) S` (spec §4.3, §9).
    fn run_for_in(&mut self, decl: &ForInTarget, object: &crate::ast::Expr, body: &Stmt, labels: &[Rc<str>]) -> RunResult<Completion> {
        if let ForInTarget::VarDecl { name, init: Some(init) } = decl {
            let v = self.eval_expr(init)?;
            let r = self.resolve_identifier(name);
            self.put_value_ref(&r, v)?;
        }
        let obj_val = self.eval_expr(object)?;
        if obj_val.is_nullish() && self.version.for_in_null_is_noop() {
            return Ok(Completion::normal(Value::Undefined));
        }
        let obj_id = self.to_object(obj_val)?;
        let keys = self.enumerate(obj_id);
        let name = match decl {
            ForInTarget::Ident(n) => n.clone(),
            ForInTarget::VarDecl { name, .. } => name.clone(),
        };
        let mut last = Value::Undefined;
        for key in keys {
            if !self.has(obj_id, &key) {
                // Deleted before this visit; spec §4.3 "properties
                // deleted before visit must not appear".
                continue;
            }
            let key_val = self.string_value(&key);
            let r = self.resolve_identifier(&name);
            self.put_value_ref(&r, key_val)?;
            let c = self.run_statement(body)?;
            match classify_loop(c, labels) {
                LoopControl::Proceed(v) => {
                    if !v.is_undefined() {
                        last = v;
                    }
                }
                LoopControl::Stop(v) => {
                    if !v.is_undefined() {
                        last = v;
                    }
                    break;
                }
                LoopControl::Propagate(c) => return Ok(c),
            }
        }
        Ok(Completion::normal(last))
    }

    /// `switch` (spec §4.3 "fall-through to either the matching case or
    /// `default`, then continue forward evaluating cases in source
    /// order"). Case tests are evaluated left-to-right only until a match
    /// is found.
    fn run_switch(&mut self, discriminant: &crate::ast::Expr, cases: &[SwitchCase], labels: &[Rc<str>]) -> RunResult<Completion> {
        let d = self.eval_expr(discriminant)?;
        let mut match_idx = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let t = self.eval_expr(test)?;
                if self.strict_equals(d, t) {
                    match_idx = Some(i);
                    break;
                }
            }
        }
        let start_idx = match match_idx {
            Some(i) => Some(i),
            None => cases.iter().position(|c| c.test.is_none()),
        };
        let Some(start_idx) = start_idx else {
            return Ok(Completion::normal(Value::Undefined));
        };
        let mut last = Value::Undefined;
        for case in &cases[start_idx..] {
            for inner in &case.body {
                let c = self.run_statement(inner)?;
                if !c.value.is_undefined() {
                    last = c.value;
                }
                match c.kind {
                    CompletionKind::Normal => {}
                    CompletionKind::Break if c.target.is_none() || c.target.as_ref().is_some_and(|t| labels.contains(t)) => {
                        return Ok(Completion::normal(last));
                    }
                    CompletionKind::Break | CompletionKind::Continue | CompletionKind::Return => return Ok(c),
                }
            }
        }
        Ok(Completion::normal(last))
    }

    /// `try { B } catch (e) { C } finally { F }` (spec §4.3): `F` always
    /// runs; a non-normal completion from `F` overrides whatever was
    /// pending from `B`/`C`.
    fn run_try(&mut self, block: &[Stmt], handler: Option<&CatchClause>, finalizer: Option<&[Stmt]>) -> RunResult<Completion> {
        let mut pending: RunResult<Completion> = match self.run_block_stmts(block) {
            Ok(c) => Ok(c),
            Err(e) => match handler {
                Some(h) => {
                    let scope_obj = self.alloc_object_with(ClassTag::Object, None, InternalSlots::None);
                    self.heap
                        .obj_mut(scope_obj)
                        .properties
                        .set(h.param.clone(), Slot::new(Property::data(e.value, true), Attrs::DEFAULT));
                    self.scope.push(scope_obj);
                    let cr = self.run_block_stmts(&h.body);
                    self.scope.pop();
                    cr
                }
                None => Err(e),
            },
        };
        if let Some(fin) = finalizer {
            match self.run_block_stmts(fin) {
                Ok(c) if c.is_abrupt() => pending = Ok(c),
                Ok(_) => {}
                Err(e) => pending = Err(e),
            }
        }
        pending
    }
}
