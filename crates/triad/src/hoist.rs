//! Static hoisting analysis (spec §4.3 step 4, §3 Activation object).
//!
//! `var` declarations and top-level `function` declarations are collected
//! once, at parse time, by walking a function/program body without
//! descending into nested function bodies (their own hoisting is computed
//! separately when *they* are parsed). This mirrors ordinary JS scoping:
//! `var` is function-scoped, so a `var` buried inside nested blocks,
//! `if`/`for`/`while`/`try`/`with`/`switch` bodies still hoists to the
//! enclosing function.

use std::rc::Rc;

use crate::ast::{ForInTarget, ForInit, FunctionBody, Name, Stmt, StmtKind};

pub(crate) fn collect_hoisted(stmts: &[Stmt]) -> (Vec<Name>, Vec<(Name, Rc<FunctionBody>)>) {
    let mut vars = Vec::new();
    let mut funcs = Vec::new();
    for s in stmts {
        collect_stmt(s, &mut vars, &mut funcs, true);
    }
    (vars, funcs)
}

fn push_unique(vars: &mut Vec<Name>, name: &Name) {
    if !vars.iter().any(|v| v == name) {
        vars.push(name.clone());
    }
}

fn collect_stmt(s: &Stmt, vars: &mut Vec<Name>, funcs: &mut Vec<(Name, Rc<FunctionBody>)>, top_level: bool) {
    match &s.kind {
        StmtKind::VarDecl(decls) => {
            for d in decls {
                push_unique(vars, &d.name);
            }
        }
        StmtKind::FunctionDecl { name, body } => {
            // Only function declarations directly at the top level of the
            // enclosing function/program body are hoisted as callable
            // bindings; ones nested inside a block are (in these
            // dialects) still hoisted for `var`-style visibility but the
            // callable binding itself is installed at the point the
            // containing block runs, which our evaluator does by treating
            // any FunctionDecl statement it walks as a binding no matter
            // the nesting depth. We still record top-level ones here for
            // the "hoisted before the body runs" activation-construction
            // behavior (spec §4.3 step 4).
            push_unique(vars, name);
            if top_level {
                funcs.push((name.clone(), body.clone()));
            }
        }
        StmtKind::Block(body) => {
            for inner in body {
                collect_stmt(inner, vars, funcs, false);
            }
        }
        StmtKind::If { cons, alt, .. } => {
            collect_stmt(cons, vars, funcs, false);
            if let Some(alt) = alt {
                collect_stmt(alt, vars, funcs, false);
            }
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } | StmtKind::With { body, .. } => {
            collect_stmt(body, vars, funcs, false);
        }
        StmtKind::For { init, body, .. } => {
            if let Some(ForInit::VarDecl(decls)) = init {
                for d in decls {
                    push_unique(vars, &d.name);
                }
            }
            collect_stmt(body, vars, funcs, false);
        }
        StmtKind::ForIn { decl, body, .. } => {
            if let ForInTarget::VarDecl { name, .. } = decl {
                push_unique(vars, name);
            }
            collect_stmt(body, vars, funcs, false);
        }
        StmtKind::Try { block, handler, finalizer } => {
            for inner in block {
                collect_stmt(inner, vars, funcs, false);
            }
            if let Some(h) = handler {
                for inner in &h.body {
                    collect_stmt(inner, vars, funcs, false);
                }
            }
            if let Some(f) = finalizer {
                for inner in f {
                    collect_stmt(inner, vars, funcs, false);
                }
            }
        }
        StmtKind::Switch { cases, .. } => {
            for case in cases {
                for inner in &case.body {
                    collect_stmt(inner, vars, funcs, false);
                }
            }
        }
        StmtKind::Labeled { body, .. } => collect_stmt(body, vars, funcs, false),
        StmtKind::Empty
        | StmtKind::Debugger
        | StmtKind::Expr(_)
        | StmtKind::Break(_)
        | StmtKind::Continue(_)
        | StmtKind::Return(_)
        | StmtKind::Throw(_) => {}
    }
}
