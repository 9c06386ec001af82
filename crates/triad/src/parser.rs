//! Recursive-descent parser producing [`crate::ast::Program`] /
//! [`crate::ast::FunctionBody`] trees, gated on [`Version`] exactly as
//! spec.md's grammar subsections describe: object/array literals, `switch`,
//! `do`/`while`, labeled statements, `try`/`catch`/`finally` and regex
//! literals require V3+; `debugger` and the `"use strict"` directive
//! require V5+.

use std::rc::Rc;

use crate::{
    ast::{
        expr, stmt, AssignOp, BinOp, CatchClause, Expr, ExprKind, ForInTarget, ForInit, FunctionBody, Literal,
        LogicalOp, ObjectProp, Program, PropKeyNode, Span, Stmt, StmtKind, SwitchCase, UnaryOp, UpdateOp,
        VarDeclarator,
    },
    exception::ParseError,
    hoist::collect_hoisted,
    lexer::{Lexer, Tok, Token},
    version::Version,
};

pub fn parse_program(src: &str, version: Version) -> Result<Program, ParseError> {
    let mut p = Parser::new(src, version)?;
    let mut strict = false;
    let body = p.parse_directive_prologue_and_statements(&mut strict)?;
    p.expect_eof()?;
    let (hoisted_vars, hoisted_functions) = collect_hoisted(&body);
    Ok(Program { body, hoisted_vars, hoisted_functions, strict })
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
    version: Version,
    /// Whether the *previous* significant token allows a following `/` to
    /// be read as a regex literal rather than division.
    regex_allowed: bool,
    /// Nesting depth of function bodies; `return` is a syntax error at
    /// depth zero (spec §4.3 "permitted only inside a function body").
    fn_depth: u32,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, version: Version) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(src, version);
        let cur = lexer.next_token(true)?;
        Ok(Parser { lexer, cur, version, regex_allowed: true, fn_depth: 0 })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.regex_allowed = !matches!(
            self.cur.tok,
            Tok::Ident(_) | Tok::Number(_) | Tok::String(_) | Tok::Regex { .. } | Tok::Punct(")") | Tok::Punct("]")
        );
        if matches!(self.cur.tok, Tok::Keyword(k) if k == "this") {
            self.regex_allowed = false;
        }
        self.cur = self.lexer.next_token(self.regex_allowed)?;
        Ok(())
    }

    fn span(&self) -> Span {
        self.cur.span
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError { message: msg.into(), span: self.cur.span }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if matches!(self.cur.tok, Tok::Eof) {
            Ok(())
        } else {
            Err(self.err("expected end of input"))
        }
    }

    fn at_punct(&self, p: &str) -> bool {
        matches!(self.cur.tok, Tok::Punct(x) if x == p)
    }

    fn at_keyword(&self, k: &str) -> bool {
        matches!(self.cur.tok, Tok::Keyword(x) if x == k)
    }

    fn eat_punct(&mut self, p: &str) -> Result<bool, ParseError> {
        if self.at_punct(p) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<(), ParseError> {
        if self.eat_punct(p)? {
            Ok(())
        } else {
            Err(self.err(format!("expected '{p}'")))
        }
    }

    fn eat_keyword(&mut self, k: &str) -> Result<bool, ParseError> {
        if self.at_keyword(k) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_keyword(&mut self, k: &str) -> Result<(), ParseError> {
        if self.eat_keyword(k)? {
            Ok(())
        } else {
            Err(self.err(format!("expected '{k}'")))
        }
    }

    fn expect_ident(&mut self) -> Result<Rc<str>, ParseError> {
        match self.cur.tok.clone() {
            Tok::Ident(name) => {
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.err("expected identifier")),
        }
    }

    fn require(&self, ok: bool, what: &str) -> Result<(), ParseError> {
        if ok {
            Ok(())
        } else {
            Err(self.err(format!("{what} requires a later dialect version")))
        }
    }

    // ---- statements ----------------------------------------------------

    fn parse_directive_prologue_and_statements(&mut self, strict: &mut bool) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        loop {
            if let Tok::String(s) = &self.cur.tok {
                if &**s == "use strict" && self.version.has_v5_syntax() {
                    let save = self.cur.clone();
                    self.advance()?;
                    if self.at_punct(";") || self.cur.newline_before || matches!(self.cur.tok, Tok::Eof | Tok::Punct("}")) {
                        self.eat_punct(";")?;
                        *strict = true;
                        continue;
                    }
                    // Not actually a directive on its own (e.g. `"use strict" + x`); reparse as expression statement.
                    let span = save.span;
                    let lit = expr(span, ExprKind::Literal(Literal::String(s.clone())));
                    body.push(self.finish_expr_statement(lit, span)?);
                    continue;
                }
            }
            break;
        }
        while !matches!(self.cur.tok, Tok::Eof | Tok::Punct("}")) {
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        match &self.cur.tok {
            Tok::Punct(";") => {
                self.advance()?;
                Ok(stmt(start, StmtKind::Empty))
            }
            Tok::Punct("{") => self.parse_block(),
            Tok::Keyword("var") => self.parse_var_statement(),
            Tok::Keyword("function") => self.parse_function_decl(),
            Tok::Keyword("if") => self.parse_if(),
            Tok::Keyword("while") => self.parse_while(),
            Tok::Keyword("do") => {
                self.require(self.version.has_v3_syntax(), "do/while")?;
                self.parse_do_while()
            }
            Tok::Keyword("for") => self.parse_for(),
            Tok::Keyword("break") => self.parse_break_continue(true),
            Tok::Keyword("continue") => self.parse_break_continue(false),
            Tok::Keyword("return") => self.parse_return(),
            Tok::Keyword("with") => self.parse_with(),
            Tok::Keyword("throw") => {
                self.require(self.version.has_v3_syntax(), "throw")?;
                self.parse_throw()
            }
            Tok::Keyword("try") => {
                self.require(self.version.has_v3_syntax(), "try/catch/finally")?;
                self.parse_try()
            }
            Tok::Keyword("switch") => {
                self.require(self.version.has_v3_syntax(), "switch")?;
                self.parse_switch()
            }
            Tok::Keyword("debugger") => {
                self.require(self.version.has_v5_syntax(), "debugger")?;
                self.advance()?;
                self.eat_punct(";")?;
                Ok(stmt(start, StmtKind::Debugger))
            }
            Tok::Ident(name) => {
                let name = name.clone();
                let save = self.checkpoint();
                self.advance()?;
                if self.at_punct(":") {
                    self.require(self.version.has_v3_syntax(), "labeled statements")?;
                    self.advance()?;
                    let body = Box::new(self.parse_statement()?);
                    let end = body.span;
                    return Ok(stmt(start.join(end), StmtKind::Labeled { label: name, body }));
                }
                self.restore(save);
                let e = self.parse_expression()?;
                self.finish_expr_statement(e, start)
            }
            _ => {
                let e = self.parse_expression()?;
                self.finish_expr_statement(e, start)
            }
        }
    }

    fn finish_expr_statement(&mut self, e: Expr, start: Span) -> Result<Stmt, ParseError> {
        let end = self.cur.span;
        self.eat_punct(";")?;
        Ok(stmt(start.join(end), StmtKind::Expr(e)))
    }

    /// Cheap re-lex checkpoint: since our lexer holds no state beyond byte
    /// position/line/col, cloning those three fields plus the current
    /// token is enough to "un-advance" by one token for the
    /// identifier-vs-label lookahead above.
    fn checkpoint(&self) -> (usize, u32, u32, Token) {
        (self.lexer_pos(), self.lexer_line(), self.lexer_col(), self.cur.clone())
    }

    fn restore(&mut self, save: (usize, u32, u32, Token)) {
        self.set_lexer_pos(save.0, save.1, save.2);
        self.cur = save.3;
    }

    fn lexer_pos(&self) -> usize {
        self.lexer.pos_for_checkpoint()
    }
    fn lexer_line(&self) -> u32 {
        self.lexer.line_for_checkpoint()
    }
    fn lexer_col(&self) -> u32 {
        self.lexer.col_for_checkpoint()
    }
    fn set_lexer_pos(&mut self, pos: usize, line: u32, col: u32) {
        self.lexer.restore_checkpoint(pos, line, col);
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.at_punct("}") && !matches!(self.cur.tok, Tok::Eof) {
            body.push(self.parse_statement()?);
        }
        let end = self.span();
        self.expect_punct("}")?;
        Ok(stmt(start.join(end), StmtKind::Block(body)))
    }

    fn parse_var_declarators(&mut self) -> Result<Vec<VarDeclarator>, ParseError> {
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.eat_punct("=")? { Some(self.parse_assignment()?) } else { None };
            decls.push(VarDeclarator { name, init });
            if !self.eat_punct(",")? {
                break;
            }
        }
        Ok(decls)
    }

    fn parse_var_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("var")?;
        let decls = self.parse_var_declarators()?;
        let end = self.span();
        self.eat_punct(";")?;
        Ok(stmt(start.join(end), StmtKind::VarDecl(decls)))
    }

    fn parse_params(&mut self) -> Result<Vec<Rc<str>>, ParseError> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.at_punct(")") {
            params.push(self.expect_ident()?);
            if !self.eat_punct(",")? {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(params)
    }

    fn parse_function_body(&mut self, name: Option<Rc<str>>) -> Result<Rc<FunctionBody>, ParseError> {
        let params = self.parse_params()?;
        self.expect_punct("{")?;
        let mut strict = false;
        self.fn_depth += 1;
        let body = self.parse_directive_prologue_and_statements(&mut strict);
        self.fn_depth -= 1;
        let body = body?;
        self.expect_punct("}")?;
        let (hoisted_vars, hoisted_functions) = collect_hoisted(&body);
        Ok(Rc::new(FunctionBody { name, params, body, hoisted_vars, hoisted_functions, strict }))
    }

    fn parse_function_decl(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("function")?;
        let name = self.expect_ident()?;
        let body = self.parse_function_body(Some(name.clone()))?;
        let end = self.span();
        Ok(stmt(start.join(end), StmtKind::FunctionDecl { name, body }))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("if")?;
        self.expect_punct("(")?;
        let test = self.parse_expression()?;
        self.expect_punct(")")?;
        let cons = Box::new(self.parse_statement()?);
        let alt = if self.eat_keyword("else")? { Some(Box::new(self.parse_statement()?)) } else { None };
        let end = alt.as_ref().map_or(cons.span, |a| a.span);
        Ok(stmt(start.join(end), StmtKind::If { test, cons, alt }))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("while")?;
        self.expect_punct("(")?;
        let test = self.parse_expression()?;
        self.expect_punct(")")?;
        let body = Box::new(self.parse_statement()?);
        let end = body.span;
        Ok(stmt(start.join(end), StmtKind::While { test, body }))
    }

    fn parse_do_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("do")?;
        let body = Box::new(self.parse_statement()?);
        self.expect_keyword("while")?;
        self.expect_punct("(")?;
        let test = self.parse_expression()?;
        self.expect_punct(")")?;
        let end = self.span();
        self.eat_punct(";")?;
        Ok(stmt(start.join(end), StmtKind::DoWhile { body, test }))
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("for")?;
        self.expect_punct("(")?;

        if self.at_keyword("var") {
            self.advance()?;
            let name = self.expect_ident()?;
            if self.at_keyword("in") {
                self.advance()?;
                let object = self.parse_expression()?;
                self.expect_punct(")")?;
                let body = Box::new(self.parse_statement()?);
                let end = body.span;
                return Ok(stmt(
                    start.join(end),
                    StmtKind::ForIn { decl: ForInTarget::VarDecl { name, init: None }, object, body },
                ));
            }
            let init = if self.eat_punct("=")? { Some(self.parse_assignment()?) } else { None };
            if self.at_keyword("in") {
                // `for (var x = e1 in e2)`: legal input, `e1` evaluated once (spec §9).
                self.advance()?;
                let object = self.parse_expression()?;
                self.expect_punct(")")?;
                let body = Box::new(self.parse_statement()?);
                let end = body.span;
                return Ok(stmt(
                    start.join(end),
                    StmtKind::ForIn { decl: ForInTarget::VarDecl { name, init }, object, body },
                ));
            }
            let mut decls = vec![VarDeclarator { name, init }];
            if self.eat_punct(",")? {
                decls.extend(self.parse_var_declarators()?);
            }
            self.expect_punct(";")?;
            return self.finish_c_style_for(start, Some(ForInit::VarDecl(decls)));
        }

        if self.at_punct(";") {
            self.advance()?;
            return self.finish_c_style_for(start, None);
        }

        let first = self.parse_expression_no_in()?;
        if self.at_keyword("in") {
            self.advance()?;
            let ExprKind::Identifier(name) = &first.kind else {
                return Err(self.err("invalid for-in left-hand side"));
            };
            let target = ForInTarget::Ident(name.clone());
            let object = self.parse_expression()?;
            self.expect_punct(")")?;
            let body = Box::new(self.parse_statement()?);
            let end = body.span;
            return Ok(stmt(start.join(end), StmtKind::ForIn { decl: target, object, body }));
        }
        self.expect_punct(";")?;
        self.finish_c_style_for(start, Some(ForInit::Expr(first)))
    }

    fn finish_c_style_for(&mut self, start: Span, init: Option<ForInit>) -> Result<Stmt, ParseError> {
        let test = if self.at_punct(";") { None } else { Some(self.parse_expression()?) };
        self.expect_punct(";")?;
        let update = if self.at_punct(")") { None } else { Some(self.parse_expression()?) };
        self.expect_punct(")")?;
        let body = Box::new(self.parse_statement()?);
        let end = body.span;
        Ok(stmt(start.join(end), StmtKind::For { init, test, update, body }))
    }

    fn parse_break_continue(&mut self, is_break: bool) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.advance()?;
        let label = match &self.cur.tok {
            Tok::Ident(n) if !self.cur.newline_before => {
                let n = n.clone();
                self.advance()?;
                Some(n)
            }
            _ => None,
        };
        let end = self.span();
        self.eat_punct(";")?;
        let kind = if is_break { StmtKind::Break(label) } else { StmtKind::Continue(label) };
        Ok(stmt(start.join(end), kind))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        if self.fn_depth == 0 {
            return Err(self.err("'return' outside of a function body"));
        }
        self.expect_keyword("return")?;
        let value = if self.at_punct(";") || self.cur.newline_before || matches!(self.cur.tok, Tok::Punct("}") | Tok::Eof) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end = self.span();
        self.eat_punct(";")?;
        Ok(stmt(start.join(end), StmtKind::Return(value)))
    }

    fn parse_with(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("with")?;
        self.expect_punct("(")?;
        let object = self.parse_expression()?;
        self.expect_punct(")")?;
        let body = Box::new(self.parse_statement()?);
        let end = body.span;
        Ok(stmt(start.join(end), StmtKind::With { object, body }))
    }

    fn parse_throw(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("throw")?;
        let value = self.parse_expression()?;
        let end = self.span();
        self.eat_punct(";")?;
        Ok(stmt(start.join(end), StmtKind::Throw(value)))
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("try")?;
        let block = self.parse_block_stmts()?;
        let handler = if self.eat_keyword("catch")? {
            self.expect_punct("(")?;
            let param = self.expect_ident()?;
            self.expect_punct(")")?;
            let body = self.parse_block_stmts()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.eat_keyword("finally")? { Some(self.parse_block_stmts()?) } else { None };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.err("try requires a catch or finally clause"));
        }
        let end = self.span();
        Ok(stmt(start.join(end), StmtKind::Try { block, handler, finalizer }))
    }

    fn parse_block_stmts(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.at_punct("}") && !matches!(self.cur.tok, Tok::Eof) {
            body.push(self.parse_statement()?);
        }
        self.expect_punct("}")?;
        Ok(body)
    }

    fn parse_switch(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.expect_keyword("switch")?;
        self.expect_punct("(")?;
        let discriminant = self.parse_expression()?;
        self.expect_punct(")")?;
        self.expect_punct("{")?;
        let mut cases = Vec::new();
        while !self.at_punct("}") {
            let test = if self.eat_keyword("case")? {
                let e = self.parse_expression()?;
                self.expect_punct(":")?;
                Some(e)
            } else {
                self.expect_keyword("default")?;
                self.expect_punct(":")?;
                None
            };
            let mut body = Vec::new();
            while !self.at_keyword("case") && !self.at_keyword("default") && !self.at_punct("}") {
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, body });
        }
        let end = self.span();
        self.expect_punct("}")?;
        Ok(stmt(start.join(end), StmtKind::Switch { discriminant, cases }))
    }

    // ---- expressions -----------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_assignment()?;
        if self.at_punct(",") {
            let mut items = vec![first];
            while self.eat_punct(",")? {
                items.push(self.parse_assignment()?);
            }
            let span = items[0].span.join(items.last().unwrap().span);
            return Ok(expr(span, ExprKind::Sequence(items)));
        }
        Ok(first)
    }

    /// Used only inside a `for (...)` head, where a bare `in` must not be
    /// swallowed by the `in` relational operator (it would make `for (x in
    /// y)` ambiguous with `for (x; ...)`'s first clause).
    fn parse_expression_no_in(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment_no_in()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment_impl(true)
    }

    fn parse_assignment_no_in(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment_impl(false)
    }

    fn parse_assignment_impl(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let left = self.parse_conditional(allow_in)?;
        let op = match &self.cur.tok {
            Tok::Punct("=") => Some(AssignOp::Assign),
            Tok::Punct("+=") => Some(AssignOp::Compound(BinOp::Add)),
            Tok::Punct("-=") => Some(AssignOp::Compound(BinOp::Sub)),
            Tok::Punct("*=") => Some(AssignOp::Compound(BinOp::Mul)),
            Tok::Punct("/=") => Some(AssignOp::Compound(BinOp::Div)),
            Tok::Punct("%=") => Some(AssignOp::Compound(BinOp::Mod)),
            Tok::Punct("&=") => Some(AssignOp::Compound(BinOp::BitAnd)),
            Tok::Punct("|=") => Some(AssignOp::Compound(BinOp::BitOr)),
            Tok::Punct("^=") => Some(AssignOp::Compound(BinOp::BitXor)),
            Tok::Punct("<<=") => Some(AssignOp::Compound(BinOp::Shl)),
            Tok::Punct(">>=") => Some(AssignOp::Compound(BinOp::Shr)),
            _ => None,
        };
        let Some(op) = op else { return Ok(left) };
        if !matches!(left.kind, ExprKind::Identifier(_) | ExprKind::Member { .. }) {
            return Err(self.err("invalid assignment target"));
        }
        self.advance()?;
        let value = self.parse_assignment_impl(allow_in)?;
        let span = left.span.join(value.span);
        Ok(expr(span, ExprKind::Assign { op, target: Box::new(left), value: Box::new(value) }))
    }

    fn parse_conditional(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let test = self.parse_logical_or(allow_in)?;
        if self.eat_punct("?")? {
            let cons = self.parse_assignment()?;
            self.expect_punct(":")?;
            let alt = self.parse_assignment_impl(allow_in)?;
            let span = test.span.join(alt.span);
            return Ok(expr(span, ExprKind::Conditional { test: Box::new(test), cons: Box::new(cons), alt: Box::new(alt) }));
        }
        Ok(test)
    }

    fn parse_logical_or(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and(allow_in)?;
        while self.eat_punct("||")? {
            let right = self.parse_logical_and(allow_in)?;
            let span = left.span.join(right.span);
            left = expr(span, ExprKind::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitor(allow_in)?;
        while self.eat_punct("&&")? {
            let right = self.parse_bitor(allow_in)?;
            let span = left.span.join(right.span);
            left = expr(span, ExprKind::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_bin_level(
        &mut self,
        allow_in: bool,
        ops: &[(&str, BinOp)],
        next: fn(&mut Self, bool) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self, allow_in)?;
        'outer: loop {
            for (p, op) in ops {
                if self.at_punct(p) {
                    self.advance()?;
                    let right = next(self, allow_in)?;
                    let span = left.span.join(right.span);
                    left = expr(span, ExprKind::Binary { op: *op, left: Box::new(left), right: Box::new(right) });
                    continue 'outer;
                }
            }
            break;
        }
        Ok(left)
    }

    fn parse_bitor(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        self.parse_bin_level(allow_in, &[("|", BinOp::BitOr)], Self::parse_bitxor)
    }
    fn parse_bitxor(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        self.parse_bin_level(allow_in, &[("^", BinOp::BitXor)], Self::parse_bitand)
    }
    fn parse_bitand(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        self.parse_bin_level(allow_in, &[("&", BinOp::BitAnd)], Self::parse_equality)
    }
    fn parse_equality(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational(allow_in)?;
        loop {
            let op = if self.at_punct("===") {
                Some(BinOp::StrictEq)
            } else if self.at_punct("!==") {
                Some(BinOp::StrictNe)
            } else if self.at_punct("==") {
                Some(BinOp::Eq)
            } else if self.at_punct("!=") {
                Some(BinOp::Ne)
            } else {
                None
            };
            let Some(op) = op else { break };
            if matches!(op, BinOp::StrictEq | BinOp::StrictNe) {
                self.require(self.version.has_v3_syntax(), "strict equality operators")?;
            }
            self.advance()?;
            let right = self.parse_relational(allow_in)?;
            let span = left.span.join(right.span);
            left = expr(span, ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_relational(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let mut left = self.parse_shift(allow_in)?;
        loop {
            let op = if self.at_punct("<") {
                Some(BinOp::Lt)
            } else if self.at_punct(">") {
                Some(BinOp::Gt)
            } else if self.at_punct("<=") {
                Some(BinOp::Le)
            } else if self.at_punct(">=") {
                Some(BinOp::Ge)
            } else if self.at_keyword("instanceof") {
                Some(BinOp::InstanceOf)
            } else if allow_in && self.at_keyword("in") {
                Some(BinOp::In)
            } else {
                None
            };
            let Some(op) = op else { break };
            self.advance()?;
            let right = self.parse_shift(allow_in)?;
            let span = left.span.join(right.span);
            left = expr(span, ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_shift(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        self.parse_bin_level(allow_in, &[("<<", BinOp::Shl), (">>>", BinOp::UShr), (">>", BinOp::Shr)], Self::parse_additive)
    }
    fn parse_additive(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        self.parse_bin_level(allow_in, &[("+", BinOp::Add), ("-", BinOp::Sub)], Self::parse_multiplicative)
    }
    fn parse_multiplicative(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        self.parse_bin_level(allow_in, &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Mod)], Self::parse_unary)
    }

    fn parse_unary(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let start = self.span();
        let op = match &self.cur.tok {
            Tok::Punct("-") => Some(UnaryOp::Minus),
            Tok::Punct("+") => Some(UnaryOp::Plus),
            Tok::Punct("!") => Some(UnaryOp::Not),
            Tok::Punct("~") => Some(UnaryOp::BitNot),
            Tok::Keyword("typeof") => Some(UnaryOp::TypeOf),
            Tok::Keyword("void") => Some(UnaryOp::Void),
            Tok::Keyword("delete") => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let arg = self.parse_unary(allow_in)?;
            let span = start.join(arg.span);
            return Ok(expr(span, ExprKind::Unary { op, arg: Box::new(arg) }));
        }
        if self.at_punct("++") || self.at_punct("--") {
            let is_inc = self.at_punct("++");
            self.advance()?;
            let target = self.parse_unary(allow_in)?;
            let span = start.join(target.span);
            return Ok(expr(
                span,
                ExprKind::Update { op: if is_inc { UpdateOp::Inc } else { UpdateOp::Dec }, prefix: true, target: Box::new(target) },
            ));
        }
        self.parse_postfix(allow_in)
    }

    fn parse_postfix(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let e = self.parse_call_or_new(allow_in)?;
        if !self.cur.newline_before && (self.at_punct("++") || self.at_punct("--")) {
            let is_inc = self.at_punct("++");
            let end = self.span();
            self.advance()?;
            let span = e.span.join(end);
            return Ok(expr(
                span,
                ExprKind::Update { op: if is_inc { UpdateOp::Inc } else { UpdateOp::Dec }, prefix: false, target: Box::new(e) },
            ));
        }
        Ok(e)
    }

    fn parse_call_or_new(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let mut e = if self.at_keyword("new") {
            self.parse_new(allow_in)?
        } else {
            self.parse_primary(allow_in)?
        };
        loop {
            if self.eat_punct(".")? {
                let name = self.expect_ident()?;
                let end = self.cur.span;
                let prop = expr(end, ExprKind::Literal(Literal::String(name)));
                let span = e.span.join(end);
                e = expr(span, ExprKind::Member { object: Box::new(e), property: Box::new(prop), computed: false });
            } else if self.eat_punct("[")? {
                let idx = self.parse_expression()?;
                let end = self.span();
                self.expect_punct("]")?;
                let span = e.span.join(end);
                e = expr(span, ExprKind::Member { object: Box::new(e), property: Box::new(idx), computed: true });
            } else if self.at_punct("(") {
                let args = self.parse_arguments()?;
                let end = self.cur.span;
                let span = e.span.join(end);
                e = expr(span, ExprKind::Call { callee: Box::new(e), args });
            } else {
                break;
            }
        }
        Ok(e)
    }

    fn parse_new(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        let start = self.span();
        self.expect_keyword("new")?;
        let mut callee = if self.at_keyword("new") { self.parse_new(allow_in)? } else { self.parse_member_only(allow_in)? };
        loop {
            if self.eat_punct(".")? {
                let name = self.expect_ident()?;
                let end = self.cur.span;
                let prop = expr(end, ExprKind::Literal(Literal::String(name)));
                let span = callee.span.join(end);
                callee = expr(span, ExprKind::Member { object: Box::new(callee), property: Box::new(prop), computed: false });
            } else if self.eat_punct("[")? {
                let idx = self.parse_expression()?;
                let end = self.span();
                self.expect_punct("]")?;
                let span = callee.span.join(end);
                callee = expr(span, ExprKind::Member { object: Box::new(callee), property: Box::new(idx), computed: true });
            } else {
                break;
            }
        }
        let args = if self.at_punct("(") { self.parse_arguments()? } else { Vec::new() };
        let end = self.cur.span;
        Ok(expr(start.join(end), ExprKind::New { callee: Box::new(callee), args }))
    }

    fn parse_member_only(&mut self, allow_in: bool) -> Result<Expr, ParseError> {
        self.parse_primary(allow_in)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        while !self.at_punct(")") {
            args.push(self.parse_assignment()?);
            if !self.eat_punct(",")? {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(args)
    }

    fn parse_primary(&mut self, _allow_in: bool) -> Result<Expr, ParseError> {
        let start = self.span();
        match self.cur.tok.clone() {
            Tok::Number(n) => {
                self.advance()?;
                Ok(expr(start, ExprKind::Literal(Literal::Number(n))))
            }
            Tok::String(s) => {
                self.advance()?;
                Ok(expr(start, ExprKind::Literal(Literal::String(s))))
            }
            Tok::Regex { source, global, ignore_case } => {
                self.require(self.version.has_v3_syntax(), "regular expression literals")?;
                self.advance()?;
                Ok(expr(start, ExprKind::Regex { source, global, ignore_case }))
            }
            Tok::Keyword("true") => {
                self.advance()?;
                Ok(expr(start, ExprKind::Literal(Literal::Bool(true))))
            }
            Tok::Keyword("false") => {
                self.advance()?;
                Ok(expr(start, ExprKind::Literal(Literal::Bool(false))))
            }
            Tok::Keyword("null") => {
                self.advance()?;
                Ok(expr(start, ExprKind::Literal(Literal::Null)))
            }
            Tok::Keyword("undefined") => {
                self.advance()?;
                Ok(expr(start, ExprKind::Literal(Literal::Undefined)))
            }
            Tok::Keyword("this") => {
                self.advance()?;
                Ok(expr(start, ExprKind::This))
            }
            Tok::Keyword("function") => {
                self.advance()?;
                let name = if let Tok::Ident(_) = &self.cur.tok { Some(self.expect_ident()?) } else { None };
                let body = self.parse_function_body(name)?;
                let end = self.span();
                Ok(expr(start.join(end), ExprKind::Function(body)))
            }
            Tok::Ident(name) => {
                self.advance()?;
                Ok(expr(start, ExprKind::Identifier(name)))
            }
            Tok::Punct("(") => {
                self.advance()?;
                let e = self.parse_expression()?;
                self.expect_punct(")")?;
                Ok(e)
            }
            Tok::Punct("[") => {
                self.require(self.version.has_v3_syntax(), "array literals")?;
                self.parse_array_literal(start)
            }
            Tok::Punct("{") => {
                self.require(self.version.has_v3_syntax(), "object literals")?;
                self.parse_object_literal(start)
            }
            _ => Err(self.err("expected expression")),
        }
    }

    fn parse_array_literal(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.expect_punct("[")?;
        let mut items = Vec::new();
        while !self.at_punct("]") {
            if self.at_punct(",") {
                items.push(None);
                self.advance()?;
                continue;
            }
            items.push(Some(self.parse_assignment()?));
            if !self.at_punct("]") {
                self.expect_punct(",")?;
            }
        }
        let end = self.span();
        self.expect_punct("]")?;
        Ok(expr(start.join(end), ExprKind::ArrayLiteral(items)))
    }

    fn parse_prop_key(&mut self) -> Result<PropKeyNode, ParseError> {
        match self.cur.tok.clone() {
            Tok::Ident(n) => {
                self.advance()?;
                Ok(PropKeyNode::Ident(n))
            }
            Tok::Keyword(k) => {
                self.advance()?;
                Ok(PropKeyNode::Ident(Rc::from(k)))
            }
            Tok::String(s) => {
                self.advance()?;
                Ok(PropKeyNode::String(s))
            }
            Tok::Number(n) => {
                self.advance()?;
                Ok(PropKeyNode::Number(n))
            }
            _ => Err(self.err("expected property name")),
        }
    }

    fn parse_object_literal(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.expect_punct("{")?;
        let mut props = Vec::new();
        while !self.at_punct("}") {
            if (self.at_ident_text("get") || self.at_ident_text("set")) && self.peek_is_prop_key_not_colon()? {
                let is_getter = self.at_ident_text("get");
                self.require(self.version.has_accessors(), "getter/setter properties")?;
                self.advance()?;
                let key = self.parse_prop_key()?;
                let body = self.parse_function_body(None)?;
                props.push(if is_getter { ObjectProp::Getter { key, body } } else { ObjectProp::Setter { key, body } });
            } else {
                let key = self.parse_prop_key()?;
                self.expect_punct(":")?;
                let value = self.parse_assignment()?;
                props.push(ObjectProp::Data { key, value });
            }
            if !self.at_punct("}") {
                self.expect_punct(",")?;
            }
        }
        let end = self.span();
        self.expect_punct("}")?;
        Ok(expr(start.join(end), ExprKind::ObjectLiteral(props)))
    }

    fn at_ident_text(&self, s: &str) -> bool {
        matches!(&self.cur.tok, Tok::Ident(n) if &**n == s)
    }

    /// Lookahead used only to disambiguate `get`/`set` as an accessor
    /// keyword (followed by another property-key token) versus a literal
    /// property named "get"/"set" (followed directly by `:`).
    fn peek_is_prop_key_not_colon(&mut self) -> Result<bool, ParseError> {
        let save = self.checkpoint();
        self.advance()?;
        let is_key = !self.at_punct(":");
        self.restore(save);
        Ok(is_key)
    }
}
