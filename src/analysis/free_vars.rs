// src/analysis/free_vars.rs

//! Free-variable and binding analysis for a Python source block.
//!
//! The contract is "names read without a prior local binding in this
//! block", independent of any external linter:
//!
//! - the top level of a block is sequential: a name read before its
//!   assignment is free;
//! - function bodies are deferred: they see their parameters plus *all*
//!   top-level bindings of the block, regardless of textual order;
//! - lambda parameters and comprehension/loop targets are local and never
//!   leak out as bindings;
//! - imports and builtins are never free.
//!
//! The analyzer also reports the block's top-level bindings (what the block
//! *produces*), which the artifact resolution pass matches consumers
//! against.

use std::collections::{BTreeSet, HashSet};

use rustpython_parser::{ast, Parse};

use crate::analysis::builtins::is_builtin;

/// Result of analyzing one source block.
#[derive(Debug, Clone, Default)]
pub struct BlockAnalysis {
    /// Names read before being locally bound.
    pub free: BTreeSet<String>,
    /// Names bound at the block's top level.
    pub bound: BTreeSet<String>,
    /// Whether the block contains a `from m import *`, which makes the
    /// binding set unknowable.
    pub star_import: bool,
}

/// Analyze a source block.
///
/// Pure function over text; the block is parsed, never executed. The error
/// case carries the parser's message; callers attach the owning step id.
pub fn analyze_block(source: &str) -> Result<BlockAnalysis, String> {
    let stmts = ast::Suite::parse(source, "<block>").map_err(|e| e.to_string())?;

    let mut bound = BTreeSet::new();
    let mut star_import = false;
    collect_bindings(&stmts, &mut bound, &mut star_import);

    let mut analyzer = Analyzer {
        free: BTreeSet::new(),
        module_bindings: bound.iter().cloned().collect(),
    };
    let mut scope = Scope::new();
    analyzer.visit_stmts(&stmts, &mut scope);

    Ok(BlockAnalysis {
        free: analyzer.free,
        bound,
        star_import,
    })
}

/// Tracks names in scope during the sequential walk.
#[derive(Debug, Clone)]
struct Scope {
    defined: HashSet<String>,
}

impl Scope {
    fn new() -> Self {
        Self {
            defined: HashSet::new(),
        }
    }

    fn define(&mut self, name: &str) {
        self.defined.insert(name.to_string());
    }

    fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Child scope for a nested region (function body, lambda,
    /// comprehension, class body).
    fn child(&self) -> Self {
        self.clone()
    }
}

struct Analyzer {
    free: BTreeSet<String>,
    /// All top-level bindings of the block, visible to deferred function
    /// bodies regardless of textual order.
    module_bindings: HashSet<String>,
}

impl Analyzer {
    fn record_read(&mut self, name: &str, scope: &Scope) {
        if !scope.is_defined(name) && !is_builtin(name) {
            self.free.insert(name.to_string());
        }
    }

    fn visit_stmts(&mut self, stmts: &[ast::Stmt], scope: &mut Scope) {
        for stmt in stmts {
            self.visit_stmt(stmt, scope);
        }
    }

    fn visit_stmt(&mut self, stmt: &ast::Stmt, scope: &mut Scope) {
        match stmt {
            ast::Stmt::FunctionDef(def) => {
                self.visit_function(
                    def.name.as_str(),
                    &def.args,
                    &def.body,
                    &def.decorator_list,
                    def.returns.as_deref(),
                    scope,
                );
            }
            ast::Stmt::AsyncFunctionDef(def) => {
                self.visit_function(
                    def.name.as_str(),
                    &def.args,
                    &def.body,
                    &def.decorator_list,
                    def.returns.as_deref(),
                    scope,
                );
            }
            ast::Stmt::ClassDef(def) => {
                for dec in &def.decorator_list {
                    self.visit_expr(dec, scope);
                }
                for base in &def.bases {
                    self.visit_expr(base, scope);
                }
                for kw in &def.keywords {
                    self.visit_expr(&kw.value, scope);
                }
                scope.define(def.name.as_str());
                // Class bodies execute immediately; attributes stay local
                // to the class scope.
                let mut class_scope = scope.child();
                self.visit_stmts(&def.body, &mut class_scope);
            }
            ast::Stmt::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.visit_expr(value, scope);
                }
            }
            ast::Stmt::Delete(del) => {
                for target in &del.targets {
                    self.visit_expr(target, scope);
                }
            }
            ast::Stmt::Assign(assign) => {
                self.visit_expr(&assign.value, scope);
                for target in &assign.targets {
                    self.bind_target(target, scope);
                }
            }
            ast::Stmt::AugAssign(assign) => {
                self.visit_expr(&assign.value, scope);
                // `x += 1` reads the target before rebinding it.
                self.visit_expr(&assign.target, scope);
                self.bind_target(&assign.target, scope);
            }
            ast::Stmt::AnnAssign(assign) => {
                self.visit_expr(&assign.annotation, scope);
                if let Some(value) = &assign.value {
                    self.visit_expr(value, scope);
                }
                self.bind_target(&assign.target, scope);
            }
            ast::Stmt::For(f) => {
                self.visit_expr(&f.iter, scope);
                self.bind_target(&f.target, scope);
                self.visit_stmts(&f.body, scope);
                self.visit_stmts(&f.orelse, scope);
            }
            ast::Stmt::AsyncFor(f) => {
                self.visit_expr(&f.iter, scope);
                self.bind_target(&f.target, scope);
                self.visit_stmts(&f.body, scope);
                self.visit_stmts(&f.orelse, scope);
            }
            ast::Stmt::While(w) => {
                self.visit_expr(&w.test, scope);
                self.visit_stmts(&w.body, scope);
                self.visit_stmts(&w.orelse, scope);
            }
            ast::Stmt::If(i) => {
                self.visit_expr(&i.test, scope);
                self.visit_stmts(&i.body, scope);
                self.visit_stmts(&i.orelse, scope);
            }
            ast::Stmt::With(w) => {
                for item in &w.items {
                    self.visit_expr(&item.context_expr, scope);
                    if let Some(vars) = &item.optional_vars {
                        self.bind_target(vars, scope);
                    }
                }
                self.visit_stmts(&w.body, scope);
            }
            ast::Stmt::AsyncWith(w) => {
                for item in &w.items {
                    self.visit_expr(&item.context_expr, scope);
                    if let Some(vars) = &item.optional_vars {
                        self.bind_target(vars, scope);
                    }
                }
                self.visit_stmts(&w.body, scope);
            }
            ast::Stmt::Match(m) => {
                self.visit_expr(&m.subject, scope);
                for case in &m.cases {
                    self.visit_pattern(&case.pattern, scope);
                    if let Some(guard) = &case.guard {
                        self.visit_expr(guard, scope);
                    }
                    self.visit_stmts(&case.body, scope);
                }
            }
            ast::Stmt::Raise(r) => {
                if let Some(exc) = &r.exc {
                    self.visit_expr(exc, scope);
                }
                if let Some(cause) = &r.cause {
                    self.visit_expr(cause, scope);
                }
            }
            ast::Stmt::Try(t) => {
                self.visit_stmts(&t.body, scope);
                for handler in &t.handlers {
                    self.visit_handler(handler, scope);
                }
                self.visit_stmts(&t.orelse, scope);
                self.visit_stmts(&t.finalbody, scope);
            }
            ast::Stmt::TryStar(t) => {
                self.visit_stmts(&t.body, scope);
                for handler in &t.handlers {
                    self.visit_handler(handler, scope);
                }
                self.visit_stmts(&t.orelse, scope);
                self.visit_stmts(&t.finalbody, scope);
            }
            ast::Stmt::Assert(a) => {
                self.visit_expr(&a.test, scope);
                if let Some(msg) = &a.msg {
                    self.visit_expr(msg, scope);
                }
            }
            ast::Stmt::Import(imp) => {
                for alias in &imp.names {
                    scope.define(&import_binding(alias));
                }
            }
            ast::Stmt::ImportFrom(imp) => {
                for alias in &imp.names {
                    if alias.name.as_str() != "*" {
                        scope.define(&import_binding(alias));
                    }
                }
            }
            ast::Stmt::Global(g) => {
                for name in &g.names {
                    scope.define(name.as_str());
                }
            }
            ast::Stmt::Nonlocal(n) => {
                for name in &n.names {
                    scope.define(name.as_str());
                }
            }
            ast::Stmt::Expr(e) => {
                self.visit_expr(&e.value, scope);
            }
            _ => {}
        }
    }

    fn visit_function(
        &mut self,
        name: &str,
        args: &ast::Arguments,
        body: &[ast::Stmt],
        decorators: &[ast::Expr],
        returns: Option<&ast::Expr>,
        scope: &mut Scope,
    ) {
        // Decorators, defaults and annotations evaluate in the enclosing
        // scope at definition time.
        for dec in decorators {
            self.visit_expr(dec, scope);
        }
        self.visit_arg_defaults_and_annotations(args, scope);
        if let Some(returns) = returns {
            self.visit_expr(returns, scope);
        }

        scope.define(name);

        // The body is deferred: it sees every top-level binding of the
        // block, its parameters, and its own locals in full (use-before-
        // assign of a local is not a *free* name).
        let mut body_scope = scope.child();
        for binding in &self.module_bindings {
            body_scope.defined.insert(binding.clone());
        }
        define_params(args, &mut body_scope);
        let mut locals = BTreeSet::new();
        let mut star = false;
        collect_bindings(body, &mut locals, &mut star);
        for local in locals {
            body_scope.defined.insert(local);
        }

        self.visit_stmts(body, &mut body_scope);
    }

    fn visit_handler(&mut self, handler: &ast::ExceptHandler, scope: &mut Scope) {
        let ast::ExceptHandler::ExceptHandler(h) = handler;
        if let Some(type_) = &h.type_ {
            self.visit_expr(type_, scope);
        }
        if let Some(name) = &h.name {
            scope.define(name.as_str());
        }
        self.visit_stmts(&h.body, scope);
    }

    fn visit_pattern(&mut self, pattern: &ast::Pattern, scope: &mut Scope) {
        match pattern {
            ast::Pattern::MatchValue(p) => self.visit_expr(&p.value, scope),
            ast::Pattern::MatchSingleton(_) => {}
            ast::Pattern::MatchSequence(p) => {
                for inner in &p.patterns {
                    self.visit_pattern(inner, scope);
                }
            }
            ast::Pattern::MatchMapping(p) => {
                for key in &p.keys {
                    self.visit_expr(key, scope);
                }
                for inner in &p.patterns {
                    self.visit_pattern(inner, scope);
                }
                if let Some(rest) = &p.rest {
                    scope.define(rest.as_str());
                }
            }
            ast::Pattern::MatchClass(p) => {
                self.visit_expr(&p.cls, scope);
                for inner in &p.patterns {
                    self.visit_pattern(inner, scope);
                }
                for inner in &p.kwd_patterns {
                    self.visit_pattern(inner, scope);
                }
            }
            ast::Pattern::MatchStar(p) => {
                if let Some(name) = &p.name {
                    scope.define(name.as_str());
                }
            }
            ast::Pattern::MatchAs(p) => {
                if let Some(inner) = &p.pattern {
                    self.visit_pattern(inner, scope);
                }
                if let Some(name) = &p.name {
                    scope.define(name.as_str());
                }
            }
            ast::Pattern::MatchOr(p) => {
                for inner in &p.patterns {
                    self.visit_pattern(inner, scope);
                }
            }
        }
    }

    fn visit_arg_defaults_and_annotations(&mut self, args: &ast::Arguments, scope: &mut Scope) {
        for arg in args
            .posonlyargs
            .iter()
            .chain(args.args.iter())
            .chain(args.kwonlyargs.iter())
        {
            if let Some(annotation) = &arg.def.annotation {
                self.visit_expr(annotation, scope);
            }
            if let Some(default) = &arg.default {
                self.visit_expr(default, scope);
            }
        }
        if let Some(vararg) = &args.vararg {
            if let Some(annotation) = &vararg.annotation {
                self.visit_expr(annotation, scope);
            }
        }
        if let Some(kwarg) = &args.kwarg {
            if let Some(annotation) = &kwarg.annotation {
                self.visit_expr(annotation, scope);
            }
        }
    }

    fn visit_expr(&mut self, expr: &ast::Expr, scope: &mut Scope) {
        match expr {
            ast::Expr::BoolOp(e) => {
                for value in &e.values {
                    self.visit_expr(value, scope);
                }
            }
            ast::Expr::NamedExpr(e) => {
                self.visit_expr(&e.value, scope);
                self.bind_target(&e.target, scope);
            }
            ast::Expr::BinOp(e) => {
                self.visit_expr(&e.left, scope);
                self.visit_expr(&e.right, scope);
            }
            ast::Expr::UnaryOp(e) => {
                self.visit_expr(&e.operand, scope);
            }
            ast::Expr::Lambda(e) => {
                self.visit_arg_defaults_and_annotations(&e.args, scope);
                let mut lambda_scope = scope.child();
                define_params(&e.args, &mut lambda_scope);
                self.visit_expr(&e.body, &mut lambda_scope);
            }
            ast::Expr::IfExp(e) => {
                self.visit_expr(&e.test, scope);
                self.visit_expr(&e.body, scope);
                self.visit_expr(&e.orelse, scope);
            }
            ast::Expr::Dict(e) => {
                for key in e.keys.iter().flatten() {
                    self.visit_expr(key, scope);
                }
                for value in &e.values {
                    self.visit_expr(value, scope);
                }
            }
            ast::Expr::Set(e) => {
                for elt in &e.elts {
                    self.visit_expr(elt, scope);
                }
            }
            ast::Expr::ListComp(e) => {
                let mut comp_scope = scope.child();
                self.visit_comprehensions(&e.generators, &mut comp_scope);
                self.visit_expr(&e.elt, &mut comp_scope);
            }
            ast::Expr::SetComp(e) => {
                let mut comp_scope = scope.child();
                self.visit_comprehensions(&e.generators, &mut comp_scope);
                self.visit_expr(&e.elt, &mut comp_scope);
            }
            ast::Expr::DictComp(e) => {
                let mut comp_scope = scope.child();
                self.visit_comprehensions(&e.generators, &mut comp_scope);
                self.visit_expr(&e.key, &mut comp_scope);
                self.visit_expr(&e.value, &mut comp_scope);
            }
            ast::Expr::GeneratorExp(e) => {
                let mut comp_scope = scope.child();
                self.visit_comprehensions(&e.generators, &mut comp_scope);
                self.visit_expr(&e.elt, &mut comp_scope);
            }
            ast::Expr::Await(e) => self.visit_expr(&e.value, scope),
            ast::Expr::Yield(e) => {
                if let Some(value) = &e.value {
                    self.visit_expr(value, scope);
                }
            }
            ast::Expr::YieldFrom(e) => self.visit_expr(&e.value, scope),
            ast::Expr::Compare(e) => {
                self.visit_expr(&e.left, scope);
                for comparator in &e.comparators {
                    self.visit_expr(comparator, scope);
                }
            }
            ast::Expr::Call(e) => {
                self.visit_expr(&e.func, scope);
                for arg in &e.args {
                    self.visit_expr(arg, scope);
                }
                for kw in &e.keywords {
                    self.visit_expr(&kw.value, scope);
                }
            }
            ast::Expr::FormattedValue(e) => {
                self.visit_expr(&e.value, scope);
                if let Some(spec) = &e.format_spec {
                    self.visit_expr(spec, scope);
                }
            }
            ast::Expr::JoinedStr(e) => {
                for value in &e.values {
                    self.visit_expr(value, scope);
                }
            }
            ast::Expr::Attribute(e) => {
                // `obj.attr` reads `obj`; the attribute itself is not a name.
                self.visit_expr(&e.value, scope);
            }
            ast::Expr::Subscript(e) => {
                self.visit_expr(&e.value, scope);
                self.visit_expr(&e.slice, scope);
            }
            ast::Expr::Starred(e) => self.visit_expr(&e.value, scope),
            ast::Expr::Name(e) => match e.ctx {
                ast::ExprContext::Store => scope.define(e.id.as_str()),
                ast::ExprContext::Load | ast::ExprContext::Del => {
                    self.record_read(e.id.as_str(), scope)
                }
            },
            ast::Expr::List(e) => {
                for elt in &e.elts {
                    self.visit_expr(elt, scope);
                }
            }
            ast::Expr::Tuple(e) => {
                for elt in &e.elts {
                    self.visit_expr(elt, scope);
                }
            }
            ast::Expr::Slice(e) => {
                if let Some(lower) = &e.lower {
                    self.visit_expr(lower, scope);
                }
                if let Some(upper) = &e.upper {
                    self.visit_expr(upper, scope);
                }
                if let Some(step) = &e.step {
                    self.visit_expr(step, scope);
                }
            }
            _ => {}
        }
    }

    fn visit_comprehensions(&mut self, generators: &[ast::Comprehension], scope: &mut Scope) {
        for gen in generators {
            self.visit_expr(&gen.iter, scope);
            self.bind_target(&gen.target, scope);
            for if_clause in &gen.ifs {
                self.visit_expr(if_clause, scope);
            }
        }
    }

    /// Bind an assignment target. Subscript/attribute targets read their
    /// base value instead of binding a new name.
    fn bind_target(&mut self, target: &ast::Expr, scope: &mut Scope) {
        match target {
            ast::Expr::Name(name) => scope.define(name.id.as_str()),
            ast::Expr::Tuple(t) => {
                for elt in &t.elts {
                    self.bind_target(elt, scope);
                }
            }
            ast::Expr::List(l) => {
                for elt in &l.elts {
                    self.bind_target(elt, scope);
                }
            }
            ast::Expr::Starred(s) => self.bind_target(&s.value, scope),
            ast::Expr::Attribute(a) => self.visit_expr(&a.value, scope),
            ast::Expr::Subscript(s) => {
                self.visit_expr(&s.value, scope);
                self.visit_expr(&s.slice, scope);
            }
            other => self.visit_expr(other, scope),
        }
    }
}

/// Collect the names a statement list binds in its own scope.
///
/// Recurses into compound-statement bodies (`if`/`for`/`while`/`try`/`with`)
/// but not into nested function or class scopes, which only contribute
/// their names.
fn collect_bindings(stmts: &[ast::Stmt], out: &mut BTreeSet<String>, star_import: &mut bool) {
    for stmt in stmts {
        match stmt {
            ast::Stmt::FunctionDef(def) => {
                out.insert(def.name.to_string());
            }
            ast::Stmt::AsyncFunctionDef(def) => {
                out.insert(def.name.to_string());
            }
            ast::Stmt::ClassDef(def) => {
                out.insert(def.name.to_string());
            }
            ast::Stmt::Assign(assign) => {
                for target in &assign.targets {
                    collect_target(target, out);
                }
                collect_walrus(&assign.value, out);
            }
            ast::Stmt::AugAssign(assign) => collect_target(&assign.target, out),
            ast::Stmt::AnnAssign(assign) => collect_target(&assign.target, out),
            ast::Stmt::For(f) => {
                collect_target(&f.target, out);
                collect_bindings(&f.body, out, star_import);
                collect_bindings(&f.orelse, out, star_import);
            }
            ast::Stmt::AsyncFor(f) => {
                collect_target(&f.target, out);
                collect_bindings(&f.body, out, star_import);
                collect_bindings(&f.orelse, out, star_import);
            }
            ast::Stmt::While(w) => {
                collect_bindings(&w.body, out, star_import);
                collect_bindings(&w.orelse, out, star_import);
            }
            ast::Stmt::If(i) => {
                collect_bindings(&i.body, out, star_import);
                collect_bindings(&i.orelse, out, star_import);
            }
            ast::Stmt::With(w) => {
                for item in &w.items {
                    if let Some(vars) = &item.optional_vars {
                        collect_target(vars, out);
                    }
                }
                collect_bindings(&w.body, out, star_import);
            }
            ast::Stmt::AsyncWith(w) => {
                for item in &w.items {
                    if let Some(vars) = &item.optional_vars {
                        collect_target(vars, out);
                    }
                }
                collect_bindings(&w.body, out, star_import);
            }
            ast::Stmt::Try(t) => {
                collect_bindings(&t.body, out, star_import);
                for handler in &t.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    if let Some(name) = &h.name {
                        out.insert(name.to_string());
                    }
                    collect_bindings(&h.body, out, star_import);
                }
                collect_bindings(&t.orelse, out, star_import);
                collect_bindings(&t.finalbody, out, star_import);
            }
            ast::Stmt::TryStar(t) => {
                collect_bindings(&t.body, out, star_import);
                for handler in &t.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    if let Some(name) = &h.name {
                        out.insert(name.to_string());
                    }
                    collect_bindings(&h.body, out, star_import);
                }
                collect_bindings(&t.orelse, out, star_import);
                collect_bindings(&t.finalbody, out, star_import);
            }
            ast::Stmt::Match(m) => {
                for case in &m.cases {
                    collect_pattern(&case.pattern, out);
                    collect_bindings(&case.body, out, star_import);
                }
            }
            ast::Stmt::Import(imp) => {
                for alias in &imp.names {
                    out.insert(import_binding(alias));
                }
            }
            ast::Stmt::ImportFrom(imp) => {
                for alias in &imp.names {
                    if alias.name.as_str() == "*" {
                        *star_import = true;
                    } else {
                        out.insert(import_binding(alias));
                    }
                }
            }
            ast::Stmt::Global(g) => {
                for name in &g.names {
                    out.insert(name.to_string());
                }
            }
            ast::Stmt::Expr(e) => collect_walrus(&e.value, out),
            _ => {}
        }
    }
}

fn collect_target(target: &ast::Expr, out: &mut BTreeSet<String>) {
    match target {
        ast::Expr::Name(name) => {
            out.insert(name.id.to_string());
        }
        ast::Expr::Tuple(t) => {
            for elt in &t.elts {
                collect_target(elt, out);
            }
        }
        ast::Expr::List(l) => {
            for elt in &l.elts {
                collect_target(elt, out);
            }
        }
        ast::Expr::Starred(s) => collect_target(&s.value, out),
        _ => {}
    }
}

fn collect_pattern(pattern: &ast::Pattern, out: &mut BTreeSet<String>) {
    match pattern {
        ast::Pattern::MatchSequence(p) => {
            for inner in &p.patterns {
                collect_pattern(inner, out);
            }
        }
        ast::Pattern::MatchMapping(p) => {
            for inner in &p.patterns {
                collect_pattern(inner, out);
            }
            if let Some(rest) = &p.rest {
                out.insert(rest.to_string());
            }
        }
        ast::Pattern::MatchClass(p) => {
            for inner in &p.patterns {
                collect_pattern(inner, out);
            }
            for inner in &p.kwd_patterns {
                collect_pattern(inner, out);
            }
        }
        ast::Pattern::MatchStar(p) => {
            if let Some(name) = &p.name {
                out.insert(name.to_string());
            }
        }
        ast::Pattern::MatchAs(p) => {
            if let Some(inner) = &p.pattern {
                collect_pattern(inner, out);
            }
            if let Some(name) = &p.name {
                out.insert(name.to_string());
            }
        }
        ast::Pattern::MatchOr(p) => {
            for inner in &p.patterns {
                collect_pattern(inner, out);
            }
        }
        _ => {}
    }
}

/// Shallow walrus scan for top-level expression statements; `(x := f())` at
/// the top level binds `x` in the block scope.
fn collect_walrus(expr: &ast::Expr, out: &mut BTreeSet<String>) {
    if let ast::Expr::NamedExpr(e) = expr {
        collect_target(&e.target, out);
        collect_walrus(&e.value, out);
    }
}

/// The name an `import`/`from … import` alias binds: the alias if present,
/// otherwise the first component of the (possibly dotted) module path.
fn import_binding(alias: &ast::Alias) -> String {
    match &alias.asname {
        Some(asname) => asname.to_string(),
        None => alias
            .name
            .as_str()
            .split('.')
            .next()
            .unwrap_or(alias.name.as_str())
            .to_string(),
    }
}

fn define_params(args: &ast::Arguments, scope: &mut Scope) {
    for arg in args
        .posonlyargs
        .iter()
        .chain(args.args.iter())
        .chain(args.kwonlyargs.iter())
    {
        scope.define(arg.def.arg.as_str());
    }
    if let Some(vararg) = &args.vararg {
        scope.define(vararg.arg.as_str());
    }
    if let Some(kwarg) = &args.kwarg {
        scope.define(kwarg.arg.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(source: &str) -> Vec<String> {
        analyze_block(source)
            .unwrap()
            .free
            .into_iter()
            .collect()
    }

    fn bound(source: &str) -> Vec<String> {
        analyze_block(source)
            .unwrap()
            .bound
            .into_iter()
            .collect()
    }

    #[test]
    fn simple_free_variable() {
        assert_eq!(free("y = x + 1"), vec!["x"]);
    }

    #[test]
    fn locally_bound_names_are_not_free() {
        assert_eq!(free("x = 1\ny = x + 1"), Vec::<String>::new());
    }

    #[test]
    fn use_before_bind_at_top_level_is_free() {
        assert_eq!(free("y = x\nx = 1"), vec!["x"]);
    }

    #[test]
    fn imports_and_builtins_are_not_free() {
        let source = "import os\nfrom json import dumps\nprint(dumps(os.getcwd()))";
        assert_eq!(free(source), Vec::<String>::new());
    }

    #[test]
    fn dotted_import_binds_first_component() {
        assert_eq!(free("import os.path\nprint(os.path.sep)"), Vec::<String>::new());
        assert_eq!(bound("import os.path"), vec!["os"]);
    }

    #[test]
    fn comprehension_targets_are_local() {
        let analysis = analyze_block("squares = [i * i for i in data]").unwrap();
        assert_eq!(
            analysis.free.iter().collect::<Vec<_>>(),
            vec![&"data".to_string()]
        );
        assert_eq!(
            analysis.bound.iter().collect::<Vec<_>>(),
            vec![&"squares".to_string()]
        );
    }

    #[test]
    fn function_body_sees_later_top_level_bindings() {
        // `helper` reads `model`, which is bound after the def; deferred
        // execution makes that fine.
        let source = "def helper():\n    return model\nmodel = 42";
        assert_eq!(free(source), Vec::<String>::new());
    }

    #[test]
    fn function_body_reports_external_reads() {
        let source = "def train():\n    return fit(df)";
        assert_eq!(free(source), vec!["df", "fit"]);
    }

    #[test]
    fn function_params_are_not_free() {
        let source = "def f(a, b=1, *args, c, **kwargs):\n    return a + b + c";
        assert_eq!(free(source), Vec::<String>::new());
    }

    #[test]
    fn lambda_params_are_local() {
        assert_eq!(free("f = lambda a: a + offset"), vec!["offset"]);
    }

    #[test]
    fn default_values_evaluate_in_outer_scope() {
        assert_eq!(free("def f(a=base):\n    return a"), vec!["base"]);
    }

    #[test]
    fn aug_assign_reads_its_target() {
        assert_eq!(free("total += 1"), vec!["total"]);
    }

    #[test]
    fn for_loop_target_is_bound() {
        let source = "for row in rows:\n    print(row)";
        assert_eq!(free(source), vec!["rows"]);
    }

    #[test]
    fn with_target_is_bound() {
        let source = "with open(path) as fh:\n    text = fh.read()";
        assert_eq!(free(source), vec!["path"]);
    }

    #[test]
    fn except_name_is_bound() {
        let source = "try:\n    risky()\nexcept ValueError as err:\n    print(err)";
        assert_eq!(free(source), vec!["risky"]);
    }

    #[test]
    fn subscript_assignment_reads_the_base() {
        assert_eq!(free("table[0] = 1"), vec!["table"]);
    }

    #[test]
    fn walrus_binds_in_block_scope() {
        assert_eq!(free("if (n := len(items)) > 3:\n    print(n)"), vec!["items"]);
    }

    #[test]
    fn fstring_reads_are_detected() {
        assert_eq!(free("msg = f\"value={value}\""), vec!["value"]);
    }

    #[test]
    fn star_import_is_flagged() {
        let analysis = analyze_block("from os.path import *").unwrap();
        assert!(analysis.star_import);
    }

    #[test]
    fn top_level_bindings_include_defs_and_classes() {
        let source = "def f():\n    pass\nclass C:\n    pass\nx, y = 1, 2";
        assert_eq!(bound(source), vec!["C", "f", "x", "y"]);
    }

    #[test]
    fn syntax_error_is_reported() {
        assert!(analyze_block("def broken(:\n    pass").is_err());
    }

    #[test]
    fn magic_directives_must_be_neutralized_first() {
        // Raw magics do not parse; the preprocessing contract comments them
        // out before the analyzer runs.
        assert!(analyze_block("%matplotlib inline\nx = 1").is_err());
        let cleaned = crate::analysis::magics::comment_magic_commands("%matplotlib inline\nx = 1");
        assert_eq!(free(&cleaned), Vec::<String>::new());
    }
}
