//! Depth-first traversal over statements and expressions
//!
//! Override `visit_*` to observe nodes; call the matching `walk_*` from an
//! override to keep descending.

use crate::ast::{
    Arg, ClassDef, DictItem, Expr, FPart, FunctionDef, Generator, Param, Stmt,
};

/// Read-only visitor
pub trait Visitor {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

/// Mutable visitor
pub trait VisitorMut {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

/// Visit every statement of a block
pub fn walk_body<V: Visitor + ?Sized>(v: &mut V, body: &[Stmt]) {
    for stmt in body {
        v.visit_stmt(stmt);
    }
}

fn walk_params<V: Visitor + ?Sized>(v: &mut V, params: &[Param]) {
    for p in params {
        if let Some(a) = &p.annotation {
            v.visit_expr(a);
        }
        if let Some(d) = &p.default {
            v.visit_expr(d);
        }
    }
}

fn walk_function<V: Visitor + ?Sized>(v: &mut V, f: &FunctionDef) {
    for d in &f.decorators {
        v.visit_expr(d);
    }
    walk_params(v, &f.params);
    if let Some(r) = &f.returns {
        v.visit_expr(r);
    }
    walk_body(v, &f.body);
}

fn walk_class<V: Visitor + ?Sized>(v: &mut V, c: &ClassDef) {
    for d in &c.decorators {
        v.visit_expr(d);
    }
    for a in &c.bases {
        v.visit_expr(a.value());
    }
    walk_body(v, &c.body);
}

/// Visit the children of a statement
pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Expr(e) => v.visit_expr(e),
        Stmt::Assign { targets, value } => {
            v.visit_expr(value);
            for t in targets {
                v.visit_expr(t);
            }
        }
        Stmt::AugAssign { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        Stmt::AnnAssign {
            target,
            annotation,
            value,
        } => {
            v.visit_expr(target);
            v.visit_expr(annotation);
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::If { test, body, orelse } | Stmt::While { test, body, orelse } => {
            v.visit_expr(test);
            walk_body(v, body);
            walk_body(v, orelse);
        }
        Stmt::For {
            target,
            iter,
            body,
            orelse,
            ..
        } => {
            v.visit_expr(iter);
            v.visit_expr(target);
            walk_body(v, body);
            walk_body(v, orelse);
        }
        Stmt::With { items, body, .. } => {
            for item in items {
                v.visit_expr(&item.context);
                if let Some(alias) = &item.alias {
                    v.visit_expr(alias);
                }
            }
            walk_body(v, body);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            walk_body(v, body);
            for h in handlers {
                if let Some(kind) = &h.kind {
                    v.visit_expr(kind);
                }
                walk_body(v, &h.body);
            }
            walk_body(v, orelse);
            walk_body(v, finalbody);
        }
        Stmt::Raise { exc, cause } => {
            if let Some(e) = exc {
                v.visit_expr(e);
            }
            if let Some(c) = cause {
                v.visit_expr(c);
            }
        }
        Stmt::Assert { test, msg } => {
            v.visit_expr(test);
            if let Some(m) = msg {
                v.visit_expr(m);
            }
        }
        Stmt::Delete(targets) => {
            for t in targets {
                v.visit_expr(t);
            }
        }
        Stmt::FunctionDef(f) => walk_function(v, f),
        Stmt::ClassDef(c) => walk_class(v, c),
        Stmt::Pass
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Global(_)
        | Stmt::Nonlocal(_)
        | Stmt::Import(_) => {}
    }
}

fn walk_generators<V: Visitor + ?Sized>(v: &mut V, generators: &[Generator]) {
    for g in generators {
        v.visit_expr(&g.iter);
        v.visit_expr(&g.target);
        for cond in &g.ifs {
            v.visit_expr(cond);
        }
    }
}

/// Visit the children of an expression
pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Name(_) | Expr::Constant(_) => {}
        Expr::FString(parts) => {
            for part in parts {
                if let FPart::Interpolation { expr, .. } = part {
                    v.visit_expr(expr);
                }
            }
        }
        Expr::Attribute { value, .. } | Expr::Starred(value) | Expr::Await(value) => {
            v.visit_expr(value);
        }
        Expr::YieldFrom(value) => v.visit_expr(value),
        Expr::Yield(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Expr::NamedExpr { value, .. } => v.visit_expr(value),
        Expr::Subscript { value, index } => {
            v.visit_expr(value);
            v.visit_expr(index);
        }
        Expr::Slice { lower, upper, step } => {
            for part in [lower, upper, step].into_iter().flatten() {
                v.visit_expr(part);
            }
        }
        Expr::Call { func, args } => {
            v.visit_expr(func);
            for a in args {
                v.visit_expr(a.value());
            }
        }
        Expr::BinOp { left, right, .. } | Expr::BoolOp { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        Expr::UnaryOp { operand, .. } => v.visit_expr(operand),
        Expr::Compare { left, ops } => {
            v.visit_expr(left);
            for (_, e) in ops {
                v.visit_expr(e);
            }
        }
        Expr::IfExp { body, test, orelse } => {
            v.visit_expr(test);
            v.visit_expr(body);
            v.visit_expr(orelse);
        }
        Expr::Lambda { params, body } => {
            walk_params(v, params);
            v.visit_expr(body);
        }
        Expr::Tuple(items) | Expr::List(items) | Expr::Set(items) => {
            for e in items {
                v.visit_expr(e);
            }
        }
        Expr::Dict(items) => {
            for item in items {
                match item {
                    DictItem::Pair(k, val) => {
                        v.visit_expr(k);
                        v.visit_expr(val);
                    }
                    DictItem::Splat(e) => v.visit_expr(e),
                }
            }
        }
        Expr::Comprehension {
            element,
            value,
            generators,
            ..
        } => {
            walk_generators(v, generators);
            v.visit_expr(element);
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
    }
}

/// Visit every statement of a block mutably
pub fn walk_body_mut<V: VisitorMut + ?Sized>(v: &mut V, body: &mut [Stmt]) {
    for stmt in body {
        v.visit_stmt_mut(stmt);
    }
}

fn walk_params_mut<V: VisitorMut + ?Sized>(v: &mut V, params: &mut [Param]) {
    for p in params {
        if let Some(a) = &mut p.annotation {
            v.visit_expr_mut(a);
        }
        if let Some(d) = &mut p.default {
            v.visit_expr_mut(d);
        }
    }
}

fn walk_args_mut<V: VisitorMut + ?Sized>(v: &mut V, args: &mut [Arg]) {
    for a in args {
        v.visit_expr_mut(a.value_mut());
    }
}

/// Visit the children of a statement mutably
pub fn walk_stmt_mut<V: VisitorMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Expr(e) => v.visit_expr_mut(e),
        Stmt::Assign { targets, value } => {
            v.visit_expr_mut(value);
            for t in targets {
                v.visit_expr_mut(t);
            }
        }
        Stmt::AugAssign { target, value, .. } => {
            v.visit_expr_mut(target);
            v.visit_expr_mut(value);
        }
        Stmt::AnnAssign {
            target,
            annotation,
            value,
        } => {
            v.visit_expr_mut(target);
            v.visit_expr_mut(annotation);
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
        }
        Stmt::Return(value) => {
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
        }
        Stmt::If { test, body, orelse } | Stmt::While { test, body, orelse } => {
            v.visit_expr_mut(test);
            walk_body_mut(v, body);
            walk_body_mut(v, orelse);
        }
        Stmt::For {
            target,
            iter,
            body,
            orelse,
            ..
        } => {
            v.visit_expr_mut(iter);
            v.visit_expr_mut(target);
            walk_body_mut(v, body);
            walk_body_mut(v, orelse);
        }
        Stmt::With { items, body, .. } => {
            for item in items {
                v.visit_expr_mut(&mut item.context);
                if let Some(alias) = &mut item.alias {
                    v.visit_expr_mut(alias);
                }
            }
            walk_body_mut(v, body);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            walk_body_mut(v, body);
            for h in handlers {
                if let Some(kind) = &mut h.kind {
                    v.visit_expr_mut(kind);
                }
                walk_body_mut(v, &mut h.body);
            }
            walk_body_mut(v, orelse);
            walk_body_mut(v, finalbody);
        }
        Stmt::Raise { exc, cause } => {
            if let Some(e) = exc {
                v.visit_expr_mut(e);
            }
            if let Some(c) = cause {
                v.visit_expr_mut(c);
            }
        }
        Stmt::Assert { test, msg } => {
            v.visit_expr_mut(test);
            if let Some(m) = msg {
                v.visit_expr_mut(m);
            }
        }
        Stmt::Delete(targets) => {
            for t in targets {
                v.visit_expr_mut(t);
            }
        }
        Stmt::FunctionDef(f) => {
            for d in &mut f.decorators {
                v.visit_expr_mut(d);
            }
            walk_params_mut(v, &mut f.params);
            if let Some(r) = &mut f.returns {
                v.visit_expr_mut(r);
            }
            walk_body_mut(v, &mut f.body);
        }
        Stmt::ClassDef(c) => {
            for d in &mut c.decorators {
                v.visit_expr_mut(d);
            }
            walk_args_mut(v, &mut c.bases);
            walk_body_mut(v, &mut c.body);
        }
        Stmt::Pass
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Global(_)
        | Stmt::Nonlocal(_)
        | Stmt::Import(_) => {}
    }
}

/// Visit the children of an expression mutably
pub fn walk_expr_mut<V: VisitorMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Name(_) | Expr::Constant(_) => {}
        Expr::FString(parts) => {
            for part in parts {
                if let FPart::Interpolation { expr, .. } = part {
                    v.visit_expr_mut(expr);
                }
            }
        }
        Expr::Attribute { value, .. }
        | Expr::Starred(value)
        | Expr::Await(value)
        | Expr::YieldFrom(value) => v.visit_expr_mut(value),
        Expr::Yield(value) => {
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
        }
        Expr::NamedExpr { value, .. } => v.visit_expr_mut(value),
        Expr::Subscript { value, index } => {
            v.visit_expr_mut(value);
            v.visit_expr_mut(index);
        }
        Expr::Slice { lower, upper, step } => {
            for part in [lower, upper, step].into_iter().flatten() {
                v.visit_expr_mut(part);
            }
        }
        Expr::Call { func, args } => {
            v.visit_expr_mut(func);
            walk_args_mut(v, args);
        }
        Expr::BinOp { left, right, .. } | Expr::BoolOp { left, right, .. } => {
            v.visit_expr_mut(left);
            v.visit_expr_mut(right);
        }
        Expr::UnaryOp { operand, .. } => v.visit_expr_mut(operand),
        Expr::Compare { left, ops } => {
            v.visit_expr_mut(left);
            for (_, e) in ops {
                v.visit_expr_mut(e);
            }
        }
        Expr::IfExp { body, test, orelse } => {
            v.visit_expr_mut(test);
            v.visit_expr_mut(body);
            v.visit_expr_mut(orelse);
        }
        Expr::Lambda { params, body } => {
            walk_params_mut(v, params);
            v.visit_expr_mut(body);
        }
        Expr::Tuple(items) | Expr::List(items) | Expr::Set(items) => {
            for e in items {
                v.visit_expr_mut(e);
            }
        }
        Expr::Dict(items) => {
            for item in items {
                match item {
                    DictItem::Pair(k, val) => {
                        v.visit_expr_mut(k);
                        v.visit_expr_mut(val);
                    }
                    DictItem::Splat(e) => v.visit_expr_mut(e),
                }
            }
        }
        Expr::Comprehension {
            element,
            value,
            generators,
            ..
        } => {
            for g in generators {
                v.visit_expr_mut(&mut g.iter);
                v.visit_expr_mut(&mut g.target);
                for cond in &mut g.ifs {
                    v.visit_expr_mut(cond);
                }
            }
            v.visit_expr_mut(element);
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
        }
    }
}

/// Direct sub-expressions of `expr`, for callers whose traversal can fail
pub fn children_mut(expr: &mut Expr) -> Vec<&mut Expr> {
    let mut out: Vec<&mut Expr> = Vec::new();
    match expr {
        Expr::Name(_) | Expr::Constant(_) => {}
        Expr::FString(parts) => {
            for part in parts {
                if let FPart::Interpolation { expr, .. } = part {
                    out.push(expr);
                }
            }
        }
        Expr::Attribute { value, .. }
        | Expr::Starred(value)
        | Expr::Await(value)
        | Expr::YieldFrom(value)
        | Expr::NamedExpr { value, .. } => out.push(value),
        Expr::Yield(value) => out.extend(value.as_deref_mut()),
        Expr::Subscript { value, index } => {
            out.push(value);
            out.push(index);
        }
        Expr::Slice { lower, upper, step } => {
            out.extend(lower.as_deref_mut());
            out.extend(upper.as_deref_mut());
            out.extend(step.as_deref_mut());
        }
        Expr::Call { func, args } => {
            out.push(func);
            out.extend(args.iter_mut().map(Arg::value_mut));
        }
        Expr::BinOp { left, right, .. } | Expr::BoolOp { left, right, .. } => {
            out.push(left);
            out.push(right);
        }
        Expr::UnaryOp { operand, .. } => out.push(operand),
        Expr::Compare { left, ops } => {
            out.push(left);
            out.extend(ops.iter_mut().map(|(_, e)| e));
        }
        Expr::IfExp { body, test, orelse } => {
            out.push(test);
            out.push(body);
            out.push(orelse);
        }
        Expr::Lambda { params, body } => {
            for p in params {
                out.extend(p.default.as_mut());
            }
            out.push(body);
        }
        Expr::Tuple(items) | Expr::List(items) | Expr::Set(items) => out.extend(items.iter_mut()),
        Expr::Dict(items) => {
            for item in items {
                match item {
                    DictItem::Pair(k, v) => {
                        out.push(k);
                        out.push(v);
                    }
                    DictItem::Splat(e) => out.push(e),
                }
            }
        }
        Expr::Comprehension {
            element,
            value,
            generators,
            ..
        } => {
            for g in generators {
                out.push(&mut g.iter);
                out.push(&mut g.target);
                out.extend(g.ifs.iter_mut());
            }
            out.push(element);
            out.extend(value.as_deref_mut());
        }
    }
    out
}

/// Every bare identifier bound or read anywhere in a function
#[must_use]
pub fn identifiers(f: &FunctionDef) -> std::collections::HashSet<String> {
    struct Collect(std::collections::HashSet<String>);
    impl Visitor for Collect {
        fn visit_expr(&mut self, expr: &Expr) {
            match expr {
                Expr::Name(id) => {
                    self.0.insert(id.clone());
                }
                Expr::NamedExpr { target, .. } => {
                    self.0.insert(target.clone());
                }
                _ => {}
            }
            walk_expr(self, expr);
        }
    }
    let mut c = Collect(f.params.iter().map(|p| p.name.clone()).collect());
    walk_body(&mut c, &f.body);
    c.0
}
