//! Rewriting borrowed bodies into a foreign state space
//!
//! A member declared at `u` reads and writes the fields of `base(u)`. To run
//! it at `v` every such access goes through lenses onto `base(v)`:
//!
//! - reads become calls to the get lens serving the field, composing lens
//!   by lens when no single lens reaches the target;
//! - writes are pushed through put lenses into every target field whose get
//!   lens depends on the written field, synthesizing puts on demand;
//! - compound, annotated, multi-target and destructuring assignments are
//!   decomposed first so each field write is a single `self.f = value`.
//!
//! Every lens a rewrite calls is collected once, by emitted name, for the
//! slicer to append to the output class.

use crate::config::SliceConfig;
use crate::error::RewriteError;
use crate::fields::FieldMap;
use crate::lens::{Lens, LensTable};
use crate::model::ClassModel;
use crate::synth::{fields_read, synthesize_put};
use indexmap::IndexMap;
use std::collections::HashSet;
use vlens_graph::VersionId;
use vlens_syntax::ast::{Arg, BinOp, Constant, Expr, FunctionDef, Stmt, UnaryOp};
use vlens_syntax::visit::{children_mut, identifiers};

type Result<T> = std::result::Result<T, RewriteError>;

/// Per-function naming context
struct Scope {
    owner: String,
    prefix: String,
    used: HashSet<String>,
    next: usize,
}

impl Scope {
    fn new(def: &FunctionDef, prefix: &str) -> Option<Self> {
        Some(Self {
            owner: def.self_name()?.to_string(),
            prefix: prefix.to_string(),
            used: identifiers(def),
            next: 0,
        })
    }

    fn fresh(&mut self) -> String {
        loop {
            let name = format!("{}{}", self.prefix, self.next);
            self.next += 1;
            if self.used.insert(name.clone()) {
                return name;
            }
        }
    }

    fn field(&self, f: &str) -> Expr {
        Expr::attr(Expr::name(&self.owner), f)
    }

    fn call(&self, method: &str, args: Vec<Arg>) -> Expr {
        Expr::call(Expr::attr(Expr::name(&self.owner), method), args)
    }
}

fn assign(target: Expr, value: Expr) -> Stmt {
    Stmt::Assign {
        targets: vec![target],
        value,
    }
}

/// Safe to evaluate more than once
fn is_pure(e: &Expr) -> bool {
    match e {
        Expr::Name(_) | Expr::Constant(_) => true,
        Expr::Subscript { value, index } => {
            matches!(value.as_ref(), Expr::Name(_))
                && match index.as_ref() {
                    Expr::Constant(Constant::Int(_)) => true,
                    Expr::UnaryOp {
                        op: UnaryOp::Neg,
                        operand,
                    } => matches!(operand.as_ref(), Expr::Constant(Constant::Int(_))),
                    _ => false,
                }
        }
        _ => false,
    }
}

fn negative(k: usize) -> Expr {
    Expr::UnaryOp {
        op: UnaryOp::Neg,
        operand: Box::new(Expr::int(k as i64)),
    }
}

/// Rewrites members of one class into the state space of one version
#[derive(Debug)]
pub struct Rewriter<'a> {
    class: &'a ClassModel,
    fields: &'a FieldMap,
    config: &'a SliceConfig,
    lenses: LensTable,
    target: VersionId,
    emitted: IndexMap<String, FunctionDef>,
    active: Vec<(VersionId, String)>,
}

impl<'a> Rewriter<'a> {
    /// Rewriter into the state space of `version`
    #[must_use]
    pub fn new(
        class: &'a ClassModel,
        fields: &'a FieldMap,
        lenses: LensTable,
        config: &'a SliceConfig,
        version: VersionId,
    ) -> Self {
        Self {
            class,
            fields,
            config,
            lenses,
            target: fields.base_or_self(version),
            emitted: IndexMap::new(),
            active: Vec::new(),
        }
    }

    /// Base version whose state rewritten code operates on
    #[inline]
    #[must_use]
    pub fn target(&self) -> VersionId {
        self.target
    }

    /// Lens table, including puts synthesized so far
    #[inline]
    #[must_use]
    pub fn lenses(&self) -> &LensTable {
        &self.lenses
    }

    /// Consume the rewriter, returning the lens methods to append
    #[must_use]
    pub fn into_emitted(self) -> Vec<FunctionDef> {
        self.emitted.into_values().collect()
    }

    /// Rewrite a function written against the state of `from`
    ///
    /// The function is returned unchanged when `from` shares the target's
    /// base or the function has no instance parameter.
    ///
    /// # Errors
    /// Returns [`RewriteError`] when a field cannot be routed through lenses.
    pub fn rewrite_function(&mut self, def: &FunctionDef, from: VersionId) -> Result<FunctionDef> {
        let from = self.fields.base_or_self(from);
        if from == self.target {
            return Ok(def.clone());
        }
        let Some(mut scope) = Scope::new(def, &self.config.temp_prefix) else {
            return Ok(def.clone());
        };
        tracing::debug!(
            class = self.class.name(),
            function = %def.name,
            from = self.version(from),
            to = self.version(self.target),
            "rewriting"
        );
        let mut out = def.clone();
        out.body = self.block(&def.body, from, &mut scope)?;
        if out.body.is_empty() {
            out.body.push(Stmt::Pass);
        }
        Ok(out)
    }

    fn version(&self, v: VersionId) -> &str {
        self.class.version_name(v)
    }

    fn is_field(&self, from: VersionId, name: &str) -> bool {
        self.fields.fields(from).contains(name)
    }

    /// `self.f` with `f` a field of `from`
    fn field_of(&self, e: &Expr, from: VersionId, scope: &Scope) -> Option<String> {
        e.as_attr_of(&scope.owner)
            .filter(|f| self.is_field(from, f))
            .map(str::to_string)
    }

    /// Field at the root of an attribute/subscript chain
    fn field_root(&self, e: &Expr, from: VersionId, scope: &Scope) -> Option<String> {
        if let Some(f) = self.field_of(e, from, scope) {
            return Some(f);
        }
        match e {
            Expr::Subscript { value, .. } | Expr::Attribute { value, .. } => self.field_root(value, from, scope),
            _ => None,
        }
    }

    /// Field written, wholly or in part, by an assignment target
    fn touched_field(&self, target: &Expr, from: VersionId, scope: &Scope) -> Option<String> {
        match target {
            Expr::Tuple(items) | Expr::List(items) => items.iter().find_map(|i| self.touched_field(i, from, scope)),
            Expr::Starred(inner) => self.touched_field(inner, from, scope),
            _ => self.field_root(target, from, scope),
        }
    }

    fn unsupported(&self, target: &Expr, from: VersionId, scope: &Scope, construct: &'static str) -> Result<()> {
        match self.touched_field(target, from, scope) {
            Some(field) => Err(RewriteError::UnsupportedConstruct { field, construct }),
            None => Ok(()),
        }
    }

    fn enter(&mut self, from: VersionId, field: &str) -> Result<()> {
        let key = (from, field.to_string());
        if self.active.contains(&key) {
            return Err(RewriteError::LensCycle {
                field: field.to_string(),
                version: self.version(from).to_string(),
            });
        }
        if self.active.len() >= self.config.max_lens_hops {
            return Err(RewriteError::LensHopLimit {
                field: field.to_string(),
                limit: self.config.max_lens_hops,
            });
        }
        self.active.push(key);
        Ok(())
    }

    fn missing(&self, from: VersionId, field: &str) -> RewriteError {
        RewriteError::MissingFieldLens {
            field: field.to_string(),
            from: self.version(from).to_string(),
            to: self.version(self.target).to_string(),
        }
    }

    fn emit(&mut self, name: &str, mut def: FunctionDef) {
        if !self.emitted.contains_key(name) {
            def.name = name.to_string();
            self.emitted.insert(name.to_string(), def);
        }
    }

    fn lens_name(&self, lens: &Lens) -> String {
        lens.emitted_name(self.class.graph(), &self.config.lens_prefix)
    }

    /// Target-space expression for field `f` of `from`
    fn read_field(&mut self, from: VersionId, f: &str, scope: &mut Scope) -> Result<Expr> {
        if from == self.target {
            return Ok(scope.field(f));
        }
        if let Some(lens) = self.lenses.get(from, f, self.target) {
            let (name, def) = (self.lens_name(lens), lens.def.clone());
            self.emit(&name, def);
            return Ok(scope.call(&name, Vec::new()));
        }
        if let Some((hop, lens)) = self.lenses.closest(from, f, self.target) {
            let (name, def) = (self.lens_name(lens), lens.def.clone());
            if !self.emitted.contains_key(&name) {
                tracing::debug!(
                    field = f,
                    from = self.version(from),
                    via = self.version(hop),
                    "composing lenses"
                );
                self.enter(from, f)?;
                let body = self.rewrite_function(&def, hop);
                self.active.pop();
                self.emit(&name, body?);
            }
            return Ok(scope.call(&name, Vec::new()));
        }
        if self.config.implicit_identity_lenses && self.is_field(self.target, f) {
            return Ok(scope.field(f));
        }
        Err(self.missing(from, f))
    }

    /// Emit statements storing `value` into field `f` of `from`
    fn write_field(&mut self, from: VersionId, f: &str, value: Expr, scope: &mut Scope, out: &mut Vec<Stmt>) -> Result<()> {
        if from == self.target {
            out.push(assign(scope.field(f), value));
            return Ok(());
        }
        let step = if self.lenses.get(from, f, self.target).is_some() {
            self.target
        } else if let Some((hop, _)) = self.lenses.closest(from, f, self.target) {
            hop
        } else if self.config.implicit_identity_lenses && self.is_field(self.target, f) {
            out.push(assign(scope.field(f), value));
            return Ok(());
        } else {
            return Err(self.missing(from, f));
        };

        self.enter(from, f)?;
        let result = self.write_through(from, f, step, value, scope, out);
        self.active.pop();
        result
    }

    fn write_through(
        &mut self,
        from: VersionId,
        f: &str,
        step: VersionId,
        value: Expr,
        scope: &mut Scope,
        out: &mut Vec<Stmt>,
    ) -> Result<()> {
        let fields = self.fields;
        let from_fields = fields.fields(from);

        let mut dependents = Vec::new();
        for g in fields.fields(step) {
            if let Some(get) = self.lenses.get(step, g, from) {
                let reads = fields_read(from_fields, &get.def);
                if reads.iter().any(|r| r == f) {
                    dependents.push((g.clone(), get.clone(), reads));
                }
            }
        }

        if dependents.is_empty() {
            return Err(RewriteError::MissingFieldLens {
                field: f.to_string(),
                from: self.version(from).to_string(),
                to: self.version(step).to_string(),
            });
        }

        let value = if dependents.len() > 1 && !is_pure(&value) {
            self.hoist(value, scope, out)
        } else {
            value
        };

        for (g, get, reads) in dependents {
            let put = match self.lenses.put(step, &g, from) {
                Some(put) => put.clone(),
                None => {
                    let put = synthesize_put(from_fields, &get);
                    self.lenses.insert_put(step, &g, from, put.clone());
                    put
                }
            };
            let name = self.lens_name(&put);
            if !self.emitted.contains_key(&name) {
                let body = self.rewrite_function(&put.def, from)?;
                self.emit(&name, body);
            }

            let mut args = Vec::with_capacity(reads.len());
            for h in &reads {
                let arg = if h == f {
                    value.clone()
                } else {
                    self.read_field(from, h, scope)?
                };
                args.push(Arg::Keyword(h.clone(), arg));
            }
            let call = scope.call(&name, args);

            if step == self.target {
                out.push(assign(scope.field(&g), call));
            } else {
                self.write_field(step, &g, call, scope, out)?;
            }
        }
        Ok(())
    }

    fn hoist(&self, value: Expr, scope: &mut Scope, out: &mut Vec<Stmt>) -> Expr {
        let tmp = scope.fresh();
        out.push(assign(Expr::name(&tmp), value));
        Expr::name(tmp)
    }

    fn block(&mut self, body: &[Stmt], from: VersionId, scope: &mut Scope) -> Result<Vec<Stmt>> {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            self.stmt(stmt, from, scope, &mut out)?;
        }
        Ok(out)
    }

    fn exprs<'e>(&mut self, exprs: impl IntoIterator<Item = &'e mut Expr>, from: VersionId, scope: &mut Scope) -> Result<()> {
        for e in exprs {
            self.expr(e, from, scope)?;
        }
        Ok(())
    }

    /// Rewrite field reads inside an expression
    fn expr(&mut self, e: &mut Expr, from: VersionId, scope: &mut Scope) -> Result<()> {
        if let Some(f) = self.field_of(e, from, scope) {
            *e = self.read_field(from, &f, scope)?;
            return Ok(());
        }
        if let Expr::Comprehension { generators, .. } = e {
            for g in generators.iter() {
                self.unsupported(&g.target, from, scope, "comprehension")?;
            }
        }
        for child in children_mut(e) {
            self.expr(child, from, scope)?;
        }
        Ok(())
    }

    /// Rewrite reads inside an assignment target that writes no field
    fn target_reads(&mut self, t: &mut Expr, from: VersionId, scope: &mut Scope) -> Result<()> {
        match t {
            Expr::Name(_) => Ok(()),
            Expr::Tuple(items) | Expr::List(items) => self.targets_reads(items, from, scope),
            Expr::Starred(inner) => self.target_reads(inner, from, scope),
            Expr::Attribute { value, .. } => self.expr(value, from, scope),
            Expr::Subscript { value, index } => {
                self.expr(value, from, scope)?;
                self.expr(index, from, scope)
            }
            other => self.expr(other, from, scope),
        }
    }

    fn targets_reads(&mut self, targets: &mut [Expr], from: VersionId, scope: &mut Scope) -> Result<()> {
        for t in targets {
            self.target_reads(t, from, scope)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt, from: VersionId, scope: &mut Scope, out: &mut Vec<Stmt>) -> Result<()> {
        match stmt {
            Stmt::Assign { targets, value } => return self.assign(targets, value, from, scope, out),
            Stmt::AugAssign { target, op, value } => {
                if self.touched_field(target, from, scope).is_some() {
                    let value = Expr::binop(target.clone(), *op, value.clone());
                    return self.assign(std::slice::from_ref(target), &value, from, scope, out);
                }
                let (mut target, mut value) = (target.clone(), value.clone());
                self.target_reads(&mut target, from, scope)?;
                self.expr(&mut value, from, scope)?;
                out.push(Stmt::AugAssign { target, op: *op, value });
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                if self.touched_field(target, from, scope).is_some() {
                    return match value {
                        Some(value) => self.assign(std::slice::from_ref(target), value, from, scope, out),
                        None => Ok(()),
                    };
                }
                let (mut target, mut value) = (target.clone(), value.clone());
                self.target_reads(&mut target, from, scope)?;
                self.exprs(value.as_mut(), from, scope)?;
                out.push(Stmt::AnnAssign {
                    target,
                    annotation: annotation.clone(),
                    value,
                });
            }
            Stmt::Delete(targets) => return self.delete(targets, from, scope, out),
            Stmt::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            } => {
                self.unsupported(target, from, scope, "for-loop")?;
                let (mut target, mut iter) = (target.clone(), iter.clone());
                self.target_reads(&mut target, from, scope)?;
                self.expr(&mut iter, from, scope)?;
                out.push(Stmt::For {
                    target,
                    iter,
                    body: self.block(body, from, scope)?,
                    orelse: self.block(orelse, from, scope)?,
                    is_async: *is_async,
                });
            }
            Stmt::With { items, body, is_async } => {
                let mut items = items.clone();
                for item in &mut items {
                    if let Some(alias) = &mut item.alias {
                        self.unsupported(alias, from, scope, "with-statement")?;
                        self.target_reads(alias, from, scope)?;
                    }
                    self.expr(&mut item.context, from, scope)?;
                }
                out.push(Stmt::With {
                    items,
                    body: self.block(body, from, scope)?,
                    is_async: *is_async,
                });
            }
            Stmt::If { test, body, orelse } | Stmt::While { test, body, orelse } => {
                let mut test = test.clone();
                self.expr(&mut test, from, scope)?;
                let body = self.block(body, from, scope)?;
                let orelse = self.block(orelse, from, scope)?;
                out.push(if matches!(stmt, Stmt::If { .. }) {
                    Stmt::If { test, body, orelse }
                } else {
                    Stmt::While { test, body, orelse }
                });
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                let mut rewritten = Vec::with_capacity(handlers.len());
                let body = self.block(body, from, scope)?;
                for h in handlers {
                    let mut h = h.clone();
                    self.exprs(h.kind.as_mut(), from, scope)?;
                    h.body = self.block(&h.body, from, scope)?;
                    rewritten.push(h);
                }
                out.push(Stmt::Try {
                    body,
                    handlers: rewritten,
                    orelse: self.block(orelse, from, scope)?,
                    finalbody: self.block(finalbody, from, scope)?,
                });
            }
            Stmt::FunctionDef(f) => {
                let mut f = f.clone();
                f.body = self.block(&f.body, from, scope)?;
                out.push(Stmt::FunctionDef(f));
            }
            Stmt::Expr(_) | Stmt::Return(_) | Stmt::Raise { .. } | Stmt::Assert { .. } => {
                let mut stmt = stmt.clone();
                match &mut stmt {
                    Stmt::Expr(e) => self.expr(e, from, scope)?,
                    Stmt::Return(e) => self.exprs(e.as_mut(), from, scope)?,
                    Stmt::Raise { exc, cause } => self.exprs(exc.as_mut().into_iter().chain(cause.as_mut()), from, scope)?,
                    Stmt::Assert { test, msg } => self.exprs(std::iter::once(test).chain(msg.as_mut()), from, scope)?,
                    _ => {}
                }
                out.push(stmt);
            }
            Stmt::Pass
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Global(_)
            | Stmt::Nonlocal(_)
            | Stmt::Import(_)
            | Stmt::ClassDef(_) => out.push(stmt.clone()),
        }
        Ok(())
    }

    fn assign(&mut self, targets: &[Expr], value: &Expr, from: VersionId, scope: &mut Scope, out: &mut Vec<Stmt>) -> Result<()> {
        let mut value = value.clone();
        self.expr(&mut value, from, scope)?;

        if !targets.iter().any(|t| self.touched_field(t, from, scope).is_some()) {
            let mut targets = targets.to_vec();
            self.targets_reads(&mut targets, from, scope)?;
            out.push(Stmt::Assign { targets, value });
            return Ok(());
        }

        if let [t] = targets {
            if let Some(f) = self.field_of(t, from, scope) {
                return self.write_field(from, &f, value, scope, out);
            }
        }

        // A bare name survives only if no target of this statement can rebind it first
        let single_plain = matches!(targets, [t] if !matches!(t, Expr::Tuple(_) | Expr::List(_)));
        let keep = matches!(value, Expr::Constant(_)) || (single_plain && matches!(value, Expr::Name(_)));
        let src = if keep { value } else { self.hoist(value, scope, out) };
        for t in targets {
            self.assign_to(t, src.clone(), from, scope, out)?;
        }
        Ok(())
    }

    fn assign_to(&mut self, t: &Expr, src: Expr, from: VersionId, scope: &mut Scope, out: &mut Vec<Stmt>) -> Result<()> {
        if let Some(f) = self.field_of(t, from, scope) {
            return self.write_field(from, &f, src, scope, out);
        }
        match t {
            Expr::Tuple(items) | Expr::List(items) => self.unpack(items, src, from, scope, out),
            Expr::Subscript { .. } | Expr::Attribute { .. } => match self.field_root(t, from, scope) {
                Some(f) => self.through_temporary(t, &f, from, scope, out, |inner| assign(inner, src)),
                None => {
                    let mut t = t.clone();
                    self.target_reads(&mut t, from, scope)?;
                    out.push(assign(t, src));
                    Ok(())
                }
            },
            _ => {
                let mut t = t.clone();
                self.target_reads(&mut t, from, scope)?;
                out.push(assign(t, src));
                Ok(())
            }
        }
    }

    /// Element-wise assignment of `src` to a tuple or list target
    fn unpack(&mut self, items: &[Expr], src: Expr, from: VersionId, scope: &mut Scope, out: &mut Vec<Stmt>) -> Result<()> {
        let src = if is_pure(&src) { src } else { self.hoist(src, scope, out) };
        let n = items.len();
        let star = items.iter().position(|i| matches!(i, Expr::Starred(_)));
        for (i, item) in items.iter().enumerate() {
            match item {
                Expr::Starred(inner) => {
                    let after = n - i - 1;
                    let upper = (after > 0).then(|| {
                        let len = Expr::call(Expr::name("len"), vec![Arg::Positional(src.clone())]);
                        Box::new(Expr::binop(len, BinOp::Sub, Expr::int(after as i64)))
                    });
                    let slice = Expr::Slice {
                        lower: Some(Box::new(Expr::int(i as i64))),
                        upper,
                        step: None,
                    };
                    let rest = Expr::call(
                        Expr::name("list"),
                        vec![Arg::Positional(Expr::subscript(src.clone(), slice))],
                    );
                    self.assign_to(inner, rest, from, scope, out)?;
                }
                _ => {
                    let index = match star {
                        Some(s) if i > s => negative(n - i),
                        _ => Expr::int(i as i64),
                    };
                    self.assign_to(item, Expr::subscript(src.clone(), index), from, scope, out)?;
                }
            }
        }
        Ok(())
    }

    /// Load field `f` into a temporary, apply `make` to the target with its
    /// root replaced by the temporary, then write the temporary back
    fn through_temporary(
        &mut self,
        target: &Expr,
        f: &str,
        from: VersionId,
        scope: &mut Scope,
        out: &mut Vec<Stmt>,
        make: impl FnOnce(Expr) -> Stmt,
    ) -> Result<()> {
        let tmp = scope.fresh();
        let current = self.read_field(from, f, scope)?;
        out.push(assign(Expr::name(&tmp), current));

        let mut inner = target.clone();
        replace_root(&mut inner, &scope.owner, f, &tmp);
        self.target_reads(&mut inner, from, scope)?;
        out.push(make(inner));

        self.write_field(from, f, Expr::name(tmp), scope, out)
    }

    fn delete(&mut self, targets: &[Expr], from: VersionId, scope: &mut Scope, out: &mut Vec<Stmt>) -> Result<()> {
        if !targets.iter().any(|t| self.touched_field(t, from, scope).is_some()) {
            let mut targets = targets.to_vec();
            self.targets_reads(&mut targets, from, scope)?;
            out.push(Stmt::Delete(targets));
            return Ok(());
        }
        for t in targets {
            if let Some(field) = self.field_of(t, from, scope) {
                return Err(RewriteError::UnsupportedConstruct { field, construct: "del" });
            }
            match t {
                Expr::Tuple(items) | Expr::List(items) => self.delete(items, from, scope, out)?,
                _ => match self.field_root(t, from, scope) {
                    Some(f) => self.through_temporary(t, &f, from, scope, out, |inner| Stmt::Delete(vec![inner]))?,
                    None => {
                        let mut t = t.clone();
                        self.target_reads(&mut t, from, scope)?;
                        out.push(Stmt::Delete(vec![t]));
                    }
                },
            }
        }
        Ok(())
    }
}

/// Replace the `owner.field` at the root of a projection chain by `tmp`
fn replace_root(e: &mut Expr, owner: &str, field: &str, tmp: &str) {
    if let Expr::Subscript { value, .. } | Expr::Attribute { value, .. } = e {
        if value.as_attr_of(owner) == Some(field) {
            **value = Expr::name(tmp);
        } else {
            replace_root(value, owner, field, tmp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vlens_syntax::{parse_module, print_body, print_function};

    const POINT: &str = r#"
@version("1")
@version("2", replaces=["1"])
class Point:
    @at("1")
    def __init__(self, x):
        self.x = x

    @at("2")
    def __init__(self, y):
        self.y = y

    @at("1")
    def method(self):
        pass

    @get("1", "2", "y")
    def y_of(self):
        return str(self.x)

    @get("2", "1", "x")
    def x_of(self):
        return int(self.y)
"#;

    struct Fixture {
        class: ClassModel,
        fields: FieldMap,
        config: SliceConfig,
    }

    impl Fixture {
        fn new(src: &str) -> Self {
            Self::with_config(src, SliceConfig::default())
        }

        fn with_config(src: &str, config: SliceConfig) -> Self {
            let module = parse_module(src).unwrap();
            let class = ClassModel::from_class(module.classes().next().unwrap())
                .unwrap()
                .unwrap();
            let fields = FieldMap::new(&class);
            Self { class, fields, config }
        }

        fn rewriter(&self, to: &str) -> Rewriter<'_> {
            let lenses = LensTable::new(&self.class, &self.fields);
            let v = self.class.graph().id(to).unwrap();
            Rewriter::new(&self.class, &self.fields, lenses, &self.config, v)
        }

        /// Rewrite `body` as a method declared at `from`, returning the body
        /// and the emitted lens methods
        fn rewrite(&self, body: &str, from: &str, to: &str) -> Result<(String, Vec<String>)> {
            let module = parse_module(body).unwrap();
            let mut def = FunctionDef::method("m", "self");
            def.params.push(vlens_syntax::Param::regular("e"));
            def.body = module.body;
            let mut rw = self.rewriter(to);
            let out = rw.rewrite_function(&def, self.class.graph().id(from).unwrap())?;
            let lenses = rw.into_emitted().iter().map(print_function).collect();
            Ok((print_body(&out.body), lenses))
        }
    }

    #[test]
    fn reads_become_lens_calls() {
        let fx = Fixture::new(POINT);
        let (body, lenses) = fx.rewrite("return self.x + self.x\n", "1", "2").unwrap();
        assert_eq!(body, "return self._lens_get_x_2_1() + self._lens_get_x_2_1()\n");
        assert_eq!(lenses, vec!["def _lens_get_x_2_1(self):\n    return int(self.y)\n"]);
    }

    #[test]
    fn same_base_is_unchanged() {
        let fx = Fixture::new(POINT);
        let (body, lenses) = fx.rewrite("self.x = e\nreturn self.x\n", "1", "1").unwrap();
        assert_eq!(body, "self.x = e\nreturn self.x\n");
        assert!(lenses.is_empty());
    }

    #[test]
    fn writes_go_through_synthesized_put() {
        let fx = Fixture::new(POINT);
        let (body, lenses) = fx.rewrite("self.x = e\n", "1", "2").unwrap();
        assert_eq!(body, "self.y = self._lens_put_y_1_2(x=e)\n");
        assert_eq!(lenses, vec!["def _lens_put_y_1_2(self, x):\n    return str(x)\n"]);
    }

    #[test]
    fn compound_assignment_is_desugared() {
        let fx = Fixture::new(POINT);
        let (body, _) = fx.rewrite("self.x += 1\n", "1", "2").unwrap();
        assert_eq!(body, "self.y = self._lens_put_y_1_2(x=self._lens_get_x_2_1() + 1)\n");
    }

    #[test]
    fn destructuring_hoists_then_assigns_in_order() {
        let fx = Fixture::new(POINT);
        let (body, _) = fx.rewrite("self.x, b = f(e)\n", "1", "2").unwrap();
        assert_eq!(
            body,
            "_vl_tmp0 = f(e)\nself.y = self._lens_put_y_1_2(x=_vl_tmp0[0])\nb = _vl_tmp0[1]\n"
        );
    }

    #[test]
    fn starred_destructuring_uses_slices() {
        let fx = Fixture::new(POINT);
        let (body, _) = fx.rewrite("a, *rest, self.x = e\n", "1", "2").unwrap();
        assert_eq!(
            body,
            "_vl_tmp0 = e\na = _vl_tmp0[0]\nrest = list(_vl_tmp0[1:len(_vl_tmp0) - 1])\nself.y = self._lens_put_y_1_2(x=_vl_tmp0[-1])\n"
        );
    }

    #[test]
    fn projected_write_round_trips_through_temporary() {
        let fx = Fixture::new(POINT);
        let (body, _) = fx.rewrite("self.x[0] = e\n", "1", "2").unwrap();
        assert_eq!(
            body,
            "_vl_tmp0 = self._lens_get_x_2_1()\n_vl_tmp0[0] = e\nself.y = self._lens_put_y_1_2(x=_vl_tmp0)\n"
        );
    }

    #[test]
    fn temporaries_avoid_existing_names() {
        let fx = Fixture::new(POINT);
        let (body, _) = fx.rewrite("_vl_tmp0 = 1\nself.x, b = f(_vl_tmp0)\n", "1", "2").unwrap();
        assert!(body.starts_with("_vl_tmp0 = 1\n_vl_tmp1 = f(_vl_tmp0)\n"), "{body}");
    }

    #[test]
    fn annotated_field_write_drops_annotation() {
        let fx = Fixture::new(POINT);
        let (body, _) = fx.rewrite("self.x: int = e\nself.x: int\n", "1", "2").unwrap();
        assert_eq!(body, "self.y = self._lens_put_y_1_2(x=e)\n");
    }

    #[test]
    fn unsupported_positions_fail() {
        let fx = Fixture::new(POINT);
        for (src, construct) in [
            ("del self.x\n", "del"),
            ("for self.x in e:\n    pass\n", "for-loop"),
            ("with e as self.x:\n    pass\n", "with-statement"),
            ("return [1 for self.x in e]\n", "comprehension"),
        ] {
            let err = fx.rewrite(src, "1", "2").unwrap_err();
            assert_eq!(
                err,
                RewriteError::UnsupportedConstruct {
                    field: "x".into(),
                    construct
                },
                "{src}"
            );
        }
    }

    #[test]
    fn projected_delete_writes_back() {
        let fx = Fixture::new(POINT);
        let (body, _) = fx.rewrite("del self.x[0]\n", "1", "2").unwrap();
        assert_eq!(
            body,
            "_vl_tmp0 = self._lens_get_x_2_1()\ndel _vl_tmp0[0]\nself.y = self._lens_put_y_1_2(x=_vl_tmp0)\n"
        );
    }

    #[test]
    fn missing_lens_is_reported() {
        let fx = Fixture::new(
            "@version(\"1\")\n@version(\"2\")\nclass C:\n    @at(\"1\")\n    def __init__(self):\n        self.a = 0\n\n    @at(\"2\")\n    def __init__(self):\n        self.b = 0\n",
        );
        let err = fx.rewrite("return self.a\n", "1", "2").unwrap_err();
        assert_eq!(
            err,
            RewriteError::MissingFieldLens {
                field: "a".into(),
                from: "1".into(),
                to: "2".into()
            }
        );
    }

    #[test]
    fn write_reaching_no_target_field_fails() {
        let src = POINT.replace(
            "    @get(\"1\", \"2\", \"y\")\n    def y_of(self):\n        return str(self.x)\n\n",
            "",
        );
        assert_ne!(src, POINT);
        let fx = Fixture::new(&src);
        let err = fx.rewrite("self.x = e\n", "1", "2").unwrap_err();
        assert_eq!(
            err,
            RewriteError::MissingFieldLens {
                field: "x".into(),
                from: "1".into(),
                to: "2".into()
            }
        );
    }

    #[test]
    fn impure_value_is_hoisted_for_several_dependents() {
        let src = r#"
@version("1")
@version("2", replaces=["1"])
class Pair:
    @at("1")
    def __init__(self):
        self.n = 0

    @at("2")
    def __init__(self):
        self.a = 0
        self.b = None

    @get("1", "2", "a")
    def a_of(self):
        return self.n * 2

    @get("1", "2", "b")
    def b_of(self):
        return str(self.n)

    @get("2", "1", "n")
    def n_of(self):
        return self.a // 2
"#;
        let fx = Fixture::new(src);
        let (body, lenses) = fx.rewrite("self.n = compute(e)\n", "1", "2").unwrap();
        assert_eq!(
            body,
            "_vl_tmp0 = compute(e)\nself.a = self._lens_put_a_1_2(n=_vl_tmp0)\nself.b = self._lens_put_b_1_2(n=_vl_tmp0)\n"
        );
        assert_eq!(
            lenses,
            vec![
                "def _lens_put_a_1_2(self, n):\n    return n * 2\n",
                "def _lens_put_b_1_2(self, n):\n    return str(n)\n",
            ]
        );

        let (body, _) = fx.rewrite("self.n = e\n", "1", "2").unwrap();
        assert_eq!(
            body,
            "self.a = self._lens_put_a_1_2(n=e)\nself.b = self._lens_put_b_1_2(n=e)\n"
        );
    }

    #[test]
    fn implicit_identity_lens_when_enabled() {
        let src = "@version(\"1\")\n@version(\"2\")\nclass C:\n    @at(\"1\")\n    def __init__(self):\n        self.a = 0\n\n    @at(\"2\")\n    def __init__(self):\n        self.a = 1\n";
        let fx = Fixture::with_config(src, SliceConfig::new().with_implicit_identity_lenses(true));
        let (body, lenses) = fx.rewrite("self.a = self.a + 1\n", "1", "2").unwrap();
        assert_eq!(body, "self.a = self.a + 1\n");
        assert!(lenses.is_empty());
    }

    #[test]
    fn is_pure_cases() {
        assert!(is_pure(&Expr::name("a")));
        assert!(is_pure(&Expr::subscript(Expr::name("t"), negative(1))));
        assert!(!is_pure(&Expr::subscript(Expr::name("t"), Expr::name("i"))));
        assert!(!is_pure(&Expr::call(Expr::name("f"), Vec::new())));
    }
}
