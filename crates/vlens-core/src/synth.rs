//! Put-lens synthesis
//!
//! A get lens `def g(self): return int(self.y)` yields the put lens
//! `def g(self, y): return int(y)`: every field the get lens reads becomes
//! a parameter, so a caller can pass the new value of the written field and
//! the current values of the others.

use crate::lens::Lens;
use crate::model::Direction;
use indexmap::IndexSet;
use vlens_syntax::ast::{Expr, FunctionDef, Param, ParamKind};
use vlens_syntax::visit::{walk_body, walk_body_mut, walk_expr, walk_expr_mut, Visitor, VisitorMut};

/// Fields of `fields` read as `self.<field>` in `def`, in first-read order
#[must_use]
pub fn fields_read(fields: &IndexSet<String>, def: &FunctionDef) -> Vec<String> {
    struct Reads<'a> {
        owner: &'a str,
        fields: &'a IndexSet<String>,
        found: IndexSet<String>,
    }

    impl Visitor for Reads<'_> {
        fn visit_expr(&mut self, expr: &Expr) {
            match expr.as_attr_of(self.owner) {
                Some(f) if self.fields.contains(f) => {
                    self.found.insert(f.to_string());
                }
                _ => walk_expr(self, expr),
            }
        }
    }

    let Some(owner) = def.self_name() else {
        return Vec::new();
    };
    let mut reads = Reads {
        owner,
        fields,
        found: IndexSet::new(),
    };
    walk_body(&mut reads, &def.body);
    reads.found.into_iter().collect()
}

/// Derive a put lens from a get lens over the same endpoints and subject
///
/// Nested lens calls in the body are left as they are.
#[must_use]
pub fn synthesize_put(fields: &IndexSet<String>, get: &Lens) -> Lens {
    struct ToParams<'a> {
        owner: &'a str,
        reads: &'a [String],
    }

    impl VisitorMut for ToParams<'_> {
        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            let param = expr
                .as_attr_of(self.owner)
                .filter(|f| self.reads.iter().any(|r| r.as_str() == *f))
                .map(str::to_string);
            match param {
                Some(f) => *expr = Expr::name(f),
                None => walk_expr_mut(self, expr),
            }
        }
    }

    let reads = fields_read(fields, &get.def);
    let mut def = get.def.clone();
    def.name = format!("{}_put", get.def.name);
    def.decorators.clear();

    let at = def
        .params
        .iter()
        .position(|p| p.kind == ParamKind::KwArgs)
        .unwrap_or(def.params.len());
    let fresh: Vec<Param> = reads
        .iter()
        .filter(|r| def.params.iter().all(|p| &p.name != *r))
        .map(Param::regular)
        .collect();
    def.params.splice(at..at, fresh);

    if let Some(owner) = get.def.self_name() {
        let mut v = ToParams {
            owner,
            reads: &reads,
        };
        walk_body_mut(&mut v, &mut def.body);
    }

    Lens {
        direction: Direction::Put,
        def,
        synthesized: true,
        ..get.clone()
    }
}
