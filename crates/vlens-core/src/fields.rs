//! Base versions and their instance fields
//!
//! A version owns its state shape only if one of its own members writes an
//! instance field; otherwise it inherits the shape of the first `upgrades`
//! ancestor that owns one. `replaces` edges never carry state shape.

use crate::model::ClassModel;
use indexmap::IndexSet;
use std::collections::HashMap;
use vlens_graph::{VersionGraph, VersionId};
use vlens_syntax::ast::{Expr, FunctionDef, Stmt};

/// Version whose members own the state shape of `version`
#[must_use]
pub fn base(graph: &VersionGraph, class: &ClassModel, version: VersionId) -> Option<VersionId> {
    if !graph.contains(version) {
        return None;
    }
    if class.decls_at(version).any(|d| !assigned_fields(&d.def).is_empty()) {
        return Some(version);
    }
    graph
        .upgrades(version)
        .find_map(|parent| base(graph, class, parent))
}

/// Instance fields assigned at `base(version)`, methods excluded
#[must_use]
pub fn fields_at(graph: &VersionGraph, class: &ClassModel, version: VersionId) -> IndexSet<String> {
    let Some(owner) = base(graph, class, version) else {
        return IndexSet::new();
    };
    let mut fields = IndexSet::new();
    for decl in class.decls_at(owner) {
        for f in assigned_fields(&decl.def) {
            if !class.is_method(&f) {
                fields.insert(f);
            }
        }
    }
    fields
}

/// Fields written as `self.f` targets (plain, annotated, augmented or
/// destructured) anywhere in the function, nested definitions excluded
#[must_use]
pub fn assigned_fields(def: &FunctionDef) -> Vec<String> {
    let Some(self_name) = def.self_name() else {
        return Vec::new();
    };
    let mut out = IndexSet::new();
    collect_block(&def.body, self_name, &mut out);
    out.into_iter().collect()
}

fn collect_block(body: &[Stmt], owner: &str, out: &mut IndexSet<String>) {
    for stmt in body {
        match stmt {
            Stmt::Assign { targets, .. } => {
                for t in targets {
                    collect_target(t, owner, out);
                }
            }
            Stmt::AugAssign { target, .. } | Stmt::AnnAssign { target, .. } => {
                collect_target(target, owner, out);
            }
            Stmt::If { body, orelse, .. }
            | Stmt::While { body, orelse, .. }
            | Stmt::For { body, orelse, .. } => {
                collect_block(body, owner, out);
                collect_block(orelse, owner, out);
            }
            Stmt::With { body, .. } => collect_block(body, owner, out),
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                collect_block(body, owner, out);
                for h in handlers {
                    collect_block(&h.body, owner, out);
                }
                collect_block(orelse, owner, out);
                collect_block(finalbody, owner, out);
            }
            _ => {}
        }
    }
}

fn collect_target(target: &Expr, owner: &str, out: &mut IndexSet<String>) {
    match target {
        Expr::Tuple(items) | Expr::List(items) => {
            for item in items {
                collect_target(item, owner, out);
            }
        }
        Expr::Starred(inner) => collect_target(inner, owner, out),
        _ => {
            if let Some(f) = target.as_attr_of(owner) {
                out.insert(f.to_string());
            }
        }
    }
}

/// `base` and `fields_at` for every version of a class, computed once
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    bases: HashMap<VersionId, Option<VersionId>>,
    fields: HashMap<VersionId, IndexSet<String>>,
}

impl FieldMap {
    /// Compute the map over the class's own graph
    #[must_use]
    pub fn new(class: &ClassModel) -> Self {
        let graph = class.graph();
        let mut map = Self::default();
        for v in graph.versions() {
            map.bases.insert(v, base(graph, class, v));
            map.fields.insert(v, fields_at(graph, class, v));
        }
        map
    }

    /// Cached [`base`]
    #[inline]
    #[must_use]
    pub fn base(&self, version: VersionId) -> Option<VersionId> {
        self.bases.get(&version).copied().flatten()
    }

    /// Base of `version`, or the version itself when it owns no state
    #[inline]
    #[must_use]
    pub fn base_or_self(&self, version: VersionId) -> VersionId {
        self.base(version).unwrap_or(version)
    }

    /// Cached [`fields_at`]
    #[must_use]
    pub fn fields(&self, version: VersionId) -> &IndexSet<String> {
        static EMPTY: std::sync::OnceLock<IndexSet<String>> = std::sync::OnceLock::new();
        self.fields
            .get(&version)
            .unwrap_or_else(|| EMPTY.get_or_init(IndexSet::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlens_syntax::parse_module;

    fn class(src: &str) -> ClassModel {
        let module = parse_module(src).unwrap();
        let class = ClassModel::from_class(module.classes().next().unwrap())
            .unwrap()
            .unwrap();
        class
    }

    const LAYERED: &str = r#"
@version("1")
@version("2", upgrades=["1"])
@version("3", replaces=["2"])
@version("4", upgrades=["3"], replaces=["1"])
class Shape:
    @at("1")
    def __init__(self, w, h):
        self.w = w
        self.h, self.area = h, w * h

    @at("1")
    def area(self):
        return self.w * self.h

    @at("2")
    def grow(self):
        self.w += 1

    @at("3")
    def __init__(self, side):
        self.side: int = side
"#;

    #[test]
    fn base_walks_upgrades_only() {
        let c = class(LAYERED);
        let g = c.graph();
        let id = |n| g.id(n).unwrap();
        assert_eq!(base(g, &c, id("1")), Some(id("1")));
        // grow writes self.w, so 2 owns its shape
        assert_eq!(base(g, &c, id("2")), Some(id("2")));
        assert_eq!(base(g, &c, id("3")), Some(id("3")));
        // 4 upgrades 3; its replaces edge to 1 is ignored
        assert_eq!(base(g, &c, id("4")), Some(id("3")));
    }

    #[test]
    fn fields_exclude_methods_and_keep_order() {
        let c = class(LAYERED);
        let g = c.graph();
        let v1 = g.id("1").unwrap();
        let fields: Vec<_> = fields_at(g, &c, v1).into_iter().collect();
        assert_eq!(fields, vec!["w", "h"]);
        let v4 = g.id("4").unwrap();
        assert_eq!(fields_at(g, &c, v4).into_iter().collect::<Vec<_>>(), vec!["side"]);
    }

    #[test]
    fn version_without_state_has_no_base() {
        let c = class("@version(\"1\")\nclass C:\n    @at(\"1\")\n    def f(self):\n        return 1\n");
        let v1 = c.graph().id("1").unwrap();
        assert_eq!(base(c.graph(), &c, v1), None);
        assert!(fields_at(c.graph(), &c, v1).is_empty());
        let map = FieldMap::new(&c);
        assert_eq!(map.base_or_self(v1), v1);
        assert!(map.fields(v1).is_empty());
    }

    #[test]
    fn projected_writes_do_not_define_fields() {
        let module = parse_module("def f(self):\n    self.items[0] = 1\n    self.a.b = 2\n    self.n = 0\n").unwrap();
        let Stmt::FunctionDef(f) = &module.body[0] else {
            panic!("expected function");
        };
        assert_eq!(assigned_fields(f), vec!["n"]);
    }
}
