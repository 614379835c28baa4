//! Which declaration backs a member at a version
//!
//! Three tiers, each recursing on the graph with the current version
//! deleted so every call terminates:
//!
//! 1. replacements: versions that replace this one, unless the member is
//!    the initializer;
//! 2. a local declaration;
//! 3. inheritance over `upgrades` then `replaces`.

use crate::model::{ClassModel, DeclId, INITIALIZER};
use indexmap::IndexSet;
use vlens_graph::{VersionGraph, VersionId};

/// Outcome of [`resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one declaration backs the member
    Resolved(DeclId),
    /// Nothing backs the member at this version
    Unresolved,
    /// Distinct candidates of the first ambiguous tier
    Ambiguous(Vec<DeclId>),
}

impl Resolution {
    /// Declaration when resolved
    #[inline]
    #[must_use]
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            Resolution::Resolved(id) => Some(*id),
            _ => None,
        }
    }
}

/// Resolve `member` at `version` on `graph`
#[must_use]
pub fn resolve(graph: &VersionGraph, class: &ClassModel, member: &str, version: VersionId) -> Resolution {
    if !graph.contains(version) {
        return Resolution::Unresolved;
    }
    let sub = graph.delete(version);

    let replacements = if member == INITIALIZER {
        IndexSet::new()
    } else {
        candidates(&sub, class, member, graph.replaced_by(version))
    };
    if replacements.len() == 1 {
        return Resolution::Resolved(replacements[0]);
    }

    if let Some(local) = class.local(member, version) {
        return Resolution::Resolved(local);
    }

    let inherited = candidates(&sub, class, member, graph.parents(version));
    if inherited.len() == 1 {
        return Resolution::Resolved(inherited[0]);
    }

    let result = if replacements.len() > 1 {
        Resolution::Ambiguous(replacements.into_iter().collect())
    } else if inherited.len() > 1 {
        Resolution::Ambiguous(inherited.into_iter().collect())
    } else {
        Resolution::Unresolved
    };
    tracing::debug!(
        class = class.name(),
        member,
        version = graph.name(version),
        ?result,
        "resolution"
    );
    result
}

fn candidates(
    graph: &VersionGraph,
    class: &ClassModel,
    member: &str,
    versions: impl IntoIterator<Item = VersionId>,
) -> IndexSet<DeclId> {
    let mut found = IndexSet::new();
    for v in versions {
        match resolve(graph, class, member, v) {
            Resolution::Resolved(id) => {
                found.insert(id);
            }
            Resolution::Ambiguous(ids) => found.extend(ids),
            Resolution::Unresolved => {}
        }
    }
    found
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

    fn origin(c: &ClassModel, r: &Resolution) -> Option<String> {
        r.decl()
            .and_then(|id| c.decl(id).origin())
            .map(|v| c.version_name(v).to_string())
    }

    const TIERS: &str = r#"
@version("1")
@version("2", replaces=["1"])
@version("3", upgrades=["2"])
class Point:
    @at("1")
    def __init__(self, x):
        self.x = x

    @at("1")
    def show(self):
        return self.x

    @at("2")
    def show(self):
        return self.y

    @at("3")
    def extra(self):
        return 0
"#;

    #[test]
    fn replacement_wins_over_local() {
        let c = class(TIERS);
        let g = c.graph();
        let r = resolve(g, &c, "show", g.id("1").unwrap());
        assert_eq!(origin(&c, &r).as_deref(), Some("2"));
    }

    #[test]
    fn initializer_is_never_replaced() {
        let c = class(TIERS);
        let g = c.graph();
        let r = resolve(g, &c, "__init__", g.id("1").unwrap());
        assert_eq!(origin(&c, &r).as_deref(), Some("1"));
        // 2 inherits the initializer of 1 through its replaces edge
        let r = resolve(g, &c, "__init__", g.id("2").unwrap());
        assert_eq!(origin(&c, &r).as_deref(), Some("1"));
    }

    #[test]
    fn upgrades_inherit() {
        let c = class(TIERS);
        let g = c.graph();
        let r = resolve(g, &c, "show", g.id("3").unwrap());
        assert_eq!(origin(&c, &r).as_deref(), Some("2"));
        assert_eq!(resolve(g, &c, "extra", g.id("2").unwrap()), Resolution::Unresolved);
    }

    #[test]
    fn parallel_upgrades_are_ambiguous() {
        let c = class(
            r#"
@version("X")
@version("Y")
@version("Z", upgrades=["X", "Y"])
class C:
    @at("X")
    def m(self):
        return 1

    @at("Y")
    def m(self):
        return 2
"#,
        );
        let g = c.graph();
        let Resolution::Ambiguous(ids) = resolve(g, &c, "m", g.id("Z").unwrap()) else {
            panic!("expected ambiguity");
        };
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn local_overrides_ambiguous_replacements() {
        let c = class(
            r#"
@version("1")
@version("2", replaces=["1"])
@version("3", replaces=["1"])
class C:
    @at("1")
    def m(self):
        return 1

    @at("2")
    def m(self):
        return 2

    @at("3")
    def m(self):
        return 3
"#,
        );
        let g = c.graph();
        let r = resolve(g, &c, "m", g.id("1").unwrap());
        assert_eq!(origin(&c, &r).as_deref(), Some("1"));
    }

    #[test]
    fn ambiguous_replacements_without_local() {
        let c = class(
            r#"
@version("1")
@version("2", replaces=["1"])
@version("3", replaces=["1"])
class C:
    @at("2")
    def m(self):
        return 2

    @at("3")
    def m(self):
        return 3
"#,
        );
        let g = c.graph();
        assert!(matches!(
            resolve(g, &c, "m", g.id("1").unwrap()),
            Resolution::Ambiguous(ref ids) if ids.len() == 2
        ));
    }

    #[test]
    fn deleted_version_is_unresolved() {
        let c = class(TIERS);
        let g = c.graph();
        let v1 = g.id("1").unwrap();
        assert_eq!(resolve(&g.delete(v1), &c, "show", v1), Resolution::Unresolved);
    }
}
