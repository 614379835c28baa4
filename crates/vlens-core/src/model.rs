//! Class model: versioned declarations of one class
//!
//! A [`ClassModel`] owns the version graph derived from the class's own
//! tags, every tagged member and lens declaration, and the untagged
//! statements shared verbatim by every slice.

use indexmap::IndexSet;
use std::collections::HashMap;
use vlens_graph::{VersionGraph, VersionId};
use vlens_syntax::ast::{Arg, Expr, FunctionDef, Stmt};

/// Name of the state initializer
pub const INITIALIZER: &str = "__init__";

/// Index of a declaration inside its class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub(crate) u32);

impl DeclId {
    /// Position in [`ClassModel::decls`]
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lens direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Derive the `to` view from `from` state
    Get,
    /// Derive the updated `to` value from new `from` field values
    Put,
}

impl Direction {
    /// Lower-case name as used in tags
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Get => "get",
            Direction::Put => "put",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a declaration is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    /// Ordinary method authoritative at `origin`
    Method { origin: VersionId },
    /// `__init__` authoritative at `origin`
    Initializer { origin: VersionId },
    /// Conversion between two versions' views of `subject`
    Lens {
        direction: Direction,
        from: VersionId,
        to: VersionId,
        subject: String,
    },
}

/// One tagged function of a class
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub id: DeclId,
    /// Member name (the function name as written)
    pub name: String,
    pub kind: DeclKind,
    /// Definition with version tags removed
    pub def: FunctionDef,
}

impl Declaration {
    /// Origin version of a member; `None` for lenses
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Option<VersionId> {
        match self.kind {
            DeclKind::Method { origin } | DeclKind::Initializer { origin } => Some(origin),
            DeclKind::Lens { .. } => None,
        }
    }

    /// Whether this is a lens declaration
    #[inline]
    #[must_use]
    pub fn is_lens(&self) -> bool {
        matches!(self.kind, DeclKind::Lens { .. })
    }
}

/// Entry of the class body in source order
#[derive(Debug, Clone, PartialEq)]
pub enum BodyItem {
    /// Tagged member (lenses are not listed here)
    Member(DeclId),
    /// Untagged statement copied into every slice
    Shared(Stmt),
}

/// One versioned class
#[derive(Debug, Clone)]
pub struct ClassModel {
    pub(crate) name: String,
    pub(crate) graph: VersionGraph,
    pub(crate) decorators: Vec<Expr>,
    pub(crate) bases: Vec<Arg>,
    pub(crate) decls: Vec<Declaration>,
    pub(crate) body: Vec<BodyItem>,
    pub(crate) locals: HashMap<(String, VersionId), DeclId>,
    pub(crate) methods: IndexSet<String>,
}

impl ClassModel {
    /// Class name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version graph derived from the class tags
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &VersionGraph {
        &self.graph
    }

    /// Decorators other than version tags
    #[inline]
    #[must_use]
    pub fn decorators(&self) -> &[Expr] {
        &self.decorators
    }

    /// Base-class arguments
    #[inline]
    #[must_use]
    pub fn bases(&self) -> &[Arg] {
        &self.bases
    }

    /// All declarations in source order
    #[inline]
    #[must_use]
    pub fn decls(&self) -> &[Declaration] {
        &self.decls
    }

    /// Declaration by id
    ///
    /// # Panics
    /// Panics if `id` belongs to another class.
    #[inline]
    #[must_use]
    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    /// Body in source order
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[BodyItem] {
        &self.body
    }

    /// Declaration of `member` tagged exactly at `version`
    #[must_use]
    pub fn local(&self, member: &str, version: VersionId) -> Option<DeclId> {
        self.locals.get(&(member.to_string(), version)).copied()
    }

    /// Members declared at exactly `version`
    pub fn decls_at(&self, version: VersionId) -> impl Iterator<Item = &Declaration> + '_ {
        self.decls
            .iter()
            .filter(move |d| d.origin() == Some(version))
    }

    /// Lens declarations
    pub fn lens_decls(&self) -> impl Iterator<Item = &Declaration> + '_ {
        self.decls.iter().filter(|d| d.is_lens())
    }

    /// Distinct tagged member names in order of first declaration
    #[must_use]
    pub fn member_names(&self) -> Vec<&str> {
        let mut seen = IndexSet::new();
        for item in &self.body {
            if let BodyItem::Member(id) = item {
                seen.insert(self.decl(*id).name.as_str());
            }
        }
        seen.into_iter().collect()
    }

    /// Whether `name` is a method rather than a field
    #[inline]
    #[must_use]
    pub fn is_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    /// Version name for an id of this class's graph
    #[inline]
    #[must_use]
    pub fn version_name(&self, id: VersionId) -> &str {
        self.graph.name(id)
    }
}
