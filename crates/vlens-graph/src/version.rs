//! Version identities and records

use smallvec::SmallVec;
use std::fmt;

/// Index of a version record in a graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionId(pub(crate) u32);

impl VersionId {
    /// Position in declaration order
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of relation between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Breaking supersession; old clients are served through lenses
    Replaces,
    /// Non-breaking extension; state shape is inherited
    Upgrades,
}

/// A version as declared by the author, before names are resolved
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionSpec {
    /// Unique version name
    pub name: String,
    /// Versions this one strictly supersedes
    pub replaces: Vec<String>,
    /// Versions this one non-breakingly extends
    pub upgrades: Vec<String>,
}

impl VersionSpec {
    /// Version with no outgoing edges
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replaces: Vec::new(),
            upgrades: Vec::new(),
        }
    }

    /// Add a `replaces` edge
    #[inline]
    #[must_use]
    pub fn replacing(mut self, name: impl Into<String>) -> Self {
        self.replaces.push(name.into());
        self
    }

    /// Add an `upgrades` edge
    #[inline]
    #[must_use]
    pub fn upgrading(mut self, name: impl Into<String>) -> Self {
        self.upgrades.push(name.into());
        self
    }
}

/// Resolved version record stored in the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VersionRecord {
    pub(crate) name: String,
    pub(crate) replaces: SmallVec<[VersionId; 2]>,
    pub(crate) upgrades: SmallVec<[VersionId; 2]>,
}

impl VersionRecord {
    pub(crate) fn edges(&self) -> impl Iterator<Item = (EdgeKind, VersionId)> + '_ {
        self.upgrades
            .iter()
            .map(|id| (EdgeKind::Upgrades, *id))
            .chain(self.replaces.iter().map(|id| (EdgeKind::Replaces, *id)))
    }
}
