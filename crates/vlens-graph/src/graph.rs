//! Version graph arena and deletion views
//!
//! [`VersionGraph`] stores every version record once in a shared arena.
//! [`VersionGraph::delete`] never copies the arena: it returns a view that
//! shares the records and adds the node to a persistent removed-set, so
//! every edge pointing at it disappears from all queries on the view.

use crate::dag;
use crate::error::GraphError;
use crate::version::{VersionId, VersionRecord, VersionSpec};
use im::OrdSet;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable version graph (or a deletion view of one)
#[derive(Debug, Clone)]
pub struct VersionGraph {
    records: Arc<[VersionRecord]>,
    by_name: Arc<HashMap<String, VersionId>>,
    removed: OrdSet<VersionId>,
}

impl VersionGraph {
    /// Build and validate a graph from declared versions
    ///
    /// # Errors
    /// Fails on duplicate names, edges to undeclared versions, self
    /// relations, and cycles.
    pub fn from_specs<I>(specs: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = VersionSpec>,
    {
        let specs: Vec<VersionSpec> = specs.into_iter().collect();

        let mut by_name = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if by_name
                .insert(spec.name.clone(), VersionId(i as u32))
                .is_some()
            {
                return Err(GraphError::DuplicateVersion(spec.name.clone()));
            }
        }

        let lookup = |owner: &VersionSpec, name: &String| -> Result<VersionId, GraphError> {
            if *name == owner.name {
                return Err(GraphError::SelfRelation(owner.name.clone()));
            }
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| GraphError::UndefinedVersion {
                    version: name.clone(),
                    referenced_by: owner.name.clone(),
                })
        };

        let mut records = Vec::with_capacity(specs.len());
        for spec in &specs {
            let replaces = spec
                .replaces
                .iter()
                .map(|n| lookup(spec, n))
                .collect::<Result<_, _>>()?;
            let upgrades = spec
                .upgrades
                .iter()
                .map(|n| lookup(spec, n))
                .collect::<Result<_, _>>()?;
            records.push(VersionRecord {
                name: spec.name.clone(),
                replaces,
                upgrades,
            });
        }

        if let Some(cycle) = dag::find_cycle(&records) {
            return Err(GraphError::CyclicVersionGraph {
                cycle: cycle
                    .into_iter()
                    .map(|id| records[id.index()].name.clone())
                    .collect(),
            });
        }

        tracing::debug!(versions = records.len(), "version graph built");

        Ok(Self {
            records: records.into(),
            by_name: Arc::new(by_name),
            removed: OrdSet::new(),
        })
    }

    /// Graph with no versions
    #[must_use]
    pub fn empty() -> Self {
        Self {
            records: Vec::new().into(),
            by_name: Arc::new(HashMap::new()),
            removed: OrdSet::new(),
        }
    }

    /// View of this graph without `id`; edges naming `id` are pruned
    #[must_use]
    pub fn delete(&self, id: VersionId) -> Self {
        let mut removed = self.removed.clone();
        removed.insert(id);
        Self {
            records: Arc::clone(&self.records),
            by_name: Arc::clone(&self.by_name),
            removed,
        }
    }

    /// Whether `id` is present in this view
    #[inline]
    #[must_use]
    pub fn contains(&self, id: VersionId) -> bool {
        id.index() < self.records.len() && !self.removed.contains(&id)
    }

    /// Look up a present version by name
    #[must_use]
    pub fn id(&self, name: &str) -> Option<VersionId> {
        self.by_name.get(name).copied().filter(|id| self.contains(*id))
    }

    /// Name of a version; ids from a deletion view remain nameable
    ///
    /// # Panics
    /// Panics if `id` did not come from this graph's arena.
    #[inline]
    #[must_use]
    pub fn name(&self, id: VersionId) -> &str {
        &self.records[id.index()].name
    }

    /// Number of present versions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len() - self.removed.len()
    }

    /// Whether no version is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present versions in declaration order
    pub fn versions(&self) -> impl Iterator<Item = VersionId> + '_ {
        (0..self.records.len())
            .map(|i| VersionId(i as u32))
            .filter(|id| !self.removed.contains(id))
    }

    /// Present version names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.versions().map(|id| self.name(id))
    }

    /// Present versions that `id` replaces
    pub fn replaces(&self, id: VersionId) -> impl Iterator<Item = VersionId> + '_ {
        self.present(id, |r| &r.replaces)
    }

    /// Present versions that `id` upgrades
    pub fn upgrades(&self, id: VersionId) -> impl Iterator<Item = VersionId> + '_ {
        self.present(id, |r| &r.upgrades)
    }

    /// `upgrades ++ replaces` of `id`, the inheritance search order
    pub fn parents(&self, id: VersionId) -> impl Iterator<Item = VersionId> + '_ {
        self.upgrades(id).chain(self.replaces(id))
    }

    /// Present versions whose `replaces` list contains `id`
    #[must_use]
    pub fn replaced_by(&self, id: VersionId) -> Vec<VersionId> {
        self.versions()
            .filter(|v| self.records[v.index()].replaces.contains(&id))
            .collect()
    }

    fn present<'a, F>(&'a self, id: VersionId, edges: F) -> impl Iterator<Item = VersionId> + 'a
    where
        F: Fn(&'a VersionRecord) -> &'a smallvec::SmallVec<[VersionId; 2]>,
    {
        let list: &[VersionId] = if self.contains(id) {
            edges(&self.records[id.index()]).as_slice()
        } else {
            &[]
        };
        list.iter().copied().filter(move |v| !self.removed.contains(v))
    }
}

impl Default for VersionGraph {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> VersionGraph {
        VersionGraph::from_specs([
            VersionSpec::new("1"),
            VersionSpec::new("2").replacing("1"),
            VersionSpec::new("3").upgrading("2"),
        ])
        .unwrap()
    }

    #[test]
    fn builds_and_names() {
        let g = chain();
        assert_eq!(g.len(), 3);
        assert_eq!(g.names().collect::<Vec<_>>(), vec!["1", "2", "3"]);
        let v2 = g.id("2").unwrap();
        assert_eq!(g.name(v2), "2");
    }

    #[test]
    fn replaced_by_and_parents() {
        let g = chain();
        let (v1, v2, v3) = (g.id("1").unwrap(), g.id("2").unwrap(), g.id("3").unwrap());
        assert_eq!(g.replaced_by(v1), vec![v2]);
        assert_eq!(g.parents(v3).collect::<Vec<_>>(), vec![v2]);
        assert_eq!(g.parents(v2).collect::<Vec<_>>(), vec![v1]);
    }

    #[test]
    fn delete_prunes_edges_without_touching_original() {
        let g = chain();
        let v1 = g.id("1").unwrap();
        let v2 = g.id("2").unwrap();

        let view = g.delete(v1);
        assert!(!view.contains(v1));
        assert!(view.id("1").is_none());
        assert_eq!(view.parents(v2).count(), 0);
        assert_eq!(view.len(), 2);

        // Canonical graph unchanged
        assert!(g.contains(v1));
        assert_eq!(g.parents(v2).collect::<Vec<_>>(), vec![v1]);
    }

    #[test]
    fn rejects_duplicate_version() {
        let err = VersionGraph::from_specs([VersionSpec::new("1"), VersionSpec::new("1")]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateVersion("1".into()));
    }

    #[test]
    fn rejects_undefined_version() {
        let err = VersionGraph::from_specs([VersionSpec::new("2").replacing("1")]).unwrap_err();
        assert!(matches!(err, GraphError::UndefinedVersion { ref version, .. } if version == "1"));
    }

    #[test]
    fn rejects_self_relation() {
        let err = VersionGraph::from_specs([VersionSpec::new("1").upgrading("1")]).unwrap_err();
        assert_eq!(err, GraphError::SelfRelation("1".into()));
    }

    #[test]
    fn rejects_cycle() {
        let err = VersionGraph::from_specs([
            VersionSpec::new("a").replacing("b"),
            VersionSpec::new("b").upgrading("a"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicVersionGraph {
                cycle: vec!["a".into(), "b".into()]
            }
        );
    }
}
