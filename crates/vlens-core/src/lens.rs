//! Lens table
//!
//! Field lenses are indexed by the state they serve: a get lens declared
//! from `A` to `B` for `f` answers "what is `B`'s `f`" while operating on
//! `A`'s state, so it is stored under `(base(B), f)` with target `base(A)`.
//! Method lenses keep their exact endpoints.

use crate::fields::FieldMap;
use crate::model::{ClassModel, DeclKind, Direction};
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};
use vlens_graph::{VersionGraph, VersionId};
use vlens_syntax::ast::FunctionDef;

/// A lens, declared or synthesized
#[derive(Debug, Clone, PartialEq)]
pub struct Lens {
    /// Get or put
    pub direction: Direction,
    /// Version whose state the lens reads
    pub from: VersionId,
    /// Version whose view of `subject` the lens produces
    pub to: VersionId,
    /// Field or method the lens converts
    pub subject: String,
    pub def: FunctionDef,
    /// Produced by put synthesis rather than written by the author
    pub synthesized: bool,
}

impl Lens {
    /// Name under which the lens is emitted into a slice
    #[must_use]
    pub fn emitted_name(&self, graph: &VersionGraph, prefix: &str) -> String {
        format!(
            "{prefix}_{}_{}_{}_{}",
            self.direction,
            self.subject,
            sanitize(graph.name(self.from)),
            sanitize(graph.name(self.to)),
        )
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

type Key = (VersionId, String);

/// Hash-indexed lenses of one class
#[derive(Debug, Clone, Default)]
pub struct LensTable {
    gets: HashMap<Key, IndexMap<VersionId, Lens>>,
    puts: HashMap<Key, IndexMap<VersionId, Lens>>,
    methods: HashMap<Key, IndexMap<VersionId, Lens>>,
    /// Version-level adjacency of field get lenses, `from -> to`
    edges: IndexMap<VersionId, Vec<VersionId>>,
}

impl LensTable {
    /// Index the lens declarations of `class`
    #[must_use]
    pub fn new(class: &ClassModel, fields: &FieldMap) -> Self {
        let mut table = Self::default();
        for decl in class.lens_decls() {
            let DeclKind::Lens {
                direction,
                from,
                to,
                ref subject,
            } = decl.kind
            else {
                continue;
            };
            let lens = Lens {
                direction,
                from,
                to,
                subject: subject.clone(),
                def: decl.def.clone(),
                synthesized: false,
            };

            if class.is_method(subject) {
                if direction == Direction::Get {
                    table
                        .methods
                        .entry((to, subject.clone()))
                        .or_default()
                        .entry(from)
                        .or_insert(lens);
                }
                continue;
            }

            let (at, target) = (fields.base_or_self(to), fields.base_or_self(from));
            if at == target {
                tracing::debug!(
                    class = class.name(),
                    lens = %decl.name,
                    "lens endpoints share a base; ignored"
                );
                continue;
            }
            if direction == Direction::Get {
                let out = table.edges.entry(target).or_default();
                if !out.contains(&at) {
                    out.push(at);
                }
            }
            let map = match direction {
                Direction::Get => &mut table.gets,
                Direction::Put => &mut table.puts,
            };
            let slot = map.entry((at, subject.clone())).or_default();
            if slot.contains_key(&target) {
                tracing::debug!(
                    class = class.name(),
                    lens = %decl.name,
                    "lens shadowed by an earlier one with the same bases"
                );
            } else {
                slot.insert(target, lens);
            }
        }
        table
    }

    /// Get lens serving `version`'s `name` on `target`'s state
    #[must_use]
    pub fn get(&self, version: VersionId, name: &str, target: VersionId) -> Option<&Lens> {
        lookup(&self.gets, version, name, target)
    }

    /// Put lens updating `version`'s `name` from `target`'s field values
    #[must_use]
    pub fn put(&self, version: VersionId, name: &str, target: VersionId) -> Option<&Lens> {
        lookup(&self.puts, version, name, target)
    }

    /// Every get lens for `(version, name)` with its target, in declaration order
    pub fn gets_for(&self, version: VersionId, name: &str) -> impl Iterator<Item = (VersionId, &Lens)> + '_ {
        self.gets
            .get(&(version, name.to_string()))
            .into_iter()
            .flat_map(|slot| slot.iter().map(|(t, l)| (*t, l)))
    }

    /// Method lens providing `member` of `version` on `target`
    #[must_use]
    pub fn method_lens(&self, version: VersionId, member: &str, target: VersionId) -> Option<&Lens> {
        lookup(&self.methods, version, member, target)
    }

    /// Register a synthesized put lens; an existing entry is kept
    pub fn insert_put(&mut self, version: VersionId, name: &str, target: VersionId, lens: Lens) {
        self.puts
            .entry((version, name.to_string()))
            .or_default()
            .entry(target)
            .or_insert(lens);
    }

    /// Breadth-first lens-graph distance from `start` to every reachable version
    #[must_use]
    pub fn distances_from(&self, start: VersionId) -> HashMap<VersionId, usize> {
        let mut dist = HashMap::from([(start, 0)]);
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            let d = dist[&v];
            for &next in self.edges.get(&v).into_iter().flatten() {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    /// First hop toward `target` for `(version, name)`: the candidate whose
    /// state is closest to `target`, ties broken by declaration order
    #[must_use]
    pub fn closest(&self, version: VersionId, name: &str, target: VersionId) -> Option<(VersionId, &Lens)> {
        let dist = self.distances_from(target);
        let mut best: Option<(usize, VersionId, &Lens)> = None;
        for (hop, lens) in self.gets_for(version, name) {
            let Some(&d) = dist.get(&hop) else { continue };
            if best.as_ref().is_none_or(|(bd, _, _)| d < *bd) {
                best = Some((d, hop, lens));
            }
        }
        best.map(|(_, hop, lens)| (hop, lens))
    }
}

fn lookup<'t>(
    map: &'t HashMap<Key, IndexMap<VersionId, Lens>>,
    version: VersionId,
    name: &str,
    target: VersionId,
) -> Option<&'t Lens> {
    map.get(&(version, name.to_string()))?.get(&target)
}
