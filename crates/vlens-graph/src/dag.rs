//! Acyclicity checks over version records
//!
//! Version records are mirrored into a petgraph `DiGraphMap` only for
//! validation; resolution works on the arena directly.

use crate::version::{EdgeKind, VersionId, VersionRecord};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

fn build(records: &[VersionRecord]) -> DiGraphMap<VersionId, EdgeKind> {
    let mut g = DiGraphMap::new();
    for (i, record) in records.iter().enumerate() {
        let from = VersionId(i as u32);
        g.add_node(from);
        for (kind, to) in record.edges() {
            g.add_edge(from, to, kind);
        }
    }
    g
}

/// Find one cycle, returned in edge order starting from its smallest id
pub(crate) fn find_cycle(records: &[VersionRecord]) -> Option<Vec<VersionId>> {
    let g = build(records);
    let mut components: Vec<Vec<VersionId>> = tarjan_scc(&g)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .collect();
    components.sort_by_key(|scc| scc.iter().min().copied());
    let scc = components.into_iter().next()?;
    let members: HashSet<VersionId> = scc.iter().copied().collect();
    let start = *scc.iter().min()?;

    // Shortest walk start -> ... -> start inside the component
    let mut parent: HashMap<VersionId, VersionId> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for next in g.neighbors_directed(node, Direction::Outgoing) {
            if !members.contains(&next) {
                continue;
            }
            if next == start {
                let mut cycle = vec![node];
                let mut cur = node;
                while cur != start {
                    cur = parent[&cur];
                    cycle.push(cur);
                }
                cycle.reverse();
                return Some(cycle);
            }
            if next != start && !parent.contains_key(&next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn record(name: &str, replaces: &[u32], upgrades: &[u32]) -> VersionRecord {
        VersionRecord {
            name: name.to_string(),
            replaces: replaces.iter().map(|i| VersionId(*i)).collect(),
            upgrades: upgrades.iter().map(|i| VersionId(*i)).collect(),
        }
    }

    #[test]
    fn no_cycle_in_chain() {
        let records = vec![record("1", &[], &[]), record("2", &[0], &[]), record("3", &[], &[1])];
        assert!(find_cycle(&records).is_none());
    }

    #[test]
    fn reports_cycle_in_edge_order() {
        let records = vec![
            record("a", &[1], &[]),
            record("b", &[], &[2]),
            record("c", &[0], &[]),
        ];
        let cycle = find_cycle(&records).unwrap();
        assert_eq!(cycle, vec![VersionId(0), VersionId(1), VersionId(2)]);
    }

    #[test]
    fn two_node_cycle() {
        let records = vec![
            VersionRecord {
                name: "x".into(),
                replaces: smallvec![VersionId(1)],
                upgrades: smallvec![],
            },
            record("y", &[], &[0]),
        ];
        assert_eq!(find_cycle(&records).unwrap(), vec![VersionId(0), VersionId(1)]);
    }
}
