use proptest::prelude::*;
use vlens_graph::{GraphError, VersionGraph, VersionSpec};

/// Edges only point from a later version to an earlier one, so the graph is acyclic
fn acyclic_specs() -> impl Strategy<Value = Vec<VersionSpec>> {
    (1..12usize).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n, any::<bool>()), 0..30).prop_map(move |edges| {
            let mut specs: Vec<VersionSpec> = (0..n).map(|i| VersionSpec::new(format!("v{i}"))).collect();
            for (a, b, replaces) in edges {
                let (hi, lo) = if a > b { (a, b) } else { (b, a) };
                if hi == lo {
                    continue;
                }
                let target = format!("v{lo}");
                let spec = &mut specs[hi];
                if spec.replaces.contains(&target) || spec.upgrades.contains(&target) {
                    continue;
                }
                if replaces {
                    spec.replaces.push(target);
                } else {
                    spec.upgrades.push(target);
                }
            }
            specs
        })
    })
}

proptest! {
    #[test]
    fn prop_forward_edges_always_build(specs in acyclic_specs()) {
        let graph = VersionGraph::from_specs(specs.clone());
        prop_assert!(graph.is_ok());
        prop_assert_eq!(graph.unwrap().len(), specs.len());
    }

    #[test]
    fn prop_delete_is_a_view(specs in acyclic_specs(), pick in 0..12usize) {
        let graph = VersionGraph::from_specs(specs).unwrap();
        let victim = graph.versions().nth(pick % graph.len()).unwrap();
        let before: Vec<_> = graph.versions().map(|v| graph.parents(v).collect::<Vec<_>>()).collect();

        let view = graph.delete(victim);

        prop_assert_eq!(view.len(), graph.len() - 1);
        for v in view.versions() {
            prop_assert!(view.parents(v).all(|p| p != victim));
            prop_assert!(!view.replaced_by(v).contains(&victim));
        }
        let after: Vec<_> = graph.versions().map(|v| graph.parents(v).collect::<Vec<_>>()).collect();
        prop_assert_eq!(before, after);
    }
}

#[test]
fn back_edge_is_rejected_as_cycle() {
    let result = VersionGraph::from_specs([
        VersionSpec::new("1").upgrading("3"),
        VersionSpec::new("2").replacing("1"),
        VersionSpec::new("3").upgrading("2"),
    ]);
    match result {
        Err(GraphError::CyclicVersionGraph { cycle }) => {
            assert_eq!(cycle, vec!["1", "3", "2"]);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn repeated_delete_shrinks_to_empty() {
    let graph = VersionGraph::from_specs([
        VersionSpec::new("a"),
        VersionSpec::new("b").upgrading("a"),
    ])
    .unwrap();
    let a = graph.id("a").unwrap();
    let b = graph.id("b").unwrap();
    let empty = graph.delete(a).delete(b);
    assert!(empty.is_empty());
    assert_eq!(empty.versions().count(), 0);
    assert_eq!(graph.len(), 2);
}
