// tests/graph_ordering.rs

//! Ordering guarantees: deterministic topological order, ordered
//! ancestor chains and cycle diagnostics.

use nbdag::errors::NbdagError;
use nbdag::graph::{build, DependencyGraph};
use nbdag_test_utils::builders::NotebookBuilder;

/// The diamond used throughout:
///
/// ```text
/// a -> b -> {c, d, e} -> r
/// ```
fn diamond() -> DependencyGraph {
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .step("b", &["a"], "y = 2")
        .step("c", &["b"], "p = 3")
        .step("d", &["b"], "q = 4")
        .step("e", &["b"], "r = 5")
        .step("res", &["c", "d", "e"], "out = 6")
        .build();
    let pipeline = build(&notebook).unwrap();
    DependencyGraph::from_pipeline(&pipeline)
}

#[test]
fn topological_order_is_declaration_stable() {
    let graph = diamond();
    let order = graph.topological_order().unwrap();
    assert_eq!(order, vec!["a", "b", "c", "d", "e", "res"]);
}

#[test]
fn topological_order_breaks_ties_by_declaration() {
    // m, z and b become ready at the same time; declaration order wins,
    // not name order.
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .step("m", &["a"], "p = 2")
        .step("z", &["a"], "q = 3")
        .step("b", &["a"], "r = 4")
        .step("end", &["m", "z", "b"], "s = 5")
        .build();
    let pipeline = build(&notebook).unwrap();
    let order = DependencyGraph::from_pipeline(&pipeline)
        .topological_order()
        .unwrap();
    assert_eq!(order, vec!["a", "m", "z", "b", "end"]);
}

#[test]
fn ordered_ancestors_are_breadth_first_by_distance() {
    let graph = diamond();
    assert_eq!(graph.ordered_ancestors("res"), vec!["c", "d", "e", "b", "a"]);
    assert_eq!(graph.ordered_ancestors("e"), vec!["b", "a"]);
    assert_eq!(graph.ordered_ancestors("b"), vec!["a"]);
    assert!(graph.ordered_ancestors("a").is_empty());
}

#[test]
fn ordered_ancestors_deduplicate_shared_predecessors() {
    // c and d both depend on b; b must appear once, after both.
    let notebook = NotebookBuilder::new()
        .step("b", &[], "x = 1")
        .step("c", &["b"], "y = 2")
        .step("d", &["b"], "z = 3")
        .step("r", &["c", "d"], "w = 4")
        .build();
    let pipeline = build(&notebook).unwrap();
    let graph = DependencyGraph::from_pipeline(&pipeline);
    assert_eq!(graph.ordered_ancestors("r"), vec!["c", "d", "b"]);
}

#[test]
fn cycles_are_reported_with_their_members() {
    // Tag syntax cannot express a forward edge, so wire one up directly.
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .step("b", &["a"], "y = 2")
        .step("c", &["b"], "z = 3")
        .build();
    let mut pipeline = build(&notebook).unwrap();
    pipeline
        .steps
        .get_mut("a")
        .unwrap()
        .add_dependency("c");

    let graph = DependencyGraph::from_pipeline(&pipeline);
    match graph.topological_order() {
        Err(NbdagError::CyclicGraph { members }) => {
            assert_eq!(members, vec!["a", "b", "c", "a"]);
        }
        other => panic!("expected CyclicGraph error, got {other:?}"),
    }
}

#[test]
fn dependencies_of_unknown_step_is_empty() {
    let graph = diamond();
    assert!(graph.dependencies_of("missing").is_empty());
}
