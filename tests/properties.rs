// tests/properties.rs

//! Property tests over randomly shaped step graphs.

use proptest::prelude::*;

use nbdag::compiler::compile;
use nbdag::graph::{build, resolve, DependencyGraph};
use nbdag::notebook::Notebook;
use nbdag_test_utils::builders::NotebookBuilder;

/// Direct predecessors of step `i`, decoded from the seed's bits. Only
/// earlier steps are eligible, so the graph is acyclic by construction.
fn deps_of(i: usize, seed: u64) -> Vec<usize> {
    (0..i).filter(|j| (seed >> (i * 7 + j)) & 1 == 1).collect()
}

/// A notebook of `n` steps where step `i` binds `v<i>` and reads `v<j>`
/// for every direct predecessor `j`.
fn random_notebook(n: usize, seed: u64) -> Notebook {
    let mut builder = NotebookBuilder::named("prop");
    for i in 0..n {
        let deps = deps_of(i, seed);
        let prevs: Vec<String> = deps.iter().map(|j| format!("s{j}")).collect();
        let prev_refs: Vec<&str> = prevs.iter().map(String::as_str).collect();

        let mut source = format!("v{i} = {i}");
        for j in &deps {
            source.push_str(&format!(" + v{j}"));
        }
        builder = builder.step(&format!("s{i}"), &prev_refs, &source);
    }
    builder.build()
}

proptest! {
    #[test]
    fn topological_order_respects_every_edge(n in 1usize..8, seed in any::<u64>()) {
        let notebook = random_notebook(n, seed);
        let pipeline = build(&notebook).unwrap();
        let graph = DependencyGraph::from_pipeline(&pipeline);
        let order = graph.topological_order().unwrap();

        prop_assert_eq!(order.len(), pipeline.steps.len());
        let position = |id: &str| order.iter().position(|o| o == id).unwrap();
        for (id, step) in &pipeline.steps {
            for dep in &step.dependencies {
                prop_assert!(position(dep) < position(id));
            }
        }
    }

    #[test]
    fn ancestors_cover_all_transitive_dependencies(n in 1usize..8, seed in any::<u64>()) {
        let notebook = random_notebook(n, seed);
        let pipeline = build(&notebook).unwrap();
        let graph = DependencyGraph::from_pipeline(&pipeline);

        for (id, step) in &pipeline.steps {
            let ancestors = graph.ordered_ancestors(id);
            for dep in &step.dependencies {
                prop_assert!(ancestors.contains(dep));
                // And everything the predecessor reaches.
                for farther in graph.ordered_ancestors(dep) {
                    prop_assert!(ancestors.contains(&farther));
                }
            }
        }
    }

    #[test]
    fn resolution_wires_reads_to_direct_producers(n in 1usize..8, seed in any::<u64>()) {
        let notebook = random_notebook(n, seed);
        let mut pipeline = build(&notebook).unwrap();
        resolve(&mut pipeline).unwrap();

        for i in 0..n {
            let id = format!("s{i}");
            let step = &pipeline.steps[id.as_str()];
            for j in deps_of(i, seed) {
                let name = format!("v{j}");
                prop_assert!(step.ins.contains(&name));
                let producer = format!("s{j}");
                prop_assert!(pipeline.steps[producer.as_str()].outs.contains(&name));
            }
        }
    }

    #[test]
    fn compilation_output_is_stable(n in 1usize..8, seed in any::<u64>()) {
        let notebook = random_notebook(n, seed);

        let mut first = build(&notebook).unwrap();
        resolve(&mut first).unwrap();
        let mut second = build(&notebook).unwrap();
        resolve(&mut second).unwrap();

        prop_assert_eq!(compile(&first).unwrap(), compile(&second).unwrap());
    }
}
