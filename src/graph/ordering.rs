// src/graph/ordering.rs

//! Graph ordering engine: acyclicity, deterministic topological order and
//! ordered ancestor chains.

use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{NbdagError, Result};
use crate::pipeline::Pipeline;

/// Ephemeral adjacency view over a [`Pipeline`]'s dependency relation.
///
/// Rebuilt whenever a stage needs it; never persisted. Keys iterate in step
/// declaration order, which is the tie-break for every ordering decision
/// here, so results are reproducible across runs on the same input.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Direct dependencies per step, in edge-declaration order.
    deps: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the view from a pipeline.
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let mut deps = IndexMap::new();
        for (id, step) in &pipeline.steps {
            deps.insert(id.clone(), step.dependencies.clone());
        }
        Self { deps }
    }

    /// All step ids, in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.deps.keys().map(String::as_str)
    }

    /// Direct dependencies of a step, in edge-declaration order.
    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.deps.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Deterministic topological order of the whole graph.
    ///
    /// Kahn's algorithm; among simultaneously ready nodes the
    /// earliest-declared one goes first. Fails with
    /// [`NbdagError::CyclicGraph`] when the ready set is exhausted before
    /// every node is placed.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        // In-degree of a node = number of dependencies it waits on.
        let mut in_degree: IndexMap<&str, usize> = self
            .deps
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        let mut placed: Vec<String> = Vec::with_capacity(self.deps.len());
        let mut done: IndexMap<&str, bool> =
            self.deps.keys().map(|id| (id.as_str(), false)).collect();

        while placed.len() < self.deps.len() {
            // Earliest-declared node with no unresolved dependencies.
            let next = self
                .deps
                .keys()
                .map(String::as_str)
                .find(|id| !done[*id] && in_degree[*id] == 0);

            let next = match next {
                Some(id) => id,
                None => {
                    let members = self.cycle_members();
                    return Err(NbdagError::CyclicGraph { members });
                }
            };

            done[next] = true;
            placed.push(next.to_string());
            // Resolve this dependency for every dependent.
            for (id, deps) in &self.deps {
                if deps.iter().any(|d| d == next) {
                    *in_degree.get_mut(id.as_str()).expect("node registered") -= 1;
                }
            }
        }

        debug!(order = ?placed, "computed topological order");
        Ok(placed)
    }

    /// Every transitive ancestor of `id`, breadth-first by distance:
    /// direct predecessors in their edge-declaration order, then their
    /// predecessors, deduplicated keeping the first occurrence.
    ///
    /// The resolution pass depends on this order to prefer the *nearest*
    /// producer of a name.
    pub fn ordered_ancestors(&self, id: &str) -> Vec<String> {
        let mut ancestors: Vec<String> = Vec::new();
        let mut queue: Vec<String> = self.dependencies_of(id).to_vec();
        let mut cursor = 0;

        while cursor < queue.len() {
            let current = queue[cursor].clone();
            cursor += 1;
            if ancestors.iter().any(|a| a == &current) {
                continue;
            }
            for dep in self.dependencies_of(&current) {
                if !ancestors.iter().any(|a| a == dep) && !queue[cursor..].contains(dep) {
                    queue.push(dep.clone());
                }
            }
            ancestors.push(current);
        }

        ancestors
    }

    /// Members of a strongly connected component with more than one node,
    /// reported in declaration order. Used for cycle diagnostics.
    fn cycle_members(&self) -> Vec<String> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for id in self.deps.keys() {
            graph.add_node(id.as_str());
        }
        for (id, deps) in &self.deps {
            for dep in deps {
                graph.add_edge(dep.as_str(), id.as_str(), ());
            }
        }

        for scc in tarjan_scc(&graph) {
            if scc.len() > 1 {
                let mut members: Vec<String> = self
                    .deps
                    .keys()
                    .filter(|id| scc.contains(&id.as_str()))
                    .cloned()
                    .collect();
                // Close the loop for readability in the error message.
                if let Some(first) = members.first().cloned() {
                    members.push(first);
                }
                return members;
            }
        }
        Vec::new()
    }
}
