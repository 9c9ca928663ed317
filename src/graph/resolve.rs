// src/graph/resolve.rs

//! Artifact resolution pass.
//!
//! Walks steps in topological order; every free variable of a step is
//! bound to the nearest ancestor that holds it (its own top-level bindings
//! or an artifact it already receives). The binding is recorded in the
//! producer's `outs` and the consumer's `ins`. A free name with no
//! producing ancestor and no global binding is a compile-time error.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::analysis::{self, BlockAnalysis};
use crate::errors::{NbdagError, Result};
use crate::graph::ordering::DependencyGraph;
use crate::pipeline::Pipeline;

/// Resolve artifact flow for a whole pipeline, populating `ins`/`outs` in
/// place. Only the declared ancestor order governs binding choice; no
/// hash-iteration order is consulted anywhere.
pub fn resolve(pipeline: &mut Pipeline) -> Result<()> {
    let graph = DependencyGraph::from_pipeline(pipeline);
    let order = graph.topological_order()?;

    let preamble = analyze_preamble(pipeline)?;
    if preamble.star_import {
        warn!(
            "preamble contains a star import; unresolved names will be \
             assumed global"
        );
    }

    // Names each processed step holds at runtime: its own top-level
    // bindings plus the artifacts it receives.
    let mut available: HashMap<String, BTreeSet<String>> = HashMap::new();

    for id in &order {
        let analysis = analyze_step(pipeline, id)?;
        let ancestors = graph.ordered_ancestors(id);
        let mut holds = analysis.bound.clone();

        for name in &analysis.free {
            if preamble.bound.contains(name) || pipeline.config.parameters.contains(name) {
                continue;
            }

            let producer = ancestors
                .iter()
                .find(|anc| available.get(*anc).is_some_and(|names| names.contains(name)));

            match producer {
                Some(producer) => {
                    debug!(step = %id, name = %name, producer = %producer, "bound artifact");
                    pipeline
                        .steps
                        .get_mut(producer)
                        .expect("ancestor exists in pipeline")
                        .outs
                        .insert(name.clone());
                    pipeline
                        .steps
                        .get_mut(id)
                        .expect("step exists in pipeline")
                        .ins
                        .insert(name.clone());
                    holds.insert(name.clone());
                }
                None if preamble.star_import || analysis.star_import => {
                    debug!(
                        step = %id, name = %name,
                        "no producing ancestor; assuming a star import in \
                         scope defines it"
                    );
                }
                None => {
                    return Err(NbdagError::UnresolvedDependency {
                        step: id.clone(),
                        name: name.clone(),
                    });
                }
            }
        }

        available.insert(id.clone(), holds);
    }

    Ok(())
}

fn analyze_preamble(pipeline: &Pipeline) -> Result<BlockAnalysis> {
    let source = pipeline.preamble();
    if source.trim().is_empty() {
        return Ok(BlockAnalysis::default());
    }
    let cleaned = analysis::comment_magic_commands(&analysis::dedent(&source));
    analysis::analyze_block(&cleaned).map_err(|reason| NbdagError::SourceSyntax {
        step: "imports_and_functions".to_string(),
        reason,
    })
}

fn analyze_step(pipeline: &Pipeline, id: &str) -> Result<BlockAnalysis> {
    let step = pipeline.steps.get(id).expect("ordered ids come from steps");
    let cleaned = analysis::comment_magic_commands(&analysis::dedent(&step.merged_source()));
    analysis::analyze_block(&cleaned).map_err(|reason| NbdagError::SourceSyntax {
        step: id.to_string(),
        reason,
    })
}
