// src/graph/builder.rs

//! Step graph builder: tagged cell records → unvalidated [`Pipeline`].

use tracing::{debug, warn};

use crate::analysis;
use crate::errors::{NbdagError, Result};
use crate::notebook::model::Notebook;
use crate::notebook::tags::{CellTags, ReservedCell};
use crate::pipeline::{Pipeline, Step};

/// Build a [`Pipeline`] from the ordered cell records of a notebook.
///
/// Grammar rules enforced here:
/// - `skip` cells are dropped;
/// - untagged cells preceding the first step join `imports_and_functions`;
///   untagged cells after steps began are orphans and rejected;
/// - `imports`/`functions` cells join the preamble wherever they appear;
/// - `pipeline-parameters` cells declare environment symbols (their
///   top-level bindings) and join the preamble so defaults stay available;
/// - consecutive cells with the same step tag merge, source concatenated
///   in cell order;
/// - `prev:` must reference an already-declared step; a later step with no
///   explicit `prev` depends on the immediately preceding declared step.
///
/// Acyclicity is *not* checked here; the ordering engine does that next.
pub fn build(notebook: &Notebook) -> Result<Pipeline> {
    let mut pipeline = Pipeline::new(notebook.pipeline.clone());
    // Step id of the previous cell, used for consecutive-cell merging.
    let mut previous_cell_step: Option<String> = None;
    // Most recently declared step, the implicit dependency for steps that
    // declare no `prev`.
    let mut last_declared_step: Option<String> = None;

    for (index, cell) in notebook.cells.iter().enumerate() {
        let tags = CellTags::parse(&cell.tags)?;

        if tags.skip {
            debug!(cell = index, "skipping cell");
            previous_cell_step = None;
            continue;
        }

        if let Some(reserved) = tags.reserved {
            match reserved {
                ReservedCell::Imports | ReservedCell::Functions => {
                    pipeline.imports_and_functions.push(cell.source.clone());
                }
                ReservedCell::PipelineParameters => {
                    declare_parameters(&mut pipeline, &cell.source)?;
                    pipeline.imports_and_functions.push(cell.source.clone());
                }
            }
            previous_cell_step = None;
            continue;
        }

        let step_name = match &tags.step {
            Some(name) => name.clone(),
            None => {
                // Untagged cell: preamble before the first step, orphan after.
                if pipeline.steps.is_empty() {
                    pipeline.imports_and_functions.push(cell.source.clone());
                    previous_cell_step = None;
                    continue;
                }
                return Err(NbdagError::GraphDefinition(format!(
                    "cell {index} has no step tag but follows tagged steps; \
                     tag it with 'step:<name>' or 'skip'"
                )));
            }
        };

        let merging = previous_cell_step.as_deref() == Some(step_name.as_str());

        if merging {
            for prev in &tags.prevs {
                if prev == &step_name {
                    return Err(NbdagError::GraphDefinition(format!(
                        "step '{step_name}' declares itself as a predecessor"
                    )));
                }
                if !pipeline.steps.contains_key(prev) {
                    return Err(NbdagError::GraphDefinition(format!(
                        "step '{step_name}' declares unknown predecessor \
                         '{prev}': predecessors must be declared earlier \
                         in the notebook"
                    )));
                }
            }
            let step = pipeline
                .steps
                .get_mut(&step_name)
                .expect("merging into a step that was just declared");
            step.source.push(cell.source.clone());
            apply_cell_config(step, &tags);
            for prev in &tags.prevs {
                step.add_dependency(prev.clone());
            }
        } else {
            if pipeline.steps.contains_key(&step_name) {
                return Err(NbdagError::GraphDefinition(format!(
                    "step '{step_name}' is declared again in a non-consecutive \
                     cell; cells of a step must be contiguous"
                )));
            }

            let mut step = Step::new(step_name.clone());
            step.source.push(cell.source.clone());
            apply_cell_config(&mut step, &tags);

            if tags.prevs.is_empty() {
                match &last_declared_step {
                    // First declared step: the only implicit root.
                    None => debug!(step = %step_name, "registering root step"),
                    Some(prev) => {
                        debug!(step = %step_name, prev = %prev, "inferring 'prev' linkage");
                        step.add_dependency(prev.clone());
                    }
                }
            } else {
                for prev in &tags.prevs {
                    if prev == &step_name {
                        return Err(NbdagError::GraphDefinition(format!(
                            "step '{step_name}' declares itself as a predecessor"
                        )));
                    }
                    if !pipeline.steps.contains_key(prev) {
                        return Err(NbdagError::GraphDefinition(format!(
                            "step '{step_name}' declares unknown predecessor \
                             '{prev}': predecessors must be declared earlier \
                             in the notebook"
                        )));
                    }
                    step.add_dependency(prev.clone());
                }
            }

            pipeline.steps.insert(step_name.clone(), step);
            last_declared_step = Some(step_name.clone());
        }

        previous_cell_step = Some(step_name);
    }

    if pipeline.steps.is_empty() {
        return Err(NbdagError::GraphDefinition(
            "the notebook declares no steps; tag at least one cell with \
             'step:<name>'"
                .to_string(),
        ));
    }

    apply_steps_defaults(&mut pipeline);

    debug!(
        steps = pipeline.steps.len(),
        preamble_blocks = pipeline.imports_and_functions.len(),
        "built step graph"
    );

    Ok(pipeline)
}

/// Record the names a `pipeline-parameters` cell declares.
fn declare_parameters(pipeline: &mut Pipeline, source: &str) -> Result<()> {
    let cleaned = analysis::comment_magic_commands(&analysis::dedent(source));
    let block = analysis::analyze_block(&cleaned).map_err(|reason| {
        NbdagError::SourceSyntax {
            step: "pipeline-parameters".to_string(),
            reason,
        }
    })?;
    if !block.free.is_empty() {
        warn!(
            names = ?block.free,
            "pipeline-parameters cell reads names it does not define"
        );
    }
    for name in block.bound {
        pipeline.config.parameters.insert(name);
    }
    Ok(())
}

fn apply_cell_config(step: &mut Step, tags: &CellTags) {
    for (k, v) in &tags.limits {
        step.config.limits.insert(k.clone(), v.clone());
    }
    for (k, v) in &tags.labels {
        step.config.labels.insert(k.clone(), v.clone());
    }
    for (k, v) in &tags.annotations {
        step.config.annotations.insert(k.clone(), v.clone());
    }
    for raw in &tags.raw {
        if !step.config.raw_tags.contains(raw) {
            step.config.raw_tags.push(raw.clone());
        }
    }
}

/// Merge pipeline-level step defaults into every step (step-local wins).
fn apply_steps_defaults(pipeline: &mut Pipeline) {
    let defaults = pipeline.config.steps_defaults.clone();
    if defaults.is_empty() {
        return;
    }
    for step in pipeline.steps.values_mut() {
        step.config.apply_defaults(&defaults);
    }
}
