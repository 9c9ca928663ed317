// src/lib.rs

pub mod analysis;
pub mod cli;
pub mod compiler;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod marshal;
pub mod notebook;
pub mod pipeline;

use std::fs;
use std::io::Write as _;

use anyhow::anyhow;
use tracing::info;

use crate::cli::CliArgs;
use crate::errors::Result;
use crate::marshal::Dispatcher;
use crate::pipeline::Pipeline;

/// High-level entry point used by `main.rs`.
///
/// This wires together the whole compilation run:
/// - cell document loading
/// - step graph construction
/// - ordering validation + artifact resolution
/// - code generation and output
///
/// Any stage failure aborts the run; no partial output is ever written.
pub fn run(args: CliArgs) -> Result<()> {
    if args.list_marshal_backends {
        print_marshal_backends();
        return Ok(());
    }

    let cells_path = args
        .cells
        .as_deref()
        .ok_or_else(|| anyhow!("--cells <PATH> is required"))?;

    let notebook = notebook::load_from_path(cells_path)?;
    info!(
        pipeline = %notebook.pipeline.pipeline_name,
        cells = notebook.cells.len(),
        "loaded cell document"
    );

    let mut pipeline = graph::build(&notebook)?;
    graph::resolve(&mut pipeline)?;

    if args.dry_run {
        print_dry_run(&pipeline)?;
        return Ok(());
    }

    let source = compiler::compile(&pipeline)?;

    match &args.out {
        Some(path) => {
            fs::write(path, &source)?;
            info!(path = %path, bytes = source.len(), "wrote pipeline source");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(source.as_bytes())?;
        }
    }

    Ok(())
}

/// Convenience API: compile a cell document (JSON text) straight to the
/// generated program's source.
pub fn compile_document(contents: &str) -> Result<String> {
    let notebook = notebook::load_from_str(contents)?;
    let mut pipeline = graph::build(&notebook)?;
    graph::resolve(&mut pipeline)?;
    compiler::compile(&pipeline)
}

fn print_marshal_backends() {
    let dispatcher = Dispatcher::default();
    println!("marshalling backends (dispatch order):");
    for name in dispatcher.backend_names() {
        println!("  - {name}");
    }
}

/// Dry-run output: the resolved step graph, no emission.
fn print_dry_run(pipeline: &Pipeline) -> Result<()> {
    let graph = graph::DependencyGraph::from_pipeline(pipeline);
    let order = graph.topological_order()?;

    println!("pipeline: {}", pipeline.config.pipeline_name);
    if let Some(image) = &pipeline.config.docker_image {
        println!("  docker_image: {image}");
    }
    println!("  marshal_path: {}", pipeline.config.marshal_path);
    if !pipeline.config.parameters.is_empty() {
        let params: Vec<&str> = pipeline
            .config
            .parameters
            .iter()
            .map(String::as_str)
            .collect();
        println!("  parameters: {}", params.join(", "));
    }
    println!();

    println!("steps ({}), in execution order:", order.len());
    for id in &order {
        let step = pipeline.steps.get(id).expect("ordered ids come from steps");
        println!("  - {id}");
        if !step.dependencies.is_empty() {
            println!("      after: {}", step.dependencies.join(", "));
        }
        if !step.ins.is_empty() {
            let ins: Vec<&str> = step.ins.iter().map(String::as_str).collect();
            println!("      ins: {}", ins.join(", "));
        }
        if !step.outs.is_empty() {
            let outs: Vec<&str> = step.outs.iter().map(String::as_str).collect();
            println!("      outs: {}", outs.join(", "));
        }
    }

    Ok(())
}
