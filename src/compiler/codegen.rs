// src/compiler/codegen.rs

//! Emits the generated pipeline program.
//!
//! The output is a single Python document: the shared preamble hoisted
//! once, one function per step (artifact loads, the de-indented cell
//! source, artifact saves), and an assembly function that registers every
//! step with an injected `runner` capability so the generated control-flow
//! graph is isomorphic to the internal one.
//!
//! Determinism is a hard requirement: for identical input the output is
//! byte-identical. Steps are walked in topological order (declaration
//! order breaks ties), `ins`/`outs` are emitted in lexicographic order,
//! config maps are `BTreeMap`s, and no timestamps are embedded.

use std::fmt::Write as _;

use tracing::debug;

use crate::analysis;
use crate::errors::Result;
use crate::graph::ordering::DependencyGraph;
use crate::pipeline::{Pipeline, Step, VolumeConfig};

/// Compile a resolved pipeline into the generated program's source text.
pub fn compile(pipeline: &Pipeline) -> Result<String> {
    let graph = DependencyGraph::from_pipeline(pipeline);
    let order = graph.topological_order()?;

    let mut sections: Vec<String> = Vec::new();
    sections.push(header(pipeline));

    let preamble = prepare_source(&pipeline.preamble());
    if !preamble.is_empty() {
        sections.push(format!(
            "# Imports and functions, shared by all steps.\n\n{preamble}"
        ));
    }

    for id in &order {
        let step = pipeline.steps.get(id).expect("ordered ids come from steps");
        sections.push(step_unit(step));
    }

    sections.push(assembly(pipeline, &order));

    debug!(steps = order.len(), "emitted pipeline source");
    Ok(sections.join("\n\n\n") + "\n")
}

fn header(pipeline: &Pipeline) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "# Pipeline {}, generated by nbdag. Do not edit.",
        py_str(&pipeline.config.pipeline_name)
    );
    out.push('\n');
    out.push_str(
        "from nbdag_marshal import load as _load, save as _save, \
         set_data_dir as _set_data_dir\n",
    );
    out.push('\n');
    let _ = write!(
        out,
        "_set_data_dir({})",
        py_str(&pipeline.config.marshal_path)
    );
    out
}

/// One executable unit per step: loads, body, saves.
fn step_unit(step: &Step) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "def step_{}():", step.id);

    let mut lines: Vec<String> = Vec::new();
    for name in &step.ins {
        lines.push(format!("{name} = _load({})", py_str(name)));
    }

    let body = prepare_source(&step.merged_source());
    for line in body.lines() {
        lines.push(line.to_string());
    }

    for name in &step.outs {
        lines.push(format!("_save({}, {name})", py_str(name)));
    }

    if lines.is_empty() {
        lines.push("pass".to_string());
    }

    for line in &lines {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "    {line}");
        }
    }
    out.pop();
    out
}

/// The pipeline-assembly unit. The runner is an injected capability: the
/// generated program never reaches for a global client.
fn assembly(pipeline: &Pipeline, order: &[String]) -> String {
    let mut out = String::new();
    out.push_str("def auto_generated_pipeline(runner):\n");
    out.push_str("    runner.configure(\n");
    let _ = writeln!(out, "        name={},", py_str(&pipeline.config.pipeline_name));
    if let Some(description) = &pipeline.config.description {
        let _ = writeln!(out, "        description={},", py_str(description));
    }
    if let Some(experiment) = &pipeline.config.experiment_name {
        let _ = writeln!(out, "        experiment={},", py_str(experiment));
    }
    if let Some(image) = &pipeline.config.docker_image {
        let _ = writeln!(out, "        docker_image={},", py_str(image));
    }
    let _ = writeln!(
        out,
        "        marshal_path={},",
        py_str(&pipeline.config.marshal_path)
    );
    if !pipeline.config.parameters.is_empty() {
        let params: Vec<&str> = pipeline
            .config
            .parameters
            .iter()
            .map(String::as_str)
            .collect();
        let _ = writeln!(out, "        parameters={},", py_str_list(&params));
    }
    if !pipeline.config.volumes.is_empty() {
        let volumes: Vec<String> = pipeline
            .config
            .volumes
            .iter()
            .map(volume_literal)
            .collect();
        let _ = writeln!(out, "        volumes=[{}],", volumes.join(", "));
    }
    out.push_str("    )\n");

    for id in order {
        let step = pipeline.steps.get(id).expect("ordered ids come from steps");
        let after: Vec<&str> = step.dependencies.iter().map(String::as_str).collect();
        let mut line = format!(
            "    runner.add_step({}, step_{}, after={}",
            py_str(id),
            id,
            py_str_list(&after)
        );
        if !step.config.is_empty() {
            let _ = write!(line, ", config={}", step_config_literal(step));
        }
        line.push(')');
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str("    return runner.run()");
    out
}

fn step_config_literal(step: &Step) -> String {
    let mut entries: Vec<String> = Vec::new();
    if !step.config.annotations.is_empty() {
        entries.push(format!(
            "\"annotations\": {}",
            py_dict(&step.config.annotations)
        ));
    }
    if !step.config.labels.is_empty() {
        entries.push(format!("\"labels\": {}", py_dict(&step.config.labels)));
    }
    if !step.config.limits.is_empty() {
        entries.push(format!("\"limits\": {}", py_dict(&step.config.limits)));
    }
    if !step.config.raw_tags.is_empty() {
        let tags: Vec<&str> = step.config.raw_tags.iter().map(String::as_str).collect();
        entries.push(format!("\"tags\": {}", py_str_list(&tags)));
    }
    format!("{{{}}}", entries.join(", "))
}

fn volume_literal(volume: &VolumeConfig) -> String {
    let mut entries = vec![
        format!("\"name\": {}", py_str(&volume.name)),
        format!("\"type\": {}", py_str(&volume.kind)),
        format!("\"mount_point\": {}", py_str(&volume.mount_point)),
    ];
    if let Some(size) = &volume.size {
        entries.push(format!("\"size\": {}", py_str(size)));
    }
    if let Some(class) = &volume.storage_class_name {
        entries.push(format!("\"storage_class_name\": {}", py_str(class)));
    }
    format!("{{{}}}", entries.join(", "))
}

/// De-indent a source block and neutralize interactive-shell directives.
fn prepare_source(source: &str) -> String {
    analysis::comment_magic_commands(&analysis::dedent(source))
}

/// A Python string literal.
fn py_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn py_str_list(values: &[&str]) -> String {
    let items: Vec<String> = values.iter().map(|v| py_str(v)).collect();
    format!("[{}]", items.join(", "))
}

fn py_dict(map: &std::collections::BTreeMap<String, String>) -> String {
    let entries: Vec<String> = map
        .iter()
        .map(|(k, v)| format!("{}: {}", py_str(k), py_str(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}
