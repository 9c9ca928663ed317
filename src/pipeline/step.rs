// src/pipeline/step.rs

//! A pipeline step and its execution configuration.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;

/// Execution parameters attached to a step.
///
/// The core treats these as opaque pass-through data: they are merged from
/// pipeline-level defaults, extended by `limit:`/`label:`/`annotation:` tags
/// and emitted verbatim into the generated pipeline definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StepConfig {
    /// Kubernetes-style labels (`label:<k>:<v>` tags).
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Annotations (`annotation:<k>:<v>` tags).
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    /// Resource limits (`limit:<k>:<v>` tags).
    #[serde(default)]
    pub limits: BTreeMap<String, String>,

    /// Unrecognised tags, passed through without interpretation.
    #[serde(default)]
    pub raw_tags: Vec<String>,
}

impl StepConfig {
    /// Merge pipeline-wide defaults into this config.
    ///
    /// Step-local entries win over defaults; default raw tags are appended
    /// after the step's own.
    pub fn apply_defaults(&mut self, defaults: &StepConfig) {
        for (k, v) in &defaults.labels {
            self.labels.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (k, v) in &defaults.annotations {
            self.annotations.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (k, v) in &defaults.limits {
            self.limits.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for tag in &defaults.raw_tags {
            if !self.raw_tags.contains(tag) {
                self.raw_tags.push(tag.clone());
            }
        }
    }

    /// Whether there is nothing to emit for this config.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
            && self.annotations.is_empty()
            && self.limits.is_empty()
            && self.raw_tags.is_empty()
    }
}

/// A unit of pipeline work, merged from one or more contiguous tagged cells.
#[derive(Debug, Clone)]
pub struct Step {
    /// Stable identifier, unique within a pipeline.
    pub id: String,

    /// Ordered source blocks from the originating cells, in cell order.
    pub source: Vec<String>,

    /// Direct predecessors, in declaration order.
    ///
    /// Invariant: never contains `id` itself; the relation over all steps is
    /// checked for acyclicity by the ordering engine.
    pub dependencies: Vec<String>,

    /// Artifact names this step must receive from ancestors.
    ///
    /// Computed by the resolution pass, not declared.
    pub ins: BTreeSet<String>,

    /// Artifact names this step must produce for descendants.
    pub outs: BTreeSet<String>,

    /// Execution parameters (opaque to the core).
    pub config: StepConfig,
}

impl Step {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: Vec::new(),
            dependencies: Vec::new(),
            ins: BTreeSet::new(),
            outs: BTreeSet::new(),
            config: StepConfig::default(),
        }
    }

    /// The step's merged source: cell blocks concatenated in cell order.
    pub fn merged_source(&self) -> String {
        self.source.join("\n")
    }

    /// Append a predecessor, preserving declaration order and ignoring
    /// duplicates.
    pub fn add_dependency(&mut self, dep: impl Into<String>) {
        let dep = dep.into();
        if !self.dependencies.contains(&dep) {
            self.dependencies.push(dep);
        }
    }
}
