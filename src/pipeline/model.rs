// src/pipeline/model.rs

//! The pipeline graph plus shared context.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::marshal::DEFAULT_DATA_DIR;
use crate::pipeline::step::{Step, StepConfig};

/// A volume attached to every step of the pipeline.
///
/// Volumes are pass-through configuration: the core records them and emits
/// them into the pipeline assembly, but mount/discovery policy lives with
/// the external orchestrator.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VolumeConfig {
    pub name: String,
    /// Volume kind, e.g. `pvc`.
    #[serde(rename = "type")]
    pub kind: String,
    pub mount_point: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub storage_class_name: Option<String>,
}

/// Pipeline-wide metadata and defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the compiled pipeline.
    pub pipeline_name: String,

    /// Optional human-readable description.
    pub description: Option<String>,

    /// Docker base image the generated steps run in.
    pub docker_image: Option<String>,

    /// Experiment the pipeline belongs to.
    pub experiment_name: Option<String>,

    /// Storage location the marshalling capability is pointed at.
    pub marshal_path: String,

    /// Volumes mounted into every step.
    pub volumes: Vec<VolumeConfig>,

    /// Defaults merged into every step's config after build.
    pub steps_defaults: StepConfig,

    /// Declared environment symbols (pipeline parameters).
    ///
    /// Free variables matching these names never need marshalling. The set
    /// is extended by `pipeline-parameters` cells during build.
    pub parameters: BTreeSet<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pipeline_name: "pipeline".to_string(),
            description: None,
            docker_image: None,
            experiment_name: None,
            marshal_path: DEFAULT_DATA_DIR.to_string(),
            volumes: Vec::new(),
            steps_defaults: StepConfig::default(),
            parameters: BTreeSet::new(),
        }
    }
}

/// The whole step graph plus shared context.
///
/// Created once per compilation run by the graph builder, annotated in
/// place by the ordering engine and the resolution pass, and consumed
/// read-only by the compiler. Steps are never removed after creation; a
/// failed validation aborts the run instead.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Steps keyed by id; iteration order is declaration order.
    pub steps: IndexMap<String, Step>,

    /// Pipeline-wide metadata.
    pub config: PipelineConfig,

    /// Code shared by all steps (cells outside any step tag), hoisted once.
    pub imports_and_functions: Vec<String>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            steps: IndexMap::new(),
            config,
            imports_and_functions: Vec::new(),
        }
    }

    /// The shared preamble: hoisted blocks concatenated in cell order.
    pub fn preamble(&self) -> String {
        self.imports_and_functions.join("\n")
    }
}
