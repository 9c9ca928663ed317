// src/pipeline/mod.rs

//! The pipeline object model: steps, per-step configuration and the
//! pipeline-wide context shared by every compilation stage.

pub mod model;
pub mod step;

pub use model::{Pipeline, PipelineConfig, VolumeConfig};
pub use step::{Step, StepConfig};
