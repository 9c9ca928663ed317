// src/notebook/model.rs

use serde::Deserialize;

use crate::pipeline::PipelineConfig;

/// A single tagged cell record, as supplied by the notebook reader.
#[derive(Debug, Clone, Deserialize)]
pub struct Cell {
    /// Declared tag strings, in declaration order (e.g. `"step:train"`,
    /// `"prev:load"`, `"skip"`).
    #[serde(default)]
    pub tags: Vec<String>,

    /// The cell's source text.
    #[serde(default)]
    pub source: String,
}

/// The whole input document: pipeline-wide configuration plus the ordered
/// cell records.
///
/// ```json
/// {
///   "pipeline": { "pipeline_name": "my-pipeline" },
///   "cells": [
///     { "tags": ["step:a"], "source": "x = 1" },
///     { "tags": ["step:b", "prev:a"], "source": "y = x + 1" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    /// Pipeline-wide metadata and defaults.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Ordered cell records; order is the notebook's cell order.
    #[serde(default)]
    pub cells: Vec<Cell>,
}
