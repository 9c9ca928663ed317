#![allow(dead_code)]

use nbdag::notebook::model::{Cell, Notebook};
use nbdag::pipeline::PipelineConfig;

/// Builder for [`Notebook`] cell documents to simplify test setup.
pub struct NotebookBuilder {
    pipeline: PipelineConfig,
    cells: Vec<Cell>,
}

impl NotebookBuilder {
    pub fn new() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            cells: Vec::new(),
        }
    }

    pub fn named(name: &str) -> Self {
        let mut builder = Self::new();
        builder.pipeline.pipeline_name = name.to_string();
        builder
    }

    /// Append a cell with the given tags and source.
    pub fn cell(mut self, tags: &[&str], source: &str) -> Self {
        self.cells.push(Cell {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            source: source.to_string(),
        });
        self
    }

    /// Append a step cell: `step:<name>` plus a `prev:` tag per predecessor.
    pub fn step(self, name: &str, prevs: &[&str], source: &str) -> Self {
        let mut tags = vec![format!("step:{name}")];
        for prev in prevs {
            tags.push(format!("prev:{prev}"));
        }
        let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
        self.cell(&tag_refs, source)
    }

    /// Append an untagged (preamble) cell.
    pub fn preamble(self, source: &str) -> Self {
        self.cell(&[], source)
    }

    pub fn docker_image(mut self, image: &str) -> Self {
        self.pipeline.docker_image = Some(image.to_string());
        self
    }

    pub fn parameter(mut self, name: &str) -> Self {
        self.pipeline.parameters.insert(name.to_string());
        self
    }

    pub fn build(self) -> Notebook {
        Notebook {
            pipeline: self.pipeline,
            cells: self.cells,
        }
    }
}

impl Default for NotebookBuilder {
    fn default() -> Self {
        Self::new()
    }
}
