// src/notebook/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::Result;
use crate::notebook::model::Notebook;

/// Load a cell document from a given path.
///
/// This only performs JSON deserialization; the tagging grammar and graph
/// shape are validated by the graph builder.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Notebook> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), "loading cell document");
    load_from_str(&contents)
}

/// Deserialize a cell document from a JSON string.
pub fn load_from_str(contents: &str) -> Result<Notebook> {
    let notebook: Notebook = serde_json::from_str(contents)?;
    Ok(notebook)
}
