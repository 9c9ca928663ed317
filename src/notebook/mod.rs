// src/notebook/mod.rs

//! Input adapter: tagged cell records and the tag grammar.
//!
//! Notebook-container parsing is out of scope; an external reader supplies
//! an ordered list of `(tags, source)` records, serialized as a JSON
//! document (see [`model::Notebook`]).

pub mod loader;
pub mod model;
pub mod tags;

pub use loader::{load_from_path, load_from_str};
pub use model::{Cell, Notebook};
pub use tags::{CellTags, ReservedCell};
