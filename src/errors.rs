// src/errors.rs

//! Crate-wide error types.
//!
//! Every stage of the compilation pipeline reports failures through
//! [`NbdagError`]. An error from an earlier stage aborts the whole run;
//! no partial pipeline is ever handed to a later stage.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NbdagError {
    /// A step's merged source does not parse as Python.
    #[error("Syntax error in step '{step}': {reason}")]
    SourceSyntax { step: String, reason: String },

    /// Malformed tagging: orphan cell, unknown or forward `prev` reference,
    /// duplicate step name, invalid step identifier.
    #[error("Invalid pipeline definition: {0}")]
    GraphDefinition(String),

    /// The declared/inferred dependency relation contains a cycle.
    #[error("Cycle detected in step graph: {}", members.join(" -> "))]
    CyclicGraph { members: Vec<String> },

    /// A free variable has no producing ancestor and no global binding.
    #[error(
        "Step '{step}' uses variable '{name}', but no ancestor step produces it \
         and it is not defined globally"
    )]
    UnresolvedDependency { step: String, name: String },

    /// No registered marshalling backend can handle a value.
    #[error("Marshalling error: {0}")]
    Marshal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cell document parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, NbdagError>;
