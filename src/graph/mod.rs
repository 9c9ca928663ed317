// src/graph/mod.rs

//! Step graph construction, ordering and artifact resolution.
//!
//! Data flow: tagged cells → [`builder::build`] (unvalidated graph) →
//! [`ordering::DependencyGraph`] (acyclicity + deterministic order) →
//! [`resolve::resolve`] (free variables bound to producing ancestors).
//! Each stage is a pure transform over the previous stage's output; a
//! failure in any stage aborts the whole run.

pub mod builder;
pub mod ordering;
pub mod resolve;

pub use builder::build;
pub use ordering::DependencyGraph;
pub use resolve::resolve;
