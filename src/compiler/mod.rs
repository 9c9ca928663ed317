// src/compiler/mod.rs

//! Code generation: resolved pipeline → executable pipeline source.

pub mod codegen;

pub use codegen::compile;
