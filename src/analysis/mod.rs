// src/analysis/mod.rs

//! Static analysis over cell source blocks.
//!
//! The analyzer is a pure function over text: it parses a block and reports
//! which names the block reads before binding them locally (free variables)
//! and which names it binds at the top level. It never executes anything;
//! referencing an undefined name is exactly the signal being extracted.

pub mod builtins;
pub mod free_vars;
pub mod magics;

pub use free_vars::{analyze_block, BlockAnalysis};
pub use magics::{comment_magic_commands, dedent};
