//! High-level operations.
//!
//! This module contains the implementation of keel commands.

pub mod clean;
pub mod orchestrate;
pub mod select;
pub mod tools;

pub use clean::{clean, CleanTarget};
pub use orchestrate::{BuildOptions, BuildOrchestrator, Outcome, Phase};
pub use select::{Selection, WorkspaceSelector};
pub use tools::{docs, find_compile_commands, format, lint, ToolReport};
