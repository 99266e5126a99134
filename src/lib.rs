//! keel - A build bootstrapper for CMake projects
//!
//! This crate provides the core library functionality for keel: toolchain
//! detection, configuration resolution, vendor environment bootstrap and
//! build orchestration over CMake and Conan.

pub mod backend;
pub mod core;
pub mod deps;
pub mod env;
pub mod ops;
pub mod resolver;
pub mod toolchain;
pub mod util;

/// Test utilities and mocks for keel unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a mock host, scripted prompts and recording
/// build backends.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildType, Configuration, Platform, Workspace, WorkspaceKey};
pub use resolver::{ConfigRequest, ConfigureError, Resolution};
pub use util::context::ProjectContext;
