//! Core data model: platforms, configurations, workspaces and cached state.

pub mod cache;
pub mod configuration;
pub mod platform;
pub mod workspace;

pub use cache::{CachedConfig, ConfigurationStore};
pub use configuration::{
    BackendKind, BuildType, CompilerFamily, CompilerId, CompilerVariant, Configuration, Field,
    Generator, GeneratorRequest, ModuleFlags, ValidationError, VsVersion,
};
pub use platform::Platform;
pub use workspace::{Workspace, WorkspaceKey};
