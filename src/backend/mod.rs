//! The external build backend.
//!
//! Compilation is delegated to CMake. The orchestrator only talks to it
//! through [`BuildBackend`], and the backend's exit code is handed back
//! untouched.

pub mod cmake;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::configuration::{BuildType, CompilerId, Generator};
use crate::env::EnvironmentContext;

pub use cmake::CMakeBackend;

/// Everything needed to configure a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureInvocation {
    pub source_root: PathBuf,
    pub workspace_dir: PathBuf,
    pub generator: Generator,
    /// `-T` for Visual Studio generators.
    pub toolset: Option<String>,
    /// `-A` for Visual Studio generators.
    pub architecture: Option<String>,
    /// Cache variables, passed as `-D<key>=<value>`.
    pub variables: BTreeMap<String, String>,
    /// Passed through after everything else.
    pub extra_args: Vec<String>,
}

impl ConfigureInvocation {
    pub fn new(source_root: impl Into<PathBuf>, workspace_dir: impl Into<PathBuf>, generator: Generator) -> Self {
        ConfigureInvocation {
            source_root: source_root.into(),
            workspace_dir: workspace_dir.into(),
            generator,
            toolset: None,
            architecture: None,
            variables: BTreeMap::new(),
            extra_args: Vec::new(),
        }
    }

    /// Set the Visual Studio toolset and platform for a compiler.
    pub fn for_compiler(mut self, compiler: CompilerId) -> Self {
        if self.generator.is_visual_studio() {
            self.architecture = Some("x64".to_string());
            if compiler == CompilerId::CLANG_CL {
                self.toolset = Some("ClangCL".to_string());
            }
        }
        self
    }

    pub fn variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn extra_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Everything needed to build a configured workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    pub workspace_dir: PathBuf,
    pub build_type: BuildType,
    pub jobs: usize,
}

/// Configures and builds a workspace.
///
/// Both operations return the backend's exit code. `Err` is reserved for
/// failing to run the backend at all.
pub trait BuildBackend {
    fn configure(&self, invocation: &ConfigureInvocation, env: &EnvironmentContext) -> Result<i32>;

    fn build(&self, invocation: &BuildInvocation, env: &EnvironmentContext) -> Result<i32>;
}

/// Default parallelism: one job per available CPU.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
