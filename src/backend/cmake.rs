//! CMake as the build backend.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::backend::{BuildBackend, BuildInvocation, ConfigureInvocation};
use crate::env::EnvironmentContext;
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Runs `cmake` with inherited stdio.
#[derive(Debug, Clone)]
pub struct CMakeBackend {
    cmake: PathBuf,
}

impl CMakeBackend {
    pub fn new(cmake: impl Into<PathBuf>) -> Self {
        CMakeBackend { cmake: cmake.into() }
    }

    /// `cmake -S <src> -B <ws> -G <generator> ...`
    pub fn configure_command(&self, invocation: &ConfigureInvocation) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("-S")
            .arg(&invocation.source_root)
            .arg("-B")
            .arg(&invocation.workspace_dir)
            .arg("-G")
            .arg(invocation.generator.cmake_name());

        if let Some(toolset) = &invocation.toolset {
            cmd = cmd.arg("-T").arg(toolset);
        }
        if let Some(arch) = &invocation.architecture {
            cmd = cmd.arg("-A").arg(arch);
        }

        for (key, value) in &invocation.variables {
            cmd = cmd.arg(format!("-D{}={}", key, value));
        }

        cmd.args(&invocation.extra_args)
    }

    /// `cmake --build <ws> --parallel <jobs> --config <type>`
    pub fn build_command(&self, invocation: &BuildInvocation) -> ProcessBuilder {
        ProcessBuilder::new(&self.cmake)
            .arg("--build")
            .arg(&invocation.workspace_dir)
            .arg("--parallel")
            .arg(invocation.jobs.max(1).to_string())
            // Ignored by single-config generators
            .arg("--config")
            .arg(invocation.build_type.as_str())
    }
}

impl BuildBackend for CMakeBackend {
    fn configure(&self, invocation: &ConfigureInvocation, env: &EnvironmentContext) -> Result<i32> {
        ensure_dir(&invocation.workspace_dir)?;
        tracing::info!("Configuring {}", invocation.workspace_dir.display());

        self.configure_command(invocation)
            .environment(env)
            .run()
            .with_context(|| format!("failed to run {}", self.cmake.display()))
    }

    fn build(&self, invocation: &BuildInvocation, env: &EnvironmentContext) -> Result<i32> {
        tracing::info!("Building {}", invocation.workspace_dir.display());

        self.build_command(invocation)
            .environment(env)
            .run()
            .with_context(|| format!("failed to run {}", self.cmake.display()))
    }
}
