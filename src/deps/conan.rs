//! Conan 2 as the dependency manager.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::cache::TOOLCHAIN_DESCRIPTOR;
use crate::core::configuration::{CompilerId, Configuration};
use crate::core::platform::Platform;
use crate::deps::{DependencyManager, InstallOutcome, InstallRequest};
use crate::env::EnvironmentContext;
use crate::util::fs::ensure_dir;
use crate::util::process::{exit_code, ProcessBuilder};

/// Runs `conan install` into the workspace.
#[derive(Debug, Clone)]
pub struct Conan {
    executable: PathBuf,
    profiles_dir: PathBuf,
    explicit_profile: Option<String>,
}

impl Conan {
    /// `profiles_dir` holds the project's profiles, usually `<root>/conan-profiles`.
    pub fn new(executable: impl Into<PathBuf>, profiles_dir: impl Into<PathBuf>) -> Self {
        Conan {
            executable: executable.into(),
            profiles_dir: profiles_dir.into(),
            explicit_profile: None,
        }
    }

    /// Prefer this profile over the automatic choice when it exists.
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.explicit_profile = profile.filter(|p| !p.is_empty() && p != "default");
        self
    }

    /// The profile for a configuration, or `None` for Conan's default profile.
    pub fn select_profile(&self, config: &Configuration) -> Option<PathBuf> {
        if let Some(name) = &self.explicit_profile {
            let path = self.profiles_dir.join(name);
            if path.is_file() {
                tracing::debug!("Using profile {}", path.display());
                return Some(path);
            }
            tracing::warn!("Profile not found: {}; selecting one automatically", path.display());
        }

        let name = match (config.platform, config.compiler) {
            (Platform::Windows, CompilerId::MSVC) => "msvc-ninja",
            (Platform::Windows, CompilerId::CLANG_CL) => "clang-cl-windows",
            (Platform::Windows, CompilerId::CLANG) => "clang-windows",
            (Platform::Linux, CompilerId::CLANG) => "clang-native",
            _ => return None,
        };
        let path = self.profiles_dir.join(name);
        path.is_file().then_some(path)
    }

    /// `conan install <root> ... --output-folder <ws> --build=missing`
    pub fn install_command(&self, request: &InstallRequest<'_>, profile: Option<&Path>) -> ProcessBuilder {
        let config = request.config;
        let mut cmd = ProcessBuilder::new(&self.executable)
            .arg("install")
            .arg(request.source_root)
            .arg("-s")
            .arg(format!("build_type={}", config.build_type))
            .arg("-s")
            .arg("compiler.cppstd=23")
            .arg("-c")
            .arg(format!(
                "tools.cmake.cmaketoolchain:generator={}",
                config.generator.cmake_name()
            ));

        if let Some(profile) = profile {
            cmd = cmd.arg("-pr").arg(profile);
        }

        // Profiles describe clang-cl as plain clang
        if config.compiler == CompilerId::CLANG_CL {
            cmd = cmd
                .arg("-c")
                .arg("tools.build:compiler_executables={'c': 'clang-cl', 'cpp': 'clang-cl'}")
                .arg("-c")
                .arg("tools.microsoft.msbuild:vs_version=17");
        }

        cmd.arg("--output-folder")
            .arg(request.workspace_dir)
            .arg("--build=missing")
            .cwd(request.source_root)
    }

    fn detect_default_profile(&self, env: &EnvironmentContext) -> Result<i32> {
        let output = ProcessBuilder::new(&self.executable)
            .args(["profile", "detect", "--force"])
            .environment(env)
            .exec()
            .with_context(|| format!("failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            tracing::warn!(
                "conan profile detect failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(exit_code(&output.status))
    }
}

impl DependencyManager for Conan {
    fn name(&self) -> &str {
        "conan"
    }

    fn install(&self, request: &InstallRequest<'_>, env: &EnvironmentContext) -> Result<InstallOutcome> {
        let code = self.detect_default_profile(env)?;
        if code != 0 {
            return Ok(InstallOutcome::failed(code));
        }

        ensure_dir(request.workspace_dir)?;
        let profile = self.select_profile(request.config);
        match &profile {
            Some(path) => tracing::info!("Installing dependencies with profile {}", path.display()),
            None => tracing::info!("Installing dependencies with the default profile"),
        }

        let code = self
            .install_command(request, profile.as_deref())
            .environment(env)
            .run()
            .with_context(|| format!("failed to run {}", self.executable.display()))?;
        if code != 0 {
            return Ok(InstallOutcome::failed(code));
        }

        let descriptor = request.workspace_dir.join(TOOLCHAIN_DESCRIPTOR);
        if descriptor.is_file() {
            Ok(InstallOutcome::installed(descriptor))
        } else {
            tracing::warn!("conan install did not produce {}", TOOLCHAIN_DESCRIPTOR);
            Ok(InstallOutcome {
                success: true,
                exit_code: 0,
                toolchain_descriptor: None,
            })
        }
    }
}
