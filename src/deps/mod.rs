//! The external dependency manager.
//!
//! When enabled, dependencies are installed into the workspace before it
//! is configured. The install leaves a toolchain descriptor that is handed
//! to CMake, and an environment script that is imported best-effort.

pub mod conan;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::cache::TOOLCHAIN_DESCRIPTOR;
use crate::core::configuration::Configuration;
use crate::core::platform::Platform;
use crate::env::EnvironmentContext;

pub use conan::Conan;

/// What to install and where.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    pub source_root: &'a Path,
    pub workspace_dir: &'a Path,
    pub config: &'a Configuration,
}

/// Result of an install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub success: bool,
    pub exit_code: i32,
    /// `conan_toolchain.cmake`, when the install produced one.
    pub toolchain_descriptor: Option<PathBuf>,
}

impl InstallOutcome {
    pub fn installed(toolchain_descriptor: impl Into<PathBuf>) -> Self {
        InstallOutcome {
            success: true,
            exit_code: 0,
            toolchain_descriptor: Some(toolchain_descriptor.into()),
        }
    }

    pub fn failed(exit_code: i32) -> Self {
        InstallOutcome {
            success: false,
            exit_code,
            toolchain_descriptor: None,
        }
    }
}

/// Installs third-party dependencies into a workspace.
pub trait DependencyManager {
    /// Tool name used in messages.
    fn name(&self) -> &str;

    fn install(&self, request: &InstallRequest<'_>, env: &EnvironmentContext) -> Result<InstallOutcome>;

    /// The toolchain descriptor left by a previous install.
    fn existing_descriptor(&self, workspace_dir: &Path) -> Option<PathBuf> {
        let descriptor = workspace_dir.join(TOOLCHAIN_DESCRIPTOR);
        descriptor.is_file().then_some(descriptor)
    }

    /// The environment script left by a previous install.
    fn environment_script(&self, workspace_dir: &Path, platform: Platform) -> Option<PathBuf> {
        let name = if platform.is_windows() {
            "conanbuild.bat"
        } else {
            "conanbuild.sh"
        };
        let script = workspace_dir.join(name);
        script.is_file().then_some(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingDependencyManager;
    use tempfile::TempDir;

    #[test]
    fn test_default_descriptor_lookup() {
        let tmp = TempDir::new().unwrap();
        let manager = RecordingDependencyManager::new();
        assert_eq!(manager.existing_descriptor(tmp.path()), None);
        assert_eq!(manager.environment_script(tmp.path(), Platform::Linux), None);

        std::fs::write(tmp.path().join(TOOLCHAIN_DESCRIPTOR), "").unwrap();
        std::fs::write(tmp.path().join("conanbuild.sh"), "").unwrap();
        assert_eq!(
            manager.existing_descriptor(tmp.path()),
            Some(tmp.path().join(TOOLCHAIN_DESCRIPTOR))
        );
        assert_eq!(
            manager.environment_script(tmp.path(), Platform::Linux),
            Some(tmp.path().join("conanbuild.sh"))
        );
        assert_eq!(manager.environment_script(tmp.path(), Platform::Windows), None);
    }
}
