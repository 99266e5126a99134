//! Project context for keel operations.
//!
//! Provides centralized access to the project root, its configuration and
//! the paths derived from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::workspace::BUILD_ROOT;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Top-level build description that marks a project root.
pub const PROJECT_MARKER: &str = "CMakeLists.txt";

/// Context shared by every command: where the project is and how it is
/// configured.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    cwd: PathBuf,
    root: PathBuf,
    config: Config,
}

impl ProjectContext {
    /// Discover the project from the current directory.
    ///
    /// `explicit_root` (from `--project-dir` or `KEEL_PROJECT_DIR`) wins.
    pub fn discover(explicit_root: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::discover_from(cwd, explicit_root, global_config_path().as_deref())
    }

    /// Discover the project starting at `cwd`.
    pub fn discover_from(cwd: PathBuf, explicit_root: Option<&Path>, global_config: Option<&Path>) -> Result<Self> {
        let root = match explicit_root {
            Some(root) => {
                let root = if root.is_absolute() {
                    root.to_path_buf()
                } else {
                    cwd.join(root)
                };
                if !root.is_dir() {
                    anyhow::bail!("project directory does not exist: {}", root.display());
                }
                root
            }
            None => find_project_root(&cwd),
        };

        let config = load_config(global_config, &project_config_path(&root));
        tracing::debug!("Project root: {}", root.display());

        Ok(ProjectContext { cwd, root, config })
    }

    /// A context with a fixed root and configuration.
    pub fn new(root: PathBuf, config: Config) -> Self {
        ProjectContext {
            cwd: root.clone(),
            root,
            config,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The project root: the CMake source directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The directory holding every workspace.
    pub fn build_root(&self) -> PathBuf {
        self.root.join(BUILD_ROOT)
    }

    /// The configured Conan profiles directory.
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join(self.config.profiles_dir())
    }
}

/// The nearest ancestor of `start` holding `.keel/config.toml`, else the
/// nearest holding `CMakeLists.txt`, else `start` itself.
pub fn find_project_root(start: &Path) -> PathBuf {
    let ancestor_with = |marker: &dyn Fn(&Path) -> bool| {
        start.ancestors().find(|dir| marker(dir)).map(Path::to_path_buf)
    };

    ancestor_with(&|dir| project_config_path(dir).is_file())
        .or_else(|| ancestor_with(&|dir| dir.join(PROJECT_MARKER).is_file()))
        .unwrap_or_else(|| start.to_path_buf())
}
