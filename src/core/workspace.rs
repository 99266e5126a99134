//! Build workspaces: one configured build directory per build type and platform.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

use crate::core::configuration::BuildType;
use crate::core::platform::Platform;

/// Directory under the project root holding all workspaces.
pub const BUILD_ROOT: &str = "build";

/// File whose presence marks a workspace as configured.
pub const CACHE_MARKER: &str = "CMakeCache.txt";

/// Identity of a workspace. Orders by build type, then platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkspaceKey {
    pub build_type: BuildType,
    pub platform: Platform,
}

impl WorkspaceKey {
    pub fn new(build_type: BuildType, platform: Platform) -> Self {
        WorkspaceKey {
            build_type,
            platform,
        }
    }

    /// `build/<type>/<platform>` relative to the project root.
    pub fn relative_dir(&self) -> PathBuf {
        Path::new(BUILD_ROOT)
            .join(self.build_type.dir_name())
            .join(self.platform.as_str())
    }
}

impl fmt::Display for WorkspaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.build_type.dir_name(), self.platform)
    }
}

/// A build directory, configured or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub key: WorkspaceKey,
    pub dir: PathBuf,
}

impl Workspace {
    pub fn new(project_root: &Path, key: WorkspaceKey) -> Self {
        Workspace {
            key,
            dir: project_root.join(key.relative_dir()),
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.join(CACHE_MARKER)
    }

    pub fn is_configured(&self) -> bool {
        self.cache_path().is_file()
    }

    /// Modification time of the cache marker.
    pub fn last_configured(&self) -> Option<SystemTime> {
        fs::metadata(self.cache_path()).and_then(|m| m.modified()).ok()
    }
}

/// List configured workspaces under `<project_root>/build`, in canonical order.
///
/// Directories whose names are not a known build type or platform are
/// ignored, as are workspaces without a cache marker.
pub fn enumerate(project_root: &Path) -> Result<Vec<Workspace>> {
    let build_root = project_root.join(BUILD_ROOT);
    if !build_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut workspaces = Vec::new();

    for type_entry in fs::read_dir(&build_root)
        .with_context(|| format!("failed to read directory: {}", build_root.display()))?
    {
        let type_entry = type_entry?;
        let Ok(build_type) = type_entry.file_name().to_string_lossy().parse::<BuildType>() else {
            continue;
        };
        if !type_entry.file_type()?.is_dir() {
            continue;
        }

        for platform_entry in fs::read_dir(type_entry.path())? {
            let platform_entry = platform_entry?;
            let Ok(platform) = platform_entry.file_name().to_string_lossy().parse::<Platform>() else {
                continue;
            };

            let workspace = Workspace::new(project_root, WorkspaceKey::new(build_type, platform));
            // `darwin` and `macos` would both map to the same key
            if workspace.dir != platform_entry.path() {
                continue;
            }
            if workspace.is_configured() {
                workspaces.push(workspace);
            }
        }
    }

    workspaces.sort_by_key(|w| w.key);
    Ok(workspaces)
}
