//! Removing workspaces.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::workspace::{Workspace, WorkspaceKey, BUILD_ROOT};
use crate::util::fs::{prune_empty_parents, remove_dir_all_if_exists};

/// What to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanTarget {
    /// One workspace.
    Workspace(WorkspaceKey),
    /// The whole build root.
    All,
}

/// Remove a workspace or the whole build root.
///
/// Returns the removed directory, or `None` when there was nothing to remove.
pub fn clean(project_root: &Path, target: CleanTarget) -> Result<Option<PathBuf>> {
    let build_root = project_root.join(BUILD_ROOT);

    let dir = match target {
        CleanTarget::All => build_root.clone(),
        CleanTarget::Workspace(key) => Workspace::new(project_root, key).dir,
    };

    if !remove_dir_all_if_exists(&dir)? {
        tracing::debug!("Nothing to clean at {}", dir.display());
        return Ok(None);
    }
    tracing::debug!("Removed {}", dir.display());

    // build/<type> stays only while it holds another platform
    if let Some(parent) = dir.parent() {
        prune_empty_parents(parent, &build_root)?;
    }
    Ok(Some(dir))
}

/// Remove a workspace's contents before it is configured again.
pub fn clean_workspace(workspace: &Workspace) -> Result<bool> {
    remove_dir_all_if_exists(&workspace.dir)
}
