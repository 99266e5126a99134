//! Choosing which workspace to work on.

use anyhow::Result;

use crate::core::cache::{CachedConfig, ConfigurationStore};
use crate::core::workspace::Workspace;
use crate::util::prompt::Prompter;

/// What the user decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Build an already configured workspace as it is.
    Build(Workspace),
    /// Resolve a new configuration.
    ConfigureNew,
    /// Resolve again, seeded with the workspace's previous configuration.
    Reconfigure(Workspace, CachedConfig),
    /// The prompt was cancelled.
    Cancelled,
}

/// Presents configured workspaces and the configure actions.
///
/// Never touches the filesystem beyond reading a cache.
pub struct WorkspaceSelector<'a> {
    prompter: &'a dyn Prompter,
}

impl<'a> WorkspaceSelector<'a> {
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        WorkspaceSelector { prompter }
    }

    /// Pick a workspace or an action. `workspaces` are in canonical order.
    pub fn select(&self, workspaces: &[Workspace]) -> Result<Selection> {
        if workspaces.is_empty() {
            return Ok(Selection::ConfigureNew);
        }

        let default = most_recent(workspaces);
        let mut items: Vec<String> = workspaces.iter().map(workspace_label).collect();
        items.push("Configure new build".to_string());
        items.push("Reconfigure existing build".to_string());

        let Some(choice) = self.prompter.select("Select a build", &items, default)? else {
            return Ok(Selection::Cancelled);
        };

        if choice < workspaces.len() {
            return Ok(Selection::Build(workspaces[choice].clone()));
        }
        if choice == workspaces.len() {
            return Ok(Selection::ConfigureNew);
        }

        let items: Vec<String> = workspaces.iter().map(|w| w.key.to_string()).collect();
        let Some(choice) = self.prompter.select("Reconfigure which build?", &items, default)? else {
            return Ok(Selection::Cancelled);
        };
        let workspace = workspaces[choice].clone();
        let cached = ConfigurationStore::load(&workspace.dir)?.unwrap_or_default();
        Ok(Selection::Reconfigure(workspace, cached))
    }
}

fn workspace_label(workspace: &Workspace) -> String {
    format!(
        "Build {} ({})",
        workspace.key.build_type, workspace.key.platform
    )
}

/// Index of the most recently configured workspace. Ties keep the first.
fn most_recent(workspaces: &[Workspace]) -> usize {
    let mut best: Option<(usize, std::time::SystemTime)> = None;
    for (index, workspace) in workspaces.iter().enumerate() {
        if let Some(time) = workspace.last_configured() {
            if best.map_or(true, |(_, t)| time > t) {
                best = Some((index, time));
            }
        }
    }
    best.map_or(0, |(index, _)| index)
}
