//! `keel workspaces` command

use anyhow::Result;

use crate::cli::GlobalOptions;
use keel::core::cache::ConfigurationStore;
use keel::core::workspace::enumerate;
use keel::util::diagnostic::suggestions;
use keel::ProjectContext;

pub fn execute(global: &GlobalOptions) -> Result<()> {
    let project = ProjectContext::discover(global.project_dir.as_deref())?;
    let workspaces = enumerate(project.root())?;

    if workspaces.is_empty() {
        global.shell().note(format!("No configured workspaces. {}", suggestions::NO_WORKSPACE));
        return Ok(());
    }

    for workspace in &workspaces {
        let cached = ConfigurationStore::load(&workspace.dir)?.unwrap_or_default();
        let generator = cached
            .generator()
            .map(|g| g.to_string())
            .unwrap_or_else(|| "?".to_string());
        let compiler = cached
            .compiler()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "?".to_string());
        let relative = workspace
            .dir
            .strip_prefix(project.root())
            .unwrap_or(&workspace.dir);

        println!(
            "{:<24} {:<10} {:<16} {}",
            workspace.key.to_string(),
            compiler,
            generator,
            relative.display()
        );
    }

    Ok(())
}
