//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod configure;
pub mod toolchain;
pub mod workspaces;

use anyhow::Result;

use keel::ops::{BuildOptions, BuildOrchestrator, Outcome};
use keel::util::host::RealHost;
use keel::util::prompt::Prompter;
use keel::util::shell::Shell;
use keel::ProjectContext;

/// Run the build pipeline on the real host.
fn orchestrate(
    project: &ProjectContext,
    shell: &Shell,
    prompter: &dyn Prompter,
    options: &BuildOptions,
) -> Result<()> {
    let host = RealHost;
    let mut orchestrator = BuildOrchestrator::new(project, &host, prompter, shell);

    match orchestrator.run(options)? {
        Outcome::Built(workspace) | Outcome::Configured(workspace) => {
            tracing::debug!("Workspace: {}", workspace.dir.display());
        }
        Outcome::Cancelled => shell.note("Cancelled; nothing was changed"),
    }
    tracing::debug!("Phases: {:?}", orchestrator.trace());
    Ok(())
}
