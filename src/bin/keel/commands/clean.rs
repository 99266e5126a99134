//! `keel clean` command

use anyhow::Result;

use crate::cli::{CleanArgs, GlobalOptions};
use keel::ops::{clean, CleanTarget};
use keel::util::shell::Status;
use keel::{Platform, ProjectContext, WorkspaceKey};

pub fn execute(args: CleanArgs, global: &GlobalOptions) -> Result<()> {
    let project = ProjectContext::discover(global.project_dir.as_deref())?;
    let shell = global.shell();

    let target = match args.build_type {
        Some(build_type) if !args.all => {
            let platform = args.platform.unwrap_or_else(Platform::host);
            CleanTarget::Workspace(WorkspaceKey::new(build_type, platform))
        }
        _ => CleanTarget::All,
    };

    match clean(project.root(), target)? {
        Some(dir) => shell.status(Status::Removed, dir.display()),
        None => shell.note("Nothing to clean"),
    }

    Ok(())
}
