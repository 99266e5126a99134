//! `keel configure` command

use anyhow::Result;

use crate::cli::{ConfigureArgs, GlobalOptions};
use keel::ops::BuildOptions;
use keel::util::prompt::default_prompter;
use keel::ProjectContext;

pub fn execute(args: ConfigureArgs, global: &GlobalOptions) -> Result<()> {
    let project = ProjectContext::discover(global.project_dir.as_deref())?;
    let shell = global.shell();
    let prompter = default_prompter(args.config.no_interactive);

    let options = BuildOptions {
        request: args.config.request(),
        clean: args.clean,
        configure_only: true,
        cmake_args: args.config.cmake_args()?,
        profile: args.config.profile.clone(),
        ..BuildOptions::default()
    };

    super::orchestrate(&project, &shell, prompter.as_ref(), &options)
}
