//! `keel build` command

use anyhow::Result;

use crate::cli::{BuildArgs, GlobalOptions};
use keel::ops::BuildOptions;
use keel::util::prompt::default_prompter;
use keel::ProjectContext;

pub fn execute(args: BuildArgs, global: &GlobalOptions) -> Result<()> {
    let project = ProjectContext::discover(global.project_dir.as_deref())?;
    let shell = global.shell();
    let prompter = default_prompter(args.config.no_interactive);

    let options = BuildOptions {
        request: args.config.request(),
        jobs: args.jobs,
        clean: args.clean,
        configure_only: false,
        skip_configure: args.skip_configure,
        cmake_args: args.config.cmake_args()?,
        profile: args.config.profile.clone(),
        format: args.format,
        lint: args.lint,
        docs: args.docs,
    };

    super::orchestrate(&project, &shell, prompter.as_ref(), &options)
}
