//! The build pipeline.
//!
//! ```text
//! SelectingWorkspace -> Resolving -> Bootstrapping -> Building -> Done
//!                                                              \-> Failed
//! ```
//!
//! Selection is skipped when the configuration was given explicitly.
//! Nothing on disk is touched until resolution has succeeded, so a
//! rejected configuration leaves every workspace as it was.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;

use crate::backend::{default_jobs, BuildBackend, BuildInvocation, CMakeBackend, ConfigureInvocation};
use crate::core::cache::{CachedConfig, ConfigurationStore};
use crate::core::workspace::{self, Workspace, WorkspaceKey};
use crate::deps::{Conan, DependencyManager, InstallRequest};
use crate::env::{BootstrapSpec, Bootstrapper, EnvironmentContext, ImportPolicy};
use crate::ops::clean::clean_workspace;
use crate::ops::select::{Selection, WorkspaceSelector};
use crate::ops::tools::{self, ToolReport};
use crate::resolver::{ConfigRequest, ConfigurationResolver, ConfigureError, Resolution};
use crate::toolchain::ToolchainDetector;
use crate::util::context::ProjectContext;
use crate::util::host::Host;
use crate::util::prompt::{NonInteractivePrompter, Prompter};
use crate::util::shell::{format_duration, Shell, Status};

/// Pipeline phases, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SelectingWorkspace,
    Resolving,
    Bootstrapping,
    Building,
    Done,
    Failed,
}

/// Options for a build or configure run.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Explicit configuration values.
    pub request: ConfigRequest,

    /// Parallel jobs (default: config file, then CPU count)
    pub jobs: Option<usize>,

    /// Remove the workspace before configuring
    pub clean: bool,

    /// Stop after configuring
    pub configure_only: bool,

    /// Don't reconfigure a workspace that is already configured
    pub skip_configure: bool,

    /// Extra arguments for the configure step
    pub cmake_args: Vec<String>,

    /// Conan profile name, overriding the config file
    pub profile: Option<String>,

    /// Run clang-format before building (fatal on failure)
    pub format: bool,

    /// Run clang-tidy after building
    pub lint: bool,

    /// Run doxygen after building
    pub docs: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Built(Workspace),
    Configured(Workspace),
    /// Cancelled at workspace selection. Not an error.
    Cancelled,
}

/// Where resolution starts from.
struct Start {
    selected: Option<Workspace>,
    cached: Option<CachedConfig>,
    /// Building an existing workspace as it is.
    existing: bool,
}

/// Drives one run from workspace selection to the finished build.
pub struct BuildOrchestrator<'a> {
    project: &'a ProjectContext,
    host: &'a dyn Host,
    prompter: &'a dyn Prompter,
    shell: &'a Shell,
    env: EnvironmentContext,
    backend: Option<&'a dyn BuildBackend>,
    dependency_manager: Option<&'a dyn DependencyManager>,
    trace: Vec<Phase>,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        project: &'a ProjectContext,
        host: &'a dyn Host,
        prompter: &'a dyn Prompter,
        shell: &'a Shell,
    ) -> Self {
        BuildOrchestrator {
            project,
            host,
            prompter,
            shell,
            env: EnvironmentContext::capture(),
            backend: None,
            dependency_manager: None,
            trace: Vec::new(),
        }
    }

    /// Start from this environment instead of the process environment.
    pub fn with_environment(mut self, env: EnvironmentContext) -> Self {
        self.env = env;
        self
    }

    /// Use this backend instead of the detected `cmake`.
    pub fn with_backend(mut self, backend: &'a dyn BuildBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use this dependency manager instead of the detected Conan.
    pub fn with_dependency_manager(mut self, manager: &'a dyn DependencyManager) -> Self {
        self.dependency_manager = Some(manager);
        self
    }

    /// Phases entered so far.
    pub fn trace(&self) -> &[Phase] {
        &self.trace
    }

    pub fn run(&mut self, options: &BuildOptions) -> Result<Outcome, ConfigureError> {
        let result = self.execute(options);
        match &result {
            Ok(Outcome::Cancelled) => {}
            Ok(_) => self.enter(Phase::Done),
            Err(_) => self.enter(Phase::Failed),
        }
        result
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!("Entering {:?}", phase);
        self.trace.push(phase);
    }

    fn execute(&mut self, options: &BuildOptions) -> Result<Outcome, ConfigureError> {
        if options.format {
            self.format()?;
        }

        let mut request = options.request.clone();
        let start = if request.has_explicit_config() || options.clean {
            Start {
                selected: None,
                cached: self.cached_for(&request)?,
                existing: false,
            }
        } else {
            self.enter(Phase::SelectingWorkspace);
            let workspaces = workspace::enumerate(self.project.root())?;
            match WorkspaceSelector::new(self.prompter).select(&workspaces)? {
                Selection::Cancelled => return Ok(Outcome::Cancelled),
                Selection::ConfigureNew => Start {
                    selected: None,
                    cached: None,
                    existing: false,
                },
                Selection::Build(ws) => Start {
                    cached: ConfigurationStore::load(&ws.dir)?,
                    selected: Some(ws),
                    existing: true,
                },
                Selection::Reconfigure(ws, cached) => Start {
                    selected: Some(ws),
                    cached: Some(cached),
                    existing: false,
                },
            }
        };

        if let Some(selected) = &start.selected {
            // The selected key names the workspace; only its contents are resolved
            request.platform = Some(selected.key.platform);
            request.build_type = Some(selected.key.build_type);
            self.shell.status(Status::Selected, selected.key);
        }

        // Existing workspaces build from their cache without asking anything
        let prompter: &dyn Prompter = if start.existing {
            &NonInteractivePrompter
        } else {
            self.prompter
        };

        self.enter(Phase::Resolving);
        let detector = ToolchainDetector::new(self.host);
        let resolution = {
            let _spinner = if prompter.is_interactive() {
                self.shell.status(Status::Detecting, "toolchains");
                None
            } else {
                Some(self.shell.spinner(Status::Detecting, "toolchains"))
            };
            ConfigurationResolver::new(&detector, prompter, &self.env, self.project.config().option_prefix())
                .resolve(&request, start.cached.as_ref())?
        };
        let config = resolution.config.clone();
        self.shell.note(format!(
            "{} {} with {} ({})",
            config.build_type,
            config.platform,
            resolution.compiler.describe(),
            config.generator
        ));

        let mut env = if config.platform == self.env.platform() {
            self.env.clone()
        } else {
            self.env.for_platform(config.platform)
        };

        let cmake_backend;
        let backend: &dyn BuildBackend = match self.backend {
            Some(backend) => backend,
            None => {
                let cmake = detector.locate_cmake(config.platform, &env).ok_or_else(|| {
                    anyhow!("cmake was not found on PATH or in a Visual Studio installation")
                })?;
                cmake_backend = CMakeBackend::new(cmake);
                &cmake_backend
            }
        };

        let workspace = Workspace::new(self.project.root(), config.workspace_key());
        if self.should_clean(options, &resolution, &workspace, prompter)? && clean_workspace(&workspace)? {
            self.shell.status(Status::Removed, workspace.dir.display());
        }

        if resolution.needs_bootstrap || (config.dependency_manager && resolution.compiler.requires_bootstrap) {
            env = self.bootstrap(&resolution, env)?;
        }

        self.enter(Phase::Building);
        let toolchain_file = if config.dependency_manager {
            self.install_dependencies(&resolution, &workspace, options, prompter, &mut env)?
        } else {
            None
        };

        let configured = workspace.is_configured();
        if !configured && options.skip_configure {
            self.shell.warn(format!("{} is not configured yet; configuring it", workspace.key));
        }
        if !configured || !(start.existing || options.skip_configure) {
            let mut extra_args = self.project.config().build.extra_cmake_args.clone();
            extra_args.extend(options.cmake_args.iter().cloned());
            let invocation = ConfigureInvocation::new(self.project.root(), &workspace.dir, config.generator)
                .for_compiler(config.compiler)
                .variables(resolution.cache_variables(
                    self.project.config().option_prefix(),
                    toolchain_file.as_deref(),
                ))
                .extra_args(extra_args);

            self.shell.status(Status::Configuring, workspace.key);
            let code = backend.configure(&invocation, &env)?;
            if code != 0 {
                return Err(ConfigureError::Subprocess {
                    tool: "cmake".to_string(),
                    code,
                });
            }
        }

        if options.configure_only {
            self.shell.status(Status::Finished, format!("configured {}", workspace.dir.display()));
            return Ok(Outcome::Configured(workspace));
        }

        let jobs = options
            .jobs
            .or(self.project.config().build.jobs)
            .unwrap_or_else(default_jobs);
        let invocation = BuildInvocation {
            workspace_dir: workspace.dir.clone(),
            build_type: config.build_type,
            jobs,
        };

        self.shell.status(Status::Building, format!("{} ({} jobs)", workspace.key, jobs));
        let started = Instant::now();
        let code = backend.build(&invocation, &env)?;
        if code != 0 {
            return Err(ConfigureError::Subprocess {
                tool: "cmake".to_string(),
                code,
            });
        }
        self.shell.status(
            Status::Finished,
            format!("{} in {}", workspace.key, format_duration(started.elapsed())),
        );

        if options.lint {
            self.post_step(tools::lint(self.project, self.host, &env, &workspace.dir));
        }
        if options.docs {
            self.post_step(tools::docs(self.project, self.host, &env));
        }

        Ok(Outcome::Built(workspace))
    }

    /// The cache of the workspace an explicit request points at, if any.
    fn cached_for(&self, request: &ConfigRequest) -> Result<Option<CachedConfig>, ConfigureError> {
        let Some(build_type) = request.build_type else {
            return Ok(None);
        };
        let platform = request.platform.unwrap_or(self.env.platform());
        let workspace = Workspace::new(self.project.root(), WorkspaceKey::new(build_type, platform));
        Ok(ConfigurationStore::load(&workspace.dir)?)
    }

    fn should_clean(
        &self,
        options: &BuildOptions,
        resolution: &Resolution,
        workspace: &Workspace,
        prompter: &dyn Prompter,
    ) -> Result<bool, ConfigureError> {
        if options.clean {
            return Ok(true);
        }
        let previous = ConfigurationStore::load(&workspace.dir)?.and_then(|c| c.generator());
        match previous {
            Some(previous) if !previous.matches(&resolution.config.generator) => {
                let question = format!(
                    "Build system changed from {} to {}. Clean {}?",
                    previous, resolution.config.generator, workspace.key
                );
                match prompter.confirm(&question, true)? {
                    Some(true) => Ok(true),
                    // The backend cannot switch generators in place
                    Some(false) | None => Err(ConfigureError::Cancelled),
                }
            }
            _ => Ok(false),
        }
    }

    fn bootstrap(
        &mut self,
        resolution: &Resolution,
        env: EnvironmentContext,
    ) -> Result<EnvironmentContext, ConfigureError> {
        let Some(spec) = BootstrapSpec::for_compiler(resolution.config.compiler) else {
            return Ok(env);
        };

        self.enter(Phase::Bootstrapping);
        let _spinner = self
            .shell
            .spinner(Status::Bootstrapping, format!("{} environment", spec.toolchain));

        match Bootstrapper::new(self.host).bootstrap(&spec, &env) {
            Ok(outcome) => Ok(outcome.into_environment(&env)),
            // Only the dependency build wanted it
            Err(failure) if !resolution.needs_bootstrap => {
                tracing::warn!("{}; dependencies may fail to build", failure);
                Ok(env)
            }
            Err(failure) => Err(failure.into()),
        }
    }

    fn install_dependencies(
        &self,
        resolution: &Resolution,
        workspace: &Workspace,
        options: &BuildOptions,
        prompter: &dyn Prompter,
        env: &mut EnvironmentContext,
    ) -> Result<Option<PathBuf>, ConfigureError> {
        let config = &resolution.config;
        let conan;
        let manager: &dyn DependencyManager = match (self.dependency_manager, &resolution.dependency_manager) {
            (Some(manager), _) => manager,
            (None, Some(candidate)) => {
                let profile = options
                    .profile
                    .clone()
                    .or_else(|| self.project.config().deps.profile.clone());
                conan = Conan::new(&candidate.executable, self.project.profiles_dir()).with_profile(profile);
                &conan
            }
            (None, None) => return Ok(None),
        };

        let existing = manager.existing_descriptor(&workspace.dir);
        let reinstall = match &existing {
            Some(_) => prompter
                .confirm("Dependencies are already installed. Reinstall them?", false)?
                .unwrap_or(false),
            None => true,
        };

        let descriptor = if reinstall {
            self.shell
                .status(Status::Installing, format!("dependencies with {}", manager.name()));
            let request = InstallRequest {
                source_root: self.project.root(),
                workspace_dir: &workspace.dir,
                config,
            };
            let outcome = manager.install(&request, env)?;
            if !outcome.success {
                return Err(ConfigureError::Subprocess {
                    tool: manager.name().to_string(),
                    code: outcome.exit_code,
                });
            }
            outcome.toolchain_descriptor
        } else {
            tracing::info!("Reusing installed dependencies in {}", workspace.dir.display());
            existing
        };

        if let Some(script) = manager.environment_script(&workspace.dir, config.platform) {
            *env = Bootstrapper::new(self.host).import_script(&script, &[], env, ImportPolicy::BestEffort)?;
        }

        Ok(descriptor)
    }

    fn format(&self) -> Result<(), ConfigureError> {
        let report = tools::format(self.project, self.host, &self.env)?;
        if !report.is_success() {
            return Err(anyhow!("{}", report.summary()).into());
        }
        self.shell.status(Status::Finished, report.summary());
        Ok(())
    }

    /// Report a post-build step. Failures never fail the build.
    fn post_step(&self, result: anyhow::Result<ToolReport>) {
        match result {
            Ok(report) if report.is_success() => self.shell.status(Status::Finished, report.summary()),
            Ok(report) => self.shell.warn(report.summary()),
            Err(e) => self.shell.warn(format!("{:#}", e)),
        }
    }
}
