//! Importing a vendor toolchain environment.
//!
//! MSVC and clang-cl keep their tools, headers and libraries off `PATH`
//! until a vendor script (`vcvarsall.bat`) has run. The bootstrapper runs
//! that script in a subshell, dumps the resulting environment and merges it
//! into an [`EnvironmentContext`].

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::configuration::CompilerId;
use crate::env::context::{merge_environment, parse_dump, EnvironmentContext};
use crate::toolchain::msvc::{vcvars_arch, VisualStudioLocator};
use crate::util::diagnostic::Diagnostic;
use crate::util::host::Host;

/// Scripts tried inside each Visual Studio installation, in order.
/// The flag says whether the script takes the target architecture.
const VENDOR_SCRIPTS: &[(&str, bool)] = &[
    ("VC/Auxiliary/Build/vcvarsall.bat", true),
    ("Common7/Tools/VsDevCmd.bat", false),
    ("VC/Auxiliary/Build/vcvars64.bat", false),
];

/// What a toolchain needs from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSpec {
    /// Toolchain name used in messages.
    pub toolchain: String,
    /// Executables that must resolve on `PATH`.
    pub probe_tools: Vec<String>,
    /// Variables that must be set and non-empty.
    pub required_vars: Vec<String>,
}

impl BootstrapSpec {
    /// The requirements of a compiler, if it has any.
    pub fn for_compiler(compiler: CompilerId) -> Option<Self> {
        match compiler {
            CompilerId::MSVC => Some(BootstrapSpec {
                toolchain: compiler.to_string(),
                probe_tools: vec!["cl".to_string()],
                required_vars: vec!["INCLUDE".to_string()],
            }),
            // clang-cl itself may be on PATH; the manifest tool and SDK are not
            CompilerId::CLANG_CL => Some(BootstrapSpec {
                toolchain: compiler.to_string(),
                probe_tools: vec!["mt".to_string()],
                required_vars: Vec::new(),
            }),
            _ => None,
        }
    }
}

/// A located vendor script and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorScript {
    pub path: PathBuf,
    pub args: Vec<String>,
}

/// Result of a successful bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The environment already satisfied the toolchain; nothing was run.
    AlreadyAvailable,
    /// A vendor script was run and its environment merged.
    Imported {
        script: PathBuf,
        env: EnvironmentContext,
    },
}

impl BootstrapOutcome {
    /// The environment to continue with.
    pub fn into_environment(self, base: &EnvironmentContext) -> EnvironmentContext {
        match self {
            BootstrapOutcome::AlreadyAvailable => base.clone(),
            BootstrapOutcome::Imported { env, .. } => env,
        }
    }
}

/// Why a vendor environment could not be imported.
#[derive(Debug, Clone, Error, MietteDiagnostic)]
pub enum BootstrapFailure {
    #[error("could not find a Visual Studio environment script for {toolchain}")]
    #[diagnostic(
        code(keel::bootstrap::script_not_found),
        help("install the 'Desktop development with C++' workload")
    )]
    ScriptNotFound {
        toolchain: String,
        searched: Vec<PathBuf>,
    },

    #[error("environment script `{}` failed ({status})", script.display())]
    #[diagnostic(code(keel::bootstrap::script_failed))]
    ScriptFailed {
        script: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("`{tool}` is still unavailable after running `{}`", script.display())]
    #[diagnostic(code(keel::bootstrap::tool_missing))]
    ToolStillMissing { tool: String, script: PathBuf },
}

impl BootstrapFailure {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());

        match self {
            BootstrapFailure::ScriptNotFound { searched, .. } => {
                if searched.is_empty() {
                    diag = diag.with_context("no Visual Studio installation was found");
                }
                for path in searched.iter().take(6) {
                    diag = diag.with_context(format!("looked for {}", path.display()));
                }
                if searched.len() > 6 {
                    diag = diag.with_context(format!("... and {} more locations", searched.len() - 6));
                }
                diag = diag.with_suggestion(
                    "Install Visual Studio 2022 or the Build Tools with the 'Desktop development with C++' workload",
                );
            }
            BootstrapFailure::ScriptFailed { stderr, .. } => {
                for line in stderr.lines().filter(|l| !l.trim().is_empty()).take(5) {
                    diag = diag.with_context(line.trim().to_string());
                }
                diag = diag.with_suggestion("Repair the Visual Studio installation from the Visual Studio Installer");
            }
            BootstrapFailure::ToolStillMissing { tool, .. } => {
                let component = if tool == "mt" {
                    "the Windows SDK"
                } else {
                    "the 'Desktop development with C++' workload"
                };
                diag = diag.with_suggestion(format!("Install {} in the Visual Studio Installer", component));
            }
        }

        diag.with_suggestion("Run from 'Developer Command Prompt for VS 2022'")
            .with_suggestion("Use native clang instead: --compiler clang")
    }
}

/// How to treat a failing script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPolicy {
    /// Failure is returned to the caller.
    Required,
    /// Failure is logged and the base environment is kept.
    BestEffort,
}

/// Imports vendor environments through a [`Host`].
pub struct Bootstrapper<'a> {
    host: &'a dyn Host,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(host: &'a dyn Host) -> Self {
        Bootstrapper { host }
    }

    /// Whether `env` already provides everything the toolchain needs.
    pub fn is_available(&self, spec: &BootstrapSpec, env: &EnvironmentContext) -> bool {
        spec.probe_tools
            .iter()
            .all(|tool| self.host.find_program(tool, env).is_some())
            && spec.required_vars.iter().all(|var| env.contains(var))
    }

    /// Make the toolchain usable, running the vendor script only if needed.
    pub fn bootstrap(
        &self,
        spec: &BootstrapSpec,
        env: &EnvironmentContext,
    ) -> Result<BootstrapOutcome, BootstrapFailure> {
        if self.is_available(spec, env) {
            tracing::debug!("{} environment already available", spec.toolchain);
            return Ok(BootstrapOutcome::AlreadyAvailable);
        }

        let script = self.locate_script(spec, env)?;
        tracing::info!(
            "Importing {} environment from {}",
            spec.toolchain,
            script.path.display()
        );

        let merged = self.import_script(&script.path, &script.args, env, ImportPolicy::Required)?;

        for tool in &spec.probe_tools {
            if self.host.find_program(tool, &merged).is_none() {
                return Err(BootstrapFailure::ToolStillMissing {
                    tool: tool.clone(),
                    script: script.path,
                });
            }
        }

        Ok(BootstrapOutcome::Imported {
            script: script.path,
            env: merged,
        })
    }

    /// Find the vendor script, newest installation first.
    pub fn locate_script(
        &self,
        spec: &BootstrapSpec,
        env: &EnvironmentContext,
    ) -> Result<VendorScript, BootstrapFailure> {
        let mut searched = Vec::new();

        for install in VisualStudioLocator::new(self.host).installations(env) {
            for (relative, takes_arch) in VENDOR_SCRIPTS {
                let path = install.path.join(relative);
                if self.host.is_file(&path) {
                    let args = if *takes_arch {
                        vec![vcvars_arch().to_string()]
                    } else {
                        Vec::new()
                    };
                    return Ok(VendorScript { path, args });
                }
                searched.push(path);
            }
        }

        Err(BootstrapFailure::ScriptNotFound {
            toolchain: spec.toolchain.clone(),
            searched,
        })
    }

    /// Run an environment script and merge what it exports into `env`.
    pub fn import_script(
        &self,
        script: &Path,
        args: &[String],
        env: &EnvironmentContext,
        policy: ImportPolicy,
    ) -> Result<EnvironmentContext, BootstrapFailure> {
        match self.run_script(script, args, env) {
            Ok(merged) => Ok(merged),
            Err(failure) if policy == ImportPolicy::BestEffort => {
                tracing::warn!("{}; continuing with the current environment", failure);
                Ok(env.clone())
            }
            Err(failure) => Err(failure),
        }
    }

    fn run_script(
        &self,
        script: &Path,
        args: &[String],
        env: &EnvironmentContext,
    ) -> Result<EnvironmentContext, BootstrapFailure> {
        let output = self
            .host
            .source_script(script, args, env)
            .map_err(|e| BootstrapFailure::ScriptFailed {
                script: script.to_path_buf(),
                status: "could not be started".to_string(),
                stderr: format!("{:#}", e),
            })?;

        if !output.success() {
            return Err(BootstrapFailure::ScriptFailed {
                script: script.to_path_buf(),
                status: output.status_text(),
                stderr: output.stderr,
            });
        }

        if parse_dump(&output.stdout).is_empty() {
            return Err(BootstrapFailure::ScriptFailed {
                script: script.to_path_buf(),
                status: "no environment was exported".to_string(),
                stderr: output.stderr,
            });
        }

        Ok(merge_environment(env, &output.stdout))
    }
}
