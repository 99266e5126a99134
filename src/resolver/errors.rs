//! Configuration error types and diagnostics.

use std::io;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::configuration::{Field, ValidationError};
use crate::core::platform::Platform;
use crate::env::BootstrapFailure;
use crate::toolchain::Role;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Why a build could not be configured.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigureError {
    #[error("no {role} found for {platform}")]
    #[diagnostic(code(keel::detect::none_found))]
    Detection {
        role: Role,
        platform: Platform,
        searched: Vec<String>,
    },

    #[error("{field} `{rejected}` cannot be used: {reason}")]
    #[diagnostic(code(keel::config::invalid))]
    Validation {
        field: Field,
        rejected: String,
        reason: String,
        alternatives: Vec<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Bootstrap(#[from] BootstrapFailure),

    #[error("{tool} exited with code {code}")]
    #[diagnostic(code(keel::subprocess::failed))]
    Subprocess { tool: String, code: i32 },

    #[error("configuration cancelled")]
    #[diagnostic(code(keel::cancelled))]
    Cancelled,

    #[error("prompt failed: {0}")]
    Prompt(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConfigureError {
    /// A validation failure together with the values that would have worked.
    pub fn invalid(err: ValidationError, alternatives: Vec<String>) -> Self {
        ConfigureError::Validation {
            field: err.field,
            rejected: err.rejected,
            reason: err.reason,
            alternatives,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigureError::Subprocess { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConfigureError::Detection {
                role,
                platform,
                searched,
            } => {
                let mut diag = Diagnostic::error(self.to_string());
                if !searched.is_empty() {
                    diag = diag.with_context(format!("looked for: {}", searched.join(", ")));
                }
                let install = match (role, platform) {
                    (Role::Compiler, Platform::Windows) => {
                        "Install Visual Studio 2022 with the 'Desktop development with C++' workload, or LLVM"
                    }
                    (Role::Compiler, Platform::Macos) => "Install the Xcode command line tools or Homebrew LLVM",
                    (Role::Compiler, Platform::Linux) => "Install GCC 13+ or Clang 17+ with your package manager",
                    (Role::Backend, _) => "Install Ninja and make sure it is on PATH",
                    (Role::DependencyManager, _) => "Install Conan 2: `pip install conan`",
                };
                diag.with_suggestion(install)
                    .with_suggestion(suggestions::SHOW_TOOLCHAIN)
            }

            ConfigureError::Validation {
                field,
                rejected,
                alternatives,
                ..
            } => {
                let mut diag = Diagnostic::error(self.to_string());
                if alternatives.is_empty() {
                    diag = diag.with_context(format!("no usable {} was detected", field));
                } else {
                    diag = diag
                        .with_context(format!("available: {}", alternatives.join(", ")))
                        .with_suggestion(format!("Use one of: {}", alternatives.join(", ")));
                }
                if *field == Field::Compiler && (rejected == "msvc" || rejected == "clang-cl") {
                    diag = diag.with_suggestion("Use native clang instead: --compiler clang");
                }
                diag.with_suggestion(suggestions::SHOW_TOOLCHAIN)
            }

            ConfigureError::Bootstrap(failure) => failure.to_diagnostic(),

            ConfigureError::Subprocess { tool, code } => {
                Diagnostic::error(format!("{} failed with exit code {}", tool, code))
                    .with_suggestion(suggestions::BUILD_FAILED)
            }

            ConfigureError::Cancelled => Diagnostic::warning("configuration cancelled; nothing was changed"),

            ConfigureError::Prompt(_) | ConfigureError::Other(_) => Diagnostic::error(format!("{:#}", self)),
        }
    }
}
