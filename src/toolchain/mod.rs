//! Toolchain detection.
//!
//! Finds compilers, build backends and the dependency manager on the host.
//! Detection runs in two passes per catalog entry: a `PATH` lookup, then the
//! entry's filesystem search strategies. Every candidate is verified to
//! exist before it is returned, and an empty result is not an error.

pub mod catalog;
pub mod msvc;
pub mod version;

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Serialize;

use crate::core::configuration::{CompilerId, Generator, VsVersion};
use crate::core::platform::Platform;
use crate::env::EnvironmentContext;
use crate::util::host::Host;
use crate::util::process::ProcessBuilder;

pub use catalog::{catalog, ProbeSpec, SearchStrategy};
pub use msvc::{VisualStudioLocator, VsInstallation};

/// What a candidate is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Compiler,
    Backend,
    DependencyManager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Compiler, Role::Backend, Role::DependencyManager];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Compiler => "compiler",
            Role::Backend => "build system",
            Role::DependencyManager => "dependency manager",
        };
        f.write_str(s)
    }
}

/// A tool found on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainCandidate {
    pub role: Role,
    pub id: String,
    pub variant: Option<String>,
    pub executable: PathBuf,
    pub version: Option<Version>,
    /// Needs a vendor environment script before it can compile.
    pub requires_bootstrap: bool,
    /// Found through `PATH` rather than a filesystem search.
    pub on_path: bool,
}

impl ToolchainCandidate {
    /// Identity used for deduplication.
    pub fn key(&self) -> (&str, Option<&str>) {
        (&self.id, self.variant.as_deref())
    }

    pub fn compiler_id(&self) -> Option<CompilerId> {
        if self.role != Role::Compiler {
            return None;
        }
        match (self.id.as_str(), self.variant.as_deref()) {
            ("gcc", None) => Some(CompilerId::GCC),
            ("clang", None) => Some(CompilerId::CLANG),
            ("clang", Some("msvc-compatible")) => Some(CompilerId::CLANG_CL),
            ("msvc", None) => Some(CompilerId::MSVC),
            _ => None,
        }
    }

    pub fn generator(&self) -> Option<Generator> {
        if self.role != Role::Backend {
            return None;
        }
        match self.id.as_str() {
            "ninja" => Some(Generator::Ninja),
            "make" => Some(Generator::UnixMakefiles),
            "msbuild" => self
                .variant
                .as_deref()
                .and_then(|year| year.parse::<u16>().ok())
                .and_then(VsVersion::from_year)
                .map(Generator::VisualStudio),
            _ => None,
        }
    }

    /// Short name shown in menus.
    pub fn label(&self) -> String {
        if let Some(compiler) = self.compiler_id() {
            return compiler.name().to_string();
        }
        if let Some(generator) = self.generator() {
            return generator.cmake_name();
        }
        match &self.variant {
            Some(variant) => format!("{} ({})", self.id, variant),
            None => self.id.clone(),
        }
    }

    /// Label, version and location.
    pub fn describe(&self) -> String {
        match &self.version {
            Some(version) => format!("{} {} ({})", self.label(), version, self.executable.display()),
            None => format!("{} ({})", self.label(), self.executable.display()),
        }
    }

    /// A sibling executable in the same directory, e.g. `g++` next to `gcc`.
    pub fn companion(&self, stem: &str) -> PathBuf {
        let ext = self
            .executable
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        self.executable.with_file_name(format!("{}{}", stem, ext))
    }
}

/// Archiver tools that go with a compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Archivers {
    pub ar: Option<PathBuf>,
    pub ranlib: Option<PathBuf>,
}

/// Discovers toolchain candidates through a [`Host`].
pub struct ToolchainDetector<'a> {
    host: &'a dyn Host,
}

impl<'a> ToolchainDetector<'a> {
    pub fn new(host: &'a dyn Host) -> Self {
        ToolchainDetector { host }
    }

    /// Detect all candidates for a role, in priority order.
    pub fn detect(&self, role: Role, platform: Platform, env: &EnvironmentContext) -> Vec<ToolchainCandidate> {
        let installs: OnceCell<Vec<VsInstallation>> = OnceCell::new();
        let mut found: Vec<ToolchainCandidate> = Vec::new();

        for spec in catalog(role, platform) {
            for candidate in self.probe(spec, role, platform, env, &installs) {
                if found.iter().any(|c| c.key() == candidate.key()) {
                    continue;
                }
                tracing::debug!("Detected {}: {}", role, candidate.describe());
                found.push(candidate);
            }
        }

        found
    }

    fn probe(
        &self,
        spec: &ProbeSpec,
        role: Role,
        platform: Platform,
        env: &EnvironmentContext,
        installs: &OnceCell<Vec<VsInstallation>>,
    ) -> Vec<ToolchainCandidate> {
        // Visual Studio is only queried when an entry needs it
        let visual_studio = || {
            installs
                .get_or_init(|| VisualStudioLocator::new(self.host).installations(env))
                .as_slice()
        };
        let make = |executable: PathBuf, variant: Option<String>, on_path: bool| {
            let version = match role {
                Role::Compiler => self.compiler_version(spec, &executable, env),
                _ => None,
            };
            ToolchainCandidate {
                role,
                id: spec.id.to_string(),
                variant: variant.or(spec.variant.map(str::to_string)),
                executable,
                version,
                requires_bootstrap: spec.requires_bootstrap,
                on_path,
            }
        };

        if spec.probe_path {
            let hits: Option<Vec<PathBuf>> = spec
                .executables
                .iter()
                .map(|exe| self.host.find_program(exe, env))
                .collect();
            if let Some(primary) = hits.and_then(|h| h.into_iter().next()) {
                if self.host.is_file(&primary) {
                    return vec![make(primary, None, true)];
                }
            }
        }

        let mut results = Vec::new();
        for strategy in spec.search {
            match strategy {
                SearchStrategy::InstallRoots(patterns) => {
                    for pattern in *patterns {
                        let pattern = expand_home(pattern, env);
                        for dir in self.host.glob(&pattern).into_iter().rev() {
                            if let Some(exe) = self.executables_in(&dir, spec, platform) {
                                results.push(make(exe, None, false));
                            }
                        }
                    }
                }
                SearchStrategy::VisualStudio(relative) => {
                    for install in visual_studio() {
                        let pattern = install.path.join(relative);
                        for dir in self.host.glob(&pattern.to_string_lossy()).into_iter().rev() {
                            if let Some(exe) = self.executables_in(&dir, spec, platform) {
                                results.push(make(exe, None, false));
                            }
                        }
                    }
                }
                SearchStrategy::VisualStudioGenerator => {
                    for install in visual_studio() {
                        let Some(version) = install.version else {
                            continue;
                        };
                        if !self.host.is_file(&install.vcvarsall()) {
                            continue;
                        }
                        let msbuild = install
                            .msbuild_candidates()
                            .into_iter()
                            .find(|p| self.host.is_file(p));
                        if let Some(msbuild) = msbuild {
                            results.push(make(msbuild, Some(version.year().to_string()), false));
                        }
                    }
                }
            }
        }
        // Install roots sort lexically (llvm-18 before llvm-9); newest version first
        results.sort_by(|a, b| b.version.cmp(&a.version));
        results
    }

    /// The primary executable if every executable of `spec` is in `dir`.
    fn executables_in(&self, dir: &Path, spec: &ProbeSpec, platform: Platform) -> Option<PathBuf> {
        let paths: Vec<PathBuf> = spec
            .executables
            .iter()
            .map(|exe| dir.join(platform.exe_name(exe)))
            .collect();
        if paths.iter().all(|p| self.host.is_file(p)) {
            paths.into_iter().next()
        } else {
            None
        }
    }

    fn compiler_version(&self, spec: &ProbeSpec, executable: &Path, env: &EnvironmentContext) -> Option<Version> {
        // cl.exe prints its banner to stderr when run without arguments
        let cmd = if spec.id == "msvc" {
            ProcessBuilder::new(executable).environment(env)
        } else {
            ProcessBuilder::new(executable).arg("--version").environment(env)
        };

        match self.host.run(&cmd) {
            Ok(output) => version::parse_version(&output.stdout)
                .or_else(|| version::parse_version(&output.stderr)),
            Err(e) => {
                tracing::debug!("Could not query version of {}: {:#}", executable.display(), e);
                None
            }
        }
    }

    /// Locate the `cmake` executable.
    pub fn locate_cmake(&self, platform: Platform, env: &EnvironmentContext) -> Option<PathBuf> {
        if let Some(cmake) = self.host.find_program("cmake", env) {
            return Some(cmake);
        }
        if platform.is_windows() {
            return VisualStudioLocator::new(self.host)
                .installations(env)
                .iter()
                .map(VsInstallation::bundled_cmake)
                .find(|p| self.host.is_file(p));
        }
        None
    }

    /// Archivers matching the compiler, preferring the compiler's own directory.
    pub fn probe_archivers(
        &self,
        compiler: &ToolchainCandidate,
        platform: Platform,
        env: &EnvironmentContext,
    ) -> Archivers {
        let find = |stem: &str| {
            let sibling = compiler.executable.with_file_name(platform.exe_name(stem));
            if self.host.is_file(&sibling) {
                Some(sibling)
            } else {
                self.host.find_program(stem, env)
            }
        };

        match compiler.compiler_id() {
            Some(CompilerId::CLANG_CL) => Archivers {
                ar: find("llvm-lib"),
                ranlib: None,
            },
            Some(CompilerId::CLANG) if !platform.is_windows() => Archivers {
                ar: find("llvm-ar"),
                ranlib: find("llvm-ranlib"),
            },
            _ => Archivers::default(),
        }
    }
}

/// Expand a leading `~` using `HOME` or `USERPROFILE`.
fn expand_home(pattern: &str, env: &EnvironmentContext) -> String {
    match pattern.strip_prefix('~') {
        Some(rest) => match env.get("HOME").or_else(|| env.get("USERPROFILE")) {
            Some(home) => format!("{}{}", home.trim_end_matches(['/', '\\']), rest),
            None => pattern.to_string(),
        },
        None => pattern.to_string(),
    }
}
