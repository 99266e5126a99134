//! The resolved build configuration and the rules it must satisfy.
//!
//! A [`Configuration`] is built fresh on every run by the resolver and is
//! never persisted directly; the backend's own cache is the only record of
//! a previous configuration. All validation in this module is pure: it looks
//! only at the configuration and the detected candidates.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::Serialize;
use thiserror::Error;

use crate::core::platform::Platform;
use crate::core::workspace::WorkspaceKey;
use crate::toolchain::ToolchainCandidate;

/// CMake build type.
///
/// Declaration order is the canonical listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
}

impl BuildType {
    pub const ALL: [BuildType; 3] = [BuildType::Debug, BuildType::Release, BuildType::RelWithDebInfo];

    /// Name as understood by `CMAKE_BUILD_TYPE` and `--config`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
        }
    }

    /// Lowercase name used for the workspace directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            BuildType::Debug => "debug",
            BuildType::Release => "release",
            BuildType::RelWithDebInfo => "relwithdebinfo",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            _ => Err(format!(
                "unknown build type '{}'; expected 'Debug', 'Release', or 'RelWithDebInfo'",
                s
            )),
        }
    }
}

/// Compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    Gcc,
    Clang,
    Msvc,
}

/// Sub-flavour of a compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerVariant {
    /// Clang with the MSVC command-line driver (`clang-cl`).
    MsvcCompatible,
}

impl CompilerVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerVariant::MsvcCompatible => "msvc-compatible",
        }
    }
}

/// A compiler identity: family plus optional variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CompilerId {
    pub family: CompilerFamily,
    pub variant: Option<CompilerVariant>,
}

impl CompilerId {
    pub const GCC: CompilerId = CompilerId {
        family: CompilerFamily::Gcc,
        variant: None,
    };
    pub const CLANG: CompilerId = CompilerId {
        family: CompilerFamily::Clang,
        variant: None,
    };
    pub const CLANG_CL: CompilerId = CompilerId {
        family: CompilerFamily::Clang,
        variant: Some(CompilerVariant::MsvcCompatible),
    };
    pub const MSVC: CompilerId = CompilerId {
        family: CompilerFamily::Msvc,
        variant: None,
    };

    /// Short user-facing name.
    pub fn name(&self) -> &'static str {
        match (self.family, self.variant) {
            (CompilerFamily::Gcc, _) => "gcc",
            (CompilerFamily::Clang, Some(CompilerVariant::MsvcCompatible)) => "clang-cl",
            (CompilerFamily::Clang, None) => "clang",
            (CompilerFamily::Msvc, _) => "msvc",
        }
    }

    /// Accepts the MSVC command line (cl.exe or clang-cl).
    pub fn is_msvc_like(&self) -> bool {
        self.family == CompilerFamily::Msvc || self.variant == Some(CompilerVariant::MsvcCompatible)
    }

    /// C and C++ driver executable stems.
    pub fn drivers(&self) -> (&'static str, &'static str) {
        match self.name() {
            "gcc" => ("gcc", "g++"),
            "clang" => ("clang", "clang++"),
            "clang-cl" => ("clang-cl", "clang-cl"),
            _ => ("cl", "cl"),
        }
    }

    /// Oldest release with usable C++23 support.
    pub fn minimum_version(&self) -> Version {
        match self.family {
            CompilerFamily::Gcc => Version::new(13, 0, 0),
            CompilerFamily::Clang => Version::new(17, 0, 0),
            CompilerFamily::Msvc => Version::new(19, 36, 0),
        }
    }

    /// Infer the compiler from a driver path such as `CMAKE_CXX_COMPILER`.
    pub fn from_driver_path(path: &str) -> Option<Self> {
        let name = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path)
            .to_ascii_lowercase();
        let stem = name.strip_suffix(".exe").unwrap_or(&name);

        if stem.contains("clang-cl") {
            Some(CompilerId::CLANG_CL)
        } else if stem.contains("clang") {
            Some(CompilerId::CLANG)
        } else if stem.contains("g++") || stem.contains("gcc") {
            Some(CompilerId::GCC)
        } else if stem == "cl" {
            Some(CompilerId::MSVC)
        } else {
            None
        }
    }
}

impl fmt::Display for CompilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompilerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcc" | "g++" => Ok(CompilerId::GCC),
            "clang" | "clang++" => Ok(CompilerId::CLANG),
            "clang-cl" => Ok(CompilerId::CLANG_CL),
            "msvc" | "cl" | "cl.exe" => Ok(CompilerId::MSVC),
            _ => Err(format!(
                "unknown compiler '{}'; expected 'gcc', 'clang', 'clang-cl', or 'msvc'",
                s
            )),
        }
    }
}

/// Visual Studio release line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VsVersion {
    Vs2017,
    Vs2019,
    Vs2022,
}

impl VsVersion {
    /// Newest first.
    pub const ALL: [VsVersion; 3] = [VsVersion::Vs2022, VsVersion::Vs2019, VsVersion::Vs2017];

    pub fn year(&self) -> u16 {
        match self {
            VsVersion::Vs2017 => 2017,
            VsVersion::Vs2019 => 2019,
            VsVersion::Vs2022 => 2022,
        }
    }

    /// Internal product version (`17` for 2022).
    pub fn major(&self) -> u8 {
        match self {
            VsVersion::Vs2017 => 15,
            VsVersion::Vs2019 => 16,
            VsVersion::Vs2022 => 17,
        }
    }

    pub fn from_year(year: u16) -> Option<Self> {
        VsVersion::ALL.into_iter().find(|v| v.year() == year)
    }

    pub fn from_major(major: u64) -> Option<Self> {
        VsVersion::ALL.into_iter().find(|v| u64::from(v.major()) == major)
    }
}

/// Kind of build backend, independent of its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ninja,
    Make,
    MsBuild,
}

impl BackendKind {
    /// Candidate id used by the detector.
    pub fn id(&self) -> &'static str {
        match self {
            BackendKind::Ninja => "ninja",
            BackendKind::Make => "make",
            BackendKind::MsBuild => "msbuild",
        }
    }
}

/// A CMake generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Generator {
    Ninja,
    UnixMakefiles,
    VisualStudio(VsVersion),
}

impl Generator {
    pub fn kind(&self) -> BackendKind {
        match self {
            Generator::Ninja => BackendKind::Ninja,
            Generator::UnixMakefiles => BackendKind::Make,
            Generator::VisualStudio(_) => BackendKind::MsBuild,
        }
    }

    /// Value for `cmake -G`.
    pub fn cmake_name(&self) -> String {
        match self {
            Generator::Ninja => "Ninja".to_string(),
            Generator::UnixMakefiles => "Unix Makefiles".to_string(),
            Generator::VisualStudio(v) => format!("Visual Studio {} {}", v.major(), v.year()),
        }
    }

    pub fn is_visual_studio(&self) -> bool {
        matches!(self, Generator::VisualStudio(_))
    }

    /// Multi-config generators pick the build type at build time.
    pub fn is_multi_config(&self) -> bool {
        self.is_visual_studio()
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cmake_name())
    }
}

/// A user or cache supplied generator, possibly without a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorRequest {
    pub kind: BackendKind,
    pub version: Option<VsVersion>,
}

impl GeneratorRequest {
    pub fn matches(&self, generator: &Generator) -> bool {
        match (self.kind, generator) {
            (BackendKind::MsBuild, Generator::VisualStudio(v)) => {
                self.version.map_or(true, |want| want == *v)
            }
            (kind, generator) => kind == generator.kind(),
        }
    }
}

impl From<Generator> for GeneratorRequest {
    fn from(generator: Generator) -> Self {
        let version = match generator {
            Generator::VisualStudio(v) => Some(v),
            _ => None,
        };
        GeneratorRequest {
            kind: generator.kind(),
            version,
        }
    }
}

impl fmt::Display for GeneratorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(v) => write!(f, "{} {}", self.kind.id(), v.year()),
            None => f.write_str(self.kind.id()),
        }
    }
}

impl FromStr for GeneratorRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let request = |kind, version| GeneratorRequest { kind, version };

        match lower.as_str() {
            "ninja" => return Ok(request(BackendKind::Ninja, None)),
            "make" | "makefiles" | "unix makefiles" => return Ok(request(BackendKind::Make, None)),
            "msbuild" | "vs" | "visual studio" => return Ok(request(BackendKind::MsBuild, None)),
            _ => {}
        }

        // "vs2022", "msbuild 2019", "Visual Studio 17 2022"
        if lower.starts_with("vs") || lower.starts_with("msbuild") || lower.starts_with("visual studio") {
            let year = lower
                .split(|c: char| !c.is_ascii_digit())
                .filter_map(|part| part.parse::<u16>().ok())
                .find_map(VsVersion::from_year);
            if let Some(version) = year {
                return Ok(request(BackendKind::MsBuild, Some(version)));
            }
        }

        Err(format!(
            "unknown build system '{}'; expected 'ninja', 'make', or 'msbuild'",
            s
        ))
    }
}

/// Which parts of the project to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ModuleFlags {
    pub core_only: bool,
    pub build_tests: bool,
    pub build_examples: bool,
}

/// A fully-specified build intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub platform: Platform,
    pub build_type: BuildType,
    pub compiler: CompilerId,
    pub generator: Generator,
    pub modules: ModuleFlags,
    pub dependency_manager: bool,
}

impl Configuration {
    pub fn workspace_key(&self) -> WorkspaceKey {
        WorkspaceKey::new(self.build_type, self.platform)
    }
}

/// A configuration field, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    CoreOnly,
    Tests,
    Examples,
    BuildType,
    Compiler,
    Generator,
    DependencyManager,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::CoreOnly => "module selection",
            Field::Tests => "tests",
            Field::Examples => "examples",
            Field::BuildType => "build type",
            Field::Compiler => "compiler",
            Field::Generator => "build system",
            Field::DependencyManager => "dependency manager",
        };
        f.write_str(s)
    }
}

/// A rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} `{rejected}` cannot be used: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub rejected: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, rejected: impl fmt::Display, reason: impl Into<String>) -> Self {
        ValidationError {
            field,
            rejected: rejected.to_string(),
            reason: reason.into(),
        }
    }
}

/// Detected candidates, grouped by role.
#[derive(Debug, Clone, Copy)]
pub struct Availability<'a> {
    pub compilers: &'a [ToolchainCandidate],
    pub backends: &'a [ToolchainCandidate],
    pub dependency_managers: &'a [ToolchainCandidate],
}

/// Compiler/platform compatibility.
pub fn check_compiler_platform(compiler: CompilerId, platform: Platform) -> Result<(), String> {
    match (compiler.is_msvc_like(), compiler.family, platform) {
        (true, _, p) if !p.is_windows() => Err(format!("{} is only available on Windows", compiler)),
        (_, CompilerFamily::Gcc, Platform::Windows) => {
            Err("gcc is not supported on Windows; use msvc, clang-cl, or clang".to_string())
        }
        _ => Ok(()),
    }
}

/// Generator/platform compatibility.
pub fn check_generator_platform(generator: Generator, platform: Platform) -> Result<(), String> {
    match (generator, platform) {
        (Generator::VisualStudio(_), p) if !p.is_windows() => {
            Err(format!("{} is only available on Windows", generator))
        }
        (Generator::UnixMakefiles, Platform::Windows) => {
            Err("Unix Makefiles are not supported on Windows; use Ninja".to_string())
        }
        _ => Ok(()),
    }
}

/// Generator/compiler compatibility.
pub fn check_generator_compiler(generator: Generator, compiler: CompilerId) -> Result<(), String> {
    if generator.is_visual_studio() && !compiler.is_msvc_like() {
        return Err(format!(
            "{} can only drive msvc or clang-cl, not {}",
            generator, compiler
        ));
    }
    Ok(())
}

/// The project requires C++23. Unknown versions pass.
pub fn check_language_standard(compiler: CompilerId, version: Option<&Version>) -> Result<(), String> {
    let minimum = compiler.minimum_version();
    match version {
        Some(found) if *found < minimum => Err(format!(
            "C++23 requires {} {} or newer, found {}",
            compiler, minimum, found
        )),
        _ => Ok(()),
    }
}

/// Check a compiler choice and return the candidate that provides it.
pub fn validate_compiler<'a>(
    compiler: CompilerId,
    platform: Platform,
    available: &'a [ToolchainCandidate],
) -> Result<&'a ToolchainCandidate, ValidationError> {
    check_compiler_platform(compiler, platform)
        .map_err(|reason| ValidationError::new(Field::Compiler, compiler, reason))?;

    let candidate = available
        .iter()
        .find(|c| c.compiler_id() == Some(compiler))
        .ok_or_else(|| {
            ValidationError::new(Field::Compiler, compiler, format!("{} was not found on this host", compiler))
        })?;

    check_language_standard(compiler, candidate.version.as_ref())
        .map_err(|reason| ValidationError::new(Field::Compiler, compiler, reason))?;

    Ok(candidate)
}

/// Check a generator choice against the platform and chosen compiler.
pub fn validate_generator<'a>(
    generator: Generator,
    compiler: CompilerId,
    platform: Platform,
    available: &'a [ToolchainCandidate],
) -> Result<&'a ToolchainCandidate, ValidationError> {
    check_generator_platform(generator, platform)
        .map_err(|reason| ValidationError::new(Field::Generator, generator, reason))?;
    check_generator_compiler(generator, compiler)
        .map_err(|reason| ValidationError::new(Field::Generator, generator, reason))?;

    available
        .iter()
        .find(|c| c.generator() == Some(generator))
        .ok_or_else(|| {
            ValidationError::new(
                Field::Generator,
                generator,
                format!("{} was not found on this host", generator.kind().id()),
            )
        })
}

/// Check the dependency-manager opt-in.
pub fn validate_dependency_manager(
    enabled: bool,
    available: &[ToolchainCandidate],
) -> Result<Option<&ToolchainCandidate>, ValidationError> {
    if !enabled {
        return Ok(None);
    }
    available.first().map(Some).ok_or_else(|| {
        ValidationError::new(Field::DependencyManager, "conan", "conan was not found on this host")
    })
}

/// Check every invariant of a complete configuration.
pub fn validate(config: &Configuration, availability: &Availability<'_>) -> Result<(), ValidationError> {
    validate_compiler(config.compiler, config.platform, availability.compilers)?;
    validate_generator(config.generator, config.compiler, config.platform, availability.backends)?;
    validate_dependency_manager(config.dependency_manager, availability.dependency_managers)?;
    Ok(())
}
