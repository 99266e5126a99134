//! Configuration file support for keel.
//!
//! keel reads two configuration files:
//! - Global: `~/.keel/config.toml` - User-wide defaults
//! - Project: `.keel/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, field by field.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Prefix of the project's own CMake options when none is configured.
pub const DEFAULT_OPTION_PREFIX: &str = "KEEL";

/// Directory holding Conan profiles, relative to the project root.
pub const DEFAULT_PROFILES_DIR: &str = "conan-profiles";

/// keel configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub build: BuildConfig,
    pub deps: DepsConfig,
    pub tools: ToolsConfig,
}

/// Project identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Prefix of project CMake options such as `<PREFIX>_BUILD_TESTS`
    pub option_prefix: Option<String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = CPU count)
    pub jobs: Option<usize>,

    /// Arguments appended to every configure
    pub extra_cmake_args: Vec<String>,
}

/// Dependency manager configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DepsConfig {
    pub profiles_dir: Option<PathBuf>,

    /// Profile name that overrides automatic selection
    pub profile: Option<String>,
}

/// Format, lint and docs tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolsConfig {
    pub source_dirs: Vec<PathBuf>,
    pub exclude_dirs: Vec<PathBuf>,
    pub clang_format: Option<String>,
    pub clang_tidy: Option<String>,
    pub doxygen: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.project.option_prefix.is_some() {
            self.project.option_prefix = other.project.option_prefix;
        }

        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if !other.build.extra_cmake_args.is_empty() {
            self.build.extra_cmake_args = other.build.extra_cmake_args;
        }

        if other.deps.profiles_dir.is_some() {
            self.deps.profiles_dir = other.deps.profiles_dir;
        }
        if other.deps.profile.is_some() {
            self.deps.profile = other.deps.profile;
        }

        if !other.tools.source_dirs.is_empty() {
            self.tools.source_dirs = other.tools.source_dirs;
        }
        if !other.tools.exclude_dirs.is_empty() {
            self.tools.exclude_dirs = other.tools.exclude_dirs;
        }
        if other.tools.clang_format.is_some() {
            self.tools.clang_format = other.tools.clang_format;
        }
        if other.tools.clang_tidy.is_some() {
            self.tools.clang_tidy = other.tools.clang_tidy;
        }
        if other.tools.doxygen.is_some() {
            self.tools.doxygen = other.tools.doxygen;
        }
    }

    pub fn option_prefix(&self) -> &str {
        self.project
            .option_prefix
            .as_deref()
            .unwrap_or(DEFAULT_OPTION_PREFIX)
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.deps
            .profiles_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILES_DIR))
    }

    /// Source directories scanned by `format`, relative to the project root.
    pub fn source_dirs(&self) -> Vec<PathBuf> {
        if self.tools.source_dirs.is_empty() {
            vec![PathBuf::from("src")]
        } else {
            self.tools.source_dirs.clone()
        }
    }

    pub fn clang_format(&self) -> &str {
        self.tools.clang_format.as_deref().unwrap_or("clang-format")
    }

    pub fn clang_tidy(&self) -> &str {
        self.tools.clang_tidy.as_deref().unwrap_or("clang-tidy")
    }

    pub fn doxygen(&self) -> &str {
        self.tools.doxygen.as_deref().unwrap_or("doxygen")
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.keel/config.toml)
/// 2. Global config (~/.keel/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global keel config directory (~/.keel).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".keel"))
}

/// Get the global config path (~/.keel/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.keel/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".keel").join("config.toml")
}
