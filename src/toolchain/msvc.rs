//! Visual Studio installation discovery.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::configuration::VsVersion;
use crate::env::EnvironmentContext;
use crate::util::host::Host;
use crate::util::process::ProcessBuilder;

/// Workload component every usable installation must have.
const VC_TOOLS_COMPONENT: &str = "Microsoft.VisualStudio.Component.VC.Tools.x86.x64";

/// Editions in the order they are preferred.
const EDITIONS: &[&str] = &["Enterprise", "Professional", "Community", "BuildTools"];

/// A Visual Studio (or Build Tools) installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsInstallation {
    pub path: PathBuf,
    pub version: Option<VsVersion>,
}

impl VsInstallation {
    pub fn vcvarsall(&self) -> PathBuf {
        self.path.join("VC/Auxiliary/Build/vcvarsall.bat")
    }

    /// MSBuild shipped with the installation.
    pub fn msbuild_candidates(&self) -> [PathBuf; 2] {
        [
            self.path.join("MSBuild/Current/Bin/MSBuild.exe"),
            self.path.join("MSBuild/15.0/Bin/MSBuild.exe"),
        ]
    }

    /// CMake shipped with the "C++ CMake tools" component.
    pub fn bundled_cmake(&self) -> PathBuf {
        self.path
            .join("Common7/IDE/CommonExtensions/Microsoft/CMake/CMake/bin/cmake.exe")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VsWhereInstance {
    installation_path: PathBuf,
    #[serde(default)]
    installation_version: Option<String>,
}

/// Finds Visual Studio installations, newest first.
pub struct VisualStudioLocator<'a> {
    host: &'a dyn Host,
}

impl<'a> VisualStudioLocator<'a> {
    pub fn new(host: &'a dyn Host) -> Self {
        VisualStudioLocator { host }
    }

    /// Locate `vswhere.exe`.
    pub fn find_vswhere(&self, env: &EnvironmentContext) -> Option<PathBuf> {
        let installer_dirs = [
            program_files_x86(env).join("Microsoft Visual Studio/Installer/vswhere.exe"),
            program_files(env).join("Microsoft Visual Studio/Installer/vswhere.exe"),
        ];

        installer_dirs
            .into_iter()
            .find(|p| self.host.is_file(p))
            .or_else(|| self.host.find_program("vswhere", env))
    }

    /// Installations reported by `vswhere`, newest first.
    pub fn query_vswhere(&self, vswhere: &Path, env: &EnvironmentContext) -> Vec<VsInstallation> {
        let cmd = ProcessBuilder::new(vswhere)
            .args([
                "-products",
                "*",
                "-requires",
                VC_TOOLS_COMPONENT,
                "-sort",
                "-utf8",
                "-format",
                "json",
            ])
            .environment(env);

        let output = match self.host.run(&cmd) {
            Ok(out) if out.success() => out,
            Ok(out) => {
                tracing::debug!("vswhere failed: {}", out.stderr.trim());
                return Vec::new();
            }
            Err(e) => {
                tracing::debug!("Failed to run vswhere: {:#}", e);
                return Vec::new();
            }
        };

        parse_vswhere(&output.stdout)
    }

    /// Every installation that exists on this host, newest first.
    ///
    /// `vswhere` results come first, followed by well-known install
    /// directories it did not report.
    pub fn installations(&self, env: &EnvironmentContext) -> Vec<VsInstallation> {
        let mut found = match self.find_vswhere(env) {
            Some(vswhere) => {
                tracing::debug!("Found vswhere at: {}", vswhere.display());
                self.query_vswhere(&vswhere, env)
            }
            None => {
                tracing::debug!("vswhere.exe not found, falling back to well-known locations");
                Vec::new()
            }
        };

        for install in well_known_installations(env) {
            if self.host.is_dir(&install.path) && !found.iter().any(|f| f.path == install.path) {
                found.push(install);
            }
        }

        found
    }
}

/// Parse `vswhere -format json` output.
pub fn parse_vswhere(json: &str) -> Vec<VsInstallation> {
    let instances: Vec<VsWhereInstance> = match serde_json::from_str(json) {
        Ok(instances) => instances,
        Err(e) => {
            tracing::debug!("Could not parse vswhere output: {}", e);
            return Vec::new();
        }
    };

    instances
        .into_iter()
        .map(|instance| {
            let version = instance
                .installation_version
                .as_deref()
                .and_then(|v| v.split('.').next())
                .and_then(|major| major.parse::<u64>().ok())
                .and_then(VsVersion::from_major)
                .or_else(|| version_from_path(&instance.installation_path));
            VsInstallation {
                path: instance.installation_path,
                version,
            }
        })
        .collect()
}

/// Guess the release line from an install path such as `.../2019/Community`.
pub fn version_from_path(path: &Path) -> Option<VsVersion> {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .filter_map(|c| c.parse::<u16>().ok())
        .find_map(VsVersion::from_year)
}

/// Default install directories, newest release first.
pub fn well_known_installations(env: &EnvironmentContext) -> Vec<VsInstallation> {
    let mut roots = Vec::new();
    for version in VsVersion::ALL {
        // 2022 is 64-bit and installs under Program Files; Build Tools and
        // older releases use Program Files (x86).
        let bases = if version == VsVersion::Vs2022 {
            vec![program_files(env), program_files_x86(env)]
        } else {
            vec![program_files_x86(env)]
        };
        for base in bases {
            for edition in EDITIONS {
                roots.push(VsInstallation {
                    path: base
                        .join("Microsoft Visual Studio")
                        .join(version.year().to_string())
                        .join(edition),
                    version: Some(version),
                });
            }
        }
    }
    roots
}

fn program_files(env: &EnvironmentContext) -> PathBuf {
    PathBuf::from(env.get("ProgramFiles").unwrap_or("C:/Program Files"))
}

fn program_files_x86(env: &EnvironmentContext) -> PathBuf {
    PathBuf::from(env.get("ProgramFiles(x86)").unwrap_or("C:/Program Files (x86)"))
}

/// Architecture argument for `vcvarsall.bat` on this host.
pub fn vcvars_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86" => "x86",
        "aarch64" => "arm64",
        _ => "amd64",
    }
}
