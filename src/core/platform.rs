//! Host platform identification.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Operating system family a workspace is configured for.
///
/// The declaration order is the canonical sort order used when listing
/// workspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    /// All known platforms.
    pub const ALL: [Platform; 3] = [Platform::Linux, Platform::Macos, Platform::Windows];

    /// The platform this binary was compiled for.
    ///
    /// Unix flavours without their own entry are treated as Linux.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else {
            Platform::Linux
        }
    }

    /// Directory and display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Separator between entries of `PATH`.
    pub fn path_separator(&self) -> char {
        if self.is_windows() {
            ';'
        } else {
            ':'
        }
    }

    /// File name of an executable with the given stem.
    pub fn exe_name(&self, stem: &str) -> String {
        if self.is_windows() && !stem.to_ascii_lowercase().ends_with(".exe") {
            format!("{}.exe", stem)
        } else {
            stem.to_string()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" | "osx" => Ok(Platform::Macos),
            "windows" | "win32" | "win" => Ok(Platform::Windows),
            _ => Err(format!(
                "unknown platform '{}'; expected 'linux', 'macos', or 'windows'",
                s
            )),
        }
    }
}
