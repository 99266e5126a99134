//! Per-platform probe tables.
//!
//! Each table is in priority order: the first entry that is found becomes
//! the default candidate for its role.

use crate::core::platform::Platform;
use crate::toolchain::Role;

/// Where to look for a tool that is not on `PATH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Directory glob patterns that may hold the executables. A leading `~`
    /// is the user's home directory.
    InstallRoots(&'static [&'static str]),
    /// Directory glob relative to each Visual Studio installation.
    VisualStudio(&'static str),
    /// A Visual Studio installation that can act as a CMake generator.
    VisualStudioGenerator,
}

/// One tool to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSpec {
    pub id: &'static str,
    pub variant: Option<&'static str>,
    /// All of these must be present, the first is the primary executable.
    pub executables: &'static [&'static str],
    pub requires_bootstrap: bool,
    /// Whether a `PATH` hit is meaningful for this entry.
    pub probe_path: bool,
    pub search: &'static [SearchStrategy],
}

const WINDOWS_LLVM_ROOTS: &[&str] = &["C:/Program Files/LLVM/bin", "C:/Program Files (x86)/LLVM/bin"];

static LINUX_COMPILERS: &[ProbeSpec] = &[
    ProbeSpec {
        id: "gcc",
        variant: None,
        executables: &["gcc", "g++"],
        requires_bootstrap: false,
        probe_path: true,
        search: &[SearchStrategy::InstallRoots(&["/opt/gcc-*/bin", "/usr/local/gcc-*/bin"])],
    },
    ProbeSpec {
        id: "clang",
        variant: None,
        executables: &["clang", "clang++"],
        requires_bootstrap: false,
        probe_path: true,
        search: &[SearchStrategy::InstallRoots(&[
            "/usr/lib/llvm-*/bin",
            "/opt/llvm*/bin",
            "/usr/local/opt/llvm/bin",
        ])],
    },
];

static MACOS_COMPILERS: &[ProbeSpec] = &[
    ProbeSpec {
        id: "clang",
        variant: None,
        executables: &["clang", "clang++"],
        requires_bootstrap: false,
        probe_path: true,
        search: &[SearchStrategy::InstallRoots(&[
            "/opt/homebrew/opt/llvm/bin",
            "/usr/local/opt/llvm/bin",
            "/Library/Developer/CommandLineTools/usr/bin",
        ])],
    },
    ProbeSpec {
        id: "gcc",
        variant: None,
        executables: &["gcc", "g++"],
        requires_bootstrap: false,
        probe_path: true,
        search: &[SearchStrategy::InstallRoots(&["/opt/homebrew/opt/gcc/bin", "/usr/local/opt/gcc/bin"])],
    },
];

static WINDOWS_COMPILERS: &[ProbeSpec] = &[
    ProbeSpec {
        id: "msvc",
        variant: None,
        executables: &["cl"],
        requires_bootstrap: true,
        probe_path: true,
        search: &[SearchStrategy::VisualStudio("VC/Tools/MSVC/*/bin/Hostx64/x64")],
    },
    ProbeSpec {
        id: "clang",
        variant: Some("msvc-compatible"),
        executables: &["clang-cl"],
        requires_bootstrap: true,
        probe_path: true,
        search: &[
            SearchStrategy::VisualStudio("VC/Tools/Llvm/x64/bin"),
            SearchStrategy::VisualStudio("VC/Tools/Llvm/bin"),
            SearchStrategy::InstallRoots(WINDOWS_LLVM_ROOTS),
        ],
    },
    ProbeSpec {
        id: "clang",
        variant: None,
        executables: &["clang", "clang++"],
        requires_bootstrap: false,
        probe_path: true,
        search: &[SearchStrategy::InstallRoots(WINDOWS_LLVM_ROOTS)],
    },
];

static UNIX_BACKENDS: &[ProbeSpec] = &[
    ProbeSpec {
        id: "ninja",
        variant: None,
        executables: &["ninja"],
        requires_bootstrap: false,
        probe_path: true,
        search: &[SearchStrategy::InstallRoots(&["/opt/homebrew/bin", "/usr/local/bin", "~/.local/bin"])],
    },
    ProbeSpec {
        id: "make",
        variant: None,
        executables: &["make"],
        requires_bootstrap: false,
        probe_path: true,
        search: &[],
    },
];

static WINDOWS_BACKENDS: &[ProbeSpec] = &[
    ProbeSpec {
        id: "ninja",
        variant: None,
        executables: &["ninja"],
        requires_bootstrap: false,
        probe_path: true,
        search: &[
            SearchStrategy::VisualStudio("Common7/IDE/CommonExtensions/Microsoft/CMake/Ninja"),
            SearchStrategy::InstallRoots(&["C:/Program Files/Ninja", "C:/ProgramData/chocolatey/bin"]),
        ],
    },
    ProbeSpec {
        id: "msbuild",
        variant: None,
        executables: &["MSBuild"],
        requires_bootstrap: false,
        probe_path: false,
        search: &[SearchStrategy::VisualStudioGenerator],
    },
];

static UNIX_DEPENDENCY_MANAGERS: &[ProbeSpec] = &[ProbeSpec {
    id: "conan",
    variant: None,
    executables: &["conan"],
    requires_bootstrap: false,
    probe_path: true,
    search: &[SearchStrategy::InstallRoots(&["~/.local/bin", "/opt/homebrew/bin", "/usr/local/bin"])],
}];

static WINDOWS_DEPENDENCY_MANAGERS: &[ProbeSpec] = &[ProbeSpec {
    id: "conan",
    variant: None,
    executables: &["conan"],
    requires_bootstrap: false,
    probe_path: true,
    search: &[SearchStrategy::InstallRoots(&[
        "~/AppData/Roaming/Python/Python3*/Scripts",
        "~/AppData/Local/Programs/Python/Python3*/Scripts",
    ])],
}];

/// Probe table for a role on a platform.
pub fn catalog(role: Role, platform: Platform) -> &'static [ProbeSpec] {
    match (role, platform) {
        (Role::Compiler, Platform::Linux) => LINUX_COMPILERS,
        (Role::Compiler, Platform::Macos) => MACOS_COMPILERS,
        (Role::Compiler, Platform::Windows) => WINDOWS_COMPILERS,
        (Role::Backend, Platform::Windows) => WINDOWS_BACKENDS,
        (Role::Backend, _) => UNIX_BACKENDS,
        (Role::DependencyManager, Platform::Windows) => WINDOWS_DEPENDENCY_MANAGERS,
        (Role::DependencyManager, _) => UNIX_DEPENDENCY_MANAGERS,
    }
}
