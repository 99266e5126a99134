//! Test fixtures for common host and project layouts.

use std::path::Path;

use tempfile::TempDir;

use super::{MockHost, MockProcessOutput};
use crate::core::platform::Platform;
use crate::core::workspace::{Workspace, WorkspaceKey, CACHE_MARKER};
use crate::env::EnvironmentContext;

/// Root of the Visual Studio 2022 installation in [`windows_host`].
pub const VS2022_ROOT: &str = "C:/Program Files/Microsoft Visual Studio/2022/Community";

/// A Linux environment with a conventional `PATH`.
pub fn linux_env() -> EnvironmentContext {
    EnvironmentContext::empty(Platform::Linux)
        .with("PATH", "/usr/local/bin:/usr/bin:/bin")
        .with("HOME", "/home/dev")
}

/// A Windows environment as seen from a plain shell: nothing from Visual
/// Studio on `PATH`.
pub fn windows_env() -> EnvironmentContext {
    EnvironmentContext::empty(Platform::Windows)
        .with("PATH", "C:/Windows/System32;C:/Program Files/CMake/bin")
        .with("USERPROFILE", "C:/Users/dev")
}

/// A Linux host with gcc 13, clang 18, ninja, make and cmake.
pub fn linux_host() -> MockHost {
    let mut host = MockHost::new();
    for tool in ["gcc", "g++", "clang", "clang++", "ninja", "make", "cmake"] {
        host.add_file(format!("/usr/bin/{}", tool));
    }
    host.expect_contains("gcc --version", MockProcessOutput::success("gcc (GCC) 13.2.0"));
    host.expect_contains("clang --version", MockProcessOutput::success("clang version 18.1.8"));
    host
}

/// A Windows host with Visual Studio 2022 (cl, bundled clang-cl, MSBuild,
/// bundled Ninja) and a standalone CMake. Nothing compiles without
/// `vcvarsall.bat`.
pub fn windows_host() -> MockHost {
    let mut host = MockHost::new();
    let vs = VS2022_ROOT;
    host.add_file(format!("{}/VC/Auxiliary/Build/vcvarsall.bat", vs));
    host.add_file(format!("{}/VC/Tools/MSVC/14.38.33130/bin/Hostx64/x64/cl.exe", vs));
    host.add_file(format!("{}/VC/Tools/Llvm/x64/bin/clang-cl.exe", vs));
    host.add_file(format!("{}/MSBuild/Current/Bin/MSBuild.exe", vs));
    host.add_file(format!(
        "{}/Common7/IDE/CommonExtensions/Microsoft/CMake/Ninja/ninja.exe",
        vs
    ));
    host.add_file("C:/Program Files/CMake/bin/cmake.exe");
    host.expect_contains("clang-cl.exe --version", MockProcessOutput::success("clang version 17.0.3"));
    host.expect_contains(
        "cl.exe",
        MockProcessOutput::with_output(
            0,
            "",
            "Microsoft (R) C/C++ Optimizing Compiler Version 19.38.33133 for x64",
        ),
    );
    host
}

/// `vcvarsall.bat` output for [`windows_host`].
pub fn vcvars_dump() -> String {
    format!(
        "Path={vs}/VC/Tools/MSVC/14.38.33130/bin/Hostx64/x64;C:/Windows/System32\r\n\
         INCLUDE={vs}/VC/Tools/MSVC/14.38.33130/include\r\n\
         LIB={vs}/VC/Tools/MSVC/14.38.33130/lib/x64\r\n",
        vs = VS2022_ROOT
    )
}

/// A temporary project directory with a top-level `CMakeLists.txt`.
pub fn create_test_project() -> TempDir {
    let tmp = TempDir::new().expect("failed to create temp dir");
    std::fs::write(
        tmp.path().join("CMakeLists.txt"),
        "cmake_minimum_required(VERSION 3.25)\nproject(helios CXX)\n",
    )
    .expect("failed to write CMakeLists.txt");
    tmp
}

/// Mark a workspace as configured with the given cache contents.
pub fn configure_workspace(project_root: &Path, key: WorkspaceKey, cache: &str) -> Workspace {
    let workspace = Workspace::new(project_root, key);
    std::fs::create_dir_all(&workspace.dir).expect("failed to create workspace dir");
    std::fs::write(workspace.dir.join(CACHE_MARKER), cache).expect("failed to write cache");
    workspace
}
