//! `keel toolchain` command

use anyhow::Result;
use serde::Serialize;

use crate::cli::{GlobalOptions, ToolchainArgs};
use keel::env::EnvironmentContext;
use keel::toolchain::{Role, ToolchainCandidate, ToolchainDetector};
use keel::util::diagnostic::suggestions;
use keel::util::host::RealHost;
use keel::Platform;

#[derive(Serialize)]
struct Report {
    platform: Platform,
    compilers: Vec<ToolchainCandidate>,
    build_systems: Vec<ToolchainCandidate>,
    dependency_managers: Vec<ToolchainCandidate>,
    cmake: Option<std::path::PathBuf>,
}

pub fn execute(args: ToolchainArgs, global: &GlobalOptions) -> Result<()> {
    let host = RealHost;
    let detector = ToolchainDetector::new(&host);
    let platform = args.platform.unwrap_or_else(Platform::host);
    let env = EnvironmentContext::capture().for_platform(platform);

    let report = Report {
        platform,
        compilers: detector.detect(Role::Compiler, platform, &env),
        build_systems: detector.detect(Role::Backend, platform, &env),
        dependency_managers: detector.detect(Role::DependencyManager, platform, &env),
        cmake: detector.locate_cmake(platform, &env),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Toolchains for {}:", report.platform);
    print_role("Compilers", &report.compilers);
    print_role("Build systems", &report.build_systems);
    print_role("Dependency managers", &report.dependency_managers);

    println!();
    match &report.cmake {
        Some(cmake) => println!("  CMake: {}", cmake.display()),
        None => {
            println!("  CMake: not found");
            global.shell().note(suggestions::CMAKE_MISSING);
        }
    }

    Ok(())
}

fn print_role(title: &str, candidates: &[ToolchainCandidate]) {
    println!();
    println!("  {}:", title);
    if candidates.is_empty() {
        println!("    none found");
        return;
    }
    for (i, candidate) in candidates.iter().enumerate() {
        let mut notes = Vec::new();
        if i == 0 {
            notes.push("default");
        }
        if candidate.requires_bootstrap {
            notes.push("needs vcvarsall");
        }
        if !candidate.on_path {
            notes.push("not on PATH");
        }

        if notes.is_empty() {
            println!("    {}", candidate.describe());
        } else {
            println!("    {} [{}]", candidate.describe(), notes.join(", "));
        }
    }
}
