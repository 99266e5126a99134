//! Formatting, static analysis and documentation.
//!
//! Each tool is invoked over a list of files and reports what happened.
//! None of them decide whether a failure is fatal; the caller does.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::workspace::BUILD_ROOT;
use crate::env::EnvironmentContext;
use crate::util::context::ProjectContext;
use crate::util::fs::{is_source_file, source_files};
use crate::util::host::Host;
use crate::util::process::ProcessBuilder;

/// Name of the compilation database CMake exports.
pub const COMPILE_COMMANDS: &str = "compile_commands.json";

/// Subdirectories of a workspace that may hold the compilation database.
const DATABASE_SUBDIRS: &[&str] = &["build", "debug", "release", "relwithdebinfo"];

/// Outcome of running a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolReport {
    pub tool: String,
    /// Number of files the tool was run on.
    pub files: usize,
    /// Files the tool failed on.
    pub failures: Vec<PathBuf>,
}

impl ToolReport {
    fn new(tool: &str) -> Self {
        ToolReport {
            tool: tool.to_string(),
            ..ToolReport::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_success() {
            format!("{} on {} file(s)", self.tool, self.files)
        } else {
            format!(
                "{} failed on {} of {} file(s)",
                self.tool,
                self.failures.len(),
                self.files
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompileCommand {
    directory: PathBuf,
    file: PathBuf,
}

/// Run `clang-format -i` over the project's sources.
pub fn format(project: &ProjectContext, host: &dyn Host, env: &EnvironmentContext) -> Result<ToolReport> {
    let config = project.config();
    let exe = find_tool(host, config.clang_format(), env)?;
    let files = source_files(project.root(), &config.source_dirs(), &config.tools.exclude_dirs);
    tracing::debug!("Formatting {} files", files.len());

    let mut report = ToolReport::new("clang-format");
    for file in files {
        let cmd = ProcessBuilder::new(&exe)
            .arg("-style=file")
            .arg("-i")
            .arg(&file)
            .cwd(project.root())
            .environment(env);
        run_on(host, &cmd, file, &mut report);
    }
    Ok(report)
}

/// Run `clang-tidy` over the project files in the workspace's compilation database.
pub fn lint(
    project: &ProjectContext,
    host: &dyn Host,
    env: &EnvironmentContext,
    workspace_dir: &Path,
) -> Result<ToolReport> {
    let config = project.config();
    let exe = find_tool(host, config.clang_tidy(), env)?;

    let Some(database_dir) = find_compile_commands(workspace_dir) else {
        bail!(
            "{} not found in {}; configure the workspace first",
            COMPILE_COMMANDS,
            workspace_dir.display()
        );
    };
    let files = database_files(project, &database_dir.join(COMPILE_COMMANDS))?;
    tracing::debug!("Linting {} files from {}", files.len(), database_dir.display());

    let mut report = ToolReport::new("clang-tidy");
    for file in files {
        let cmd = ProcessBuilder::new(&exe)
            .arg(format!("-p={}", database_dir.display()))
            .arg(&file)
            .cwd(project.root())
            .environment(env);
        run_on(host, &cmd, file, &mut report);
    }
    Ok(report)
}

/// Run `doxygen` with the project's Doxyfile.
pub fn docs(project: &ProjectContext, host: &dyn Host, env: &EnvironmentContext) -> Result<ToolReport> {
    let exe = find_tool(host, project.config().doxygen(), env)?;

    let doxyfile = [
        project.root().join("Doxyfile"),
        project.root().join("docs/doxygen/Doxyfile"),
    ]
    .into_iter()
    .find(|p| p.is_file())
    .with_context(|| format!("no Doxyfile found in {}", project.root().display()))?;

    let dir = doxyfile.parent().unwrap_or(project.root()).to_path_buf();
    let cmd = ProcessBuilder::new(&exe)
        .arg(&doxyfile)
        .cwd(&dir)
        .environment(env);

    let mut report = ToolReport::new("doxygen");
    run_on(host, &cmd, doxyfile, &mut report);
    Ok(report)
}

/// Directory holding `compile_commands.json`: the workspace, one of the
/// usual nested build directories, or anything up to three levels down.
pub fn find_compile_commands(workspace_dir: &Path) -> Option<PathBuf> {
    if workspace_dir.join(COMPILE_COMMANDS).is_file() {
        return Some(workspace_dir.to_path_buf());
    }

    for subdir in DATABASE_SUBDIRS {
        let candidate = workspace_dir.join(subdir);
        if candidate.join(COMPILE_COMMANDS).is_file() {
            return Some(candidate);
        }
    }

    walkdir::WalkDir::new(workspace_dir)
        .min_depth(2)
        .max_depth(4)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name() == COMPILE_COMMANDS)
        .and_then(|e| e.path().parent().map(Path::to_path_buf))
}

/// Project sources listed in a compilation database, skipping generated
/// and excluded files.
fn database_files(project: &ProjectContext, database: &Path) -> Result<Vec<PathBuf>> {
    let contents = std::fs::read_to_string(database)
        .with_context(|| format!("failed to read {}", database.display()))?;
    let commands: Vec<CompileCommand> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", database.display()))?;

    let root = project.root();
    let build_root = root.join(BUILD_ROOT);
    let excluded: Vec<PathBuf> = project
        .config()
        .tools
        .exclude_dirs
        .iter()
        .map(|d| root.join(d))
        .collect();

    let mut files: Vec<PathBuf> = commands
        .into_iter()
        .map(|c| {
            if c.file.is_absolute() {
                c.file
            } else {
                c.directory.join(c.file)
            }
        })
        .filter(|f| {
            f.starts_with(root)
                && !f.starts_with(&build_root)
                && !excluded.iter().any(|e| f.starts_with(e))
                && is_source_file(f)
        })
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

fn find_tool(host: &dyn Host, name: &str, env: &EnvironmentContext) -> Result<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() && host.is_file(path) {
        return Ok(path.to_path_buf());
    }
    match host.find_program(name, env) {
        Some(exe) => Ok(exe),
        None => bail!("{} was not found on PATH", name),
    }
}

fn run_on(host: &dyn Host, cmd: &ProcessBuilder, file: PathBuf, report: &mut ToolReport) {
    report.files += 1;
    match host.run(cmd) {
        Ok(output) if output.success() => {}
        Ok(output) => {
            tracing::warn!("{} failed on {} ({})", report.tool, file.display(), output.status_text());
            for line in output.stdout.lines().chain(output.stderr.lines()).take(20) {
                tracing::info!("{}", line);
            }
            report.failures.push(file);
        }
        Err(e) => {
            tracing::warn!("{}: {:#}", report.tool, e);
            report.failures.push(file);
        }
    }
}
