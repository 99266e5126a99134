//! Test utilities and mocks for keel unit tests.
//!
//! Detection and bootstrap talk to the machine through [`Host`], so most
//! tests run against a [`MockHost`]: an in-memory filesystem plus a scripted
//! process executor. Prompts, the build backend and the dependency manager
//! have recording stand-ins as well.
//!
//! # Example
//!
//! ```rust,ignore
//! use keel::test_support::{MockHost, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let mut host = MockHost::new();
//!     host.add_file("/usr/bin/gcc");
//!     host.add_file("/usr/bin/g++");
//!     host.expect_contains("gcc --version", MockProcessOutput::success("gcc 13.2.0"));
//!
//!     // Detect against the mock host...
//! }
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};
use semver::Version;

use crate::backend::{BuildBackend, BuildInvocation, ConfigureInvocation};
use crate::core::cache::TOOLCHAIN_DESCRIPTOR;
use crate::core::configuration::{CompilerId, CompilerVariant, Generator};
use crate::core::platform::Platform;
use crate::core::workspace::CACHE_MARKER;
use crate::deps::{DependencyManager, InstallOutcome, InstallRequest};
use crate::env::EnvironmentContext;
use crate::toolchain::{Role, ToolchainCandidate};
use crate::util::host::{CapturedOutput, Host};
use crate::util::process::ProcessBuilder;
use crate::util::prompt::Prompter;

pub use fixtures::*;

/// Mock filesystem for testing without real I/O.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: Vec<PathBuf>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        MockFileSystem::default()
    }

    /// Add a file with the given content. Parent directories are created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, content.into());
    }

    /// Add a directory and all of its ancestors.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() || self.dirs.contains(&path) {
            return;
        }
        let mut current = path.clone();
        while let Some(parent) = current.parent() {
            if parent.as_os_str().is_empty() {
                break;
            }
            if !self.dirs.contains(&parent.to_path_buf()) {
                self.dirs.push(parent.to_path_buf());
            }
            current = parent.to_path_buf();
        }
        self.dirs.push(path);
    }

    pub fn read_to_string(&self, path: &Path) -> Result<String> {
        let Some(bytes) = self.files.get(path) else {
            bail!("file not found: {}", path.display());
        };
        String::from_utf8(bytes.clone()).map_err(|e| anyhow::anyhow!("invalid UTF-8: {}", e))
    }

    pub fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.dirs.iter().any(|d| d == path)
    }

    /// Every file and directory path.
    pub fn all_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys().chain(self.dirs.iter())
    }
}

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MockProcessOutput {
    /// A successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn with_output(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

impl From<MockProcessOutput> for CapturedOutput {
    fn from(output: MockProcessOutput) -> Self {
        CapturedOutput {
            code: Some(output.status),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Pattern for matching command lines in [`MockExecutor`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    Exact(String),
    StartsWith(String),
    Contains(String),
    Regex(String),
    Any,
}

impl CommandPattern {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    pub pattern: CommandPattern,
    pub output: MockProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    pub used: usize,
}

impl CommandExpectation {
    pub fn new(pattern: CommandPattern, output: MockProcessOutput) -> Self {
        CommandExpectation {
            pattern,
            output,
            times: None,
            used: 0,
        }
    }

    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    fn available(&self) -> bool {
        self.times.map_or(true, |n| self.used < n)
    }
}

/// Scripted process executor.
///
/// Expectations are matched in the order they were added. Unmatched
/// commands use the default output, or fail when there is none.
#[derive(Debug, Default)]
pub struct MockExecutor {
    expectations: Vec<CommandExpectation>,
    calls: Vec<String>,
    default_output: Option<MockProcessOutput>,
}

impl MockExecutor {
    pub fn new() -> Self {
        MockExecutor::default()
    }

    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(CommandPattern::Exact(cmd.to_string()), output))
    }

    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            output,
        ))
    }

    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            output,
        ))
    }

    pub fn expect_pattern(&mut self, expectation: CommandExpectation) -> &mut Self {
        self.expectations.push(expectation);
        self
    }

    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.default_output = Some(output);
        self
    }

    /// Record a command line and return its scripted output.
    pub fn run(&mut self, command_line: &str) -> Result<MockProcessOutput> {
        self.calls.push(command_line.to_string());

        for exp in &mut self.expectations {
            if exp.available() && exp.pattern.matches(command_line) {
                exp.used += 1;
                return Ok(exp.output.clone());
            }
        }

        match &self.default_output {
            Some(default) => Ok(default.clone()),
            None => bail!("unexpected command: {}", command_line),
        }
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Verify that all counted expectations were used exactly.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in self.expectations.iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!("expectation {} was used {} times, expected {}", i, exp.used, expected);
                }
            }
        }
        Ok(())
    }
}

/// In-memory [`Host`]: a mock filesystem plus a mock executor.
///
/// `find_program` searches the `PATH` entries of the environment it is
/// given, so the same host answers differently before and after a
/// bootstrap merges a new `PATH`.
#[derive(Debug, Default)]
pub struct MockHost {
    fs: MockFileSystem,
    executor: Mutex<MockExecutor>,
}

impl MockHost {
    pub fn new() -> Self {
        MockHost::default()
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>) {
        self.fs.add_file(path, Vec::new());
    }

    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        self.fs.add_dir(path);
    }

    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) {
        self.executor_mut().expect_contains(substring, output);
    }

    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) {
        self.executor_mut().expect_prefix(prefix, output);
    }

    pub fn set_default(&mut self, output: MockProcessOutput) {
        self.executor_mut().set_default(output);
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        match self.executor.lock() {
            Ok(exec) => exec.calls().to_vec(),
            Err(poisoned) => poisoned.into_inner().calls().to_vec(),
        }
    }

    fn executor_mut(&mut self) -> &mut MockExecutor {
        match self.executor.get_mut() {
            Ok(exec) => exec,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn execute(&self, command_line: &str) -> Result<CapturedOutput> {
        let mut exec = match self.executor.lock() {
            Ok(exec) => exec,
            Err(poisoned) => poisoned.into_inner(),
        };
        exec.run(command_line).map(CapturedOutput::from)
    }
}

impl Host for MockHost {
    fn find_program(&self, name: &str, env: &EnvironmentContext) -> Option<PathBuf> {
        let file_name = env.platform().exe_name(name);
        env.path_entries()
            .into_iter()
            .map(|dir| dir.join(&file_name))
            .find(|p| self.fs.is_file(p))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.fs.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.fs.is_dir(path)
    }

    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        let Ok(pattern) = glob::Pattern::new(pattern) else {
            return Vec::new();
        };
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..glob::MatchOptions::new()
        };
        let mut found: Vec<PathBuf> = self
            .fs
            .all_paths()
            .filter(|p| pattern.matches_with(&p.to_string_lossy(), options))
            .cloned()
            .collect();
        found.sort();
        found.dedup();
        found
    }

    fn run(&self, cmd: &ProcessBuilder) -> Result<CapturedOutput> {
        self.execute(&cmd.display_command())
    }

    fn source_script(
        &self,
        script: &Path,
        args: &[String],
        _env: &EnvironmentContext,
    ) -> Result<CapturedOutput> {
        self.execute(&format!("source {} {}", script.display(), args.join(" ")))
    }
}

/// A detected compiler candidate.
pub fn compiler_candidate(compiler: CompilerId, path: &str, version: Option<&str>) -> ToolchainCandidate {
    ToolchainCandidate {
        role: Role::Compiler,
        id: match compiler {
            CompilerId::MSVC => "msvc".to_string(),
            CompilerId::GCC => "gcc".to_string(),
            _ => "clang".to_string(),
        },
        variant: compiler.variant.map(|v: CompilerVariant| v.as_str().to_string()),
        executable: PathBuf::from(path),
        version: version.and_then(|v| Version::parse(v).ok()),
        requires_bootstrap: compiler == CompilerId::MSVC,
        on_path: compiler != CompilerId::MSVC,
    }
}

/// A detected build backend candidate.
pub fn backend_candidate(generator: Generator, path: &str) -> ToolchainCandidate {
    let (id, variant) = match generator {
        Generator::Ninja => ("ninja", None),
        Generator::UnixMakefiles => ("make", None),
        Generator::VisualStudio(version) => ("msbuild", Some(version.year().to_string())),
    };
    ToolchainCandidate {
        role: Role::Backend,
        id: id.to_string(),
        variant,
        executable: PathBuf::from(path),
        version: None,
        requires_bootstrap: false,
        on_path: !generator.is_visual_studio(),
    }
}

/// A detected Conan candidate.
pub fn conan_candidate(path: &str) -> ToolchainCandidate {
    ToolchainCandidate {
        role: Role::DependencyManager,
        id: "conan".to_string(),
        variant: None,
        executable: PathBuf::from(path),
        version: None,
        requires_bootstrap: false,
        on_path: true,
    }
}

/// A canned answer for [`ScriptedPrompter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// Pick the item with this index.
    Select(usize),
    /// Pick the item whose label contains this text.
    SelectLabel(&'static str),
    /// Accept whatever the default is.
    Default,
    Confirm(bool),
    Cancel,
}

/// An interactive prompter that replays canned answers.
///
/// Running out of answers is a cancel, so a test that prompts more than
/// it expected fails on the outcome rather than hanging.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        ScriptedPrompter {
            answers: RefCell::new(answers.into_iter().collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    /// Answers that were never consumed.
    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, prompt: &str) -> Option<Answer> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers.borrow_mut().pop_front()
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn select(&self, prompt: &str, items: &[String], default: usize) -> io::Result<Option<usize>> {
        Ok(match self.next(prompt) {
            Some(Answer::Select(i)) if i < items.len() => Some(i),
            Some(Answer::SelectLabel(label)) => items.iter().position(|item| item.contains(label)),
            Some(Answer::Default) => Some(default),
            _ => None,
        })
    }

    fn confirm(&self, prompt: &str, default: bool) -> io::Result<Option<bool>> {
        Ok(match self.next(prompt) {
            Some(Answer::Confirm(value)) => Some(value),
            Some(Answer::Default) => Some(default),
            _ => None,
        })
    }
}

/// A build backend that records invocations instead of running CMake.
///
/// A successful configure writes a cache marker holding the generator and
/// the configured variables, like CMake would.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub configure_code: i32,
    pub build_code: i32,
    invocations: Mutex<Vec<String>>,
    environments: Mutex<Vec<EnvironmentContext>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        RecordingBackend::default()
    }

    pub fn failing_build(code: i32) -> Self {
        RecordingBackend {
            build_code: code,
            ..RecordingBackend::default()
        }
    }

    pub fn failing_configure(code: i32) -> Self {
        RecordingBackend {
            configure_code: code,
            ..RecordingBackend::default()
        }
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Environments passed to each invocation, in order.
    pub fn environments(&self) -> Vec<EnvironmentContext> {
        self.environments.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, line: String, env: &EnvironmentContext) {
        if let Ok(mut invocations) = self.invocations.lock() {
            invocations.push(line);
        }
        if let Ok(mut envs) = self.environments.lock() {
            envs.push(env.clone());
        }
    }
}

impl BuildBackend for RecordingBackend {
    fn configure(&self, invocation: &ConfigureInvocation, env: &EnvironmentContext) -> Result<i32> {
        let vars: Vec<String> = invocation
            .variables
            .iter()
            .map(|(k, v)| format!("-D{}={}", k, v))
            .collect();
        self.record(
            format!(
                "configure {} -G {} {}",
                invocation.workspace_dir.display(),
                invocation.generator.cmake_name(),
                vars.join(" ")
            ),
            env,
        );

        if self.configure_code == 0 {
            let mut cache = format!("CMAKE_GENERATOR:INTERNAL={}\n", invocation.generator.cmake_name());
            for (key, value) in &invocation.variables {
                cache.push_str(&format!("{}:STRING={}\n", key, value));
            }
            std::fs::create_dir_all(&invocation.workspace_dir)?;
            std::fs::write(invocation.workspace_dir.join(CACHE_MARKER), cache)?;
        }
        Ok(self.configure_code)
    }

    fn build(&self, invocation: &BuildInvocation, env: &EnvironmentContext) -> Result<i32> {
        self.record(
            format!(
                "build {} {} -j{}",
                invocation.workspace_dir.display(),
                invocation.build_type,
                invocation.jobs
            ),
            env,
        );
        Ok(self.build_code)
    }
}

/// A dependency manager that records installs and writes a toolchain
/// descriptor on success.
#[derive(Debug, Default)]
pub struct RecordingDependencyManager {
    pub exit_code: i32,
    installs: Mutex<Vec<PathBuf>>,
}

impl RecordingDependencyManager {
    pub fn new() -> Self {
        RecordingDependencyManager::default()
    }

    pub fn failing(code: i32) -> Self {
        RecordingDependencyManager {
            exit_code: code,
            installs: Mutex::new(Vec::new()),
        }
    }

    /// Workspaces installed into, in order.
    pub fn installs(&self) -> Vec<PathBuf> {
        self.installs.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

impl DependencyManager for RecordingDependencyManager {
    fn name(&self) -> &str {
        "conan"
    }

    fn install(&self, request: &InstallRequest<'_>, _env: &EnvironmentContext) -> Result<InstallOutcome> {
        if let Ok(mut installs) = self.installs.lock() {
            installs.push(request.workspace_dir.to_path_buf());
        }

        if self.exit_code != 0 {
            return Ok(InstallOutcome::failed(self.exit_code));
        }

        std::fs::create_dir_all(request.workspace_dir)?;
        let descriptor = request.workspace_dir.join(TOOLCHAIN_DESCRIPTOR);
        std::fs::write(&descriptor, "# generated\n")?;
        Ok(InstallOutcome::installed(descriptor))
    }
}

/// Cache text for a configured workspace.
pub fn cache_text(entries: &[(&str, &str)]) -> String {
    let mut text = String::from("# This is the CMakeCache file.\n\n");
    let map: BTreeMap<_, _> = entries.iter().copied().collect();
    for (key, value) in map {
        text.push_str(&format!("{}:STRING={}\n", key, value));
    }
    text
}

/// An empty environment with a `PATH` for the platform.
pub fn env_with_path(platform: Platform, path: &str) -> EnvironmentContext {
    EnvironmentContext::empty(platform).with("PATH", path)
}
