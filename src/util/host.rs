//! Access to the host filesystem and processes for probing.
//!
//! Detection and bootstrap only talk to the machine through [`Host`], so they
//! can be exercised against an in-memory host in tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::env::EnvironmentContext;
use crate::util::process::{exit_code, ProcessBuilder};

/// Captured result of a probe subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable exit status.
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "no exit code".to_string(),
        }
    }
}

/// Operations the toolchain detector and bootstrapper need from the machine.
pub trait Host {
    /// Look up an executable on the `PATH` of `env`.
    fn find_program(&self, name: &str, env: &EnvironmentContext) -> Option<PathBuf>;

    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Expand a glob pattern into existing paths, sorted.
    fn glob(&self, pattern: &str) -> Vec<PathBuf>;

    /// Run a command to completion and capture its output.
    fn run(&self, cmd: &ProcessBuilder) -> Result<CapturedOutput>;

    /// Run an environment script in a subshell and dump the resulting
    /// environment as `key=value` lines on stdout.
    fn source_script(
        &self,
        script: &Path,
        args: &[String],
        env: &EnvironmentContext,
    ) -> Result<CapturedOutput>;
}

/// The real machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealHost;

impl Host for RealHost {
    fn find_program(&self, name: &str, env: &EnvironmentContext) -> Option<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(name, env.get("PATH"), cwd).ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        match glob::glob(pattern) {
            Ok(paths) => {
                let mut found: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
                found.sort();
                found
            }
            Err(e) => {
                tracing::debug!("Invalid glob pattern {}: {}", pattern, e);
                Vec::new()
            }
        }
    }

    fn run(&self, cmd: &ProcessBuilder) -> Result<CapturedOutput> {
        let output = cmd.exec()?;
        Ok(CapturedOutput {
            code: Some(exit_code(&output.status)),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn source_script(
        &self,
        script: &Path,
        args: &[String],
        env: &EnvironmentContext,
    ) -> Result<CapturedOutput> {
        if env.platform().is_windows() {
            // A temporary batch file avoids cmd.exe quoting issues with
            // paths under "Program Files (x86)".
            let mut batch = tempfile::Builder::new()
                .prefix("keel-env-")
                .suffix(".bat")
                .tempfile()
                .context("failed to create temporary batch file")?;

            let contents = format!(
                "@echo off\r\ncall \"{}\" {} >nul\r\nif errorlevel 1 exit /b 1\r\nset\r\n",
                script.display(),
                args.join(" ")
            );
            batch
                .write_all(contents.as_bytes())
                .context("failed to write temporary batch file")?;
            batch.flush()?;

            let cmd = ProcessBuilder::new("cmd")
                .arg("/c")
                .arg(batch.path())
                .environment(env);
            self.run(&cmd)
        } else {
            // `.` takes no arguments in POSIX sh; the sourced script sees
            // the positional parameters of the shell instead
            let cmd = ProcessBuilder::new("sh")
                .arg("-c")
                .arg("keel_script=\"$1\"; shift; . \"$keel_script\" >/dev/null && env")
                .arg("sh")
                .arg(script)
                .args(args)
                .environment(env);
            self.run(&cmd)
        }
    }
}
