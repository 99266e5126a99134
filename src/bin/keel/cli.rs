//! CLI definitions using clap.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use keel::core::{BuildType, CompilerId, GeneratorRequest, Platform};
use keel::util::shell::{ColorChoice, Shell};
use keel::ConfigRequest;

/// keel - Detect toolchains, pick a configuration and build CMake projects
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// When to use colors (auto, always, never)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Project root (defaults to the nearest directory with a CMakeLists.txt)
    #[arg(long, global = true, env = "KEEL_PROJECT_DIR", value_name = "PATH")]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn global(&self) -> GlobalOptions {
        GlobalOptions {
            verbose: self.verbose,
            quiet: self.quiet,
            color: self.color,
            project_dir: self.project_dir.clone(),
        }
    }
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub verbose: bool,
    pub quiet: bool,
    pub color: ColorChoice,
    pub project_dir: Option<PathBuf>,
}

impl GlobalOptions {
    pub fn shell(&self) -> Shell {
        Shell::from_flags(self.quiet, self.verbose, self.color)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure (if needed) and build the project
    Build(BuildArgs),

    /// Resolve a configuration and configure a workspace without building
    Configure(ConfigureArgs),

    /// Show detected compilers, build systems and dependency managers
    Toolchain(ToolchainArgs),

    /// List configured workspaces
    Workspaces,

    /// Remove build workspaces
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Configuration values. Anything left out is taken from the workspace
/// cache, asked for, or defaulted.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Build type (debug, release, relwithdebinfo)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub build_type: Option<BuildType>,

    /// Compiler (gcc, clang, clang-cl, msvc)
    #[arg(short, long)]
    pub compiler: Option<CompilerId>,

    /// Build system (ninja, make, msbuild, vs2019, vs2022)
    #[arg(short = 'b', long = "build-system", value_name = "SYSTEM")]
    pub build_system: Option<GeneratorRequest>,

    /// Target platform (linux, windows, macos)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Build only the core library
    #[arg(long)]
    pub core_only: bool,

    /// Build tests
    #[arg(long, overrides_with = "no_tests")]
    pub tests: bool,

    /// Don't build tests
    #[arg(long, overrides_with = "tests")]
    pub no_tests: bool,

    /// Build examples
    #[arg(long, overrides_with = "no_examples")]
    pub examples: bool,

    /// Don't build examples
    #[arg(long, overrides_with = "examples")]
    pub no_examples: bool,

    /// Install dependencies with Conan
    #[arg(long, overrides_with = "no_conan")]
    pub use_conan: bool,

    /// Don't use Conan
    #[arg(long, overrides_with = "use_conan")]
    pub no_conan: bool,

    /// Conan profile name (from the profiles directory)
    #[arg(long)]
    pub profile: Option<String>,

    /// Extra arguments passed to the configure step, as one string
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub cmake_args: Option<String>,

    /// Never prompt; use cached values and defaults
    #[arg(long)]
    pub no_interactive: bool,
}

impl ConfigArgs {
    pub fn request(&self) -> ConfigRequest {
        ConfigRequest {
            platform: self.platform,
            build_type: self.build_type,
            compiler: self.compiler,
            generator: self.build_system,
            core_only: self.core_only.then_some(true),
            build_tests: switch(self.tests, self.no_tests),
            build_examples: switch(self.examples, self.no_examples),
            dependency_manager: switch(self.use_conan, self.no_conan),
        }
    }

    /// `--cmake-args` split the way a POSIX shell would.
    pub fn cmake_args(&self) -> Result<Vec<String>> {
        match &self.cmake_args {
            Some(args) => shlex::split(args).with_context(|| format!("invalid --cmake-args: {}", args)),
            None => Ok(Vec::new()),
        }
    }
}

fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Remove the workspace before configuring
    #[arg(long)]
    pub clean: bool,

    /// Don't reconfigure an already configured workspace
    #[arg(long)]
    pub skip_configure: bool,

    /// Run clang-format before building
    #[arg(long)]
    pub format: bool,

    /// Run clang-tidy after building
    #[arg(long)]
    pub lint: bool,

    /// Generate documentation with doxygen after building
    #[arg(long)]
    pub docs: bool,
}

#[derive(Args)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Remove the workspace before configuring
    #[arg(long)]
    pub clean: bool,
}

#[derive(Args)]
pub struct ToolchainArgs {
    /// Platform to detect for (defaults to the host)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Print candidates as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Build type of the workspace to remove
    #[arg(short = 't', long = "type", value_name = "TYPE", required_unless_present = "all")]
    pub build_type: Option<BuildType>,

    /// Platform of the workspace to remove (defaults to the host)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Remove every workspace
    #[arg(long, conflicts_with_all = ["build_type", "platform"])]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
