//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod host;
pub mod process;
pub mod prompt;
pub mod shell;

pub use config::Config;
pub use context::ProjectContext;
pub use diagnostic::Diagnostic;
pub use host::{Host, RealHost};
pub use prompt::Prompter;
pub use shell::Shell;
