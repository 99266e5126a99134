//! Subprocess environments and vendor environment bootstrap.

pub mod bootstrap;
pub mod context;

pub use bootstrap::{
    BootstrapFailure, BootstrapOutcome, BootstrapSpec, Bootstrapper, ImportPolicy, VendorScript,
};
pub use context::{merge_environment, EnvironmentContext};
