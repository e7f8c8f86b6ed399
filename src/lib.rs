//! bosun - A minimal task runner for C and C++ projects
//!
//! This crate provides the core library functionality for bosun:
//! resolving a build configuration from the project directory and
//! environment, bootstrapping the MSVC toolchain when needed, and
//! compiling and invoking the user's task delegate.

pub mod config;
pub mod ops;
pub mod toolchain;
pub mod util;

pub use config::{BuildConfig, Lang, ResolveError};
pub use toolchain::{EnvironmentProvider, ScriptEnvironment, ToolchainError};
pub use util::context::GlobalContext;
