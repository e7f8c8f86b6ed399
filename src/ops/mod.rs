//! High-level operations.
//!
//! This module contains the implementation of bosun commands.

pub mod build;
pub mod clean;
pub mod run;

pub use build::build;
pub use clean::clean;
pub use run::run;
