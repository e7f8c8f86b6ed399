//! Global context for bosun operations.
//!
//! Carries the working directory every path in a run is resolved against,
//! which lets tests point an invocation at a scratch directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Global context containing paths and output settings.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        Ok(GlobalContext {
            cwd,
            verbose: false,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            verbose: false,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the project-local bosun directory (`<cwd>/.bosun`).
    pub fn project_dir(&self) -> PathBuf {
        self.cwd.join(".bosun")
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
    }

    #[test]
    fn test_with_cwd() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        assert_eq!(ctx.cwd(), tmp.path());
        assert_eq!(ctx.project_dir(), tmp.path().join(".bosun"));
    }

    #[test]
    fn test_verbose_flag() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        assert!(!ctx.is_verbose());
        ctx.set_verbose(true);
        assert!(ctx.is_verbose());
    }
}
