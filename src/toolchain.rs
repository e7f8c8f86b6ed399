//! MSVC toolchain environment bootstrap.
//!
//! `cl.exe` only works inside the environment set up by `vcvarsall.bat`,
//! so the first build runs the script through the command shell, dumps the
//! resulting variables with `set`, and caches the dump under the project
//! directory. Later builds replay the cached dump instead of paying the
//! multi-second script startup again.
//!
//! The query strategy sits behind [`EnvironmentProvider`] so tests can
//! substitute a canned environment block for the real Visual Studio script.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Seek, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

use crate::util::process::shell_command;

/// Stock Visual Studio 2019 Community location of `vcvarsall.bat`.
pub const DEFAULT_VCVARS_SCRIPT: &str = r"C:\Program Files (x86)\Microsoft Visual Studio\2019\Community\VC\Auxiliary\Build\vcvarsall.bat";

/// Default target architecture passed to the setup script.
pub const DEFAULT_ARCH: &str = "x64";

/// Environment variable overriding the toolchain setup script path.
pub const TOOLCHAIN_QUERY_PATH_VAR: &str = "BOSUN_TOOLCHAIN_QUERY_PATH";

/// Environment variable overriding the target architecture.
pub const ARCH_VAR: &str = "BOSUN_ARCH";

/// File name of the cached environment dump inside the project directory.
pub const ENV_CACHE_FILE: &str = "bosun-env.txt";

/// Errors from toolchain environment bootstrap.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The environment query process could not be launched at all.
    #[error("failed to launch environment query `{command}`")]
    QueryLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The environment query ran but exited unsuccessfully.
    #[error("environment query `{command}` failed with {status}")]
    QueryFailed { command: String, status: ExitStatus },

    /// A cached environment line could not be applied to the process.
    #[error("cannot apply environment line `{line}`: {reason}")]
    EnvApply { line: String, reason: String },

    /// The environment cache could not be read or written.
    #[error("environment cache {}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raw result of an environment query.
#[derive(Debug)]
pub struct QueryOutput {
    /// Stdout of the query, split into lines.
    pub lines: Vec<String>,

    /// Exit status of the query process.
    pub status: ExitStatus,
}

/// Strategy for producing the toolchain environment block.
///
/// Production use shells out to a vendor setup script; tests substitute a
/// canned provider so no Visual Studio install is required.
pub trait EnvironmentProvider {
    /// The command line behind this provider, for logs and error messages.
    fn command_line(&self) -> String;

    /// Run the query and collect its stdout lines and exit status.
    fn capture(&self) -> Result<QueryOutput, ToolchainError>;
}

/// Queries the environment established by a toolchain setup script.
///
/// Runs `"<script>" <arch> && set` through the platform command shell and
/// captures the variable dump `set` prints on success.
#[derive(Debug, Clone)]
pub struct ScriptEnvironment {
    script: PathBuf,
    arch: String,
}

impl ScriptEnvironment {
    /// Create a provider for an explicit script and architecture.
    pub fn new(script: impl Into<PathBuf>, arch: impl Into<String>) -> Self {
        ScriptEnvironment {
            script: script.into(),
            arch: arch.into(),
        }
    }

    /// Build the provider from `BOSUN_TOOLCHAIN_QUERY_PATH` and `BOSUN_ARCH`,
    /// falling back to the stock Visual Studio 2019 install.
    pub fn from_env() -> Self {
        let script = env::var_os(TOOLCHAIN_QUERY_PATH_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VCVARS_SCRIPT));

        let arch = env::var(ARCH_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ARCH.to_string());

        ScriptEnvironment { script, arch }
    }

    fn shell_line(&self) -> String {
        format!("\"{}\" {} && set", self.script.display(), self.arch)
    }
}

impl EnvironmentProvider for ScriptEnvironment {
    fn command_line(&self) -> String {
        self.shell_line()
    }

    fn capture(&self) -> Result<QueryOutput, ToolchainError> {
        let line = self.shell_line();
        debug!("querying toolchain environment: {}", line);

        // stderr stays on the console so script diagnostics reach the user.
        let output = shell_command(&line)
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ToolchainError::QueryLaunch {
                command: line.clone(),
                source,
            })?;

        let lines = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();

        Ok(QueryOutput {
            lines,
            status: output.status,
        })
    }
}

/// Ensure the toolchain environment is cached and applied to this process.
///
/// An absent or empty cache triggers a query through `provider`; only stdout
/// lines containing `=` are persisted, and the query's exit status is checked
/// after they are written, so a failing script can leave its partial output
/// behind for inspection. Each cached line is then split on its first `=` and
/// applied to the process environment. The applied pairs are also returned so
/// callers can pass them to child processes explicitly.
pub fn apply(
    cache_dir: &Path,
    cache_path: &Path,
    provider: &dyn EnvironmentProvider,
) -> Result<Vec<(String, String)>, ToolchainError> {
    fs::create_dir_all(cache_dir).map_err(|source| ToolchainError::Cache {
        path: cache_dir.to_path_buf(),
        source,
    })?;

    let mut cache = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(cache_path)
        .map_err(|source| ToolchainError::Cache {
            path: cache_path.to_path_buf(),
            source,
        })?;

    let needs_query = match cache.metadata() {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };

    if needs_query {
        debug!("environment cache empty, querying toolchain");
        let output = provider.capture()?;

        for line in &output.lines {
            if line.contains('=') {
                writeln!(cache, "{}", line).map_err(|source| ToolchainError::Cache {
                    path: cache_path.to_path_buf(),
                    source,
                })?;
            }
        }

        if !output.status.success() {
            warn!(
                "environment query failed, partial cache left at {}",
                cache_path.display()
            );
            return Err(ToolchainError::QueryFailed {
                command: provider.command_line(),
                status: output.status,
            });
        }
    }

    cache.rewind().map_err(|source| ToolchainError::Cache {
        path: cache_path.to_path_buf(),
        source,
    })?;

    let mut pairs = Vec::new();

    for line in BufReader::new(&cache).lines() {
        let line = line.map_err(|source| ToolchainError::Cache {
            path: cache_path.to_path_buf(),
            source,
        })?;

        // Hand-edited caches may contain junk lines; only KEY=VALUE applies.
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        set_process_var(&line, key, value)?;
        pairs.push((key.to_string(), value.to_string()));
    }

    debug!("applied {} toolchain environment variables", pairs.len());
    Ok(pairs)
}

/// Validate and apply one variable to the process environment.
///
/// `std::env::set_var` panics on input the platform cannot represent, so
/// the conditions it would panic on are rejected up front.
fn set_process_var(line: &str, key: &str, value: &str) -> Result<(), ToolchainError> {
    if key.is_empty() {
        return Err(ToolchainError::EnvApply {
            line: line.to_string(),
            reason: "empty variable name".to_string(),
        });
    }
    if key.contains('\0') || value.contains('\0') {
        return Err(ToolchainError::EnvApply {
            line: line.to_string(),
            reason: "embedded NUL".to_string(),
        });
    }

    env::set_var(key, value);
    Ok(())
}
