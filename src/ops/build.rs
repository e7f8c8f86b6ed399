//! Implementation of delegate compilation.

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::util::fs::ensure_dir;
use crate::util::process::shell_command;
use crate::util::GlobalContext;

/// Compile the task definition into the delegate executable.
///
/// The compiler always runs and decides for itself whether anything needs
/// rebuilding. Toolchain variables captured during resolution are threaded
/// into the compiler process explicitly.
pub fn build(ctx: &GlobalContext, config: &BuildConfig) -> Result<()> {
    ensure_dir(&ctx.cwd().join(&config.artifact_dir))?;

    info!("compiling {}", config.definition.display());
    debug!("running: {}", config.build_command);

    let mut command = shell_command(&config.build_command);
    command.current_dir(ctx.cwd());
    for (key, value) in &config.toolchain_env {
        command.env(key, value);
    }

    let status = command
        .status()
        .with_context(|| format!("failed to run `{}`", config.build_command))?;

    if !status.success() {
        bail!(
            "build command `{}` failed with {}",
            config.build_command,
            status
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Lang;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn stub_config(build_command: &str) -> BuildConfig {
        BuildConfig {
            windows: false,
            definition: PathBuf::from("bosun.cpp"),
            lang: Lang::Cpp,
            compiler: "c++".to_string(),
            cache_dir: PathBuf::from(".bosun"),
            cache_file: Path::new(".bosun").join("bosun-env.txt"),
            artifact_dir: Path::new(".bosun").join("bin"),
            artifact: Path::new(".bosun").join("bin").join("delegate-bosun"),
            build_command: build_command.to_string(),
            toolchain_env: Vec::new(),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_build_creates_artifact_dir() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let config = stub_config("exit 0");

        build(&ctx, &config).unwrap();

        assert!(tmp.path().join(".bosun").join("bin").is_dir());
    }

    #[test]
    #[cfg(unix)]
    fn test_build_failure_names_the_command() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let config = stub_config("exit 1");

        let err = build(&ctx, &config).unwrap_err();
        assert!(err.to_string().contains("exit 1"));
    }

    #[test]
    #[cfg(unix)]
    fn test_build_runs_from_project_directory() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let config = stub_config("touch probe-file");

        build(&ctx, &config).unwrap();

        assert!(tmp.path().join("probe-file").exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_toolchain_env_reaches_compiler_process() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let mut config = stub_config("test \"$BOSUN_OPS_PROBE\" = on");
        config.toolchain_env = vec![("BOSUN_OPS_PROBE".to_string(), "on".to_string())];

        build(&ctx, &config).unwrap();
    }
}
