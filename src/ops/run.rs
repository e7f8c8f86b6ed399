//! Implementation of task invocation.

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::BuildConfig;
use crate::ops;
use crate::util::{GlobalContext, ProcessBuilder};

/// Build the delegate, then invoke it with the requested task names.
///
/// Returns the delegate's exit code so the caller can propagate it.
/// A delegate killed by a signal maps to exit code 1.
pub fn run(ctx: &GlobalContext, config: &BuildConfig, tasks: &[String]) -> Result<i32> {
    ops::build(ctx, config)?;

    let delegate = ctx.cwd().join(&config.artifact);
    debug!("delegating to {}", delegate.display());

    let status = ProcessBuilder::new(&delegate)
        .args(tasks)
        .envs(&config.toolchain_env)
        .cwd(ctx.cwd())
        .status()
        .with_context(|| format!("failed to invoke task delegate {}", delegate.display()))?;

    Ok(status.code().unwrap_or(1))
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

    #[cfg(unix)]
    fn install_stub_delegate(dir: &std::path::Path, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let bin = dir.join(".bosun").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let delegate = bin.join("delegate-bosun");
        std::fs::write(&delegate, script).unwrap();
        std::fs::set_permissions(&delegate, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_run_propagates_delegate_exit_code() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        install_stub_delegate(tmp.path(), "#!/bin/sh\nexit 4\n");
        let config = stub_config("exit 0");

        let code = run(&ctx, &config, &[]).unwrap();
        assert_eq!(code, 4);
    }

    #[test]
    #[cfg(unix)]
    fn test_run_passes_task_names_through() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        install_stub_delegate(
            tmp.path(),
            "#!/bin/sh\ntest \"$1\" = lint && test \"$2\" = test\n",
        );
        let config = stub_config("exit 0");

        let code = run(
            &ctx,
            &config,
            &["lint".to_string(), "test".to_string()],
        )
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_run_stops_when_build_fails() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        install_stub_delegate(tmp.path(), "#!/bin/sh\nexit 0\n");
        let config = stub_config("exit 1");

        assert!(run(&ctx, &config, &[]).is_err());
    }
}
