//! Implementation of project cleanup.

use anyhow::Result;
use tracing::info;

use crate::util::fs::remove_dir_all_if_exists;
use crate::util::GlobalContext;

/// Remove the project-local `.bosun` directory, caches and artifacts alike.
///
/// Cleanup needs no resolved configuration, so it works even where no task
/// definition exists.
pub fn clean(ctx: &GlobalContext) -> Result<()> {
    let dir = ctx.project_dir();
    info!("removing {}", dir.display());
    remove_dir_all_if_exists(&dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_project_dir() {
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join(".bosun").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("delegate-bosun"), "stale").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        clean(&ctx).unwrap();

        assert!(!tmp.path().join(".bosun").exists());
    }

    #[test]
    fn test_clean_without_project_dir_is_ok() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        clean(&ctx).unwrap();
        clean(&ctx).unwrap();
    }
}
