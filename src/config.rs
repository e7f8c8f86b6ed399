//! Build configuration resolution.
//!
//! A project is a directory holding a single task definition source file,
//! `bosun.cpp` or `bosun.c`. Resolution inspects the directory and the
//! environment, picks a compiler, bootstraps the MSVC toolchain when that
//! compiler is `cl`, and assembles the one-line command that compiles the
//! definition into the delegate executable.

use std::env;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::toolchain::{self, EnvironmentProvider, ScriptEnvironment, ToolchainError};
use crate::util::GlobalContext;

/// C++ task definition file name, checked first.
pub const DEFINITION_FILE_CPP: &str = "bosun.cpp";

/// C task definition file name, the fallback.
pub const DEFINITION_FILE_C: &str = "bosun.c";

/// Project-local directory holding caches and build artifacts.
pub const PROJECT_DIR: &str = ".bosun";

/// Artifact subdirectory basename inside the project directory.
pub const ARTIFACT_DIR: &str = "bin";

/// Basename of the compiled task delegate, before any `.exe` suffix.
pub const ARTIFACT_BASENAME: &str = "delegate-bosun";

/// The MSVC compiler driver. Selecting it triggers toolchain bootstrap.
pub const MSVC_COMPILER: &str = "cl";

/// Default C++ compiler outside of Windows.
pub const DEFAULT_COMPILER_CPP: &str = "c++";

/// Default C compiler outside of Windows.
pub const DEFAULT_COMPILER_C: &str = "cc";

/// Source language of a task definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// C++, resolved from `bosun.cpp`.
    Cpp,

    /// C, resolved from `bosun.c`.
    C,
}

impl Lang {
    /// Name of the compiler override variable for this language.
    pub fn compiler_var(&self) -> &'static str {
        match self {
            Lang::Cpp => "CXX",
            Lang::C => "CC",
        }
    }

    /// Name of the language-specific flags variable.
    pub fn flags_var(&self) -> &'static str {
        match self {
            Lang::Cpp => "CXXFLAGS",
            Lang::C => "CFLAGS",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lang::Cpp => write!(f, "C++"),
            Lang::C => write!(f, "C"),
        }
    }
}

/// Errors from build configuration resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither task definition file exists in the working directory.
    #[error(
        "no task definition found: expected {} or {} in {}",
        DEFINITION_FILE_CPP,
        DEFINITION_FILE_C,
        dir.display()
    )]
    DefinitionNotFound { dir: PathBuf },

    /// Toolchain environment bootstrap failed.
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
}

/// Resolved parameters for building and running the task delegate.
///
/// Paths are kept relative to the project directory, matching how they are
/// embedded in the build command; operations resolve them against the
/// context working directory when touching the filesystem.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Whether the runtime environment is (COMSPEC) Windows.
    pub windows: bool,

    /// The task definition source file, `bosun.cpp` or `bosun.c`.
    pub definition: PathBuf,

    /// Language of the task definition.
    pub lang: Lang,

    /// Compiler executable used to build the delegate.
    pub compiler: String,

    /// Project-local cache directory, `.bosun`.
    pub cache_dir: PathBuf,

    /// Toolchain environment cache file, `.bosun/bosun-env.txt`.
    pub cache_file: PathBuf,

    /// Directory receiving the delegate executable, `.bosun/bin`.
    pub artifact_dir: PathBuf,

    /// The delegate executable path, with `.exe` appended on Windows.
    pub artifact: PathBuf,

    /// Shell line that compiles the definition into the delegate.
    pub build_command: String,

    /// Variables captured by toolchain bootstrap, passed to child processes.
    pub toolchain_env: Vec<(String, String)>,
}

impl BuildConfig {
    /// Resolve the build configuration for the context working directory.
    ///
    /// Toolchain bootstrap, when needed, goes through the script named by
    /// `BOSUN_TOOLCHAIN_QUERY_PATH` or the stock Visual Studio install.
    pub fn load(ctx: &GlobalContext) -> Result<Self, ResolveError> {
        Self::load_with_provider(ctx, &ScriptEnvironment::from_env())
    }

    /// Resolve with an explicit toolchain environment provider.
    pub fn load_with_provider(
        ctx: &GlobalContext,
        provider: &dyn EnvironmentProvider,
    ) -> Result<Self, ResolveError> {
        let cache_dir = PathBuf::from(PROJECT_DIR);
        let cache_file = cache_dir.join(toolchain::ENV_CACHE_FILE);

        let windows = detect_windows_environment();

        // bosun.cpp wins when both definitions exist.
        let (definition, lang) = if ctx.cwd().join(DEFINITION_FILE_CPP).exists() {
            (PathBuf::from(DEFINITION_FILE_CPP), Lang::Cpp)
        } else if ctx.cwd().join(DEFINITION_FILE_C).exists() {
            (PathBuf::from(DEFINITION_FILE_C), Lang::C)
        } else {
            return Err(ResolveError::DefinitionNotFound {
                dir: ctx.cwd().to_path_buf(),
            });
        };

        let mut compiler = if windows {
            MSVC_COMPILER.to_string()
        } else if lang == Lang::Cpp {
            DEFAULT_COMPILER_CPP.to_string()
        } else {
            DEFAULT_COMPILER_C.to_string()
        };

        // A blank override keeps the default.
        if let Some(chosen) = non_empty_var(lang.compiler_var()) {
            compiler = chosen;
        }

        debug!("resolved {} compiler: {}", lang, compiler);
        advise_if_missing(&compiler);

        let toolchain_env = if compiler == MSVC_COMPILER {
            toolchain::apply(&ctx.project_dir(), &ctx.cwd().join(&cache_file), provider)?
        } else {
            Vec::new()
        };

        let artifact_dir = cache_dir.join(ARTIFACT_DIR);
        let mut artifact_name = String::from(ARTIFACT_BASENAME);
        if windows {
            artifact_name.push_str(".exe");
        }
        let artifact = artifact_dir.join(&artifact_name);

        let cppflags = non_empty_var("CPPFLAGS");
        let lang_flags = non_empty_var(lang.flags_var());

        let build_command = assemble_build_command(
            &compiler,
            &definition.display().to_string(),
            &artifact.display().to_string(),
            cppflags.as_deref(),
            lang_flags.as_deref(),
        );

        debug!("build command: {}", build_command);

        Ok(BuildConfig {
            windows,
            definition,
            lang,
            compiler,
            cache_dir,
            cache_file,
            artifact_dir,
            artifact,
            build_command,
            toolchain_env,
        })
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ windows: {}, definition: {}, lang: {}, compiler: {}, cache_dir: {}, cache_file: {}, artifact_dir: {}, artifact: {}, build_command: {} }}",
            self.windows,
            self.definition.display(),
            self.lang,
            self.compiler,
            self.cache_dir.display(),
            self.cache_file.display(),
            self.artifact_dir.display(),
            self.artifact.display(),
            self.build_command,
        )
    }
}

/// Whether the runtime environment is Windows, judged by COMSPEC presence.
///
/// Native Command Prompt and PowerShell sessions carry COMSPEC; Cygwin-style
/// environments such as WSL, MSYS2, and Git Bash do not.
pub fn detect_windows_environment() -> bool {
    env::var_os("COMSPEC").is_some()
}

/// Read an environment variable, treating blank values as unset.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Advisory PATH lookup for the chosen compiler.
///
/// Resolution still proceeds either way; the build step surfaces the hard
/// failure. `cl` is skipped because it only resolves after toolchain
/// bootstrap.
fn advise_if_missing(compiler: &str) {
    if compiler == MSVC_COMPILER {
        return;
    }
    match which::which(compiler) {
        Ok(path) => debug!("compiler resolves to {}", path.display()),
        Err(_) => warn!("compiler `{}` not found on PATH", compiler),
    }
}

/// Assemble the one-line compile command.
///
/// MSVC takes `cl [flags] <definition> /link /out:<artifact>`; every other
/// compiler takes `<compiler> -o <artifact> [flags] <definition>`. Flag
/// strings are inserted verbatim, so multi-flag values pass through intact.
fn assemble_build_command(
    compiler: &str,
    definition: &str,
    artifact: &str,
    cppflags: Option<&str>,
    lang_flags: Option<&str>,
) -> String {
    let mut parts: Vec<String> = vec![compiler.to_string()];

    if compiler == MSVC_COMPILER {
        parts.extend(cppflags.map(str::to_string));
        parts.extend(lang_flags.map(str::to_string));
        parts.push(definition.to_string());
        parts.push("/link".to_string());
        parts.push(format!("/out:{}", artifact));
    } else {
        parts.push("-o".to_string());
        parts.push(artifact.to_string());
        parts.extend(cppflags.map(str::to_string));
        parts.extend(lang_flags.map(str::to_string));
        parts.push(definition.to_string());
    }

    parts.join(" ")
}
