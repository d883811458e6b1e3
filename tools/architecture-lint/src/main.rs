//! CLI entry point for the repo-local architecture lint.
//!
//! With no arguments the lint checks `backend/` under the workspace root. A
//! single argument names another backend directory to check instead.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let backend_dir = match backend_dir() {
        Ok(dir) => dir,
        Err(err) => {
            let _ = writeln!(io::stderr().lock(), "{err}");
            return ExitCode::FAILURE;
        }
    };
    match architecture_lint::lint_backend_sources(&backend_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "{err}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RepoRootError;

impl fmt::Display for RepoRootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unable to locate workspace root (directory containing a workspace Cargo.toml)"
        )
    }
}

impl std::error::Error for RepoRootError {}

fn backend_dir() -> Result<PathBuf, RepoRootError> {
    if let Some(explicit) = std::env::args_os().nth(1) {
        return Ok(PathBuf::from(explicit));
    }
    repo_root().map(|root| root.join("backend"))
}

fn repo_root() -> Result<PathBuf, RepoRootError> {
    let from_env = std::env::var("CARGO_WORKSPACE_DIR").ok().map(PathBuf::from);
    let from_cwd = std::env::current_dir().ok();
    let from_manifest = Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")));

    [from_env, from_cwd, from_manifest]
        .iter()
        .flatten()
        .find_map(|start| find_workspace_root(start))
        .ok_or(RepoRootError)
}

fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| cargo_toml_declares_workspace(&dir.join("Cargo.toml")))
        .map(Path::to_path_buf)
}

fn cargo_toml_declares_workspace(path: &Path) -> bool {
    path.is_file()
        && fs::read_to_string(path)
            .ok()
            .is_some_and(|contents| contents.contains("[workspace]"))
}
