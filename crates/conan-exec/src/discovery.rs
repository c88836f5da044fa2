//! Discovery of the `conan` executable

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{ExecError, Result};

/// Name of the package manager executable
pub const CONAN_PROGRAM: &str = "conan";

/// Locate the package manager executable.
///
/// An explicit path wins and must point at an existing file. Otherwise the
/// directories of `PATH` are searched in order.
pub fn locate_conan(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(dunce::canonicalize(path)?);
        }
        return Err(ExecError::NotFound {
            program: path.display().to_string(),
        });
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    find_in_path(CONAN_PROGRAM, &path_var).ok_or_else(|| ExecError::NotFound {
        program: CONAN_PROGRAM.to_string(),
    })
}

/// Search a `PATH`-style list of directories for `program`.
pub fn find_in_path(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidate_names(program).map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidate_names(program: &str) -> impl Iterator<Item = String> {
    [
        format!("{program}.exe"),
        format!("{program}.bat"),
        format!("{program}.cmd"),
        program.to_string(),
    ]
    .into_iter()
}

#[cfg(not(windows))]
fn candidate_names(program: &str) -> impl Iterator<Item = String> {
    std::iter::once(program.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
