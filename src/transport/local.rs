//! Local subprocess execution and symlink refresh.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Run `command` through `shell` in `cwd` with inherited stdin/stdout/stderr.
/// Returns the subprocess exit code; blocks until it finishes.
pub fn exec_inherited(shell: &[String], command: &str, cwd: &Path) -> Result<i32> {
    let (program, leading) = shell.split_first().ok_or_else(|| Error::Spawn {
        program: String::new(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty shell"),
    })?;

    let status = Command::new(program)
        .args(leading)
        .arg(command)
        .current_dir(cwd)
        .status()
        .map_err(|e| Error::Spawn {
            program: program.clone(),
            source: e,
        })?;

    Ok(super::exit_code(status))
}

/// Create `link` pointing at `target`, replacing whatever file or symlink is
/// already at `link`. A real directory at `link` is left alone and reported.
pub fn refresh_symlink(link: &Path, target: &Path) -> Result<()> {
    if !cfg!(any(unix, windows)) {
        return Err(Error::io(link, unsupported()));
    }
    if let Ok(meta) = std::fs::symlink_metadata(link) {
        if meta.is_dir() {
            return Err(Error::io(
                link,
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "refusing to replace a directory with a symlink",
                ),
            ));
        }
        std::fs::remove_file(link).map_err(|e| Error::io(link, e))?;
    }
    create_symlink(target, link).map_err(|e| Error::io(link, e))
}

fn unsupported() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    )
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(unsupported())
}
