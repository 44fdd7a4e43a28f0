//! Filesystem helpers shared by the key and artifact code.
//!
//! Every write goes through a temporary file in the destination directory
//! followed by a rename, so readers never observe a half-written file.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Restrict a file to its owner (`0600`).
#[cfg(unix)]
pub fn restrict_permissions(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = file.metadata()?.permissions();
    perms.set_mode(0o600);
    file.set_permissions(perms)
}

#[cfg(not(unix))]
pub fn restrict_permissions(_file: &File) -> io::Result<()> {
    // Non-unix temp files inherit the owner-only ACLs of the user profile.
    Ok(())
}

/// Whether group or other permission bits are set on `path`.
#[cfg(unix)]
pub fn is_group_or_world_accessible(path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}

#[cfg(not(unix))]
pub fn is_group_or_world_accessible(_path: &Path) -> io::Result<bool> {
    Ok(false)
}

/// The directory containing `path`, with `.` standing in for a bare file name.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Absolute form of `path` with symlinks and `..` resolved.
///
/// Components that exist are canonicalized as they are reached; missing
/// ones are applied lexically, so paths that are about to be created can be
/// compared too.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => {
                resolved.push(other);
                match resolved.canonicalize() {
                    Ok(real) => resolved = real,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e),
                }
            }
        }
    }
    Ok(resolved)
}

/// Whether `path` is `dir` or lies anywhere beneath it, after resolution.
pub fn is_within(path: &Path, dir: &Path) -> io::Result<bool> {
    Ok(resolve_path(path)?.starts_with(resolve_path(dir)?))
}

/// Atomically replace `path` with `bytes`.
///
/// When `private` is set the file is created with owner-only permissions
/// before any data is written to it.
pub fn write_atomic(path: &Path, bytes: &[u8], private: bool) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".cv-")
        .tempfile_in(parent_dir(path))?;
    if private {
        restrict_permissions(tmp.as_file())?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
