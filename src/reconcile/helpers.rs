//! I/O helper utilities.
//!
//! Wraps `io::Error` into [`OwlBotError::Io`] with the failing operation, the
//! path and a platform-aware hint, for use with `map_err`:
//!
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;

use std::io;
use std::path::Path;

use crate::errors::OwlBotError;

fn hint(e: &io::Error) -> Option<&'static str> {
    #[cfg(unix)]
    if let Some(code) = e.raw_os_error() {
        let h = match code {
            libc::EACCES | libc::EPERM => "permission denied; check ownership and write permissions",
            libc::ENOENT => "path not found; verify it exists",
            libc::ENOTDIR => "a path component is a file, not a directory",
            libc::EISDIR => "path is a directory",
            libc::ENOSPC => "insufficient space on device",
            libc::EROFS => "read-only filesystem; cannot write here",
            libc::ELOOP => "too many symbolic link levels; possible symlink cycle",
            libc::ENAMETOOLONG => "filename or path too long",
            _ => return None,
        };
        return Some(h);
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        _ => None,
    }
}

fn build_message(e: &io::Error) -> String {
    let mut msg = e.to_string();
    if let Some(h) = hint(e) {
        msg.push_str(" (");
        msg.push_str(h);
        msg.push(')');
    }
    msg
}

/// Adapter for anyhow::Result code.
/// Returns a closure suitable for `.map_err(...)`.
pub(crate) fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| {
        OwlBotError::Io {
            op: op.to_string(),
            path: path.to_path_buf(),
            message: build_message(&e),
        }
        .into()
    }
}
