//! Permission bits follow the staged file.

use anyhow::Result;
use std::path::Path;

#[cfg(unix)]
pub(super) fn copy_mode(src: &Path, dest: &Path) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use super::helpers::io_error_with_help;

    let src_mode = fs::metadata(src)
        .map_err(io_error_with_help("stat staged file", src))?
        .permissions()
        .mode()
        & 0o777;
    let dest_meta = fs::metadata(dest).map_err(io_error_with_help("stat destination file", dest))?;
    if dest_meta.permissions().mode() & 0o777 != src_mode {
        let mut perms = dest_meta.permissions();
        perms.set_mode(src_mode);
        fs::set_permissions(dest, perms).map_err(io_error_with_help("set permissions", dest))?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub(super) fn copy_mode(_src: &Path, _dest: &Path) -> Result<()> {
    Ok(())
}
