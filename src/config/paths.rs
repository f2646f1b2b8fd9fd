//! Default path helpers and symlink checks.

use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

const APP_DIR: &str = "owlbot_postprocessor";

/// Config path: `$OWLBOT_CONFIG` if set, else the OS config dir.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    if let Some(base) = config_dir() {
        return Some(base.join(APP_DIR).join("config.xml"));
    }
    env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join(APP_DIR).join("config.xml"))
}

/// OS-appropriate default log file path (data dir). The directory is not created here.
pub fn default_log_path() -> Option<PathBuf> {
    data_dir().map(|base| base.join(APP_DIR).join("owlbot.log"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if !anc.as_os_str().is_empty() && anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
