//! Tree enumeration.
//!
//! Yields every regular file and symlink under a root as a root-relative,
//! `/`-separated path. Symlinks are reported as single entries and never
//! descended into, even when they point at a directory. Directories are
//! implicit and not reported. `.git` directories are skipped.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::OwlBotError;
use crate::utils::rel_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Symlink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Root-relative path with `/` separators.
    pub rel: String,
    /// Absolute (root-joined) path.
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Lazily enumerate entries under `root`, sorted by name within each directory.
///
/// Fails with an IO error (NotFound) on the first item if `root` does not exist.
pub fn list(root: &Path) -> impl Iterator<Item = Result<TreeEntry>> + '_ {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"))
        .filter_map(move |res| {
            let entry = match res {
                Ok(entry) => entry,
                Err(e) => return Some(Err(walk_error(root, e))),
            };
            let ftype = entry.file_type();
            let kind = if ftype.is_symlink() {
                EntryKind::Symlink
            } else if ftype.is_file() {
                EntryKind::File
            } else {
                if !ftype.is_dir() {
                    debug!(path = %entry.path().display(), "skipping special file");
                }
                return None;
            };
            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) => rel_string(rel),
                Err(e) => return Some(Err(e.into())),
            };
            Some(Ok(TreeEntry {
                rel,
                path: entry.into_path(),
                kind,
            }))
        })
}

/// Like [`list`], but a missing root is treated as an empty tree.
pub fn list_or_empty(root: &Path) -> Result<Vec<TreeEntry>> {
    match std::fs::symlink_metadata(root) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        _ => list(root).collect(),
    }
}

fn walk_error(root: &Path, e: walkdir::Error) -> anyhow::Error {
    let path = e.path().unwrap_or(root).to_path_buf();
    let message = match e.io_error() {
        Some(ioe) => ioe.to_string(),
        None => e.to_string(),
    };
    OwlBotError::Io {
        op: "enumerate".into(),
        path,
        message,
    }
    .into()
}
