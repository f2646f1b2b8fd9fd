//! Landing one staged entry at the destination.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Reconciler;
use super::helpers::io_error_with_help;
use super::meta::copy_mode;
use crate::rules;
use crate::tree::{EntryKind, TreeEntry};

/// What sits at a destination path right now (never follows symlinks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Existing {
    Absent,
    File,
    Symlink,
    Dir,
}

impl Existing {
    pub(super) fn stat(path: &Path) -> Result<Self> {
        match fs::symlink_metadata(path) {
            Ok(meta) => {
                let ft = meta.file_type();
                Ok(if ft.is_symlink() {
                    Existing::Symlink
                } else if ft.is_dir() {
                    Existing::Dir
                } else {
                    Existing::File
                })
            }
            Err(e) if is_absent(&e) => Ok(Existing::Absent),
            Err(e) => Err(io_error_with_help("stat destination", path)(e)),
        }
    }
}

/// NotFound, or a file where a directory component was expected.
pub(super) fn is_absent(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::NotFound || e.kind() == io::ErrorKind::NotADirectory {
        return true;
    }
    #[cfg(unix)]
    if e.raw_os_error() == Some(libc::ENOTDIR) {
        return true;
    }
    false
}

impl Reconciler<'_> {
    /// Write one staged entry; returns false when it was left alone because it is protected.
    pub(super) fn land(&self, entry: &TreeEntry) -> Result<bool> {
        let dest = self.gem_dir.join(&entry.rel);
        let existing = Existing::stat(&dest)?;

        if existing != Existing::Absent && self.protection.is_protected(&entry.rel) {
            debug!(path = %entry.rel, "protected path exists; left untouched");
            return Ok(false);
        }

        match entry.kind {
            EntryKind::File => self.land_file(entry, &dest, existing)?,
            EntryKind::Symlink => self.land_symlink(entry, &dest, existing)?,
        }
        Ok(true)
    }

    fn land_file(&self, entry: &TreeEntry, dest: &Path, existing: Existing) -> Result<()> {
        let staged =
            fs::read(&entry.path).map_err(io_error_with_help("read staged file", &entry.path))?;
        let old = if existing == Existing::File {
            Some(fs::read(dest).map_err(io_error_with_help("read destination file", dest))?)
        } else {
            None
        };

        let merged = rules::preserve(&entry.rel, old.as_deref(), staged, &self.rules);
        let content = self.modifiers.apply_bytes(&entry.rel, merged)?;

        if old.as_deref() == Some(content.as_slice()) {
            debug!(path = %entry.rel, "destination already up to date");
        } else {
            self.clear_conflicts(dest, existing, EntryKind::File)?;
            fs::write(dest, &content).map_err(io_error_with_help("write file", dest))?;
            debug!(path = %entry.rel, bytes = content.len(), "wrote file");
        }
        copy_mode(&entry.path, dest)
    }

    fn land_symlink(&self, entry: &TreeEntry, dest: &Path, existing: Existing) -> Result<()> {
        let target =
            fs::read_link(&entry.path).map_err(io_error_with_help("read staged symlink", &entry.path))?;
        if existing == Existing::Symlink {
            let current =
                fs::read_link(dest).map_err(io_error_with_help("read destination symlink", dest))?;
            if current == target {
                debug!(path = %entry.rel, "symlink already up to date");
                return Ok(());
            }
        }
        self.clear_conflicts(dest, existing, EntryKind::Symlink)?;
        make_symlink(&target, dest)?;
        debug!(path = %entry.rel, target = %target.display(), "wrote symlink");
        Ok(())
    }

    /// Make room for `want` at `dest`: non-directories among the ancestors go,
    /// and so does whatever currently occupies `dest` unless it is a regular
    /// file about to be overwritten in place.
    fn clear_conflicts(&self, dest: &Path, existing: Existing, want: EntryKind) -> Result<()> {
        let mut blockers: Vec<PathBuf> = Vec::new();
        let mut anc = dest.parent();
        while let Some(dir) = anc {
            if dir == self.gem_dir || !dir.starts_with(self.gem_dir) {
                break;
            }
            blockers.push(dir.to_path_buf());
            anc = dir.parent();
        }
        // Shallowest first, so a blocking file is gone before its would-be children are checked.
        for dir in blockers.iter().rev() {
            match Existing::stat(dir)? {
                Existing::File | Existing::Symlink => {
                    debug!(path = %dir.display(), "removing non-directory in the way");
                    fs::remove_file(dir).map_err(io_error_with_help("remove conflicting entry", dir))?;
                }
                Existing::Dir | Existing::Absent => {}
            }
        }

        match (existing, want) {
            (Existing::Dir, _) => {
                debug!(path = %dest.display(), "removing directory replaced by a staged entry");
                fs::remove_dir_all(dest).map_err(io_error_with_help("remove conflicting directory", dest))?;
            }
            (Existing::Symlink, _) | (Existing::File, EntryKind::Symlink) => {
                fs::remove_file(dest).map_err(io_error_with_help("remove conflicting entry", dest))?;
            }
            (Existing::File, EntryKind::File) | (Existing::Absent, _) => {}
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_error_with_help("create directory", parent))?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link).map_err(io_error_with_help("create symlink", link))
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, link: &Path) -> Result<()> {
    anyhow::bail!("symlinks are not supported on this platform: {}", link.display())
}
