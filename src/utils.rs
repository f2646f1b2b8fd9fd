//! Small path helpers shared by the reconcile, hook and driver modules.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::errors::OwlBotError;

/// Render a relative path with `/` separators regardless of platform.
pub(crate) fn rel_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a caller-supplied relative path onto `base`, refusing absolute paths
/// and any `..` that would leave `base`.
pub(crate) fn join_within(base: &Path, rel: &str) -> Result<PathBuf, OwlBotError> {
    let candidate = Path::new(rel);
    let mut out = base.to_path_buf();
    let mut depth = 0usize;
    for comp in candidate.components() {
        match comp {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                out.pop();
                depth -= 1;
            }
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(OwlBotError::PathEscape(rel.to_string()));
            }
        }
    }
    if depth == 0 {
        return Err(OwlBotError::PathEscape(rel.to_string()));
    }
    Ok(out)
}

/// Remove `start` and then each parent directory while it is empty, stopping
/// before `root`. Non-empty or missing directories end the climb quietly.
pub(crate) fn remove_empty_dirs_upward(root: &Path, start: &Path) -> io::Result<()> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        match fs::remove_dir(dir) {
            Ok(()) => debug!(path = %dir.display(), "removed empty directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) if is_not_empty(&e) => break,
            Err(e) => return Err(e),
        }
        current = dir.parent();
    }
    Ok(())
}

fn is_not_empty(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::DirectoryNotEmpty {
        return true;
    }
    // Some platforms report EEXIST for rmdir on a populated directory.
    #[cfg(unix)]
    if let Some(code) = e.raw_os_error() {
        return code == libc::ENOTEMPTY || code == libc::EEXIST;
    }
    false
}

/// True if `dir` exists and contains no entries.
pub(crate) fn dir_is_empty(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rel_string_uses_forward_slashes() {
        let p: PathBuf = ["lib", "my", "gem.rb"].iter().collect();
        assert_eq!(rel_string(&p), "lib/my/gem.rb");
    }

    #[test]
    fn join_within_rejects_escapes() {
        let base = Path::new("/repo/gem");
        assert_eq!(
            join_within(base, "lib/./a.rb").unwrap(),
            PathBuf::from("/repo/gem/lib/a.rb")
        );
        assert_eq!(
            join_within(base, "lib/../b.rb").unwrap(),
            PathBuf::from("/repo/gem/b.rb")
        );
        assert!(join_within(base, "../other/a.rb").is_err());
        assert!(join_within(base, "/etc/passwd").is_err());
        assert!(join_within(base, ".").is_err());
    }

    #[test]
    fn removes_only_empty_chain() {
        let td = tempdir().unwrap();
        let root = td.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::write(root.join("a/keep.txt"), "k").unwrap();

        remove_empty_dirs_upward(root, &root.join("a/b/c")).unwrap();
        assert!(!root.join("a/b").exists());
        assert!(root.join("a").exists());
        assert!(!dir_is_empty(root).unwrap());
    }
}
