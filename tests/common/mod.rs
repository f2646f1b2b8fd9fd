//! Shared fixture: a temporary repository with `<gem>/` and
//! `owl-bot-staging/<gem>/` directories.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use owlbot_postprocessor::{Config, MANIFEST_FILE_NAME, Manifest};
use tempfile::TempDir;

pub struct Fixture {
    _td: TempDir,
    pub repo: PathBuf,
    pub gem: String,
}

impl Fixture {
    pub fn new(gem: &str) -> Self {
        let td = tempfile::tempdir().expect("create tempdir");
        let repo = td.path().join("repo");
        let fx = Self {
            _td: td,
            repo,
            gem: gem.to_string(),
        };
        fs::create_dir_all(fx.gem_dir_of(gem)).expect("create gem dir");
        fs::create_dir_all(fx.staging_dir_of(gem)).expect("create staging dir");
        fx
    }

    pub fn config(&self) -> Config {
        let mut cfg = Config::new(&self.repo);
        cfg.log_file = None;
        cfg
    }

    pub fn staging_root(&self) -> PathBuf {
        self.repo.join("owl-bot-staging")
    }

    pub fn gem_dir(&self) -> PathBuf {
        self.gem_dir_of(&self.gem)
    }

    pub fn gem_dir_of(&self, gem: &str) -> PathBuf {
        self.repo.join(gem)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir_of(&self.gem)
    }

    pub fn staging_dir_of(&self, gem: &str) -> PathBuf {
        self.staging_root().join(gem)
    }

    pub fn staging_file(&self, rel: &str, content: &str) {
        write(&self.staging_dir(), rel, content);
    }

    pub fn staging_file_in(&self, gem: &str, rel: &str, content: &str) {
        write(&self.staging_dir_of(gem), rel, content);
    }

    pub fn gem_file(&self, rel: &str, content: &str) {
        write(&self.gem_dir(), rel, content);
    }

    pub fn gem_file_in(&self, gem: &str, rel: &str, content: &str) {
        write(&self.gem_dir_of(gem), rel, content);
    }

    #[cfg(unix)]
    pub fn staging_symlink(&self, rel: &str, target: &str) {
        symlink(&self.staging_dir(), rel, target);
    }

    #[cfg(unix)]
    pub fn gem_symlink(&self, rel: &str, target: &str) {
        symlink(&self.gem_dir(), rel, target);
    }

    pub fn existing_manifest(&self, generated: &[&str], static_paths: &[&str]) {
        let m = Manifest::new(
            generated.iter().map(|s| s.to_string()).collect(),
            static_paths.iter().map(|s| s.to_string()).collect(),
        );
        m.save(&self.manifest_path()).expect("write manifest");
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.gem_dir().join(MANIFEST_FILE_NAME)
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::load(&self.manifest_path()).expect("load manifest")
    }

    pub fn generated(&self) -> Vec<String> {
        self.manifest().generated.into_iter().collect()
    }

    pub fn static_paths(&self) -> Vec<String> {
        self.manifest().static_paths.into_iter().collect()
    }

    pub fn read_gem(&self, rel: &str) -> String {
        read(&self.gem_dir(), rel)
    }

    pub fn read_gem_in(&self, gem: &str, rel: &str) -> String {
        read(&self.gem_dir_of(gem), rel)
    }

    pub fn gem_has(&self, rel: &str) -> bool {
        fs::symlink_metadata(self.gem_dir().join(rel)).is_ok()
    }

    /// Visible (non-dot) entries under the gem dir, files and directories alike.
    pub fn visible_entries(&self) -> usize {
        walkdir::WalkDir::new(self.gem_dir())
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(Result::ok)
            .count()
    }
}

pub fn write(base: &Path, rel: &str, content: &str) {
    let path = base.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, content).expect("write file");
}

pub fn read(base: &Path, rel: &str) -> String {
    let path = base.join(rel);
    assert!(path.is_file(), "expected a file at {}", path.display());
    fs::read_to_string(&path).expect("read file")
}

#[cfg(unix)]
pub fn symlink(base: &Path, rel: &str, target: &str) {
    let path = base.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::os::unix::fs::symlink(target, &path).expect("create symlink");
}

pub fn strs(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}
