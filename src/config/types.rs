//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use super::{DEFAULT_PRESERVED_PATHS, SCRIPT_NAME_DEFAULT, STAGING_ROOT_DEFAULT};
use crate::manifest::MANIFEST_FILE_NAME;
use crate::rules::LibraryTypePolicy;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Unit-level milestones (default)
    #[default]
    Normal,
    /// Per-unit detail
    Info,
    /// Per-entry decisions
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one postprocessor run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository root holding one directory per gem
    pub repo_dir: PathBuf,
    /// Staging root, relative to `repo_dir` unless absolute
    pub staging_root: PathBuf,
    /// Manifest file name inside each gem directory
    pub manifest_name: String,
    /// Extension script file name inside each gem directory
    pub script_name: String,
    /// Glob patterns protected in every run, before any script runs
    pub preserved_paths: Vec<String>,
    pub library_type: LibraryTypePolicy,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Emit logs as JSON lines
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            staging_root: PathBuf::from(STAGING_ROOT_DEFAULT),
            manifest_name: MANIFEST_FILE_NAME.to_string(),
            script_name: SCRIPT_NAME_DEFAULT.to_string(),
            preserved_paths: DEFAULT_PRESERVED_PATHS.iter().map(|s| s.to_string()).collect(),
            library_type: LibraryTypePolicy::default(),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path(),
            json: false,
        }
    }
}

impl Config {
    /// Config rooted at `repo_dir`; other fields use defaults.
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            ..Default::default()
        }
    }

    /// Absolute-or-repo-relative staging root.
    pub fn staging_root_path(&self) -> PathBuf {
        if self.staging_root.is_absolute() {
            self.staging_root.clone()
        } else {
            self.repo_dir.join(&self.staging_root)
        }
    }

    pub fn gem_dir(&self, name: &str) -> PathBuf {
        self.repo_dir.join(name)
    }
}
