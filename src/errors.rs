//! Typed error definitions for owlbot_postprocessor.
//! Provides a small set of well-known failure modes for better logs and tests.
//!
//! Library entry points return `anyhow::Result`; these variants travel inside
//! and can be recovered with `downcast_ref::<OwlBotError>()`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OwlBotError {
    #[error("No staging root dir: {0}")]
    NoStagingRoot(PathBuf),

    #[error("No staging dirs under {0}")]
    NoStagingDirs(PathBuf),

    #[error("Unable to choose a gem: there are multiple staging dirs under {root}: {}", names.join(", "))]
    MultipleStagingDirs { root: PathBuf, names: Vec<String> },

    #[error("Staging dir does not exist: {0}")]
    StagingMissing(PathBuf),

    #[error("Extension script {path} failed: {message}")]
    Script { path: PathBuf, message: String },

    #[error("{op} '{path}': {message}")]
    Io {
        op: String,
        path: PathBuf,
        message: String,
    },

    #[error("Preservation rule skipped for {path}: {reason}")]
    MergeRule { path: String, reason: String },

    #[error("Path '{0}' escapes the unit directory")]
    PathEscape(String),

    #[error("Command '{program}' exited with status {status}")]
    CommandFailed { program: String, status: i32 },
}

impl OwlBotError {
    /// Stable numeric code per kind, used in structured logs and as exit status.
    pub fn code(&self) -> i32 {
        match self {
            OwlBotError::NoStagingRoot(_) => 10,
            OwlBotError::NoStagingDirs(_) => 11,
            OwlBotError::MultipleStagingDirs { .. } => 12,
            OwlBotError::StagingMissing(_) => 13,
            OwlBotError::Script { .. } => 20,
            OwlBotError::PathEscape(_) => 21,
            OwlBotError::CommandFailed { .. } => 22,
            OwlBotError::Io { .. } => 30,
            OwlBotError::MergeRule { .. } => 40,
        }
    }

    /// True for the configuration family: nothing was reconciled.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OwlBotError::NoStagingRoot(_)
                | OwlBotError::NoStagingDirs(_)
                | OwlBotError::MultipleStagingDirs { .. }
                | OwlBotError::StagingMissing(_)
        )
    }
}
