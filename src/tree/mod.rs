//! Read-only views over a directory tree: entry enumeration and ignore rules.

pub mod ignore_rules;
pub mod walker;

pub use ignore_rules::{IgnoreRules, is_ignored};
pub use walker::{EntryKind, TreeEntry, list, list_or_empty};
