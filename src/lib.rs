//! Core library for `owlbot_postprocessor`.
//!
//! Reconciles a freshly generated staging tree into a gem directory of a
//! repository checkout. Generated files are overwritten, handwritten files are
//! left alone, and a few fields or lines inside regenerated files are carried
//! over from the previous version. A manifest (`.owlbot-manifest.json`) records
//! which paths are generated and which are static, so files the generator
//! stops producing can be deleted on the next run.
//!
//! Per-gem behavior can be customized with an `.owlbot.xml` extension script
//! (see [`hook::script`]) or, from Rust, with any [`hook::Hook`].

pub mod block_selector;
pub mod cli;
pub mod config;
pub mod driver;
pub mod errors;
pub mod hook;
pub mod manifest;
pub mod multi_wrapper;
pub mod output;
pub mod reconcile;
pub mod rules;
pub mod shutdown;
pub mod tree;
mod utils;

pub use block_selector::{Selection, SourceText, select_block};
pub use config::{
    Config, LogLevel, default_config_path, default_log_path, load_config, load_config_from_xml_path,
    path_has_symlink_ancestor,
};
pub use driver::{
    Unit, UnitOutcome, UnitReport, entrypoint, locate_unit, multi_entrypoint, reconcile_many,
    reconcile_one,
};
pub use errors::OwlBotError;
pub use hook::{
    CommandOutput, CommandRunner, DefaultHook, Hook, HookContext, ScriptHook, SystemCommandRunner,
};
pub use manifest::{MANIFEST_FILE_NAME, Manifest};
pub use rules::LibraryTypePolicy;
