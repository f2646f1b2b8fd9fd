//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{load_config, load_config_from_xml_path};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "OWLBOT_CONFIG";
pub const STAGING_ROOT_DEFAULT: &str = "owl-bot-staging";
pub const SCRIPT_NAME_DEFAULT: &str = ".owlbot.xml";
pub const DEFAULT_PRESERVED_PATHS: &[&str] = &["CHANGELOG.md", "lib/**/version.rb"];
