use clap::Parser;
use owlbot_postprocessor::cli::Args;
use owlbot_postprocessor::config::types::{Config, LogLevel};
use std::path::PathBuf;

#[test]
fn gem_flag_selects_a_single_unit() {
    let args = Args::parse_from(["owlbot-postprocessor", "--gem", "google-cloud-language"]);
    assert_eq!(args.gem.as_deref(), Some("google-cloud-language"));

    let args = Args::parse_from(["owlbot-postprocessor", "--gem=another-gem"]);
    assert_eq!(args.gem.as_deref(), Some("another-gem"));

    let args = Args::parse_from(["owlbot-postprocessor"]);
    assert_eq!(args.gem, None);
}

#[test]
fn effective_log_level_precedence() {
    let args = Args::parse_from(["owlbot-postprocessor", "--debug", "--log-level", "quiet"]);
    assert_eq!(args.effective_log_level(), Some(LogLevel::Debug)); // --debug wins

    let args = Args::parse_from(["owlbot-postprocessor", "-d"]);
    assert_eq!(args.effective_log_level(), Some(LogLevel::Debug));

    let args = Args::parse_from(["owlbot-postprocessor", "--log-level", "info"]);
    assert_eq!(args.effective_log_level(), Some(LogLevel::Info));

    let args = Args::parse_from(["owlbot-postprocessor", "--log-level", "loud"]);
    assert_eq!(args.effective_log_level(), None);
}

#[test]
fn apply_overrides_sets_flags() {
    let args = Args::parse_from([
        "owlbot-postprocessor",
        "--repo-dir",
        "/repo",
        "--staging-root",
        "generated",
        "--log-level",
        "quiet",
        "--log-file",
        "/tmp/owlbot.log",
        "--json",
    ]);
    let mut cfg = Config::default();
    args.apply_overrides(&mut cfg);

    assert_eq!(cfg.repo_dir, PathBuf::from("/repo"));
    assert_eq!(cfg.staging_root_path(), PathBuf::from("/repo/generated"));
    assert_eq!(cfg.log_level, LogLevel::Quiet);
    assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/owlbot.log")));
    assert!(cfg.json);
}

#[test]
fn unset_flags_leave_config_alone() {
    let args = Args::parse_from(["owlbot-postprocessor"]);
    let mut cfg = Config::new("/somewhere");
    cfg.log_level = LogLevel::Info;
    args.apply_overrides(&mut cfg);

    assert_eq!(cfg.repo_dir, PathBuf::from("/somewhere"));
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert!(!cfg.json);
}
