// use macro form directly; no import needed
use std::fs;
use std::process::Command;

#[test]
fn binary_print_config_succeeds() {
    let me = assert_cmd::cargo::cargo_bin!("owlbot-postprocessor");
    let out = Command::new(me)
        .arg("--print-config")
        .output()
        .expect("spawn binary");
    assert!(out.status.success(), "binary should succeed with --print-config");
}

#[test]
fn binary_reconciles_a_selected_gem() {
    let td = tempfile::tempdir().expect("create tempdir");
    let repo = td.path();
    let staged = repo.join("owl-bot-staging/my-gem/lib");
    fs::create_dir_all(&staged).expect("create staging dir");
    fs::write(staged.join("hello.rb"), "puts 'hello'\n").expect("write staged file");

    let me = assert_cmd::cargo::cargo_bin!("owlbot-postprocessor");
    let out = Command::new(me)
        .env("OWLBOT_CONFIG", repo.join("no-config.xml"))
        .args(["--gem", "my-gem", "--log-level", "quiet", "--log-file"])
        .arg(repo.join("logs/owlbot.log"))
        .arg("--repo-dir")
        .arg(repo)
        .output()
        .expect("spawn binary");

    assert!(
        out.status.success(),
        "binary should succeed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(
        fs::read_to_string(repo.join("my-gem/lib/hello.rb")).expect("read landed file"),
        "puts 'hello'\n"
    );
    assert!(repo.join("my-gem/.owlbot-manifest.json").is_file());
    assert!(!repo.join("owl-bot-staging").exists());
}

#[test]
fn binary_fails_on_ambiguous_staging() {
    let td = tempfile::tempdir().expect("create tempdir");
    let repo = td.path();
    fs::create_dir_all(repo.join("owl-bot-staging/a")).expect("create staging dir");
    fs::create_dir_all(repo.join("owl-bot-staging/b")).expect("create staging dir");

    let me = assert_cmd::cargo::cargo_bin!("owlbot-postprocessor");
    let status = Command::new(me)
        .env("OWLBOT_CONFIG", repo.join("no-config.xml"))
        .args(["--gem", "c", "--log-level", "quiet", "--log-file"])
        .arg(repo.join("owlbot.log"))
        .arg("--repo-dir")
        .arg(repo)
        .status()
        .expect("spawn binary");
    assert!(!status.success(), "a missing gem staging dir must fail");
}

#[test]
fn binary_honors_gitignore_with_the_default_repo_dir() {
    let td = tempfile::tempdir().expect("create tempdir");
    let repo = td.path();
    fs::create_dir_all(repo.join("my-gem")).expect("create gem dir");
    fs::write(repo.join("my-gem/.gitignore"), "ignored.txt\n").expect("write gem .gitignore");
    fs::write(repo.join("my-gem/ignored.txt"), "local only\n").expect("write ignored file");
    fs::write(repo.join(".gitignore"), "Gemfile.lock\n").expect("write repo .gitignore");
    fs::write(repo.join("my-gem/Gemfile.lock"), "lock\n").expect("write lock file");
    let staged = repo.join("owl-bot-staging/my-gem");
    fs::create_dir_all(&staged).expect("create staging dir");
    fs::write(staged.join("hello.rb"), "puts 'hello'\n").expect("write staged file");

    // No --repo-dir: the binary works from "." inside the checkout.
    let me = assert_cmd::cargo::cargo_bin!("owlbot-postprocessor");
    let out = Command::new(me)
        .current_dir(repo)
        .env("OWLBOT_CONFIG", repo.join("no-config.xml"))
        .args(["--gem", "my-gem", "--log-level", "quiet", "--log-file"])
        .arg(repo.join("logs/owlbot.log"))
        .output()
        .expect("spawn binary");

    assert!(
        out.status.success(),
        "binary should succeed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let manifest: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(repo.join("my-gem/.owlbot-manifest.json")).expect("read manifest"),
    )
    .expect("parse manifest");
    assert_eq!(manifest["generated"], serde_json::json!(["hello.rb"]));
    assert_eq!(manifest["static"], serde_json::json!([".gitignore"]));
}
