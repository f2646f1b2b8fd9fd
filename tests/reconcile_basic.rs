mod common;

use common::{Fixture, strs};
use owlbot_postprocessor::entrypoint;

#[test]
fn copies_files_into_an_empty_gem_dir() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.staging_file("hello.txt", "hello world\n");
    fx.staging_file("lib/hello.rb", "puts 'hello'\n");

    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.read_gem("hello.txt"), "hello world\n");
    assert_eq!(fx.read_gem("lib/hello.rb"), "puts 'hello'\n");
    assert!(!fx.staging_dir().exists(), "staging dir should be removed");
    assert!(!fx.staging_root().exists(), "empty staging root should be removed");
    // Two files and one directory
    assert_eq!(fx.visible_entries(), 3);

    assert_eq!(strs(&fx.generated()), ["hello.txt", "lib/hello.rb"]);
    assert!(fx.static_paths().is_empty());
    Ok(())
}

#[test]
fn copies_files_into_an_existing_gem_dir() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.gem_file("hello.txt", "hello world\n");
    fx.gem_file("lib/bye.rb", "puts 'bye'\n");
    fx.gem_file("lib/stay.rb", "puts 'stay'\n");
    fx.staging_file("hello.txt", "hello again\n");
    fx.staging_file("lib/hello.rb", "puts 'hello'\n");
    fx.staging_file("lib/stay.rb", "puts 'stay'\n");

    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.read_gem("hello.txt"), "hello again\n");
    assert_eq!(fx.read_gem("lib/bye.rb"), "puts 'bye'\n");
    assert_eq!(fx.read_gem("lib/hello.rb"), "puts 'hello'\n");
    assert_eq!(fx.read_gem("lib/stay.rb"), "puts 'stay'\n");
    // Four files and one directory
    assert_eq!(fx.visible_entries(), 5);

    assert_eq!(strs(&fx.generated()), ["hello.txt", "lib/hello.rb", "lib/stay.rb"]);
    assert_eq!(strs(&fx.static_paths()), ["lib/bye.rb"]);
    Ok(())
}

#[test]
fn deletes_files_no_longer_generated() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.gem_file("hello.txt", "hello world\n");
    fx.gem_file("lib/bye.rb", "puts 'bye'\n");
    fx.staging_file("hello.txt", "hello again\n");
    fx.staging_file("lib/hello.rb", "puts 'hello'\n");
    fx.existing_manifest(&["hello.txt", "lib/bye.rb"], &[]);

    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.read_gem("hello.txt"), "hello again\n");
    assert_eq!(fx.read_gem("lib/hello.rb"), "puts 'hello'\n");
    assert!(!fx.gem_has("lib/bye.rb"), "stale generated file should be deleted");
    assert_eq!(fx.visible_entries(), 3);

    assert_eq!(strs(&fx.generated()), ["hello.txt", "lib/hello.rb"]);
    assert!(fx.static_paths().is_empty());
    Ok(())
}

#[test]
fn keeps_existing_changelog_and_version_files() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.gem_file("CHANGELOG.md", "old changelog\n");
    fx.gem_file("lib/my/gem/version.rb", "VERSION = 'old'\n");
    fx.gem_file("lib/hello.rb", "puts 'hello1'\n");
    fx.staging_file("CHANGELOG.md", "new changelog\n");
    fx.staging_file("lib/my/gem/version.rb", "VERSION = 'new'\n");
    fx.staging_file("lib/hello.rb", "puts 'hello2'\n");

    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.read_gem("CHANGELOG.md"), "old changelog\n");
    assert_eq!(fx.read_gem("lib/my/gem/version.rb"), "VERSION = 'old'\n");
    assert_eq!(fx.read_gem("lib/hello.rb"), "puts 'hello2'\n");

    // Protected files that were kept are not claimed as generated.
    assert_eq!(strs(&fx.generated()), ["lib/hello.rb"]);
    assert_eq!(strs(&fx.static_paths()), ["CHANGELOG.md", "lib/my/gem/version.rb"]);
    Ok(())
}

#[test]
fn protected_files_land_when_absent() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.staging_file("CHANGELOG.md", "first changelog\n");

    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.read_gem("CHANGELOG.md"), "first changelog\n");
    assert_eq!(strs(&fx.generated()), ["CHANGELOG.md"]);
    Ok(())
}

#[test]
fn handles_deletion_cases() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.gem_file("CHANGELOG.md", "old changelog\n");
    fx.gem_file("lib/my/gem/version.rb", "VERSION = 'old'\n");
    fx.gem_file("lib/foo/hello.rb", "puts 'hello1'\n");
    fx.gem_file("lib/bar/hello.rb", "puts 'hello2'\n");
    fx.existing_manifest(&["CHANGELOG.md", "lib/my/gem/version.rb", "lib/foo/hello.rb"], &[]);

    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.read_gem("CHANGELOG.md"), "old changelog\n");
    assert_eq!(fx.read_gem("lib/my/gem/version.rb"), "VERSION = 'old'\n");
    assert!(!fx.gem_has("lib/foo/hello.rb"));
    assert!(!fx.gem_has("lib/foo"), "emptied directory should be removed");
    assert_eq!(fx.read_gem("lib/bar/hello.rb"), "puts 'hello2'\n");

    assert!(fx.generated().is_empty());
    assert_eq!(
        strs(&fx.static_paths()),
        ["CHANGELOG.md", "lib/bar/hello.rb", "lib/my/gem/version.rb"]
    );
    Ok(())
}

#[test]
fn deals_with_types_changing() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.gem_file("hello", "hello world\n");
    fx.gem_file("foo/bar.rb", "puts 'bar'\n");
    fx.staging_file("hello/foo.txt", "hello again\n");
    fx.staging_file("foo", "bar\n");

    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.read_gem("hello/foo.txt"), "hello again\n");
    assert_eq!(fx.read_gem("foo"), "bar\n");
    assert!(!fx.gem_has("foo/bar.rb"));
    // Two files and one directory
    assert_eq!(fx.visible_entries(), 3);

    assert_eq!(strs(&fx.generated()), ["foo", "hello/foo.txt"]);
    assert!(fx.static_paths().is_empty());
    Ok(())
}

#[test]
fn staged_manifest_is_not_copied() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.staging_file("hello.txt", "hello\n");
    fx.staging_file(".owlbot-manifest.json", "{\"generated\": [\"bogus\"], \"static\": []}\n");

    entrypoint(&fx.config(), None)?;

    assert_eq!(strs(&fx.generated()), ["hello.txt"]);
    Ok(())
}

#[test]
fn second_run_with_same_staging_is_stable() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.gem_file("static.txt", "here before\n");
    fx.staging_file("hello.txt", "hello world\n");
    fx.staging_file("lib/hello.rb", "# Copyright 2021 Google LLC\nputs 'hello'\n");
    entrypoint(&fx.config(), None)?;
    let first = fx.manifest();

    fx.staging_file("hello.txt", "hello world\n");
    fx.staging_file("lib/hello.rb", "# Copyright 2021 Google LLC\nputs 'hello'\n");
    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.manifest(), first);
    assert_eq!(fx.read_gem("hello.txt"), "hello world\n");
    assert_eq!(fx.read_gem("static.txt"), "here before\n");
    Ok(())
}

#[test]
fn second_run_keeps_protected_paths_generated() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.staging_file("CHANGELOG.md", "first changelog\n");
    fx.staging_file("lib/a.rb", "puts 'a'\n");
    entrypoint(&fx.config(), None)?;
    let first = fx.manifest();
    assert_eq!(strs(&fx.generated()), ["CHANGELOG.md", "lib/a.rb"]);

    fx.staging_file("CHANGELOG.md", "regenerated changelog\n");
    fx.staging_file("lib/a.rb", "puts 'a'\n");
    entrypoint(&fx.config(), None)?;

    assert_eq!(fx.manifest(), first);
    assert_eq!(fx.read_gem("CHANGELOG.md"), "first changelog\n");
    Ok(())
}

#[test]
fn generated_and_static_never_overlap() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.gem_file("a.txt", "a\n");
    fx.gem_file("b.txt", "b\n");
    fx.existing_manifest(&[], &["a.txt", "b.txt"]);
    fx.staging_file("a.txt", "new a\n");

    entrypoint(&fx.config(), None)?;

    let m = fx.manifest();
    assert!(m.overlap().is_empty(), "overlap: {:?}", m.overlap());
    assert_eq!(strs(&fx.generated()), ["a.txt"]);
    assert_eq!(strs(&fx.static_paths()), ["b.txt"]);
    Ok(())
}

#[test]
fn manifest_is_pretty_json_with_sorted_lists() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    fx.staging_file("z.txt", "z\n");
    fx.staging_file("a.txt", "a\n");

    entrypoint(&fx.config(), None)?;

    let text = std::fs::read_to_string(fx.manifest_path())?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(value["generated"], serde_json::json!(["a.txt", "z.txt"]));
    assert_eq!(value["static"], serde_json::json!([]));
    assert!(text.ends_with('\n'));
    Ok(())
}
