mod common;

use common::Fixture;
use owlbot_postprocessor::entrypoint;

fn stage_two_wrappers(fx: &Fixture) {
    fx.staging_file(
        "my-gem/Gemfile",
        "source \"https://rubygems.org\"\ngemspec\nlocal_dependencies = [\"my-gem-v1\", \"my-gem-v2\"]\nputs local_dependencies\n",
    );
    fx.staging_file(
        "my-gem/my-gem.gemspec",
        "Gem::Specification.new do |gem|\n  gem.add_dependency \"my-gem-v1\", \"~>1.0\"\n  gem.add_dependency \"my-gem-v2\", \"~>1.0\"\nend\n",
    );
    fx.staging_file("my-gem/.repo-metadata.json", "{\"name_pretty\": \"My Gem\"}\n");
    fx.staging_file("my-gem/lib/my-gem.rb", "require \"my-gem/entrypoint\"\n");
    fx.staging_file(
        "my-gem/README.md",
        "Gems: [my-gem-v1](https://example.com/v1) and [my-gem-v2](https://example.com/v2)...\n",
    );
    fx.staging_file(
        "my-second-gem/Gemfile",
        "source \"https://rubygems.org\"\ngemspec\nlocal_dependencies = [\"my-second-gem-v1\", \"my-second-gem-v2\"]\nputs local_dependencies\n",
    );
    fx.staging_file(
        "my-second-gem/my-second-gem.gemspec",
        "Gem::Specification.new do |gem|\n  gem.add_dependency \"my-second-gem-v1\", \"~>2.0\"\n  gem.add_dependency \"my-second-gem-v2\", \"~>2.0\"\nend\n",
    );
    fx.staging_file(
        "my-second-gem/README.md",
        "Gems: [my-second-gem-v1](https://example.com/w1) and [my-second-gem-v2](https://example.com/w2)...\n",
    );
    fx.staging_file(
        "my-second-gem/lib/my/second/gem/version.rb",
        "module MySecondGem\n  VERSION = \"1.2.3\"\nend\n",
    );
}

#[test]
fn runs_multi_wrapper() -> Result<(), Box<dyn std::error::Error>> {
    let fx = Fixture::new("my-gem");
    stage_two_wrappers(&fx);
    fx.gem_file(
        ".owlbot.xml",
        r#"<owlbot>
  <prepare_multi_wrapper>
    <gem>my-gem</gem>
    <gem>my-second-gem</gem>
  </prepare_multi_wrapper>
  <move_files/>
  <update_manifest/>
</owlbot>
"#,
    );

    entrypoint(&fx.config(), None)?;

    assert_eq!(
        fx.read_gem("Gemfile"),
        "source \"https://rubygems.org\"\ngemspec\nlocal_dependencies = [\"my-gem-v1\", \"my-gem-v2\", \"my-second-gem-v1\", \"my-second-gem-v2\"]\nputs local_dependencies\n"
    );
    assert_eq!(
        fx.read_gem("lib/my/second/gem/version.rb"),
        "module MySecondGem\n  # @private Unused\n  VERSION = \"\"\nend\n"
    );
    assert_eq!(
        fx.read_gem("my-gem.gemspec"),
        "Gem::Specification.new do |gem|\n  gem.add_dependency \"my-gem-v1\", \"~>1.0\"\n  gem.add_dependency \"my-gem-v2\", \"~>1.0\"\n  gem.add_dependency \"my-second-gem-v1\", \"~>2.0\"\n  gem.add_dependency \"my-second-gem-v2\", \"~>2.0\"\nend\n"
    );
    // The primary's own files win over the secondary's.
    assert!(fx.read_gem("README.md").starts_with("Gems: [my-gem-v1]"));
    assert!(!fx.gem_has("my-second-gem.gemspec"));
    assert!(!fx.gem_has("my-gem"), "per-gem subdirectories are folded away");

    let generated = fx.generated();
    assert!(generated.contains(&"lib/my-gem.rb".to_string()));
    assert!(generated.contains(&".repo-metadata.json".to_string()));
    Ok(())
}

#[test]
fn unknown_secondary_fails_the_unit() {
    let fx = Fixture::new("my-gem");
    stage_two_wrappers(&fx);
    fx.gem_file(
        ".owlbot.xml",
        "<owlbot><prepare_multi_wrapper><gem>my-gem</gem><gem>nope</gem></prepare_multi_wrapper><move_files/></owlbot>",
    );

    let err = entrypoint(&fx.config(), None).unwrap_err();
    assert!(format!("{err:#}").contains("nope"), "{err:#}");
    assert!(!fx.gem_has("Gemfile"));
}
