//! End-to-end tests for the changelog pipeline over temporary repositories.

mod common;

use std::fs;

use common::TestRepo;
use semver::Version;
use tidings::changelog::{parse_changelog_markdown, write_changelog};
use tidings::config::{ConfigOverrides, load_config};
use tidings::pipeline::{bump, load_commits, release_body, render_markdown};
use tidings::plugins::PluginRegistry;
use tidings::version::{BumpOptions, read_current_version, write_version_files};

fn release_repo() -> TestRepo {
    let test_repo = TestRepo::new();
    test_repo.write_file("package.json", "{\n  \"name\": \"demo\",\n  \"version\": \"1.0.0\"\n}\n");
    test_repo.write_file(
        "tidings.toml",
        concat!(
            "repo = \"unjs/changelogen\"\n",
            "no_authors = true\n\n",
            "[types]\n",
            "revert = { title = \"⏪ Reverts\" }\n"
        ),
    );
    let initial = test_repo.commit("chore: initial release");
    test_repo.tag_annotated("v1.0.0", initial, "v1.0.0");
    test_repo
}

#[tokio::test]
async fn test_generates_release_notes_since_last_tag() {
    let test_repo = release_repo();
    test_repo.commit("feat(cli): add --dry-run flag (#21)");
    let temp = test_repo.commit("feat: experimental cache");
    test_repo.commit(&format!(
        "revert: feat: experimental cache\n\nThis reverts commit {temp}."
    ));
    test_repo.commit("fix: handle missing config :bug:");
    test_repo.commit("Merge branch 'main' of github.com:unjs/changelogen");

    let mut config = load_config(test_repo.path(), ConfigOverrides::default()).unwrap();
    config.resolve_git_defaults(&test_repo.repo).unwrap();
    assert_eq!(config.from, "v1.0.0");

    let plugins = PluginRegistry::from_names(&config.plugins).unwrap();
    let commits = load_commits(&test_repo.repo, &config, &plugins).unwrap();
    let descriptions: Vec<&str> = commits.iter().map(|c| c.description.as_str()).collect();
    assert_eq!(
        descriptions,
        vec!["handle missing config :bug:", "add --dry-run flag"]
    );

    let decided = bump(&commits, &mut config, &plugins, &BumpOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(decided.current, Version::new(1, 0, 0));
    assert_eq!(decided.new_version, Version::new(1, 1, 0));

    let markdown = render_markdown(commits, &config, &plugins, None).await.unwrap();

    assert!(markdown.starts_with("## v1.1.0\n\n"));
    assert!(markdown.contains(
        "[compare changes](https://github.com/unjs/changelogen/compare/v1.0.0...v1.1.0)"
    ));
    assert!(markdown.contains(
        "- **cli:** Add --dry-run flag ([#21](https://github.com/unjs/changelogen/pull/21))"
    ));
    assert!(markdown.contains("Handle missing config 🐛"));
    assert!(!markdown.contains("Experimental cache"));
    assert!(!markdown.contains("Contributors"));

    let body = release_body(&markdown);
    assert!(body.starts_with("[compare changes]"));
}

#[tokio::test]
async fn test_release_files_are_written() {
    let test_repo = release_repo();
    test_repo.commit("fix: correct exit code");

    let mut config = load_config(test_repo.path(), ConfigOverrides::default()).unwrap();
    config.resolve_git_defaults(&test_repo.repo).unwrap();

    let plugins = PluginRegistry::from_names(&config.plugins).unwrap();
    let commits = load_commits(&test_repo.repo, &config, &plugins).unwrap();
    let decided = bump(&commits, &mut config, &plugins, &BumpOptions::default())
        .unwrap()
        .unwrap();
    let changed =
        write_version_files(test_repo.path(), &decided.current, &decided.new_version).unwrap();
    assert_eq!(changed, vec![test_repo.path().join("package.json")]);
    assert_eq!(read_current_version(test_repo.path()).unwrap(), Version::new(1, 0, 1));

    let markdown = render_markdown(commits, &config, &plugins, None).await.unwrap();
    let output = config.output_path().unwrap();
    write_changelog(&output, &markdown).unwrap();

    let content = fs::read_to_string(output).unwrap();
    let releases = parse_changelog_markdown(&content);
    let release = releases.find("1.0.1").unwrap();
    assert!(release.body.contains("- Correct exit code"));
}

#[tokio::test]
async fn test_tagged_head_has_nothing_to_release() {
    let test_repo = release_repo();

    let mut config = load_config(test_repo.path(), ConfigOverrides::default()).unwrap();
    config.resolve_git_defaults(&test_repo.repo).unwrap();
    assert_eq!(config.to, "v1.0.0");

    let plugins = PluginRegistry::new();
    let commits = load_commits(&test_repo.repo, &config, &plugins).unwrap();
    assert!(commits.is_empty());

    let decided = bump(&commits, &mut config, &plugins, &BumpOptions::default()).unwrap();
    assert!(decided.is_none());
}

#[tokio::test]
async fn test_explicit_range_overrides_tags() {
    let test_repo = release_repo();
    let feat = test_repo.commit("feat: first feature");
    test_repo.commit("feat: second feature");

    let overrides = ConfigOverrides {
        from: Some(feat.to_string()),
        new_version: Some("v3.0.0".to_string()),
        ..Default::default()
    };
    let mut config = load_config(test_repo.path(), overrides).unwrap();
    config.resolve_git_defaults(&test_repo.repo).unwrap();

    let plugins = PluginRegistry::new();
    let commits = load_commits(&test_repo.repo, &config, &plugins).unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].description, "second feature");

    let decided = bump(&commits, &mut config, &plugins, &BumpOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(decided.new_version, Version::new(3, 0, 0));
}
