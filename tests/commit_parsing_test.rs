//! Integration tests for conventional commit parsing.

mod common;

use common::{hash, parsed, parsed_as};
use tidings::git::{CommitAuthor, ParseOptions, RawCommit, ReferenceKind, parse_commit};

fn raw(message: &str) -> RawCommit {
    RawCommit::from_message(&hash('a'), message, CommitAuthor::new("Test User", "test@example.com"))
}

fn refs(message: &str) -> Vec<(ReferenceKind, String)> {
    parsed(&hash('a'), message)
        .references
        .into_iter()
        .map(|r| (r.kind, r.value))
        .collect()
}

#[test]
fn test_parse_with_various_scopes() {
    let cases = vec![
        ("feat(api): new endpoint", "api"),
        ("fix(ui): button alignment", "ui"),
        ("feat(auth/oauth): add provider", "auth/oauth"),
        ("fix(db-layer): connection leak", "db-layer"),
        ("feat: no scope", ""),
    ];

    for (message, expected_scope) in cases {
        let commit = parsed(&hash('a'), message);
        assert_eq!(commit.scope, expected_scope, "Failed to parse: {}", message);
    }
}

#[test]
fn test_type_is_lowercased() {
    assert_eq!(parsed(&hash('a'), "FEAT: shout").commit_type, "feat");
}

#[test]
fn test_breaking_scope_with_issue_and_pr() {
    let commit = parsed(&hash('a'), "fix(scope)!: breaking change example, close #123 (#134)");

    assert_eq!(commit.commit_type, "fix");
    assert_eq!(commit.scope, "scope");
    assert!(commit.is_breaking);
    assert_eq!(commit.description, "breaking change example, close #123");
    assert_eq!(
        refs("fix(scope)!: breaking change example, close #123 (#134)"),
        vec![
            (ReferenceKind::PullRequest, "#134".to_string()),
            (ReferenceKind::Issue, "#123".to_string()),
            (ReferenceKind::Hash, "aaaaaaa".to_string()),
        ]
    );
}

#[test]
fn test_pr_reference_is_not_repeated_as_issue() {
    assert_eq!(
        refs("feat: add feature (#37)"),
        vec![
            (ReferenceKind::PullRequest, "#37".to_string()),
            (ReferenceKind::Hash, "aaaaaaa".to_string()),
        ]
    );
    assert_eq!(
        refs("fix: spaced marker ( #12 )"),
        vec![
            (ReferenceKind::PullRequest, "#12".to_string()),
            (ReferenceKind::Hash, "aaaaaaa".to_string()),
        ]
    );
}

#[test]
fn test_hash_reference_is_always_last() {
    let plain = refs("docs: no references at all");
    assert_eq!(plain, vec![(ReferenceKind::Hash, "aaaaaaa".to_string())]);
}

#[test]
fn test_full_hash_reference_when_requested() {
    let options = ParseOptions {
        full_hash_references: true,
        ..ParseOptions::default()
    };
    let commit = parse_commit(&raw("fix: bitbucket"), &options).unwrap();
    assert_eq!(commit.hash_reference().map(|r| r.value.as_str()), Some(hash('a').as_str()));
}

#[test]
fn test_breaking_change_body_marker_is_case_insensitive() {
    let commit = parsed(&hash('a'), "feat: new api\n\nbreaking change: the old one is gone");
    assert!(commit.is_breaking);

    let commit = parsed(&hash('a'), "feat: new api\n\nNothing breaks here");
    assert!(!commit.is_breaking);
}

#[test]
fn test_emoji_prefixes() {
    let commit = parsed(&hash('a'), "✨ feat: sparkle");
    assert_eq!(commit.commit_type, "feat");
    assert_eq!(commit.description, "sparkle");

    let commit = parsed(&hash('a'), ":bug: fix: squash");
    assert_eq!(commit.commit_type, "fix");

    assert!(parsed(&hash('a'), "💥 feat: remove everything").is_breaking);
}

#[test]
fn test_scope_map() {
    let options = ParseOptions {
        scope_map: [("nuxt3".to_string(), "nuxt".to_string())].into(),
        ..ParseOptions::default()
    };
    let commit = parse_commit(&raw("fix(nuxt3): render"), &options).unwrap();
    assert_eq!(commit.scope, "nuxt");
}

#[test]
fn test_non_conventional_subjects_are_dropped() {
    let options = ParseOptions::default();
    for message in [
        "Initial commit",
        "Merge branch 'main' into feature",
        "Revert \"feat: add thing\"\n\nThis reverts commit aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.",
        "feat:missing space",
        "feat(): empty scope",
    ] {
        assert!(parse_commit(&raw(message), &options).is_none(), "Should skip: {message}");
    }
}

#[test]
fn test_reverted_hashes_need_full_hashes() {
    let full = hash('b');
    let commit = parsed(&hash('a'), &format!("revert: undo\n\nThis reverts commit {full}."));
    assert!(commit.reverted_hashes.contains(&full));

    let commit = parsed(&hash('a'), "revert: undo\n\nThis reverts commit bbbbbbb.");
    assert!(commit.reverted_hashes.is_empty());
}

#[test]
fn test_co_authors_follow_the_author() {
    let commit = parsed_as(
        &hash('a'),
        concat!(
            "feat: pair work\n\n",
            "Co-authored-by: Jane Doe <jane@example.com>\n",
            "co-authored-by: Bob <bob@example.com>"
        ),
        "Alice",
        "alice@example.com",
    );

    let authors: Vec<(&str, &str)> = commit
        .authors
        .iter()
        .map(|a| (a.name.as_str(), a.email.as_str()))
        .collect();
    assert_eq!(
        authors,
        vec![
            ("Alice", "alice@example.com"),
            ("Jane Doe", "jane@example.com"),
            ("Bob", "bob@example.com"),
        ]
    );
}
