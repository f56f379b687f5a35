//! Conventional commit parsing with reference and co-author extraction.
//!
//! Subjects follow `[emoji] type(scope)!: description`. Anything else is not a
//! conventional commit and is dropped from the changelog without an error.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::commits::{CommitAuthor, RawCommit};

/// `type(scope)!: description`, matched after any emoji prefix is removed.
static CONVENTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^()]+)\))?(?P<breaking>!)?: (?P<description>.+)$",
    )
    .expect("conventional commit regex is valid")
});

/// A leading `:emoji_code:` token.
static EMOJI_CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:[a-z0-9_+-]+:").expect("emoji code regex is valid")
});

/// Parenthesized PR references like `(#123)`, `( #123 )` or `(resolves #37)`.
static PULL_REQUEST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([ a-z]*(#\d+)\s*\)").expect("pull request regex is valid")
});

static ISSUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\d+").expect("issue regex is valid"));

static REVERT_HASH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"This reverts commit (?P<hash>[a-f0-9]{40})\.").expect("revert regex is valid")
});

static CO_AUTHORED_BY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)co-authored-by:\s*(?P<name>.+)<(?P<email>.+)>")
        .expect("co-author regex is valid")
});

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    Hash,
    Issue,
    PullRequest,
}

/// An issue, pull request or commit reference found in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    /// `#123` for issues and PRs, the commit hash for hashes.
    pub value: String,
}

impl Reference {
    pub fn new(kind: ReferenceKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// A commit that matched the conventional commit grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommit {
    #[serde(flatten)]
    pub raw: RawCommit,
    /// Lowercased commit type, e.g. `feat`.
    #[serde(rename = "type")]
    pub commit_type: String,
    /// Scope after alias resolution; empty when absent.
    pub scope: String,
    pub description: String,
    pub is_breaking: bool,
    /// PR refs, then issue refs, then the commit's own hash.
    pub references: Vec<Reference>,
    /// Primary author first, then co-authors in trailer order.
    pub authors: Vec<CommitAuthor>,
    /// Full hashes named by `This reverts commit <hash>.` lines.
    pub reverted_hashes: BTreeSet<String>,
}

impl ParsedCommit {
    pub fn short_hash(&self) -> &str {
        &self.raw.short_hash
    }

    /// References that point at PRs or issues, PRs first.
    pub fn linked_references(&self) -> impl Iterator<Item = &Reference> {
        self.references
            .iter()
            .filter(|r| r.kind == ReferenceKind::PullRequest)
            .chain(
                self.references
                    .iter()
                    .filter(|r| r.kind == ReferenceKind::Issue),
            )
    }

    /// The commit's own hash reference.
    pub fn hash_reference(&self) -> Option<&Reference> {
        self.references
            .iter()
            .find(|r| r.kind == ReferenceKind::Hash)
    }
}

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Scope aliases, e.g. `"nuxt3" -> "nuxt"`.
    pub scope_map: HashMap<String, String>,
    /// Body markers (matched case-insensitively) that flag a breaking change.
    pub breaking_markers: Vec<String>,
    /// Subject prefixes (emoji or `:code:`) that flag a breaking change.
    pub breaking_prefixes: Vec<String>,
    /// Reference commits by their full hash instead of the short one.
    pub full_hash_references: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            scope_map: HashMap::new(),
            breaking_markers: default_breaking_markers(),
            breaking_prefixes: vec!["💥".to_string(), ":boom:".to_string()],
            full_hash_references: false,
        }
    }
}

pub fn default_breaking_markers() -> Vec<String> {
    vec!["BREAKING CHANGE:".to_string(), "BREAKING-CHANGE:".to_string()]
}

/// Parse a batch of raw commits, dropping the non-conventional ones.
pub fn parse_commits(commits: &[RawCommit], options: &ParseOptions) -> Vec<ParsedCommit> {
    commits
        .iter()
        .filter_map(|raw| {
            let parsed = parse_commit(raw, options);
            if parsed.is_none() {
                debug!(
                    hash = %raw.short_hash,
                    subject = %raw.subject,
                    "skipping non-conventional commit"
                );
            }
            parsed
        })
        .collect()
}

/// Parse one raw commit. Returns `None` when the subject is not conventional.
pub fn parse_commit(raw: &RawCommit, options: &ParseOptions) -> Option<ParsedCommit> {
    let (prefix, subject) = split_emoji_prefix(&raw.subject);
    let caps = CONVENTIONAL_REGEX.captures(subject)?;

    let commit_type = caps.name("type")?.as_str().to_lowercase();

    let scope = caps
        .name("scope")
        .map(|m| {
            let scope = m.as_str();
            options
                .scope_map
                .get(scope)
                .cloned()
                .unwrap_or_else(|| scope.to_string())
        })
        .unwrap_or_default();

    let prefix_breaking = !prefix.is_empty()
        && options
            .breaking_prefixes
            .iter()
            .any(|p| prefix.starts_with(p.as_str()));
    let is_breaking = caps.name("breaking").is_some()
        || prefix_breaking
        || has_breaking_marker(&raw.body, &options.breaking_markers);

    let description = caps.name("description")?.as_str();

    let own_hash = if options.full_hash_references {
        raw.full_hash.clone()
    } else {
        raw.short_hash.clone()
    };
    let references = extract_references(description, own_hash);
    let description = PULL_REQUEST_REGEX
        .replace_all(description, "")
        .trim()
        .to_string();

    Some(ParsedCommit {
        commit_type,
        scope,
        description,
        is_breaking,
        references,
        authors: extract_authors(&raw.author, &raw.body),
        reverted_hashes: extract_reverted_hashes(&raw.body),
        raw: raw.clone(),
    })
}

/// Split a leading emoji glyph or `:code:` token off a subject.
fn split_emoji_prefix(subject: &str) -> (&str, &str) {
    let trimmed = subject.trim_start();

    let prefix_len = match EMOJI_CODE_REGEX.find(trimmed) {
        Some(m) => m.end(),
        None => trimmed
            .char_indices()
            .find(|(_, c)| c.is_ascii() || c.is_alphanumeric())
            .map(|(idx, _)| idx)
            .unwrap_or(trimmed.len()),
    };

    let (prefix, rest) = trimmed.split_at(prefix_len);
    (prefix, rest.trim_start())
}

fn has_breaking_marker(body: &str, markers: &[String]) -> bool {
    let body = body.to_lowercase();
    markers
        .iter()
        .any(|marker| body.contains(&marker.to_lowercase()))
}

/// PR refs, then issue refs not already captured, then the commit's own hash.
fn extract_references(description: &str, own_hash: String) -> Vec<Reference> {
    let mut references: Vec<Reference> = PULL_REQUEST_REGEX
        .captures_iter(description)
        .filter_map(|caps| caps.get(1))
        .map(|m| Reference::new(ReferenceKind::PullRequest, m.as_str()))
        .collect();

    for m in ISSUE_REGEX.find_iter(description) {
        if !references.iter().any(|r| r.value == m.as_str()) {
            references.push(Reference::new(ReferenceKind::Issue, m.as_str()));
        }
    }

    references.push(Reference::new(ReferenceKind::Hash, own_hash));
    references
}

fn extract_reverted_hashes(body: &str) -> BTreeSet<String> {
    REVERT_HASH_REGEX
        .captures_iter(body)
        .filter_map(|caps| caps.name("hash"))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn extract_authors(author: &CommitAuthor, body: &str) -> Vec<CommitAuthor> {
    let mut authors = vec![author.clone()];
    authors.extend(CO_AUTHORED_BY_REGEX.captures_iter(body).map(|caps| {
        CommitAuthor::new(
            caps.name("name").map_or("", |m| m.as_str()).trim(),
            caps.name("email").map_or("", |m| m.as_str()).trim(),
        )
    }));
    authors
}
