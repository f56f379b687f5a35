//! Markdown rendering of a release.
//!
//! Output shape:
//!
//! ```text
//! ## v1.1.0
//!
//! [compare changes](https://github.com/owner/repo/compare/v1.0.0...v1.1.0)
//!
//! ### 🚀 Enhancements
//!
//! - **scope:** Add feature ([#37](https://github.com/owner/repo/pull/37))
//!
//! #### ⚠️ Breaking Changes
//!
//! ### ❤️ Contributors
//!
//! - Jane Doe ([@jane](https://github.com/jane))
//! ```

use std::collections::HashMap;

use semver::Version;

use crate::authors::{AuthorInfo, upper_first};
use crate::config::CommitTypes;
use crate::git::{ParsedCommit, ReferenceKind};
use crate::host::{RepoConfig, format_compare_changes, format_reference};

pub const BREAKING_CHANGES_HEADING: &str = "#### ⚠️ Breaking Changes";
pub const CONTRIBUTORS_HEADING: &str = "### ❤️ Contributors";

/// Everything the renderer needs besides the commits.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub types: &'a CommitTypes,
    pub repo: Option<&'a RepoConfig>,
    pub new_version: Option<&'a Version>,
    pub from: &'a str,
    pub to: &'a str,
    /// Resolved contributors; `None` disables the section.
    pub authors: Option<&'a [AuthorInfo]>,
    pub hide_author_email: bool,
}

/// Render commits (newest-first) as a changelog section.
pub fn generate_markdown(commits: &[ParsedCommit], ctx: &RenderContext<'_>) -> String {
    let version = ctx.new_version.map(|v| format!("v{v}"));

    let mut markdown: Vec<String> = vec![
        String::new(),
        format!(
            "## {}",
            version
                .clone()
                .unwrap_or_else(|| format!("{}...{}", ctx.from, ctx.to))
        ),
    ];

    if let Some(compare) = ctx.repo.and_then(|repo| {
        format_compare_changes(repo, ctx.from, version.as_deref().unwrap_or(ctx.to))
    }) {
        markdown.extend([String::new(), compare]);
    }

    let groups = group_by_type(commits);
    let mut breaking_changes = Vec::new();

    for (name, commit_type) in ctx.types.iter() {
        let Some(group) = groups.get(name) else {
            continue;
        };

        markdown.extend([String::new(), format!("### {}", commit_type.title), String::new()]);
        for commit in group.iter().rev() {
            let line = format_commit_line(commit, ctx.repo);
            if commit.is_breaking {
                breaking_changes.push(line.clone());
            }
            markdown.push(line);
        }
    }

    if !breaking_changes.is_empty() {
        markdown.extend([String::new(), BREAKING_CHANGES_HEADING.to_string(), String::new()]);
        markdown.extend(breaking_changes);
    }

    let contributors: Vec<String> = ctx
        .authors
        .unwrap_or_default()
        .iter()
        .map(|author| format_contributor(author, ctx.hide_author_email))
        .collect();
    if !contributors.is_empty() {
        markdown.extend([String::new(), CONTRIBUTORS_HEADING.to_string(), String::new()]);
        markdown.extend(contributors);
    }

    markdown.join("\n").trim().to_string()
}

/// `- **scope:** ⚠️ Description (refs)`
pub fn format_commit_line(commit: &ParsedCommit, repo: Option<&RepoConfig>) -> String {
    let mut line = String::from("- ");
    if !commit.scope.is_empty() {
        line.push_str(&format!("**{}:** ", commit.scope.trim()));
    }
    if commit.is_breaking {
        line.push_str("⚠️ ");
    }
    line.push_str(&upper_first(&commit.description));
    line.push_str(&format_references(commit, repo));
    line
}

/// PR and issue refs when there are any, else the commit's own hash.
fn format_references(commit: &ParsedCommit, repo: Option<&RepoConfig>) -> String {
    let linked: Vec<String> = commit
        .linked_references()
        .map(|r| format_reference(r, repo))
        .collect();
    if !linked.is_empty() {
        return format!(" ({})", linked.join(", "));
    }

    commit
        .references
        .iter()
        .find(|r| r.kind == ReferenceKind::Hash)
        .map(|r| format!(" ({})", format_reference(r, repo)))
        .unwrap_or_default()
}

/// `- Name ([@login](https://github.com/login))`, `- Name <email>` or `- Name`.
fn format_contributor(author: &AuthorInfo, hide_email: bool) -> String {
    if let Some(login) = &author.login {
        return format!("- {} ([@{login}](https://github.com/{login}))", author.name);
    }
    match author.public_email() {
        Some(email) if !hide_email => format!("- {} <{}>", author.name, email),
        _ => format!("- {}", author.name),
    }
}

fn group_by_type(commits: &[ParsedCommit]) -> HashMap<&str, Vec<&ParsedCommit>> {
    commits.iter().fold(HashMap::new(), |mut groups, commit| {
        groups
            .entry(commit.commit_type.as_str())
            .or_insert_with(Vec::new)
            .push(commit);
        groups
    })
}
