//! Contributor collection and host username resolution.
//!
//! Collection is a pure fold over commits. Resolution fans out one lookup per
//! author through an injected [`AuthorResolver`]; a failed lookup only means
//! that author renders without a username.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::HostError;
use crate::git::ParsedCommit;

/// A unique contributor across the changelog window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorInfo {
    /// Display name, capitalized per word.
    pub name: String,
    /// Every email seen for this name, in first-seen order.
    pub emails: Vec<String>,
    /// Short hashes of the commits this author appears on.
    pub commits: Vec<String>,
    /// Host username, once resolved.
    pub login: Option<String>,
}

impl AuthorInfo {
    /// First email that is not a GitHub noreply address.
    pub fn public_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .map(String::as_str)
            .find(|email| !email.is_empty() && !email.contains("noreply.github.com"))
    }
}

/// Looks up the host username for an author.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorResolver: Send + Sync {
    /// Return the username, `Ok(None)` when the host does not know the author.
    async fn resolve_login(&self, author: &AuthorInfo) -> Result<Option<String>, HostError>;
}

/// Capitalize the first letter of each space-separated word.
pub fn format_name(name: &str) -> String {
    name.split(' ')
        .map(|part| upper_first(part.trim()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase the first character, leaving the rest untouched.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fold commit authors and co-authors into unique contributors.
///
/// Names containing `[bot]` are dropped, as are authors whose name or email
/// contains any of the `exclude` patterns.
pub fn collect_authors(commits: &[ParsedCommit], exclude: &[String]) -> Vec<AuthorInfo> {
    commits
        .iter()
        .flat_map(|commit| commit.authors.iter().map(move |author| (commit, author)))
        .fold(Vec::<AuthorInfo>::new(), |mut authors, (commit, author)| {
            let name = format_name(&author.name);
            let excluded = name.trim().is_empty()
                || name.contains("[bot]")
                || exclude.iter().any(|pattern| {
                    name.contains(pattern.as_str()) || author.email.contains(pattern.as_str())
                });
            if excluded {
                return authors;
            }

            match authors.iter_mut().find(|info| info.name == name) {
                Some(info) => {
                    if !info.emails.contains(&author.email) {
                        info.emails.push(author.email.clone());
                    }
                    if !info.commits.iter().any(|h| h == commit.short_hash()) {
                        info.commits.push(commit.short_hash().to_string());
                    }
                }
                None => authors.push(AuthorInfo {
                    name,
                    emails: vec![author.email.clone()],
                    commits: vec![commit.short_hash().to_string()],
                    login: None,
                }),
            }
            authors
        })
}

/// Resolve usernames concurrently, then drop authors whose username was
/// already claimed by an earlier author.
pub async fn resolve_authors(
    authors: Vec<AuthorInfo>,
    resolver: Arc<dyn AuthorResolver>,
) -> Vec<AuthorInfo> {
    let mut join_set = JoinSet::new();
    for (idx, author) in authors.iter().cloned().enumerate() {
        let resolver = Arc::clone(&resolver);
        join_set.spawn(async move {
            let login = match resolver.resolve_login(&author).await {
                Ok(login) => login,
                Err(e) => {
                    debug!(author = %author.name, error = %e, "Author lookup failed");
                    None
                }
            };
            (idx, login)
        });
    }

    let mut logins: Vec<Option<String>> = vec![None; authors.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((idx, login)) => logins[idx] = login,
            Err(e) => warn!("Author lookup task failed: {}", e),
        }
    }

    let mut seen = HashSet::new();
    authors
        .into_iter()
        .zip(logins)
        .filter_map(|(mut author, login)| {
            if author.login.is_none() {
                author.login = login;
            }
            match &author.login {
                Some(login) if !seen.insert(login.clone()) => None,
                _ => Some(author),
            }
        })
        .collect()
}
