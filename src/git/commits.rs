//! Raw commit collection from the repository history.

use git2::{Commit, Oid, Repository};
use serde::{Deserialize, Serialize};

use crate::error::GitError;

/// Length of the abbreviated hash used to key commits.
pub const SHORT_HASH_LEN: usize = 7;

/// Name and email of a commit author or co-author.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl CommitAuthor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// One git log entry before interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    /// First line of the commit message.
    pub subject: String,
    /// Remaining lines of the commit message.
    pub body: String,
    pub short_hash: String,
    pub full_hash: String,
    pub author: CommitAuthor,
}

impl RawCommit {
    /// Build a raw commit from a full message, splitting subject and body.
    pub fn from_message(full_hash: &str, message: &str, author: CommitAuthor) -> Self {
        let (subject, body) = match message.split_once('\n') {
            Some((subject, body)) => (subject, body.trim_start_matches('\n')),
            None => (message, ""),
        };

        Self {
            subject: subject.trim_end().to_string(),
            body: body.to_string(),
            short_hash: short_hash(full_hash),
            full_hash: full_hash.to_string(),
            author,
        }
    }

    /// Create a RawCommit from a git2 Commit.
    pub fn from_git2_commit(commit: &Commit) -> Self {
        let signature = commit.author();
        let author = CommitAuthor::new(
            signature.name().unwrap_or_default(),
            signature.email().unwrap_or_default(),
        );
        let message = commit.message().unwrap_or_default();

        Self::from_message(&commit.id().to_string(), message, author)
    }
}

/// Abbreviate a full hash to the short form used for references.
pub fn short_hash(full_hash: &str) -> String {
    full_hash.chars().take(SHORT_HASH_LEN).collect()
}

/// Fetch commits reachable from `to_oid` but not from `from_oid`.
///
/// Commits are returned newest-first, the order `git log` prints them in.
/// A `None` start walks the whole history behind `to_oid`.
pub fn fetch_raw_commits(
    repo: &Repository,
    from_oid: Option<Oid>,
    to_oid: Oid,
) -> Result<Vec<RawCommit>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    revwalk.push(to_oid).map_err(GitError::RevwalkError)?;
    if let Some(from_oid) = from_oid {
        revwalk.hide(from_oid).map_err(GitError::RevwalkError)?;
    }

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        commits.push(RawCommit::from_git2_commit(&commit));
    }

    Ok(commits)
}
