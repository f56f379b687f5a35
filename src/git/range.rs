//! Commit range resolution.

use std::path::Path;

use git2::{Oid, Repository};
use tracing::debug;

use crate::error::GitError;

use super::tags::{get_latest_reachable_tag, get_tag_at_head};

/// Resolved commit range. `from` is `None` when history starts at the root.
#[derive(Debug, Clone)]
pub struct CommitRange {
    pub from: Option<Oid>,
    pub to: Oid,
    /// The start ref as given or detected; empty when there is none.
    pub from_ref: String,
    pub to_ref: String,
}

/// Open the repository containing `dir`.
pub fn open_repository(dir: &Path) -> Result<Repository, GitError> {
    Repository::discover(dir).map_err(GitError::OpenRepository)
}

/// Resolve a commit range from user-provided references.
///
/// A missing `from` falls back to the latest reachable semver tag, and then
/// to the start of history. A missing `to` falls back to [`current_ref`].
pub fn resolve_range(
    repo: &Repository,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<CommitRange, GitError> {
    let to_ref = match to {
        Some(to) => to.to_string(),
        None => current_ref(repo)?,
    };
    let to_oid = resolve_reference(repo, &to_ref)?;

    let from_ref = match from {
        Some(from) => from.to_string(),
        None => get_latest_reachable_tag(repo)?
            .map(|tag| tag.name)
            .unwrap_or_default(),
    };
    let from_oid = if from_ref.is_empty() {
        None
    } else {
        Some(resolve_reference(repo, &from_ref)?)
    };

    debug!(from = %from_ref, to = %to_ref, "Resolved commit range");

    Ok(CommitRange {
        from: from_oid,
        to: to_oid,
        from_ref,
        to_ref,
    })
}

/// The tag at HEAD if there is one, else the branch name, else `HEAD`.
pub fn current_ref(repo: &Repository) -> Result<String, GitError> {
    if let Some(tag) = get_tag_at_head(repo)? {
        return Ok(tag);
    }

    let head = repo.head().map_err(GitError::HeadUnavailable)?;
    if head.is_branch() {
        if let Some(name) = head.shorthand() {
            return Ok(name.to_string());
        }
    }
    Ok("HEAD".to_string())
}

/// URL of the `origin` remote, if configured.
pub fn origin_url(repo: &Repository) -> Option<String> {
    repo.find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().map(str::to_string))
}

/// Resolve a reference (tag, branch, commit hash) to a commit OID.
fn resolve_reference(repo: &Repository, reference: &str) -> Result<Oid, GitError> {
    if let Ok(oid) = Oid::from_str(reference) {
        if repo.find_commit(oid).is_ok() {
            return Ok(oid);
        }
    }

    let obj = repo
        .revparse_single(reference)
        .map_err(|e| GitError::ReferenceNotFound(reference.to_string(), e))?;
    Ok(obj.peel_to_commit().map_err(GitError::ParseCommit)?.id())
}
