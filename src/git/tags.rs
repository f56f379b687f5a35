//! Tag lookup and version detection.

use std::collections::HashMap;

use git2::{Oid, Repository};
use semver::Version;
use tracing::{debug, warn};

use crate::error::GitError;

/// A git tag resolved to the commit it points at.
#[derive(Debug, Clone)]
pub struct TagInfo {
    pub name: String,
    pub oid: Oid,
    pub version: Option<Version>,
}

/// Get the most recent semver tag reachable from HEAD.
///
/// Walks history from `HEAD` and returns the first commit carrying a tag that
/// parses as a version (`v1.2.3`, `1.2.3`, `v2.0.0-beta.1`). When one commit
/// carries several, the highest version wins.
pub fn get_latest_reachable_tag(repo: &Repository) -> Result<Option<TagInfo>, GitError> {
    let Some(head_oid) = repo.head().ok().and_then(|head| head.target()) else {
        return Ok(None);
    };

    let mut tags_by_commit: HashMap<Oid, Vec<TagInfo>> = HashMap::new();
    for tag in get_all_tags(repo)?
        .into_iter()
        .filter(|tag| tag.version.is_some())
    {
        tags_by_commit.entry(tag.oid).or_default().push(tag);
    }

    if tags_by_commit.is_empty() {
        debug!("No semver tags found in repository");
        return Ok(None);
    }

    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk.push(head_oid).map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    for oid in revwalk {
        let oid = oid.map_err(GitError::RevwalkError)?;
        if let Some(candidates) = tags_by_commit.remove(&oid) {
            let latest = candidates.into_iter().max_by(|a, b| a.version.cmp(&b.version));
            if let Some(tag) = latest {
                debug!(tag = %tag.name, "Found latest reachable semver tag");
                return Ok(Some(tag));
            }
        }
    }

    Ok(None)
}

/// Name of a tag pointing exactly at HEAD, if any.
pub fn get_tag_at_head(repo: &Repository) -> Result<Option<String>, GitError> {
    let Some(head_oid) = repo.head().ok().and_then(|head| head.target()) else {
        return Ok(None);
    };

    let mut at_head: Vec<TagInfo> = get_all_tags(repo)?
        .into_iter()
        .filter(|tag| tag.oid == head_oid)
        .collect();
    // Prefer version tags, highest first.
    at_head.sort_by(|a, b| b.version.cmp(&a.version));

    Ok(at_head.into_iter().next().map(|tag| tag.name))
}

/// Get all tags from the repository, peeled to their commits.
pub fn get_all_tags(repo: &Repository) -> Result<Vec<TagInfo>, GitError> {
    let mut tags = Vec::new();

    repo.tag_foreach(|oid, name_bytes| {
        let Ok(name_str) = std::str::from_utf8(name_bytes) else {
            warn!("Skipping tag with OID {} - name is not valid UTF-8", oid);
            return true;
        };
        let name = name_str
            .strip_prefix("refs/tags/")
            .unwrap_or(name_str)
            .to_string();

        let commit_oid = repo
            .find_object(oid, None)
            .and_then(|obj| obj.peel_to_commit())
            .map(|commit| commit.id());

        match commit_oid {
            Ok(commit_oid) => tags.push(TagInfo {
                version: get_version_from_tag(&name),
                name,
                oid: commit_oid,
            }),
            Err(e) => debug!(tag = %name, error = %e, "Tag does not point at a commit"),
        }
        true
    })
    .map_err(GitError::RevwalkError)?;

    Ok(tags)
}

/// Extract a semver version from a tag name, with or without the `v` prefix.
pub fn get_version_from_tag(tag_name: &str) -> Option<Version> {
    let version_str = tag_name.strip_prefix('v').unwrap_or(tag_name);
    Version::parse(version_str).ok()
}
