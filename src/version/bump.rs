//! Semver calculation from commits.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CommitTypes;
use crate::error::VersionError;
use crate::git::ParsedCommit;

/// The version impact a commit type contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemverImpact {
    Patch,
    Minor,
    Major,
}

/// An increment, including the node-semver prerelease variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    Major,
    Premajor,
    Minor,
    Preminor,
    Patch,
    Prepatch,
    Prerelease,
}

impl From<SemverImpact> for BumpType {
    fn from(impact: SemverImpact) -> Self {
        match impact {
            SemverImpact::Major => BumpType::Major,
            SemverImpact::Minor => BumpType::Minor,
            SemverImpact::Patch => BumpType::Patch,
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BumpType::Major => "major",
            BumpType::Premajor => "premajor",
            BumpType::Minor => "minor",
            BumpType::Preminor => "preminor",
            BumpType::Patch => "patch",
            BumpType::Prepatch => "prepatch",
            BumpType::Prerelease => "prerelease",
        };
        f.write_str(name)
    }
}

impl FromStr for BumpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(BumpType::Major),
            "premajor" => Ok(BumpType::Premajor),
            "minor" => Ok(BumpType::Minor),
            "preminor" => Ok(BumpType::Preminor),
            "patch" => Ok(BumpType::Patch),
            "prepatch" => Ok(BumpType::Prepatch),
            "prerelease" => Ok(BumpType::Prerelease),
            other => Err(format!("unknown bump type '{other}'")),
        }
    }
}

/// Replacement for the prerelease segment of a bumped version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSuffix {
    /// `<unix seconds>.<short hash of the newest commit>`.
    Timestamp,
    Literal(String),
}

#[derive(Debug, Clone, Default)]
pub struct BumpOptions {
    /// Skip commit scanning and use this increment.
    pub bump_type: Option<BumpType>,
    /// Prerelease identifier, e.g. `beta`.
    pub preid: Option<String>,
    pub suffix: Option<VersionSuffix>,
}

/// Outcome of a bump. `new_version` is `None` when there is nothing to release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpDecision {
    pub bump_type: Option<BumpType>,
    pub new_version: Option<Version>,
}

impl BumpDecision {
    fn none(bump_type: Option<BumpType>) -> Self {
        Self {
            bump_type,
            new_version: None,
        }
    }
}

/// Determine the strongest impact across commits.
///
/// Breaking commits count as major whatever their type. Returns `None` when
/// no commit type carries an impact.
pub fn determine_semver_change(
    commits: &[ParsedCommit],
    types: &CommitTypes,
) -> Option<SemverImpact> {
    commits
        .iter()
        .filter_map(|commit| {
            if commit.is_breaking {
                return Some(SemverImpact::Major);
            }
            types.get(&commit.commit_type).and_then(|t| t.semver)
        })
        .max()
}

/// Compute the next version for `current`.
///
/// Pre-1.0 versions are dampened: major becomes minor and minor becomes patch.
/// A result equal to `current` is reported as no bump.
pub fn bump_version(
    commits: &[ParsedCommit],
    types: &CommitTypes,
    current: &Version,
    options: &BumpOptions,
    now: DateTime<Utc>,
) -> Result<BumpDecision, VersionError> {
    let proposed = match options.bump_type {
        Some(explicit) => explicit,
        None => match determine_semver_change(commits, types) {
            Some(impact) => impact.into(),
            None => {
                debug!("No commit carries a semver impact");
                return Ok(BumpDecision::none(None));
            }
        },
    };

    let bump_type = dampen_zero_major(current, proposed);
    let mut next = increment(current, bump_type, options.preid.as_deref());

    if let Some(suffix) = &options.suffix {
        next = apply_suffix(&next, suffix, commits.first(), now)?;
    }

    if &next == current {
        debug!(version = %current, "Computed version equals current version");
        return Ok(BumpDecision::none(Some(bump_type)));
    }

    debug!(from = %current, to = %next, bump = %bump_type, "Computed version bump");
    Ok(BumpDecision {
        bump_type: Some(bump_type),
        new_version: Some(next),
    })
}

/// Downgrade major to minor and minor to patch while the major version is 0.
pub fn dampen_zero_major(current: &Version, bump_type: BumpType) -> BumpType {
    if current.major != 0 {
        return bump_type;
    }
    match bump_type {
        BumpType::Major => BumpType::Minor,
        BumpType::Minor => BumpType::Patch,
        other => other,
    }
}

/// Increment a version following node-semver `inc` rules.
///
/// Build metadata is always cleared.
pub fn increment(version: &Version, bump_type: BumpType, preid: Option<&str>) -> Version {
    let mut next = version.clone();
    next.build = BuildMetadata::EMPTY;
    let has_pre = !version.pre.is_empty();

    match bump_type {
        BumpType::Major => {
            // 1.0.0-rc.1 releases as 1.0.0.
            if !(has_pre && version.minor == 0 && version.patch == 0) {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        BumpType::Minor => {
            if !(has_pre && version.patch == 0) {
                next.minor += 1;
            }
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        BumpType::Patch => {
            if !has_pre {
                next.patch += 1;
            }
            next.pre = Prerelease::EMPTY;
        }
        BumpType::Premajor => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
            next.pre = next_prerelease(&[], preid);
        }
        BumpType::Preminor => {
            next.minor += 1;
            next.patch = 0;
            next.pre = next_prerelease(&[], preid);
        }
        BumpType::Prepatch => {
            next.patch += 1;
            next.pre = next_prerelease(&[], preid);
        }
        BumpType::Prerelease => {
            if has_pre {
                let current: Vec<&str> = version.pre.as_str().split('.').collect();
                next.pre = next_prerelease(&current, preid);
            } else {
                next.patch += 1;
                next.pre = next_prerelease(&[], preid);
            }
        }
    }

    next
}

/// Next prerelease identifiers: bump the last numeric part, or start at
/// `<preid>.0` when the identifier changes.
fn next_prerelease(current: &[&str], preid: Option<&str>) -> Prerelease {
    let mut parts: Vec<String> = current.iter().map(|s| s.to_string()).collect();

    if parts.is_empty() {
        parts.push("0".to_string());
    } else if let Some(last_numeric) = parts.iter().rposition(|p| p.parse::<u64>().is_ok()) {
        let value = parts[last_numeric].parse::<u64>().unwrap_or(0);
        parts[last_numeric] = (value + 1).to_string();
    } else {
        parts.push("0".to_string());
    }

    if let Some(preid) = preid.filter(|p| !p.is_empty()) {
        let restart = parts.first().map(String::as_str) != Some(preid)
            || parts.get(1).is_none_or(|p| p.parse::<u64>().is_err());
        if restart {
            parts = vec![preid.to_string(), "0".to_string()];
        }
    }

    Prerelease::new(&parts.join(".")).unwrap_or(Prerelease::EMPTY)
}

/// Replace the prerelease segment of `version` with a suffix.
pub fn apply_suffix(
    version: &Version,
    suffix: &VersionSuffix,
    newest_commit: Option<&ParsedCommit>,
    now: DateTime<Utc>,
) -> Result<Version, VersionError> {
    let value = match suffix {
        VersionSuffix::Literal(literal) => literal.clone(),
        VersionSuffix::Timestamp => match newest_commit {
            Some(commit) => format!("{}.{}", now.timestamp(), hash_identifier(commit.short_hash())),
            None => now.timestamp().to_string(),
        },
    };

    let pre = Prerelease::new(&value).map_err(|e| VersionError::InvalidSuffix(value.clone(), e))?;
    Ok(Version {
        pre,
        build: BuildMetadata::EMPTY,
        ..version.clone()
    })
}

/// A short hash as a prerelease identifier.
///
/// All-digit hashes with a leading zero are not valid numeric identifiers, so
/// they get a `g` prefix like `git describe` output.
fn hash_identifier(short_hash: &str) -> String {
    if short_hash.len() > 1
        && short_hash.starts_with('0')
        && short_hash.bytes().all(|b| b.is_ascii_digit())
    {
        format!("g{short_hash}")
    } else {
        short_hash.to_string()
    }
}
