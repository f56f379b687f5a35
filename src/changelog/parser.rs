//! Split an existing CHANGELOG.md back into releases.
//!
//! A release starts at any `##` (or deeper) heading carrying a `vX.Y.Z`
//! token and runs until the next such heading.

use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use semver::Version;

use crate::error::ChangelogError;

static RELEASE_HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#{2,}[ \t]+.*?v(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?).*$")
        .expect("release heading regex is valid")
});

/// One release section of a changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogRelease {
    /// Version without the `v` prefix.
    pub version: String,
    /// Trimmed text between this heading and the next release heading.
    pub body: String,
}

/// Releases in file order, newest first for a conventional changelog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogReleases {
    pub releases: Vec<ChangelogRelease>,
}

impl ChangelogReleases {
    pub fn find(&self, version: &str) -> Option<&ChangelogRelease> {
        let version = version.strip_prefix('v').unwrap_or(version);
        self.releases.iter().find(|r| r.version == version)
    }

    pub fn latest(&self) -> Option<&ChangelogRelease> {
        self.releases.first()
    }

    /// Versions to publish for `gh release [all|versions...]`.
    ///
    /// `all` selects every release in ascending semver order. No request
    /// falls back to `fallback`, then to the newest release in the file.
    pub fn select_versions(&self, requested: &[String], fallback: Option<&Version>) -> Vec<String> {
        let requested: Vec<String> = requested
            .iter()
            .map(|v| v.strip_prefix('v').unwrap_or(v).to_string())
            .collect();

        if requested.first().is_some_and(|v| v == "all") {
            let mut all: Vec<&ChangelogRelease> = self.releases.iter().collect();
            all.sort_by(|a, b| match (Version::parse(&a.version), Version::parse(&b.version)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.version.cmp(&b.version),
            });
            return all.into_iter().map(|r| r.version.clone()).collect();
        }

        if !requested.is_empty() {
            return requested;
        }

        fallback
            .map(Version::to_string)
            .or_else(|| self.latest().map(|r| r.version.clone()))
            .into_iter()
            .collect()
    }
}

/// Parse changelog markdown into releases.
pub fn parse_changelog_markdown(contents: &str) -> ChangelogReleases {
    let headings: Vec<_> = RELEASE_HEADING_REGEX.captures_iter(contents).collect();

    let releases = headings
        .iter()
        .enumerate()
        .filter_map(|(idx, caps)| {
            let heading = caps.get(0)?;
            let version = caps.get(1)?.as_str().to_string();
            let end = headings
                .get(idx + 1)
                .and_then(|next| next.get(0))
                .map_or(contents.len(), |m| m.start());

            Some(ChangelogRelease {
                version,
                body: contents[heading.end()..end].trim().to_string(),
            })
        })
        .collect();

    ChangelogReleases { releases }
}

/// Read and parse a changelog file. Returns `None` when it does not exist.
pub fn read_changelog(path: &Path) -> Result<Option<ChangelogReleases>, ChangelogError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(ChangelogError::ReadFailed)?;
    Ok(Some(parse_changelog_markdown(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = "# Changelog

## v1.1.0

[compare changes](https://github.com/unjs/c/compare/v1.0.0...v1.1.0)

### 🚀 Enhancements

- Add feature ([#37](https://github.com/unjs/c/pull/37))

### [v1.0.0](https://github.com/unjs/c/compare/v0.9.0...v1.0.0) (2024-01-01)

- Initial release

## Unreleased notes without a version
";

    #[test]
    fn test_releases_split_on_versioned_headings() {
        let parsed = parse_changelog_markdown(CHANGELOG);

        assert_eq!(parsed.releases.len(), 2);
        assert_eq!(parsed.releases[0].version, "1.1.0");
        assert!(parsed.releases[0].body.starts_with("[compare changes]"));
        assert!(parsed.releases[0].body.ends_with("pull/37))"));
        assert_eq!(parsed.releases[1].version, "1.0.0");
        assert!(parsed.releases[1].body.starts_with("- Initial release"));
        assert!(parsed.releases[1].body.contains("Unreleased notes"));
    }

    #[test]
    fn test_prerelease_versions_and_lookup() {
        let parsed = parse_changelog_markdown("## v2.0.0-beta.1\n\n- Thing\n");
        assert_eq!(parsed.find("v2.0.0-beta.1").map(|r| r.body.as_str()), Some("- Thing"));
        assert_eq!(parsed.latest().map(|r| r.version.as_str()), Some("2.0.0-beta.1"));
    }

    #[test]
    fn test_headings_without_v_prefix_are_not_releases() {
        let parsed = parse_changelog_markdown("# v1.0.0\n\n## 1.0.0\n\n### Fixes\n");
        assert!(parsed.releases.is_empty());
    }

    #[test]
    fn test_select_versions() {
        let parsed = parse_changelog_markdown(
            "## v1.10.0\n\n- C\n\n## v1.9.0\n\n- B\n\n## v1.0.0\n\n- A\n",
        );

        assert_eq!(
            parsed.select_versions(&["all".to_string()], None),
            vec!["1.0.0", "1.9.0", "1.10.0"]
        );
        assert_eq!(
            parsed.select_versions(&["v1.9.0".to_string(), "1.0.0".to_string()], None),
            vec!["1.9.0", "1.0.0"]
        );
        assert_eq!(parsed.select_versions(&[], None), vec!["1.10.0"]);
        assert_eq!(
            parsed.select_versions(&[], Some(&Version::new(2, 0, 0))),
            vec!["2.0.0"]
        );
        assert!(ChangelogReleases::default().select_versions(&[], None).is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_changelog(&dir.path().join("CHANGELOG.md")).unwrap().is_none());
    }
}
