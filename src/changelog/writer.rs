//! Insert a rendered release into CHANGELOG.md.

use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::ChangelogError;

pub const CHANGELOG_HEADER: &str = "# Changelog\n\n";

static FIRST_RELEASE_HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^###?[ \t]+.*$").expect("release heading regex is valid")
});

/// Place `markdown` above the newest release, or append it when the file
/// has no `##`/`###` heading yet.
pub fn insert_release(existing: &str, markdown: &str) -> String {
    match FIRST_RELEASE_HEADING_REGEX.find(existing) {
        Some(heading) => format!(
            "{}{}\n\n{}",
            &existing[..heading.start()],
            markdown,
            &existing[heading.start()..]
        ),
        None => format!("{}\n{}\n\n", existing, markdown),
    }
}

/// Write a release into the changelog at `path`, creating it if needed.
///
/// The file is replaced atomically.
pub fn write_changelog(path: &Path, markdown: &str) -> Result<(), ChangelogError> {
    let existing = if path.exists() {
        std::fs::read_to_string(path).map_err(ChangelogError::ReadFailed)?
    } else {
        CHANGELOG_HEADER.to_string()
    };

    let content = insert_release(&existing, markdown);

    let dir = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return Err(ChangelogError::InvalidPath(path.to_path_buf())),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(ChangelogError::WriteFailed)?;
    file.write_all(content.as_bytes())
        .map_err(ChangelogError::WriteFailed)?;
    file.persist(path)
        .map_err(|e| ChangelogError::WriteFailed(e.error))?;

    info!(path = %path.display(), "Updated changelog");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_before_newest_release() {
        let existing = "# Changelog\n\nIntro.\n\n## v1.0.0\n\n- Old\n";
        let updated = insert_release(existing, "## v1.1.0\n\n- New");
        assert_eq!(
            updated,
            "# Changelog\n\nIntro.\n\n## v1.1.0\n\n- New\n\n## v1.0.0\n\n- Old\n"
        );
    }

    #[test]
    fn test_append_when_no_release_heading() {
        let updated = insert_release(CHANGELOG_HEADER, "## v0.1.0\n\n- First");
        assert_eq!(updated, "# Changelog\n\n\n## v0.1.0\n\n- First\n\n");
    }

    #[test]
    fn test_write_creates_then_prepends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CHANGELOG.md");

        write_changelog(&path, "## v0.1.0\n\n- First").unwrap();
        write_changelog(&path, "## v0.2.0\n\n- Second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Changelog\n"));
        assert!(content.find("## v0.2.0").unwrap() < content.find("## v0.1.0").unwrap());
    }
}
