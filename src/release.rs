//! Git side of `--release`: commit, tag, push.
//!
//! All operations shell out to the system `git` binary so the user's git
//! config, SSH agent and credential store apply unchanged.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::error::ReleaseError;
use crate::template::Templates;

/// Which release steps to run.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseSteps {
    pub commit: bool,
    pub tag: bool,
    pub push: bool,
}

impl Default for ReleaseSteps {
    fn default() -> Self {
        Self {
            commit: true,
            tag: true,
            push: false,
        }
    }
}

/// Commit `files`, tag the release and optionally push.
///
/// 1. `git add <files>` then `git commit -m <commit template>`
/// 2. `git tag -am <tag body> <tag message>` (annotated, so `--follow-tags` pushes it)
/// 3. `git push --follow-tags`
pub fn commit_tag_push(
    cwd: &Path,
    files: &[PathBuf],
    version: &str,
    templates: &Templates,
    steps: ReleaseSteps,
) -> Result<(), ReleaseError> {
    if steps.commit {
        let file_args: Vec<&str> = files.iter().filter_map(|p| p.to_str()).collect();
        if file_args.is_empty() {
            return Err(ReleaseError::NothingToStage);
        }

        let mut add_args = vec!["add"];
        add_args.extend(file_args);
        run_git(cwd, &add_args, "stage files")?;

        let message = templates.commit_message(version);
        run_git(cwd, &["commit", "-m", &message], "create commit")?;
        info!("Committed {}", message);
    }

    if steps.tag {
        let tag = templates.tag_message(version);
        let body = templates.tag_body(version);
        run_git(cwd, &["tag", "-am", &body, &tag], "create tag")?;
        info!("Tagged {}", tag);
    }

    if steps.push {
        run_git(cwd, &["push", "--follow-tags"], "push")
            .map_err(|e| ReleaseError::PushFailed(e.to_string()))?;
        info!("Pushed release");
    }

    Ok(())
}

/// Run a git command in `cwd` and return success or a descriptive error.
fn run_git(cwd: &Path, args: &[&str], operation: &str) -> Result<(), ReleaseError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| ReleaseError::GitFailed(format!("Failed to run git {}: {}", operation, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReleaseError::GitFailed(format!(
            "git {} failed: {}",
            operation,
            stderr.trim()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};

    fn repo_with_commit() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
            config.set_bool("commit.gpgsign", false).unwrap();
            config.set_bool("tag.gpgsign", false).unwrap();
        }

        std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "feat: init", &tree, &[])
            .unwrap();
        drop(tree);
        (dir, repo)
    }

    #[test]
    fn test_run_git_version_succeeds() {
        let result = run_git(Path::new("."), &["--version"], "version check");
        assert!(result.is_ok());
    }

    #[test]
    fn test_run_git_invalid_command_fails() {
        let result = run_git(Path::new("."), &["not-a-real-command"], "invalid");
        assert!(matches!(result, Err(ReleaseError::GitFailed(_))));
    }

    #[test]
    fn test_commit_requires_files() {
        let result = commit_tag_push(
            Path::new("."),
            &[],
            "1.0.0",
            &Templates::default(),
            ReleaseSteps::default(),
        );
        assert!(matches!(result, Err(ReleaseError::NothingToStage)));
    }

    #[test]
    fn test_commit_and_tag() {
        let (dir, repo) = repo_with_commit();
        std::fs::write(dir.path().join("CHANGELOG.md"), "# Changelog\n").unwrap();

        commit_tag_push(
            dir.path(),
            &[PathBuf::from("CHANGELOG.md")],
            "1.1.0",
            &Templates::default(),
            ReleaseSteps::default(),
        )
        .unwrap();

        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.summary(), Some("chore(release): v1.1.0"));

        let tag = repo
            .find_reference("refs/tags/v1.1.0")
            .unwrap()
            .peel_to_tag()
            .unwrap();
        assert_eq!(tag.message().map(str::trim), Some("v1.1.0"));
        assert_eq!(tag.target_id(), head.id());
    }
}
