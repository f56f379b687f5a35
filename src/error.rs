//! Error types for tidings modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to find reference '{0}': {1}")]
    ReferenceNotFound(String, #[source] git2::Error),

    #[error("Failed to parse commit: {0}")]
    ParseCommit(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to read HEAD: {0}")]
    HeadUnavailable(#[source] git2::Error),
}

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    InvalidToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid repository '{0}'. Expected owner/repo, provider:owner/repo or a git URL")]
    InvalidRepository(String),

    #[error("Invalid version '{0}' in configuration: {1}")]
    InvalidVersion(String, #[source] semver::Error),

    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Errors from the code-host collaborator.
#[derive(Error, Debug)]
pub enum HostError {
    #[error(
        "GitHub authentication failed: no valid auth found. Run 'gh auth login' or set GITHUB_TOKEN environment variable"
    )]
    AuthenticationFailed,

    #[error("GitHub API request failed: {0}")]
    Api(#[source] Box<octocrab::Error>),

    #[error("Repository '{0}' is not hosted on GitHub")]
    NotGithub(String),

    #[error("Failed to build release URL: {0}")]
    InvalidUrl(#[source] url::ParseError),
}

/// Errors from changelog operations.
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Failed to read changelog: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to write changelog: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Changelog has no parent directory: {0}")]
    InvalidPath(PathBuf),
}

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Failed to parse version '{0}': {1}")]
    ParseFailed(String, #[source] semver::Error),

    #[error("Invalid prerelease suffix '{0}': {1}")]
    InvalidSuffix(String, #[source] semver::Error),

    #[error("Failed to update {path}: {reason}")]
    FileUpdateFailed { path: PathBuf, reason: String },
}

/// Errors raised by registered plugins.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin \"{plugin}\" failed in hook \"{hook}\": {message}")]
    Execution {
        plugin: String,
        hook: &'static str,
        message: String,
    },
}

/// Errors from the release step (git commit, tag, push).
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    GitFailed(String),

    #[error("Push failed: {0}")]
    PushFailed(String),

    #[error("No files to stage")]
    NothingToStage,
}

/// Errors from a changelog generation run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Version(#[from] VersionError),
}
