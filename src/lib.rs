//! tidings - changelogs and semver releases from conventional commits.
//!
//! # Overview
//!
//! tidings reads git history, parses conventional commit subjects, cancels
//! out reverted work, picks the next semantic version, and renders a
//! markdown release section for CHANGELOG.md and GitHub releases.

pub mod authors;
pub mod changelog;
pub mod config;
pub mod error;
pub mod git;
pub mod host;
pub mod pipeline;
pub mod plugins;
pub mod release;
pub mod template;
pub mod version;

// Re-export commonly used types
pub use config::{ChangelogConfig, CommitType, CommitTypes, ConfigOverrides, load_config};
pub use error::{
    ChangelogError, ConfigError, GitError, HostError, PipelineError, PluginError, ReleaseError,
    VersionError,
};
pub use git::{ParsedCommit, RawCommit};
pub use plugins::{Plugin, PluginRegistry};
pub use version::{BumpType, SemverImpact};
