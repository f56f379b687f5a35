//! One changelog run: commits in, markdown and next version out.
//!
//! ```text
//! git log -> before_commit_parsing -> parse -> after_commit_parsing
//!         -> filter (types, deps, reverts) -> before_markdown_generation
//!         -> authors -> render -> after_markdown_generation
//! ```

use std::sync::Arc;

use chrono::Utc;
use git2::Repository;
use semver::Version;
use tracing::{debug, info, warn};

use crate::authors::{AuthorInfo, AuthorResolver, collect_authors, resolve_authors};
use crate::changelog::{RenderContext, generate_markdown};
use crate::config::ChangelogConfig;
use crate::error::PipelineError;
use crate::git::{ParsedCommit, fetch_raw_commits, filter_commits, parse_commits, resolve_range};
use crate::host::{GithubAuthorResolver, GithubClient, RepoProvider, resolve_github_token};
use crate::plugins::PluginRegistry;
use crate::version::{BumpOptions, bump_version, read_current_version};

/// Version change decided for a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub current: Version,
    pub new_version: Version,
}

/// Fetch, parse and filter the commits in the configured range.
///
/// `config.from` and `config.to` should already be resolved; an empty
/// `from` walks the whole history.
pub fn load_commits(
    repo: &Repository,
    config: &ChangelogConfig,
    plugins: &PluginRegistry,
) -> Result<Vec<ParsedCommit>, PipelineError> {
    let from = (!config.from.is_empty()).then_some(config.from.as_str());
    let to = (!config.to.is_empty()).then_some(config.to.as_str());
    let range = resolve_range(repo, from, to)?;

    let raw = fetch_raw_commits(repo, range.from, range.to)?;
    debug!(count = raw.len(), from = %range.from_ref, to = %range.to_ref, "Fetched commits");

    let raw = plugins.before_commit_parsing(raw, config)?;
    let parsed = parse_commits(&raw, &config.parse_options());
    let parsed = plugins.after_commit_parsing(parsed, config)?;

    let commits = filter_commits(parsed, &config.types);
    info!("Found {} relevant commits", commits.len());
    Ok(commits)
}

/// Decide the next version and record it in `config.new_version`.
///
/// A version already present in the configuration wins over the computed
/// one. Returns `None` when the commits do not warrant a release.
pub fn bump(
    commits: &[ParsedCommit],
    config: &mut ChangelogConfig,
    plugins: &PluginRegistry,
    options: &BumpOptions,
) -> Result<Option<VersionBump>, PipelineError> {
    let current = read_current_version(&config.cwd)?;

    if let Some(explicit) = config.new_version.clone() {
        debug!(version = %explicit, "Using configured version");
        return Ok(Some(VersionBump {
            current,
            new_version: explicit,
        }));
    }

    plugins.before_version_bump(commits, config)?;
    let decision = bump_version(commits, &config.types, &current, options, Utc::now())?;
    let Some(new_version) = decision.new_version else {
        return Ok(None);
    };
    plugins.after_version_bump(&new_version, config)?;

    config.new_version = Some(new_version.clone());
    Ok(Some(VersionBump {
        current,
        new_version,
    }))
}

/// Render the release section, contributors included unless disabled.
pub async fn render_markdown(
    commits: Vec<ParsedCommit>,
    config: &ChangelogConfig,
    plugins: &PluginRegistry,
    resolver: Option<Arc<dyn AuthorResolver>>,
) -> Result<String, PipelineError> {
    let commits = plugins.before_markdown_generation(commits, config)?;

    let authors = contributors(&commits, config, resolver).await;
    let ctx = RenderContext {
        types: &config.types,
        repo: config.repo.as_ref(),
        new_version: config.new_version.as_ref(),
        from: &config.from,
        to: &config.to,
        authors: authors.as_deref(),
        hide_author_email: config.hide_author_email,
    };
    let markdown = generate_markdown(&commits, &ctx);

    Ok(plugins.after_markdown_generation(markdown, &commits, config)?)
}

/// Username lookup for GitHub repositories when a token is available.
///
/// The token goes through [`resolve_github_token`], so a `gh` login counts.
pub fn author_resolver(config: &ChangelogConfig) -> Option<Arc<dyn AuthorResolver>> {
    let repo = config
        .repo
        .as_ref()
        .filter(|repo| repo.provider == RepoProvider::Github)?;
    let token = resolve_github_token(config.github_token.as_deref())?;

    match GithubClient::new(&token, repo) {
        Ok(client) => Some(Arc::new(GithubAuthorResolver::new(client))),
        Err(e) => {
            warn!("Could not create GitHub client, skipping username lookup: {}", e);
            None
        }
    }
}

async fn contributors(
    commits: &[ParsedCommit],
    config: &ChangelogConfig,
    resolver: Option<Arc<dyn AuthorResolver>>,
) -> Option<Vec<AuthorInfo>> {
    if config.no_authors {
        return None;
    }

    let authors = collect_authors(commits, &config.exclude_authors);
    Some(match resolver {
        Some(resolver) => resolve_authors(authors, resolver).await,
        None => authors,
    })
}

/// The part of a release section that goes into a GitHub release body.
///
/// Drops the `## v<version>` heading and the blank line after it.
pub fn release_body(markdown: &str) -> String {
    markdown.lines().skip(2).collect::<Vec<_>>().join("\n")
}
