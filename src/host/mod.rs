//! Code host identity and link conventions.
//!
//! Repositories are identified from `owner/repo` shorthands, `provider:owner/repo`
//! shorthands, HTTP(S) URLs and SCP-style git remotes.

pub mod auth;
pub mod github;

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::git::{Reference, ReferenceKind};
use crate::version::read_package_repository;

pub use auth::resolve_github_token;
pub use github::{
    GithubAuthorResolver, GithubClient, GithubRelease, ReleaseSync, manual_release_url,
    sync_github_release,
};

static PROVIDER_SHORTHAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<provider>[a-z]+):(?P<repo>[\w.-]+(?:/[\w.-]+)+)$")
        .expect("provider shorthand regex is valid")
});

static SCP_REMOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.-]+@(?P<host>[^:/]+):(?P<repo>[^/].*)$").expect("scp remote regex is valid")
});

static OWNER_REPO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.-]+(?:/[\w.-]+)+$").expect("owner/repo regex is valid")
});

/// The hosting platform behind a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoProvider {
    Github,
    Gitlab,
    Bitbucket,
    /// A self-hosted instance following the GitHub URL layout.
    Selfhosted,
    /// Anything else. References render as plain text.
    Other(String),
}

impl RepoProvider {
    pub fn from_name(name: &str) -> Self {
        match name {
            "github" => RepoProvider::Github,
            "gitlab" => RepoProvider::Gitlab,
            "bitbucket" => RepoProvider::Bitbucket,
            "selfhosted" => RepoProvider::Selfhosted,
            other => RepoProvider::Other(other.to_string()),
        }
    }

    fn from_domain(domain: &str) -> Self {
        match domain {
            "github.com" => RepoProvider::Github,
            "gitlab.com" => RepoProvider::Gitlab,
            "bitbucket.org" => RepoProvider::Bitbucket,
            other if other.contains('.') => RepoProvider::Selfhosted,
            other => RepoProvider::Other(other.to_string()),
        }
    }

    fn default_domain(&self) -> &str {
        match self {
            RepoProvider::Github => "github.com",
            RepoProvider::Gitlab => "gitlab.com",
            RepoProvider::Bitbucket => "bitbucket.org",
            RepoProvider::Selfhosted | RepoProvider::Other(_) => "",
        }
    }

    /// URL path segment for each reference kind, `None` when links are unknown.
    fn reference_segment(&self, kind: ReferenceKind) -> Option<&'static str> {
        let segment = match (self, kind) {
            (RepoProvider::Other(_), _) => return None,
            (_, ReferenceKind::Issue) => "issues",
            (RepoProvider::Gitlab, ReferenceKind::PullRequest) => "merge_requests",
            (RepoProvider::Bitbucket, ReferenceKind::PullRequest) => "pull-requests",
            (_, ReferenceKind::PullRequest) => "pull",
            (RepoProvider::Bitbucket, ReferenceKind::Hash) => "commits",
            (_, ReferenceKind::Hash) => "commit",
        };
        Some(segment)
    }
}

impl fmt::Display for RepoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoProvider::Github => write!(f, "github"),
            RepoProvider::Gitlab => write!(f, "gitlab"),
            RepoProvider::Bitbucket => write!(f, "bitbucket"),
            RepoProvider::Selfhosted => write!(f, "selfhosted"),
            RepoProvider::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Where a repository lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub provider: RepoProvider,
    /// Host, including the port when one was given.
    pub domain: String,
    /// Repository path, e.g. `unjs/changelogen`.
    pub repo: String,
    /// `https:` unless the URL said otherwise.
    pub protocol: String,
}

impl RepoConfig {
    pub fn base_url(&self) -> String {
        format!("{}//{}/{}", self.protocol, self.domain, self.repo)
    }

    /// Whether commit references should use the full hash.
    pub fn uses_full_hashes(&self) -> bool {
        self.provider == RepoProvider::Bitbucket
    }
}

/// Identify a repository from a URL or shorthand.
///
/// `provider` overrides the provider detected from the domain, which is how
/// self-hosted GitLab instances on bare IPs are configured.
pub fn get_repo_config(url: &str, provider: Option<&str>) -> Option<RepoConfig> {
    let url = url.trim();
    let url = url.strip_prefix("git+").unwrap_or(url);
    if url.is_empty() {
        return None;
    }

    let (detected, domain, repo, protocol) = split_repo_url(url)?;

    let repo = repo.trim_matches('/');
    let repo = repo.strip_suffix(".git").unwrap_or(repo).to_string();
    if repo.is_empty() {
        return None;
    }

    Some(RepoConfig {
        provider: provider.map(RepoProvider::from_name).unwrap_or(detected),
        domain,
        repo,
        protocol,
    })
}

/// Provider, domain, raw repo path and protocol of a repository URL.
fn split_repo_url(url: &str) -> Option<(RepoProvider, String, String, String)> {
    if let Some(caps) = PROVIDER_SHORTHAND_REGEX.captures(url) {
        let provider = RepoProvider::from_name(&caps["provider"]);
        let domain = provider.default_domain().to_string();
        Some((provider, domain, caps["repo"].to_string(), "https:".to_string()))
    } else if let Some(caps) = SCP_REMOTE_REGEX.captures(url) {
        let domain = caps["host"].to_string();
        Some((
            RepoProvider::from_domain(&domain),
            domain,
            caps["repo"].to_string(),
            "https:".to_string(),
        ))
    } else if url.contains("://") {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let domain = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Some((
            RepoProvider::from_domain(host),
            domain,
            parsed.path().to_string(),
            format!("{}:", parsed.scheme()),
        ))
    } else if OWNER_REPO_REGEX.is_match(url) {
        Some((
            RepoProvider::Github,
            "github.com".to_string(),
            url.to_string(),
            "https:".to_string(),
        ))
    } else {
        debug!(url, "Unrecognized repository URL");
        None
    }
}

/// Find the repository from `package.json`, then the `origin` remote.
pub fn resolve_repo_config(cwd: &Path, origin_url: Option<&str>) -> Option<RepoConfig> {
    read_package_repository(cwd)
        .and_then(|url| get_repo_config(&url, None))
        .or_else(|| origin_url.and_then(|url| get_repo_config(url, None)))
}

/// Render a reference, linked when the provider's URL layout is known.
pub fn format_reference(reference: &Reference, repo: Option<&RepoConfig>) -> String {
    let Some(repo) = repo else {
        return reference.value.clone();
    };
    let Some(segment) = repo.provider.reference_segment(reference.kind) else {
        return reference.value.clone();
    };

    format!(
        "[{}]({}/{}/{})",
        reference.value,
        repo.base_url(),
        segment,
        reference.value.trim_start_matches('#')
    )
}

/// `[compare changes](<base>/compare/<from>...<to>)`, or `None` when no link
/// can be built.
pub fn format_compare_changes(repo: &RepoConfig, from: &str, to: &str) -> Option<String> {
    if from.is_empty() || matches!(repo.provider, RepoProvider::Other(_)) {
        return None;
    }
    let part = if repo.provider == RepoProvider::Bitbucket {
        "branches/compare"
    } else {
        "compare"
    };
    Some(format!(
        "[compare changes]({}/{}/{}...{})",
        repo.base_url(),
        part,
        from,
        to
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: RepoProvider, domain: &str, repo: &str, protocol: &str) -> RepoConfig {
        RepoConfig {
            provider,
            domain: domain.to_string(),
            repo: repo.to_string(),
            protocol: protocol.to_string(),
        }
    }

    #[test]
    fn test_provider_shorthands() {
        assert_eq!(
            get_repo_config("github:donaldsh/test", None),
            Some(config(RepoProvider::Github, "github.com", "donaldsh/test", "https:"))
        );
        assert_eq!(
            get_repo_config("gitlab:donaldsh/test.git", None),
            Some(config(RepoProvider::Gitlab, "gitlab.com", "donaldsh/test", "https:"))
        );
    }

    #[test]
    fn test_scp_remotes() {
        assert_eq!(
            get_repo_config("git@bitbucket.org:donaldsh/test.git", None),
            Some(config(RepoProvider::Bitbucket, "bitbucket.org", "donaldsh/test", "https:"))
        );
        assert_eq!(
            get_repo_config("a@x:b/c", None),
            Some(config(RepoProvider::Other("x".into()), "x", "b/c", "https:"))
        );
    }

    #[test]
    fn test_http_urls() {
        assert_eq!(
            get_repo_config("https://github.com/unjs/changelogen.git", None),
            Some(config(RepoProvider::Github, "github.com", "unjs/changelogen", "https:"))
        );
        assert_eq!(
            get_repo_config("https://github.com/myproject.git", None),
            Some(config(RepoProvider::Github, "github.com", "myproject", "https:"))
        );
        assert_eq!(
            get_repo_config("https://github.com/account/project/sub1/sub2/myproject.git", None),
            Some(config(
                RepoProvider::Github,
                "github.com",
                "account/project/sub1/sub2/myproject",
                "https:"
            ))
        );
        assert_eq!(
            get_repo_config("git+https://github.com/unjs/changelogen.git", None)
                .map(|c| c.repo),
            Some("unjs/changelogen".to_string())
        );
    }

    #[test]
    fn test_provider_override_with_port() {
        assert_eq!(
            get_repo_config("http://192.168.1.10:8888/unjs/changelogen.git", Some("gitlab")),
            Some(config(RepoProvider::Gitlab, "192.168.1.10:8888", "unjs/changelogen", "http:"))
        );
    }

    #[test]
    fn test_owner_repo_defaults_to_github() {
        assert_eq!(
            get_repo_config("donaldsh/test.git", None),
            Some(config(RepoProvider::Github, "github.com", "donaldsh/test", "https:"))
        );
        assert_eq!(get_repo_config("", None), None);
        assert_eq!(get_repo_config("not a repo", None), None);
    }

    #[test]
    fn test_reference_links_per_provider() {
        let pr = Reference::new(ReferenceKind::PullRequest, "#12");
        let hash = Reference::new(ReferenceKind::Hash, "3828bda");

        let github = config(RepoProvider::Github, "github.com", "unjs/c", "https:");
        assert_eq!(
            format_reference(&pr, Some(&github)),
            "[#12](https://github.com/unjs/c/pull/12)"
        );
        assert_eq!(
            format_reference(&hash, Some(&github)),
            "[3828bda](https://github.com/unjs/c/commit/3828bda)"
        );

        let gitlab = config(RepoProvider::Gitlab, "gitlab.com", "unjs/c", "https:");
        assert_eq!(
            format_reference(&pr, Some(&gitlab)),
            "[#12](https://gitlab.com/unjs/c/merge_requests/12)"
        );

        let bitbucket = config(RepoProvider::Bitbucket, "bitbucket.org", "unjs/c", "https:");
        assert_eq!(
            format_reference(&hash, Some(&bitbucket)),
            "[3828bda](https://bitbucket.org/unjs/c/commits/3828bda)"
        );

        let other = config(RepoProvider::Other("x".into()), "x", "b/c", "https:");
        assert_eq!(format_reference(&pr, Some(&other)), "#12");
        assert_eq!(format_reference(&pr, None), "#12");
    }

    #[test]
    fn test_compare_links() {
        let github = config(RepoProvider::Github, "github.com", "unjs/c", "https:");
        assert_eq!(
            format_compare_changes(&github, "v1.0.0", "v1.1.0").as_deref(),
            Some("[compare changes](https://github.com/unjs/c/compare/v1.0.0...v1.1.0)")
        );

        let bitbucket = config(RepoProvider::Bitbucket, "bitbucket.org", "unjs/c", "https:");
        assert_eq!(
            format_compare_changes(&bitbucket, "v1.0.0", "main").as_deref(),
            Some("[compare changes](https://bitbucket.org/unjs/c/branches/compare/v1.0.0...main)")
        );

        assert_eq!(format_compare_changes(&github, "", "main"), None);
    }
}
