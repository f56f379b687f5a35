//! GitHub REST calls via octocrab: release sync and username lookup.

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::authors::{AuthorInfo, AuthorResolver};
use crate::error::HostError;

use super::{RepoConfig, RepoProvider};

/// A release as returned by the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubRelease {
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

/// Body for creating or updating a release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseRequest {
    pub tag_name: String,
    pub name: String,
    pub body: String,
}

impl ReleaseRequest {
    /// `v<version>` as both tag and title.
    pub fn for_version(version: &str, body: &str) -> Self {
        Self {
            tag_name: format!("v{version}"),
            name: format!("v{version}"),
            body: body.to_string(),
        }
    }
}

/// What happened when syncing a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSync {
    Created { id: u64 },
    Updated { id: u64 },
    /// The release must be created by hand at `url`.
    Manual { url: String, error: Option<String> },
}

#[derive(Debug, Deserialize)]
struct UserRef {
    login: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    author: Option<UserRef>,
}

#[derive(Debug, Deserialize)]
struct UserSearch {
    items: Vec<UserRef>,
}

/// GitHub API client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    octocrab: Octocrab,
    repo: String,
}

impl GithubClient {
    /// Build an authenticated client for `repo`.
    ///
    /// Self-hosted instances use the `/api/v3` endpoint on their own domain.
    pub fn new(token: &str, repo: &RepoConfig) -> Result<Self, HostError> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if repo.provider == RepoProvider::Selfhosted {
            let base = format!("{}//{}/api/v3", repo.protocol, repo.domain);
            builder = builder
                .base_uri(base)
                .map_err(|e| HostError::Api(Box::new(e)))?;
        }
        let octocrab = builder.build().map_err(|e| HostError::Api(Box::new(e)))?;
        Ok(Self::with_client(octocrab, &repo.repo))
    }

    /// Wrap a pre-configured octocrab client.
    ///
    /// This allows dependency injection for testing with mock servers.
    pub fn with_client(octocrab: Octocrab, repo: impl Into<String>) -> Self {
        Self {
            octocrab,
            repo: repo.into(),
        }
    }

    /// Find the release for `tag`, `None` when it does not exist.
    pub async fn get_release_by_tag(&self, tag: &str) -> Option<GithubRelease> {
        let route = format!("/repos/{}/releases/tags/{}", self.repo, tag);
        match self.octocrab.get::<GithubRelease, _, ()>(route, None).await {
            Ok(release) => Some(release),
            Err(e) => {
                debug!(tag, error = %e, "No existing release");
                None
            }
        }
    }

    pub async fn create_release(
        &self,
        request: &ReleaseRequest,
    ) -> Result<GithubRelease, HostError> {
        let route = format!("/repos/{}/releases", self.repo);
        self.octocrab
            .post(route, Some(request))
            .await
            .map_err(|e| HostError::Api(Box::new(e)))
    }

    pub async fn update_release(
        &self,
        id: u64,
        request: &ReleaseRequest,
    ) -> Result<GithubRelease, HostError> {
        let route = format!("/repos/{}/releases/{}", self.repo, id);
        self.octocrab
            .patch(route, Some(request))
            .await
            .map_err(|e| HostError::Api(Box::new(e)))
    }

    /// Username of the account a commit is attributed to.
    pub async fn login_by_commit(&self, sha: &str) -> Result<Option<String>, HostError> {
        let route = format!("/repos/{}/commits/{}", self.repo, sha);
        let commit: CommitResponse = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| HostError::Api(Box::new(e)))?;
        Ok(commit.author.map(|user| user.login))
    }

    /// Username of the account with a public `email`.
    pub async fn login_by_email(&self, email: &str) -> Result<Option<String>, HostError> {
        let query = [("q", format!("{email} in:email"))];
        let search: UserSearch = self
            .octocrab
            .get("/search/users", Some(&query))
            .await
            .map_err(|e| HostError::Api(Box::new(e)))?;
        Ok(search.items.into_iter().next().map(|user| user.login))
    }
}

/// Create or update the GitHub release for `version`.
///
/// Without a client, or when the API call fails, the result is a prefilled
/// "new release" URL for finishing the release by hand.
pub async fn sync_github_release(
    client: Option<&GithubClient>,
    repo: &RepoConfig,
    version: &str,
    body: &str,
) -> Result<ReleaseSync, HostError> {
    if !matches!(repo.provider, RepoProvider::Github | RepoProvider::Selfhosted) {
        return Err(HostError::NotGithub(repo.base_url()));
    }

    let Some(client) = client else {
        return Ok(ReleaseSync::Manual {
            url: manual_release_url(repo, version, body)?,
            error: None,
        });
    };

    let request = ReleaseRequest::for_version(version, body);
    let result = match client.get_release_by_tag(&request.tag_name).await {
        Some(existing) => client
            .update_release(existing.id, &request)
            .await
            .map(|release| ReleaseSync::Updated { id: release.id }),
        None => client
            .create_release(&request)
            .await
            .map(|release| ReleaseSync::Created { id: release.id }),
    };

    match result {
        Ok(sync) => {
            info!(version, "Synced release to GitHub");
            Ok(sync)
        }
        Err(e) => Ok(ReleaseSync::Manual {
            url: manual_release_url(repo, version, body)?,
            error: Some(e.to_string()),
        }),
    }
}

/// Prefilled `releases/new` URL for a version.
pub fn manual_release_url(
    repo: &RepoConfig,
    version: &str,
    body: &str,
) -> Result<String, HostError> {
    let tag = format!("v{version}");
    let base = format!("{}/releases/new", repo.base_url());
    let params = [("tag", tag.as_str()), ("title", tag.as_str()), ("body", body)];
    let url = url::Url::parse_with_params(&base, params).map_err(HostError::InvalidUrl)?;
    Ok(url.to_string())
}

/// Resolves GitHub usernames by public email, then by commit attribution.
pub struct GithubAuthorResolver {
    client: GithubClient,
}

impl GithubAuthorResolver {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthorResolver for GithubAuthorResolver {
    async fn resolve_login(&self, author: &AuthorInfo) -> Result<Option<String>, HostError> {
        for email in author.emails.iter().filter(|e| !e.is_empty()) {
            match self.client.login_by_email(email).await {
                Ok(Some(login)) => return Ok(Some(login)),
                Ok(None) => {}
                Err(e) => debug!(email = %email, error = %e, "Email lookup failed"),
            }
        }

        for sha in &author.commits {
            match self.client.login_by_commit(sha).await {
                Ok(Some(login)) => return Ok(Some(login)),
                Ok(None) => {}
                Err(e) => debug!(commit = %sha, error = %e, "Commit lookup failed"),
            }
        }

        Ok(None)
    }
}
