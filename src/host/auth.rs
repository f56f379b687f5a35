//! GitHub token resolution.
//!
//! Lookup order:
//! 1. A token passed on the command line or set in `tidings.toml`
//! 2. `TIDINGS_TOKENS_GITHUB`, `GITHUB_TOKEN`, `GH_TOKEN`
//! 3. `gh auth token`, when the gh CLI is installed

use std::env;
use std::process::Command;

use tracing::debug;

use crate::error::HostError;

const TOKEN_ENV_VARS: [&str; 3] = ["TIDINGS_TOKENS_GITHUB", "GITHUB_TOKEN", "GH_TOKEN"];

/// Find a GitHub token, or `None` when no source has one.
pub fn resolve_github_token(configured: Option<&str>) -> Option<String> {
    if let Some(token) = configured.filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    token_from_env().or_else(token_from_gh_cli)
}

/// Like [`resolve_github_token`], but missing auth is an error.
pub fn get_github_token(configured: Option<&str>) -> Result<String, HostError> {
    resolve_github_token(configured).ok_or(HostError::AuthenticationFailed)
}

/// First non-empty token from the environment.
pub fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS.iter().find_map(|name| {
        env::var(name)
            .ok()
            .filter(|token| !token.is_empty())
            .inspect(|_| debug!(source = name, "Using GitHub token from environment"))
    })
}

fn token_from_gh_cli() -> Option<String> {
    let gh = which::which("gh").ok()?;

    let output = Command::new(gh).args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        None
    } else {
        debug!("Using GitHub token from gh CLI");
        Some(token)
    }
}
