//! Configuration: defaults, `tidings.toml`, environment and CLI overrides.
//!
//! Precedence is CLI > file > environment > defaults. Values that depend on
//! the repository (range endpoints, repo URL) are filled in afterwards by
//! [`ChangelogConfig::resolve_git_defaults`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use git2::Repository;
use semver::Version;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::{ConfigError, GitError};
use crate::git::parse::{ParseOptions, default_breaking_markers};
use crate::git::{current_ref, get_latest_reachable_tag, origin_url};
use crate::host::{RepoConfig, get_repo_config, resolve_repo_config};
use crate::host::auth::token_from_env;
use crate::template::Templates;
use crate::version::SemverImpact;

/// Configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tidings.toml";

/// Default changelog path.
pub const DEFAULT_OUTPUT: &str = "CHANGELOG.md";

/// Display title and version impact of one commit type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitType {
    pub title: String,
    #[serde(default)]
    pub semver: Option<SemverImpact>,
}

impl CommitType {
    fn new(title: &str, semver: Option<SemverImpact>) -> Self {
        Self {
            title: title.to_string(),
            semver,
        }
    }
}

/// Ordered type table. Order decides section order in the changelog, and
/// membership decides which commits are kept at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTypes(Vec<(String, CommitType)>);

impl Default for CommitTypes {
    fn default() -> Self {
        use SemverImpact::{Minor, Patch};
        let types = [
            ("feat", "🚀 Enhancements", Some(Minor)),
            ("perf", "🔥 Performance", Some(Patch)),
            ("fix", "🩹 Fixes", Some(Patch)),
            ("refactor", "💅 Refactors", Some(Patch)),
            ("docs", "📖 Documentation", Some(Patch)),
            ("build", "📦 Build", Some(Patch)),
            ("types", "🌊 Types", Some(Patch)),
            ("chore", "🏡 Chore", None),
            ("examples", "🏀 Examples", None),
            ("test", "✅ Tests", None),
            ("style", "🎨 Styles", None),
            ("ci", "🤖 CI", None),
        ];
        Self(
            types
                .into_iter()
                .map(|(name, title, semver)| (name.to_string(), CommitType::new(title, semver)))
                .collect(),
        )
    }
}

impl CommitTypes {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&CommitType> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Update a type in place, or append it when new.
    pub fn set(&mut self, name: &str, commit_type: CommitType) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = commit_type,
            None => self.0.push((name.to_string(), commit_type)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(n, _)| n != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommitType)> {
        self.0.iter().map(|(n, t)| (n.as_str(), t))
    }

    fn apply(&mut self, overrides: TypeOverrides) {
        for (name, setting) in overrides.0 {
            match setting {
                TypeSetting::Enabled(false) => self.remove(&name),
                TypeSetting::Enabled(true) => {}
                TypeSetting::Type(commit_type) => self.set(&name, commit_type),
            }
        }
    }
}

impl<const N: usize> From<[(&str, CommitType); N]> for CommitTypes {
    fn from(types: [(&str, CommitType); N]) -> Self {
        let mut table = Self::empty();
        for (name, commit_type) in types {
            table.set(name, commit_type);
        }
        table
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TypeSetting {
    /// `false` removes a default type.
    Enabled(bool),
    Type(CommitType),
}

/// `[types]` entries in document order.
#[derive(Debug, Clone, Default)]
struct TypeOverrides(Vec<(String, TypeSetting)>);

impl<'de> Deserialize<'de> for TypeOverrides {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = TypeOverrides;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of commit types")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((name, setting)) = map.next_entry::<String, TypeSetting>()? {
                    entries.push((name, setting));
                }
                Ok(TypeOverrides(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// `output = "CHANGELOG.md"` or `output = false`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OutputSetting {
    Enabled(bool),
    Path(PathBuf),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokensFile {
    github: Option<String>,
}

/// Shape of `tidings.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    from: Option<String>,
    to: Option<String>,
    new_version: Option<String>,
    output: Option<OutputSetting>,
    repo: Option<String>,
    scope_map: HashMap<String, String>,
    types: TypeOverrides,
    exclude_authors: Vec<String>,
    no_authors: Option<bool>,
    hide_author_email: Option<bool>,
    breaking_markers: Option<Vec<String>>,
    plugins: Option<Vec<String>>,
    templates: Option<Templates>,
    tokens: TokensFile,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub from: Option<String>,
    pub to: Option<String>,
    pub new_version: Option<String>,
    pub output: Option<OutputSetting>,
    pub repo: Option<String>,
    pub no_authors: bool,
    pub hide_author_email: bool,
    pub github_token: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ChangelogConfig {
    pub cwd: PathBuf,
    pub types: CommitTypes,
    pub scope_map: HashMap<String, String>,
    pub repo: Option<RepoConfig>,
    pub github_token: Option<String>,
    /// Start of the range; empty means the start of history.
    pub from: String,
    pub to: String,
    pub new_version: Option<Version>,
    /// Changelog file, `None` when writing is disabled.
    pub output: Option<PathBuf>,
    pub exclude_authors: Vec<String>,
    pub no_authors: bool,
    pub hide_author_email: bool,
    pub breaking_markers: Vec<String>,
    /// Built-in plugin names, in registration order.
    pub plugins: Vec<String>,
    pub templates: Templates,
}

impl ChangelogConfig {
    /// Defaults for `cwd`, with the token taken from the environment.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            types: CommitTypes::default(),
            scope_map: HashMap::new(),
            repo: None,
            github_token: token_from_env(),
            from: String::new(),
            to: String::new(),
            new_version: None,
            output: Some(PathBuf::from(DEFAULT_OUTPUT)),
            exclude_authors: Vec::new(),
            no_authors: false,
            hide_author_email: false,
            breaking_markers: default_breaking_markers(),
            plugins: vec!["gitmoji".to_string()],
            templates: Templates::default(),
        }
    }

    /// Parser options implied by this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            scope_map: self.scope_map.clone(),
            breaking_markers: self.breaking_markers.clone(),
            full_hash_references: self.repo.as_ref().is_some_and(RepoConfig::uses_full_hashes),
            ..ParseOptions::default()
        }
    }

    /// Output path resolved against `cwd`.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.as_ref().map(|p| self.cwd.join(p))
    }

    /// Fill `from`, `to` and `repo` from the repository when unset.
    pub fn resolve_git_defaults(&mut self, repo: &Repository) -> Result<(), GitError> {
        if self.from.is_empty() {
            if let Some(tag) = get_latest_reachable_tag(repo)? {
                self.from = tag.name;
            }
        }
        if self.to.is_empty() {
            self.to = current_ref(repo)?;
        }
        if self.repo.is_none() {
            self.repo = resolve_repo_config(&self.cwd, origin_url(repo).as_deref());
        }
        debug!(from = %self.from, to = %self.to, repo = ?self.repo, "Resolved git defaults");
        Ok(())
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        if let Some(from) = file.from {
            self.from = from;
        }
        if let Some(to) = file.to {
            self.to = to;
        }
        if let Some(version) = file.new_version {
            self.new_version = Some(parse_version(&version)?);
        }
        if let Some(output) = file.output {
            self.set_output(output);
        }
        if let Some(repo) = file.repo {
            self.repo = Some(parse_repo(&repo)?);
        }
        self.scope_map.extend(file.scope_map);
        self.types.apply(file.types);
        self.exclude_authors.extend(file.exclude_authors);
        if let Some(no_authors) = file.no_authors {
            self.no_authors = no_authors;
        }
        if let Some(hide) = file.hide_author_email {
            self.hide_author_email = hide;
        }
        if let Some(markers) = file.breaking_markers {
            self.breaking_markers = markers;
        }
        if let Some(plugins) = file.plugins {
            self.plugins = plugins;
        }
        if let Some(templates) = file.templates {
            self.templates = templates;
        }
        if let Some(token) = file.tokens.github.filter(|t| !t.is_empty()) {
            self.github_token = Some(token);
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(from) = overrides.from {
            self.from = from;
        }
        if let Some(to) = overrides.to {
            self.to = to;
        }
        if let Some(version) = overrides.new_version {
            self.new_version = Some(parse_version(&version)?);
        }
        if let Some(output) = overrides.output {
            self.set_output(output);
        }
        if let Some(repo) = overrides.repo {
            self.repo = Some(parse_repo(&repo)?);
        }
        self.no_authors |= overrides.no_authors;
        self.hide_author_email |= overrides.hide_author_email;
        if let Some(token) = overrides.github_token {
            self.github_token = Some(token);
        }
        Ok(())
    }

    fn set_output(&mut self, output: OutputSetting) {
        self.output = match output {
            OutputSetting::Enabled(false) => None,
            OutputSetting::Enabled(true) => Some(PathBuf::from(DEFAULT_OUTPUT)),
            OutputSetting::Path(path) => Some(path),
        };
    }
}

/// Load configuration for `cwd`, reading `tidings.toml` when present.
pub fn load_config(cwd: &Path, overrides: ConfigOverrides) -> Result<ChangelogConfig, ConfigError> {
    let mut config = ChangelogConfig::new(cwd);

    let path = cwd.join(CONFIG_FILE_NAME);
    if path.exists() {
        debug!(?path, "loading configuration");
        config.apply_file(read_config_file(&path)?)?;
    }

    config.apply_overrides(overrides)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::InvalidToml {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_version(raw: &str) -> Result<Version, ConfigError> {
    let trimmed = raw.strip_prefix('v').unwrap_or(raw);
    Version::parse(trimmed).map_err(|e| ConfigError::InvalidVersion(raw.to_string(), e))
}

fn parse_repo(raw: &str) -> Result<RepoConfig, ConfigError> {
    get_repo_config(raw, None).ok_or_else(|| ConfigError::InvalidRepository(raw.to_string()))
}
