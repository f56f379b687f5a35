//! tidings - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tidings::changelog::{read_changelog, write_changelog};
use tidings::config::{ChangelogConfig, ConfigOverrides, OutputSetting, load_config};
use tidings::git::open_repository;
use tidings::host::{
    GithubClient, ReleaseSync, RepoProvider, resolve_github_token, sync_github_release,
};
use tidings::pipeline::{self, author_resolver, load_commits, release_body, render_markdown};
use tidings::plugins::PluginRegistry;
use tidings::release::{ReleaseSteps, commit_tag_push};
use tidings::version::{BumpOptions, BumpType, VersionSuffix, write_version_files};

/// Generate changelogs and releases from conventional commits.
#[derive(Parser, Debug)]
#[command(name = "tidings")]
#[command(about = "Generate changelogs and releases from conventional commits")]
#[command(version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    generate: GenerateArgs,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GitHub commands
    Gh {
        #[command(subcommand)]
        command: GhCommand,
    },
}

#[derive(Subcommand, Debug)]
enum GhCommand {
    /// Create or update GitHub releases from CHANGELOG.md
    Release {
        /// `all`, or versions to publish (defaults to the newest release)
        versions: Vec<String>,

        /// Project directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// GitHub token
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Project directory
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Start of commit range (defaults to the latest tag)
    #[arg(long)]
    from: Option<String>,

    /// End of commit range (defaults to the tag at HEAD or the current branch)
    #[arg(long)]
    to: Option<String>,

    /// Write the changelog, optionally to PATH
    #[arg(short = 'o', long, value_name = "PATH", num_args = 0..=1)]
    output: Option<Option<PathBuf>>,

    /// Use this version instead of computing one
    #[arg(short = 'r', long = "release-version", value_name = "VERSION")]
    release_version: Option<String>,

    /// Bump the version in package.json / Cargo.toml and write the changelog
    #[arg(long)]
    bump: bool,

    /// Bump, write the changelog, commit and tag
    #[arg(long)]
    release: bool,

    #[command(flatten)]
    bump_type: BumpTypeArgs,

    /// Prerelease identifier, e.g. beta
    #[arg(long)]
    preid: Option<String>,

    /// Append a suffix to the new version (timestamp and hash when empty)
    #[arg(long, value_name = "SUFFIX", num_args = 0..=1)]
    suffix: Option<Option<String>>,

    /// Skip the release commit
    #[arg(long)]
    no_commit: bool,

    /// Skip the release tag
    #[arg(long)]
    no_tag: bool,

    /// Push the release commit and tag
    #[arg(long)]
    push: bool,

    /// Skip the GitHub release
    #[arg(long)]
    no_github: bool,

    /// Omit the contributors section
    #[arg(long)]
    no_authors: bool,

    /// Show contributors without their email
    #[arg(long)]
    hide_author_email: bool,

    /// GitHub token
    #[arg(long)]
    token: Option<String>,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
struct BumpTypeArgs {
    #[arg(long)]
    major: bool,
    #[arg(long)]
    minor: bool,
    #[arg(long)]
    patch: bool,
    #[arg(long)]
    premajor: bool,
    #[arg(long)]
    preminor: bool,
    #[arg(long)]
    prepatch: bool,
    #[arg(long)]
    prerelease: bool,
}

impl BumpTypeArgs {
    fn selected(&self) -> Option<BumpType> {
        [
            (self.major, BumpType::Major),
            (self.minor, BumpType::Minor),
            (self.patch, BumpType::Patch),
            (self.premajor, BumpType::Premajor),
            (self.preminor, BumpType::Preminor),
            (self.prepatch, BumpType::Prepatch),
            (self.prerelease, BumpType::Prerelease),
        ]
        .into_iter()
        .find_map(|(set, bump_type)| set.then_some(bump_type))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Command::Gh {
            command: GhCommand::Release { versions, dir, token },
        }) => gh_release(&dir, &versions, token).await,
        None => generate(cli.generate).await,
    }
}

/// Diagnostics go to stderr, filtered by `TIDINGS_LOG` (default `info`).
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("TIDINGS_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        from: args.from.clone(),
        to: args.to.clone(),
        new_version: args.release_version.clone(),
        output: args.output.clone().flatten().map(OutputSetting::Path),
        repo: None,
        no_authors: args.no_authors,
        hide_author_email: args.hide_author_email,
        github_token: args.token.clone(),
    };
    let mut config = load_config(&args.dir, overrides).context("Failed to load configuration")?;

    let repo = open_repository(&args.dir)
        .context("Not a git repository. Run tidings from within a git repository.")?;
    config
        .resolve_git_defaults(&repo)
        .context("Failed to resolve commit range")?;

    let plugins = PluginRegistry::from_names(&config.plugins).context("Failed to load plugins")?;

    let commits = load_commits(&repo, &config, &plugins).context("Failed to read commits")?;
    info!(
        "Generating changelog for {}...{}",
        if config.from.is_empty() { "(root)" } else { config.from.as_str() },
        config.to
    );

    let bumping = args.bump || args.release;
    let mut changed_files = Vec::new();

    if bumping {
        let options = BumpOptions {
            bump_type: args.bump_type.selected(),
            preid: args.preid.clone(),
            suffix: args.suffix.clone().map(|suffix| match suffix {
                Some(literal) => VersionSuffix::Literal(literal),
                None => VersionSuffix::Timestamp,
            }),
        };

        let Some(bump) = pipeline::bump(&commits, &mut config, &plugins, &options)
            .context("Failed to determine the next version")?
        else {
            bail!("Unable to bump version based on changes.");
        };

        changed_files = write_version_files(&config.cwd, &bump.current, &bump.new_version)
            .context("Failed to update version files")?;
    }

    let resolver = if config.no_authors { None } else { author_resolver(&config) };
    let markdown = render_markdown(commits, &config, &plugins, resolver)
        .await
        .context("Failed to render changelog")?;

    let display_only = !bumping;
    if display_only {
        println!("\n\n{}\n\n", markdown);
    }

    if let Some(path) = config.output_path() {
        if args.output.is_some() || !display_only {
            write_changelog(&path, &markdown)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Updated {}", path.display());
            changed_files.push(path);
        }
    }

    if args.release {
        let Some(version) = config.new_version.as_ref().map(ToString::to_string) else {
            bail!("Unable to bump version based on changes.");
        };

        let steps = ReleaseSteps {
            commit: !args.no_commit,
            tag: !args.no_tag,
            push: args.push,
        };
        commit_tag_push(&config.cwd, &changed_files, &version, &config.templates, steps)
            .context("Failed to commit and tag the release")?;

        let on_github = config
            .repo
            .as_ref()
            .is_some_and(|repo| repo.provider == RepoProvider::Github);
        if !args.no_github && on_github {
            publish_release(&config, &version, &release_body(&markdown)).await?;
        }
    }

    Ok(())
}

async fn gh_release(dir: &Path, versions: &[String], token: Option<String>) -> Result<()> {
    let overrides = ConfigOverrides {
        github_token: token,
        ..Default::default()
    };
    let mut config = load_config(dir, overrides).context("Failed to load configuration")?;

    if config.repo.is_none() {
        if let Ok(repo) = open_repository(dir) {
            config
                .resolve_git_defaults(&repo)
                .context("Failed to resolve repository")?;
        }
    }
    if !config
        .repo
        .as_ref()
        .is_some_and(|repo| repo.provider == RepoProvider::Github)
    {
        bail!("These commands are only supported for GitHub repositories.");
    }

    let path = config
        .output_path()
        .unwrap_or_else(|| config.cwd.join(tidings::config::DEFAULT_OUTPUT));
    let releases = read_changelog(&path)
        .context("Failed to read changelog")?
        .with_context(|| format!("Cannot resolve {}", path.display()))?;

    let selected = releases.select_versions(versions, config.new_version.as_ref());
    if selected.is_empty() {
        bail!("No versions specified to release!");
    }

    for version in selected {
        let Some(release) = releases.find(&version) else {
            warn!(
                "No matching changelog entry found for {} in {}. Skipping!",
                version,
                path.display()
            );
            continue;
        };
        if release.body.is_empty() {
            warn!("Changelog entry for {} is empty. Skipping!", version);
            continue;
        }
        publish_release(&config, &release.version, &release.body).await?;
    }

    Ok(())
}

/// Sync one release, printing a manual link when the API is unavailable.
async fn publish_release(config: &ChangelogConfig, version: &str, body: &str) -> Result<()> {
    let Some(repo) = config.repo.as_ref() else {
        return Ok(());
    };

    let client = resolve_github_token(config.github_token.as_deref())
        .map(|token| GithubClient::new(&token, repo))
        .transpose()
        .context("Failed to create GitHub client")?;

    let outcome = sync_github_release(client.as_ref(), repo, version, body)
        .await
        .context("Failed to sync GitHub release")?;

    match outcome {
        ReleaseSync::Created { .. } | ReleaseSync::Updated { .. } => {
            println!("✓ Synced v{} to GitHub releases", version);
        }
        ReleaseSync::Manual { url, error } => {
            if let Some(error) = error {
                warn!("GitHub release failed: {}", error);
            }
            println!("Open this link to manually create a release:\n{}\n", url);
        }
    }

    Ok(())
}
