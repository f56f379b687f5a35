//! Pipeline extension hooks.
//!
//! Plugins are plain Rust values registered at startup. Each hook receives
//! the current value and returns the value handed to the next plugin, so
//! hooks run strictly in registration order. The first failing hook aborts
//! the run with the plugin's name and the hook name attached.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};
use semver::Version;
use tracing::debug;

use crate::config::ChangelogConfig;
use crate::error::{ConfigError, PluginError};
use crate::git::{ParsedCommit, RawCommit};

/// Error a hook may return.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;
pub type HookResult<T> = Result<T, HookError>;

/// Extension points around parsing, rendering and bumping.
///
/// Every hook defaults to passing its input through unchanged.
#[allow(unused_variables)]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn before_commit_parsing(
        &self,
        commits: Vec<RawCommit>,
        config: &ChangelogConfig,
    ) -> HookResult<Vec<RawCommit>> {
        Ok(commits)
    }

    fn after_commit_parsing(
        &self,
        commits: Vec<ParsedCommit>,
        config: &ChangelogConfig,
    ) -> HookResult<Vec<ParsedCommit>> {
        Ok(commits)
    }

    fn before_markdown_generation(
        &self,
        commits: Vec<ParsedCommit>,
        config: &ChangelogConfig,
    ) -> HookResult<Vec<ParsedCommit>> {
        Ok(commits)
    }

    fn after_markdown_generation(
        &self,
        markdown: String,
        commits: &[ParsedCommit],
        config: &ChangelogConfig,
    ) -> HookResult<String> {
        Ok(markdown)
    }

    fn before_version_bump(
        &self,
        commits: &[ParsedCommit],
        config: &ChangelogConfig,
    ) -> HookResult<()> {
        Ok(())
    }

    fn after_version_bump(
        &self,
        new_version: &Version,
        config: &ChangelogConfig,
    ) -> HookResult<()> {
        Ok(())
    }
}

/// Registered plugins in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from built-in plugin names.
    pub fn from_names(names: &[String]) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for name in names {
            match name.as_str() {
                GitmojiPlugin::NAME => registry.register(GitmojiPlugin),
                other => return Err(ConfigError::UnknownPlugin(other.to_string())),
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, plugin: impl Plugin + 'static) {
        debug!(plugin = plugin.name(), "Registered plugin");
        self.plugins.push(Box::new(plugin));
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn before_commit_parsing(
        &self,
        commits: Vec<RawCommit>,
        config: &ChangelogConfig,
    ) -> Result<Vec<RawCommit>, PluginError> {
        self.fold("before_commit_parsing", commits, |plugin, commits| {
            plugin.before_commit_parsing(commits, config)
        })
    }

    pub fn after_commit_parsing(
        &self,
        commits: Vec<ParsedCommit>,
        config: &ChangelogConfig,
    ) -> Result<Vec<ParsedCommit>, PluginError> {
        self.fold("after_commit_parsing", commits, |plugin, commits| {
            plugin.after_commit_parsing(commits, config)
        })
    }

    pub fn before_markdown_generation(
        &self,
        commits: Vec<ParsedCommit>,
        config: &ChangelogConfig,
    ) -> Result<Vec<ParsedCommit>, PluginError> {
        self.fold("before_markdown_generation", commits, |plugin, commits| {
            plugin.before_markdown_generation(commits, config)
        })
    }

    pub fn after_markdown_generation(
        &self,
        markdown: String,
        commits: &[ParsedCommit],
        config: &ChangelogConfig,
    ) -> Result<String, PluginError> {
        self.fold("after_markdown_generation", markdown, |plugin, markdown| {
            plugin.after_markdown_generation(markdown, commits, config)
        })
    }

    pub fn before_version_bump(
        &self,
        commits: &[ParsedCommit],
        config: &ChangelogConfig,
    ) -> Result<(), PluginError> {
        self.fold("before_version_bump", (), |plugin, ()| {
            plugin.before_version_bump(commits, config)
        })
    }

    pub fn after_version_bump(
        &self,
        new_version: &Version,
        config: &ChangelogConfig,
    ) -> Result<(), PluginError> {
        self.fold("after_version_bump", (), |plugin, ()| {
            plugin.after_version_bump(new_version, config)
        })
    }

    fn fold<T>(
        &self,
        hook: &'static str,
        initial: T,
        mut run: impl FnMut(&dyn Plugin, T) -> HookResult<T>,
    ) -> Result<T, PluginError> {
        self.plugins.iter().try_fold(initial, |value, plugin| {
            debug!(plugin = plugin.name(), hook, "Running plugin hook");
            run(plugin.as_ref(), value).map_err(|e| PluginError::Execution {
                plugin: plugin.name().to_string(),
                hook,
                message: e.to_string(),
            })
        })
    }
}

static SHORTCODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([a-z0-9_+-]+):").expect("shortcode regex is valid")
});

const GITMOJI: &[(&str, &str)] = &[
    ("art", "🎨"),
    ("zap", "⚡️"),
    ("fire", "🔥"),
    ("bug", "🐛"),
    ("ambulance", "🚑️"),
    ("sparkles", "✨"),
    ("memo", "📝"),
    ("rocket", "🚀"),
    ("lipstick", "💄"),
    ("tada", "🎉"),
    ("white_check_mark", "✅"),
    ("lock", "🔒️"),
    ("closed_lock_with_key", "🔐"),
    ("bookmark", "🔖"),
    ("rotating_light", "🚨"),
    ("construction", "🚧"),
    ("green_heart", "💚"),
    ("arrow_down", "⬇️"),
    ("arrow_up", "⬆️"),
    ("pushpin", "📌"),
    ("construction_worker", "👷"),
    ("chart_with_upwards_trend", "📈"),
    ("recycle", "♻️"),
    ("heavy_plus_sign", "➕"),
    ("heavy_minus_sign", "➖"),
    ("wrench", "🔧"),
    ("hammer", "🔨"),
    ("globe_with_meridians", "🌐"),
    ("pencil2", "✏️"),
    ("poop", "💩"),
    ("rewind", "⏪️"),
    ("twisted_rightwards_arrows", "🔀"),
    ("package", "📦️"),
    ("alien", "👽️"),
    ("truck", "🚚"),
    ("page_facing_up", "📄"),
    ("boom", "💥"),
    ("bento", "🍱"),
    ("wheelchair", "♿️"),
    ("bulb", "💡"),
    ("beers", "🍻"),
    ("speech_balloon", "💬"),
    ("card_file_box", "🗃️"),
    ("loud_sound", "🔊"),
    ("mute", "🔇"),
    ("busts_in_silhouette", "👥"),
    ("children_crossing", "🚸"),
    ("building_construction", "🏗️"),
    ("iphone", "📱"),
    ("clown_face", "🤡"),
    ("egg", "🥚"),
    ("see_no_evil", "🙈"),
    ("camera_flash", "📸"),
    ("alembic", "⚗️"),
    ("mag", "🔍️"),
    ("label", "🏷️"),
    ("seedling", "🌱"),
    ("triangular_flag_on_post", "🚩"),
    ("goal_net", "🥅"),
    ("dizzy", "💫"),
    ("wastebasket", "🗑️"),
    ("passport_control", "🛂"),
    ("adhesive_bandage", "🩹"),
    ("monocle_face", "🧐"),
    ("coffin", "⚰️"),
    ("test_tube", "🧪"),
    ("necktie", "👔"),
    ("stethoscope", "🩺"),
    ("bricks", "🧱"),
    ("technologist", "🧑‍💻"),
    ("money_with_wings", "💸"),
    ("thread", "🧵"),
    ("safety_vest", "🦺"),
    ("warning", "⚠️"),
    ("heart", "❤️"),
];

/// Look up the emoji for a gitmoji shortcode (without colons).
pub fn gitmoji(code: &str) -> Option<&'static str> {
    GITMOJI
        .iter()
        .find(|(name, _)| *name == code)
        .map(|(_, emoji)| *emoji)
}

/// Replace known `:code:` shortcodes with emoji, leaving unknown ones as-is.
pub fn convert_gitmoji(text: &str) -> String {
    SHORTCODE_REGEX
        .replace_all(text, |caps: &Captures| {
            gitmoji(&caps[1])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Turns gitmoji shortcodes in the rendered changelog into emoji.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitmojiPlugin;

impl GitmojiPlugin {
    pub const NAME: &'static str = "gitmoji";
}

impl Plugin for GitmojiPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn after_markdown_generation(
        &self,
        markdown: String,
        _commits: &[ParsedCommit],
        _config: &ChangelogConfig,
    ) -> HookResult<String> {
        Ok(convert_gitmoji(&markdown))
    }
}
