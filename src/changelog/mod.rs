//! Changelog rendering, parsing and writing.

pub mod markdown;
pub mod parser;
pub mod writer;

pub use markdown::{RenderContext, format_commit_line, generate_markdown};
pub use parser::{ChangelogRelease, ChangelogReleases, parse_changelog_markdown, read_changelog};
pub use writer::write_changelog;
