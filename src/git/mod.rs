//! Git operations using git2-rs.

pub mod commits;
pub mod parse;
pub mod range;
pub mod revert;
pub mod tags;

pub use commits::{CommitAuthor, RawCommit, fetch_raw_commits};
pub use parse::{ParseOptions, ParsedCommit, Reference, ReferenceKind, parse_commit, parse_commits};
pub use range::{CommitRange, current_ref, open_repository, origin_url, resolve_range};
pub use revert::{RevertPair, RevertState, filter_commits, resolve_reverts};
pub use tags::{get_latest_reachable_tag, get_tag_at_head, get_version_from_tag};
