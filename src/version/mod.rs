//! Version management and semver bumping.

pub mod bump;
pub mod files;

pub use bump::{
    BumpDecision, BumpOptions, BumpType, SemverImpact, VersionSuffix, apply_suffix,
    bump_version, determine_semver_change, increment,
};
pub use files::{read_current_version, read_package_repository, write_version_files};
