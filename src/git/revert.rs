//! Revert resolution and commit filtering.
//!
//! A commit and the commit that reverts it cancel out when both fall inside
//! the changelog window. A revert whose target predates the window stays
//! visible since it is a real change in this release.

use crate::config::CommitTypes;

use super::parse::ParsedCommit;

/// A pending revert: `reverting_hash` (short) undoes `reverted_hash` (full).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertPair {
    pub reverting_hash: String,
    pub reverted_hash: String,
}

/// Working state of the resolver between commits.
#[derive(Debug, Clone, Default)]
pub struct RevertState {
    pub resolved: Vec<ParsedCommit>,
    pub watch_list: Vec<RevertPair>,
}

impl RevertState {
    /// Process one commit, visiting commits newest-first.
    pub fn step(mut self, commit: ParsedCommit) -> Self {
        for reverted in &commit.reverted_hashes {
            let pair = RevertPair {
                reverting_hash: commit.short_hash().to_string(),
                reverted_hash: reverted.clone(),
            };
            if !self.watch_list.contains(&pair) {
                self.watch_list.push(pair);
            }
        }

        let matching: Vec<String> = self
            .watch_list
            .iter()
            .filter(|pair| pair.reverted_hash.starts_with(commit.short_hash()))
            .map(|pair| pair.reverting_hash.clone())
            .collect();

        if matching.is_empty() {
            self.resolved.push(commit);
            return self;
        }

        self.resolved
            .retain(|c| !matching.iter().any(|hash| hash == c.short_hash()));
        self.watch_list
            .retain(|pair| !matching.contains(&pair.reverting_hash));
        self
    }
}

/// Drop commits reverted inside the batch together with their reverters.
///
/// Input and output are newest-first; survivors keep their relative order.
pub fn resolve_reverts(commits: Vec<ParsedCommit>) -> Vec<ParsedCommit> {
    commits
        .into_iter()
        .fold(RevertState::default(), RevertState::step)
        .resolved
}

/// Keep commits whose type is configured, drop non-breaking `chore(deps)`
/// updates, then resolve reverts.
pub fn filter_commits(commits: Vec<ParsedCommit>, types: &CommitTypes) -> Vec<ParsedCommit> {
    let allowed = commits
        .into_iter()
        .filter(|c| types.contains(&c.commit_type))
        .filter(|c| !(c.commit_type == "chore" && c.scope == "deps" && !c.is_breaking))
        .collect();

    resolve_reverts(allowed)
}
