//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;

use git2::{Oid, Repository, Signature};
use tidings::git::{CommitAuthor, ParseOptions, ParsedCommit, RawCommit, parse_commit};

/// Parse a commit message authored by the default test user.
pub fn parsed(hash: &str, message: &str) -> ParsedCommit {
    parsed_as(hash, message, "Test User", "test@example.com")
}

/// Parse a commit message with an explicit author.
pub fn parsed_as(hash: &str, message: &str, name: &str, email: &str) -> ParsedCommit {
    let raw = RawCommit::from_message(hash, message, CommitAuthor::new(name, email));
    parse_commit(&raw, &ParseOptions::default())
        .unwrap_or_else(|| panic!("Not a conventional commit: {message}"))
}

/// Create a temporary directory for test output.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// A 40 character hash made of one repeated hex digit.
pub fn hash(digit: char) -> String {
    std::iter::repeat_n(digit, 40).collect()
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the repository root.
    pub fn write_file(&self, name: &str, content: &str) {
        std::fs::write(self.dir.path().join(name), content).expect("Failed to write file");
    }

    /// Create a commit by the default test user. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        self.commit_as(message, "Test User", "test@example.com")
    }

    /// Create a commit with the given author. Returns the commit OID.
    pub fn commit_as(&self, message: &str, name: &str, email: &str) -> Oid {
        let sig = Signature::now(name, email).expect("Failed to create signature");

        // Touch a file so every commit has a distinct tree
        let content = format!(
            "{}\n{}",
            message,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        );
        self.write_file("test.txt", &content);

        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new("test.txt")).expect("Failed to add file");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create a lightweight tag pointing to the given OID.
    pub fn tag_lightweight(&self, name: &str, oid: Oid) {
        let obj = self.repo.find_object(oid, None).expect("Failed to find object");
        self.repo
            .tag_lightweight(name, &obj, false)
            .expect("Failed to create lightweight tag");
    }

    /// Create an annotated tag pointing to the given OID.
    pub fn tag_annotated(&self, name: &str, oid: Oid, message: &str) {
        let sig =
            Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let obj = self.repo.find_object(oid, None).expect("Failed to find object");
        self.repo
            .tag(name, &obj, &sig, message, false)
            .expect("Failed to create annotated tag");
    }

    /// Create a branch pointing to the given OID.
    pub fn branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("Failed to find commit");
        self.repo
            .branch(name, &commit, false)
            .expect("Failed to create branch");
    }

    /// Add an `origin` remote.
    pub fn set_origin(&self, url: &str) {
        self.repo.remote("origin", url).expect("Failed to add remote");
    }
}
