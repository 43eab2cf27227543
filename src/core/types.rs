//! core::types
//!
//! Strong types for the remote repository domain.
//!
//! # Types
//!
//! - [`RepositoryRef`] - `owner/repo` pair identifying a remote repository
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`FileChange`] / [`TreeEntry`] - Pending writes and their tree form
//! - [`Tree`], [`Commit`], [`Reference`] - Git objects as returned by the remote
//! - [`FileContent`] / [`Contents`] - Results of a contents lookup
//!
//! # Validation
//!
//! Identifiers enforce validity at construction time. An [`Oid`] can only be
//! built from a well-formed hex string, so every sha handed to a tree, commit
//! or ref request came from somewhere real.
//!
//! # Examples
//!
//! ```
//! use hubkit::core::types::{BranchName, FileChange, Oid, RepositoryRef, TreeEntry};
//!
//! let repo = RepositoryRef::new("octocat", "hello-world").unwrap();
//! assert_eq!(repo.to_string(), "octocat/hello-world");
//!
//! let branch = BranchName::new("feature/docs").unwrap();
//! assert_eq!(branch.ref_path(), "heads/feature/docs");
//!
//! let entry = TreeEntry::from_change(&FileChange::new("docs/README.md", "# Hi")).unwrap();
//! assert_eq!(entry.mode, "100644");
//!
//! assert!(Oid::new("not-a-sha").is_err());
//! assert!(BranchName::new("invalid..name").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid repository: {0}")]
    InvalidRepository(String),
}

/// Identifies a remote repository by owner and name.
///
/// Supplied by the caller on every operation; nothing is cached per repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// User or organization login
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepositoryRef {
    /// Create a validated repository reference.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepository` if either part is empty or
    /// contains a `/`.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self, TypeError> {
        let owner = owner.into();
        let repo = repo.into();
        for (label, value) in [("owner", &owner), ("repo", &repo)] {
            if value.trim().is_empty() {
                return Err(TypeError::InvalidRepository(format!(
                    "{label} cannot be empty"
                )));
            }
            if value.contains('/') {
                return Err(TypeError::InvalidRepository(format!(
                    "{label} cannot contain '/': {value}"
                )));
            }
        }
        Ok(Self { owner, repo })
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty or exactly `@`
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
///
/// # Example
///
/// ```
/// use hubkit::core::types::BranchName;
///
/// let name = BranchName::new("feature/my-branch").unwrap();
/// assert_eq!(name.as_str(), "feature/my-branch");
/// assert_eq!(name.full_ref(), "refs/heads/feature/my-branch");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name).map_err(|reason| {
            TypeError::InvalidBranchName(format!("{reason}: '{name}'"))
        })?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("branch name cannot be empty".into());
        }
        if name == "@" {
            return Err("branch name cannot be '@'".into());
        }

        let prefix_rules = [(".", "start with '.'"), ("-", "start with '-'")];
        for (prefix, rule) in prefix_rules {
            if name.starts_with(prefix) {
                return Err(format!("branch name cannot {rule}"));
            }
        }

        let suffix_rules = [(".lock", "end with '.lock'"), ("/", "end with '/'")];
        for (suffix, rule) in suffix_rules {
            if name.ends_with(suffix) {
                return Err(format!("branch name cannot {rule}"));
            }
        }

        for sequence in ["..", "@{", "//"] {
            if name.contains(sequence) {
                return Err(format!("branch name cannot contain '{sequence}'"));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name
            .chars()
            .find(|c| INVALID_CHARS.contains(c) || c.is_ascii_control())
        {
            return Err(if c.is_ascii_control() {
                "branch name cannot contain control characters".into()
            } else {
                format!("branch name cannot contain '{c}'")
            });
        }

        if name
            .split('/')
            .any(|component| component.starts_with('.') || component.ends_with(".lock"))
        {
            return Err("path component cannot start with '.' or end with '.lock'".into());
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reference path relative to `refs/` (`heads/<branch>`), as used in
    /// `git/refs/...` URLs.
    pub fn ref_path(&self) -> String {
        format!("heads/{}", self.0)
    }

    /// Fully qualified reference name (`refs/heads/<branch>`).
    pub fn full_ref(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase.
///
/// # Example
///
/// ```
/// use hubkit::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64
    /// character hex string.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!(
                "object id must be hexadecimal: {oid}"
            )));
        }
        Ok(Self(oid))
    }

    /// Build an object id from raw digest bytes (20 or 32 of them).
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pending write of one file, part of an in-memory batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileChange {
    /// Repository-relative path
    pub path: String,
    /// Full new text content
    pub content: String,
}

impl FileChange {
    /// Create a file change.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Mode of a regular, non-executable file in a Git tree.
pub const FILE_MODE: &str = "100644";

/// Object type of file content in a Git tree.
pub const BLOB_TYPE: &str = "blob";

/// A tree entry submitted to the remote create-tree call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: String,
}

impl TreeEntry {
    /// Derive a tree entry from a file change.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` if the path is empty, absolute, has a
    /// trailing `/`, or contains empty, `.`, `..` or NUL-bearing components.
    pub fn from_change(change: &FileChange) -> Result<Self, TypeError> {
        validate_path(&change.path)?;
        Ok(Self {
            path: change.path.clone(),
            mode: FILE_MODE,
            kind: BLOB_TYPE,
            content: change.content.clone(),
        })
    }
}

/// Check that a repository-relative file path is well formed.
pub fn validate_path(path: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("path cannot be empty"));
    }
    if path.starts_with('/') {
        return Err(invalid("path must be relative"));
    }
    if path.ends_with('/') {
        return Err(invalid("path cannot end with '/'"));
    }
    if path.contains('\0') {
        return Err(invalid("path cannot contain NUL"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(invalid("path cannot contain empty components")),
            "." | ".." => return Err(invalid("path cannot contain '.' or '..' components")),
            _ => {}
        }
    }
    Ok(())
}

/// One entry of a tree object as reported by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeItem {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: Oid,
}

/// An immutable, content-addressed tree object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub sha: Oid,
    #[serde(rename = "tree", default)]
    pub entries: Vec<TreeItem>,
}

/// An immutable commit object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: Oid,
    pub message: String,
    pub tree_sha: Oid,
    pub parent_shas: Vec<Oid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

/// A named, mutable pointer to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Fully qualified name, e.g. `refs/heads/main`
    pub ref_name: String,
    /// Commit the reference points at
    pub target_sha: Oid,
}

/// Kind of an entry returned by a contents lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::File => write!(f, "file"),
            ContentKind::Dir => write!(f, "dir"),
            ContentKind::Symlink => write!(f, "symlink"),
            ContentKind::Submodule => write!(f, "submodule"),
        }
    }
}

/// Metadata, and for single files the content, of a repository path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub name: String,
    pub path: String,
    /// Blob sha; the conditional-write token for this version of the file
    pub sha: Oid,
    #[serde(default)]
    pub size: u64,
    /// Decoded text for a single file, or the raw payload when `encoding` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Remaining encoding of `content`; `None` once decoded to text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Result of a contents lookup: one file, or a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Contents {
    File(FileContent),
    Directory(Vec<FileContent>),
}

impl Contents {
    /// The single file, if this is not a directory listing.
    pub fn as_file(&self) -> Option<&FileContent> {
        match self {
            Contents::File(file) => Some(file),
            Contents::Directory(_) => None,
        }
    }

    /// Whether this is a directory listing.
    pub fn is_directory(&self) -> bool {
        matches!(self, Contents::Directory(_))
    }
}

/// Result of a single-file write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    /// Metadata of the written file (absent for deletions on the remote side)
    pub content: Option<FileContent>,
    /// The commit created by the write
    pub commit: Commit,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repository_ref {
        use super::*;

        #[test]
        fn valid() {
            let repo = RepositoryRef::new("octocat", "hello-world").unwrap();
            assert_eq!(repo.owner, "octocat");
            assert_eq!(repo.repo, "hello-world");
            assert_eq!(repo.to_string(), "octocat/hello-world");
        }

        #[test]
        fn rejects_empty_parts() {
            assert!(RepositoryRef::new("", "repo").is_err());
            assert!(RepositoryRef::new("owner", "  ").is_err());
        }

        #[test]
        fn rejects_slash() {
            let err = RepositoryRef::new("owner/x", "repo").unwrap_err();
            assert!(matches!(err, TypeError::InvalidRepository(_)));
        }
    }

    mod branch_name {
        use super::*;

        #[test]
        fn valid_names() {
            for name in ["main", "feature/foo", "fix-123", "v1.0.0", "user@feature"] {
                assert!(BranchName::new(name).is_ok(), "{name} should be valid");
            }
        }

        #[test]
        fn invalid_names() {
            for name in [
                "",
                "@",
                ".hidden",
                "-flag",
                "branch.lock",
                "trailing/",
                "a..b",
                "a@{b",
                "a//b",
                "has space",
                "tilde~",
                "caret^",
                "colon:",
                "question?",
                "star*",
                "bracket[",
                "ctrl\x07",
                "foo/.bar",
                "foo.lock/bar",
            ] {
                assert!(BranchName::new(name).is_err(), "{name:?} should be invalid");
            }
        }

        #[test]
        fn ref_forms() {
            let branch = BranchName::new("feature/x").unwrap();
            assert_eq!(branch.ref_path(), "heads/feature/x");
            assert_eq!(branch.full_ref(), "refs/heads/feature/x");
        }

        #[test]
        fn serde_roundtrip_validates() {
            let ok: BranchName = serde_json::from_str("\"main\"").unwrap();
            assert_eq!(ok.as_str(), "main");
            assert!(serde_json::from_str::<BranchName>("\"bad name\"").is_err());
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn normalizes_case() {
            let oid = Oid::new("ABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
            assert_eq!(oid.as_str(), "abcdef0123456789abcdef0123456789abcdef01");
        }

        #[test]
        fn accepts_sha256_length() {
            assert!(Oid::new("a".repeat(64)).is_ok());
        }

        #[test]
        fn rejects_bad_input() {
            assert!(Oid::new("abc").is_err());
            assert!(Oid::new("g".repeat(40)).is_err());
            assert!(Oid::new("").is_err());
        }
    }

    mod tree_entry {
        use super::*;

        #[test]
        fn from_change_uses_blob_mode() {
            let entry = TreeEntry::from_change(&FileChange::new("src/lib.rs", "fn x() {}")).unwrap();
            assert_eq!(entry.path, "src/lib.rs");
            assert_eq!(entry.mode, FILE_MODE);
            assert_eq!(entry.kind, BLOB_TYPE);
            assert_eq!(entry.content, "fn x() {}");
        }

        #[test]
        fn serializes_type_field() {
            let entry = TreeEntry::from_change(&FileChange::new("a.txt", "a")).unwrap();
            let json = serde_json::to_value(&entry).unwrap();
            assert_eq!(json["type"], "blob");
            assert_eq!(json["mode"], "100644");
        }

        #[test]
        fn rejects_bad_paths() {
            for path in ["", "   ", "/abs", "dir/", "a//b", "./a", "a/../b", "nul\0"] {
                let result = TreeEntry::from_change(&FileChange::new(path, "x"));
                assert!(
                    matches!(result, Err(TypeError::InvalidPath { .. })),
                    "{path:?} should be rejected"
                );
            }
        }
    }

    mod contents {
        use super::*;

        fn file(name: &str) -> FileContent {
            FileContent {
                kind: ContentKind::File,
                name: name.to_string(),
                path: name.to_string(),
                sha: Oid::new("1".repeat(40)).unwrap(),
                size: 1,
                content: Some("x".into()),
                encoding: None,
                html_url: None,
                download_url: None,
            }
        }

        #[test]
        fn file_vs_directory() {
            let single = Contents::File(file("a"));
            assert!(single.as_file().is_some());
            assert!(!single.is_directory());

            let listing = Contents::Directory(vec![file("a"), file("b")]);
            assert!(listing.as_file().is_none());
            assert!(listing.is_directory());
        }

        #[test]
        fn serializes_untagged() {
            let listing = Contents::Directory(vec![file("a")]);
            let json = serde_json::to_value(&listing).unwrap();
            assert!(json.is_array());
            assert_eq!(json[0]["type"], "file");
        }
    }
}
