//! forge::traits
//!
//! Trait definitions for talking to a remote source-hosting service.
//!
//! # Design
//!
//! The remote surface is split in two:
//!
//! - [`GitData`]: the Git object primitives (refs, contents, trees, commits)
//!   that the orchestration in [`crate::ops`] is built on. This is the seam
//!   the deterministic [`MockForge`](super::mock::MockForge) implements.
//! - [`Forge`]: everything else a tool can ask for (forks, repositories,
//!   issues, pull requests, gists, search). These are single requests with
//!   no ordering between them.
//!
//! Both traits are async because every method is one network round trip.
//! Nothing is retried; the first failing call is the result.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{
    CommitSummary, CreateGistRequest, CreateIssueRequest, CreatePrRequest,
    CreateRepositoryRequest, Gist, Issue, IssueComment, ListCommitsOpts, ListIssuesOpts,
    PullRequest, Repository, SearchKind, SearchQuery, SearchResults, UpdateIssueRequest,
};
use crate::core::types::{
    BranchName, Commit, Contents, Oid, Reference, RepositoryRef, Tree, TreeEntry, WriteResult,
};

/// Errors from forge operations.
///
/// These map the HTTP failure modes of the remote onto the conditions the
/// orchestration cares about.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The referenced remote object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency or fast-forward violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// Any other non-success response, or a response of unexpected shape.
    #[error("remote error: {status} - {message}")]
    RemoteError {
        /// HTTP status code
        status: u16,
        /// Error message from the remote
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The client was constructed with unusable settings.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl ForgeError {
    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound(_))
    }

    /// Whether this is a `Conflict` error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ForgeError::Conflict(_))
    }
}

/// Request to create or update a single file through the contents API.
#[derive(Debug, Clone)]
pub struct PutContentsRequest {
    /// Repository-relative path
    pub path: String,
    /// New text content (encoded by the implementation)
    pub content: String,
    /// Commit message
    pub message: String,
    /// Target branch
    pub branch: BranchName,
    /// Blob sha of the version being replaced; `None` creates the file
    pub sha: Option<Oid>,
}

/// Request to create a commit object.
#[derive(Debug, Clone)]
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: Oid,
    pub parents: Vec<Oid>,
}

/// Git object primitives of a remote repository.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one client can serve
/// concurrent tool calls.
///
/// # Errors
///
/// - `NotFound`: the ref, path, or object does not exist
/// - `Conflict`: a conditional write or fast-forward check was rejected
/// - `RemoteError`: anything else the remote refused
#[async_trait]
pub trait GitData: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Look up `refs/heads/{branch}`.
    async fn get_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
    ) -> Result<Reference, ForgeError>;

    /// Create `refs/heads/{branch}` pointing at `sha`.
    async fn create_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
        sha: &Oid,
    ) -> Result<Reference, ForgeError>;

    /// Move `refs/heads/{branch}` to `sha`.
    ///
    /// With `force = false` the remote rejects a move that is not a
    /// fast-forward, reported as `Conflict`.
    async fn update_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
        sha: &Oid,
        force: bool,
    ) -> Result<Reference, ForgeError>;

    /// Fetch a file or directory listing at `path`, optionally at `git_ref`
    /// (branch, tag, or commit sha). File content is returned decoded.
    async fn get_contents(
        &self,
        repo: &RepositoryRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Contents, ForgeError>;

    /// Create or conditionally overwrite one file, producing one commit.
    async fn put_contents(
        &self,
        repo: &RepositoryRef,
        request: PutContentsRequest,
    ) -> Result<WriteResult, ForgeError>;

    /// Create a tree from `entries` layered on `base_tree`.
    ///
    /// `base_tree` may name a tree or a commit; a commit resolves to its tree.
    async fn create_tree(
        &self,
        repo: &RepositoryRef,
        entries: &[TreeEntry],
        base_tree: Option<&Oid>,
    ) -> Result<Tree, ForgeError>;

    /// Create a commit object.
    async fn create_commit(
        &self,
        repo: &RepositoryRef,
        request: CreateCommitRequest,
    ) -> Result<Commit, ForgeError>;
}

/// The full remote surface exposed as tools.
#[async_trait]
pub trait Forge: GitData {
    /// Fork a repository, optionally into an organization.
    async fn fork_repository(
        &self,
        repo: &RepositoryRef,
        organization: Option<&str>,
    ) -> Result<Repository, ForgeError>;

    /// Create a repository owned by the authenticated user.
    async fn create_repository(
        &self,
        request: CreateRepositoryRequest,
    ) -> Result<Repository, ForgeError>;

    /// List one page of commits.
    async fn list_commits(
        &self,
        repo: &RepositoryRef,
        opts: ListCommitsOpts,
    ) -> Result<Vec<CommitSummary>, ForgeError>;

    /// Open an issue.
    async fn create_issue(
        &self,
        repo: &RepositoryRef,
        request: CreateIssueRequest,
    ) -> Result<Issue, ForgeError>;

    /// Get an issue by number.
    async fn get_issue(&self, repo: &RepositoryRef, number: u64) -> Result<Issue, ForgeError>;

    /// List one page of issues.
    async fn list_issues(
        &self,
        repo: &RepositoryRef,
        opts: ListIssuesOpts,
    ) -> Result<Vec<Issue>, ForgeError>;

    /// Update fields of an existing issue.
    async fn update_issue(
        &self,
        repo: &RepositoryRef,
        request: UpdateIssueRequest,
    ) -> Result<Issue, ForgeError>;

    /// Comment on an issue or pull request.
    async fn add_issue_comment(
        &self,
        repo: &RepositoryRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, ForgeError>;

    /// Open a pull request.
    async fn create_pull_request(
        &self,
        repo: &RepositoryRef,
        request: CreatePrRequest,
    ) -> Result<PullRequest, ForgeError>;

    /// Get a pull request by number.
    async fn get_pull_request(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<PullRequest, ForgeError>;

    /// Create a gist owned by the authenticated user.
    async fn create_gist(&self, request: CreateGistRequest) -> Result<Gist, ForgeError>;

    /// Run one of the search endpoints and return one page of results.
    async fn search(
        &self,
        kind: SearchKind,
        query: SearchQuery,
    ) -> Result<SearchResults, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_error_display() {
        assert_eq!(
            format!("{}", ForgeError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", ForgeError::AuthFailed("expired token".into())),
            "authentication failed: expired token"
        );
        assert_eq!(
            format!("{}", ForgeError::NotFound("heads/main".into())),
            "not found: heads/main"
        );
        assert_eq!(
            format!("{}", ForgeError::Conflict("Update is not a fast forward".into())),
            "conflict: Update is not a fast forward"
        );
        assert_eq!(format!("{}", ForgeError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                ForgeError::RemoteError {
                    status: 500,
                    message: "boom".into()
                }
            ),
            "remote error: 500 - boom"
        );
        assert_eq!(
            format!("{}", ForgeError::NetworkError("connection refused".into())),
            "network error: connection refused"
        );
        assert_eq!(
            format!("{}", ForgeError::Configuration("bad base".into())),
            "invalid configuration: bad base"
        );
    }

    #[test]
    fn classification_helpers() {
        assert!(ForgeError::NotFound("x".into()).is_not_found());
        assert!(!ForgeError::NotFound("x".into()).is_conflict());
        assert!(ForgeError::Conflict("x".into()).is_conflict());
        assert!(!ForgeError::RateLimited.is_not_found());
    }
}
