//! forge::models
//!
//! Request and response types for the non-Git parts of the remote surface.
//!
//! Response types are subsets of the GitHub REST shapes: they deserialize
//! straight from the API and serialize back out as tool results, so unknown
//! fields are ignored rather than rejected. Request types skip unset options
//! so the remote applies its own defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::Oid;

/// Largest page size the remote accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Clamp a requested page size into `1..=MAX_PER_PAGE`.
pub fn clamp_per_page(per_page: Option<u32>) -> Option<u32> {
    per_page.map(|n| n.clamp(1, MAX_PER_PAGE))
}

// --------------------------------------------------------------------------
// Shared shapes
// --------------------------------------------------------------------------

/// A user or organization account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

/// Issue label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// Issue or pull request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// State filter for listing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStateFilter {
    Open,
    Closed,
    All,
}

/// Sort direction for list and search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

// --------------------------------------------------------------------------
// Repositories
// --------------------------------------------------------------------------

/// A repository as returned by the create and fork endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Account,
    pub private: bool,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Request to create a repository for the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRepositoryRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,
}

// --------------------------------------------------------------------------
// Commits
// --------------------------------------------------------------------------

/// Author or committer identity embedded in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitActor {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Commit details nested in a commit listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    #[serde(default)]
    pub author: Option<GitActor>,
}

/// One entry of a commit listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: Oid,
    pub html_url: String,
    pub commit: CommitDetail,
    /// Linked account, absent when the author email is unknown to the remote
    #[serde(default)]
    pub author: Option<Account>,
}

/// Options for listing commits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListCommitsOpts {
    /// Branch name or commit sha to start listing from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

// --------------------------------------------------------------------------
// Issues
// --------------------------------------------------------------------------

/// An issue (pull requests also appear here on the remote side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<Account>,
    #[serde(default)]
    pub user: Option<Account>,
    #[serde(default)]
    pub comments: u64,
}

/// Request to open an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateIssueRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

/// Request to update an issue. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateIssueRequest {
    #[serde(skip)]
    pub number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

/// Options for listing issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListIssuesOpts {
    pub state: Option<IssueStateFilter>,
    pub labels: Vec<String>,
    /// `created`, `updated` or `comments`
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
    /// ISO 8601 timestamp; only issues updated at or after it
    pub since: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub body: String,
    pub html_url: String,
    #[serde(default)]
    pub user: Option<Account>,
}

// --------------------------------------------------------------------------
// Pull requests
// --------------------------------------------------------------------------

/// Head or base of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: Oid,
}

/// A pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub merged: bool,
    pub html_url: String,
    pub head: PullRequestRef,
    pub base: PullRequestRef,
    #[serde(default)]
    pub user: Option<Account>,
}

/// Request to open a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatePrRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Branch with the changes (`owner:branch` for cross-repository)
    pub head: String,
    /// Branch to merge into
    pub base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer_can_modify: Option<bool>,
}

// --------------------------------------------------------------------------
// Gists
// --------------------------------------------------------------------------

/// A file inside a gist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistFile {
    pub filename: String,
    #[serde(default)]
    pub raw_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A gist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub public: bool,
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
}

/// Content of one file in a gist creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GistFileContent {
    pub content: String,
}

/// Request to create a gist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateGistRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub public: bool,
    pub files: BTreeMap<String, GistFileContent>,
}

// --------------------------------------------------------------------------
// Search
// --------------------------------------------------------------------------

/// Which search endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Repositories,
    Code,
    Issues,
    Users,
}

impl SearchKind {
    /// Path segment under `search/`.
    pub fn path(&self) -> &'static str {
        match self {
            SearchKind::Repositories => "repositories",
            SearchKind::Code => "code",
            SearchKind::Issues => "issues",
            SearchKind::Users => "users",
        }
    }
}

impl std::fmt::Display for SearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A single-page search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    #[serde(rename = "q")]
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// One page of search results.
///
/// Items keep the remote's shape; each endpoint returns a different item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}
