//! tools::call
//!
//! Tool names and typed arguments.
//!
//! A [`ToolCall`] is built from a name and a JSON argument object by
//! [`ToolCall::parse`]. Argument structs reject unknown fields, so a typo in
//! a field name is an `InvalidArguments` error rather than a silently
//! ignored option.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::ToolError;
use crate::core::types::{BranchName, FileChange, Oid};
use crate::forge::models::{
    CreateRepositoryRequest, IssueState, IssueStateFilter, SearchKind, SortDirection,
};

/// Every tool, by stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateOrUpdateFile,
    GetFileContents,
    PushFiles,
    CreateBranch,
    ForkRepository,
    CreateRepository,
    ListCommits,
    CreateIssue,
    GetIssue,
    ListIssues,
    UpdateIssue,
    AddIssueComment,
    CreatePullRequest,
    GetPullRequest,
    CreateGist,
    SearchRepositories,
    SearchCode,
    SearchIssues,
    SearchUsers,
}

impl ToolName {
    /// All tools, in catalog order.
    pub const ALL: [ToolName; 19] = [
        ToolName::CreateOrUpdateFile,
        ToolName::GetFileContents,
        ToolName::PushFiles,
        ToolName::CreateBranch,
        ToolName::ForkRepository,
        ToolName::CreateRepository,
        ToolName::ListCommits,
        ToolName::CreateIssue,
        ToolName::GetIssue,
        ToolName::ListIssues,
        ToolName::UpdateIssue,
        ToolName::AddIssueComment,
        ToolName::CreatePullRequest,
        ToolName::GetPullRequest,
        ToolName::CreateGist,
        ToolName::SearchRepositories,
        ToolName::SearchCode,
        ToolName::SearchIssues,
        ToolName::SearchUsers,
    ];

    /// The wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateOrUpdateFile => "create_or_update_file",
            ToolName::GetFileContents => "get_file_contents",
            ToolName::PushFiles => "push_files",
            ToolName::CreateBranch => "create_branch",
            ToolName::ForkRepository => "fork_repository",
            ToolName::CreateRepository => "create_repository",
            ToolName::ListCommits => "list_commits",
            ToolName::CreateIssue => "create_issue",
            ToolName::GetIssue => "get_issue",
            ToolName::ListIssues => "list_issues",
            ToolName::UpdateIssue => "update_issue",
            ToolName::AddIssueComment => "add_issue_comment",
            ToolName::CreatePullRequest => "create_pull_request",
            ToolName::GetPullRequest => "get_pull_request",
            ToolName::CreateGist => "create_gist",
            ToolName::SearchRepositories => "search_repositories",
            ToolName::SearchCode => "search_code",
            ToolName::SearchIssues => "search_issues",
            ToolName::SearchUsers => "search_users",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// Arguments for `create_or_update_file`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrUpdateFileArgs {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub content: String,
    pub message: String,
    pub branch: BranchName,
    /// Blob sha of the file being replaced
    #[serde(default)]
    pub sha: Option<Oid>,
}

/// Arguments for `get_file_contents`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetFileContentsArgs {
    pub owner: String,
    pub repo: String,
    pub path: String,
    /// Branch, tag or commit sha
    #[serde(default)]
    pub branch: Option<String>,
}

/// Arguments for `push_files`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushFilesArgs {
    pub owner: String,
    pub repo: String,
    pub branch: BranchName,
    pub files: Vec<FileChange>,
    pub message: String,
}

/// Arguments for `create_branch`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBranchArgs {
    pub owner: String,
    pub repo: String,
    pub branch: BranchName,
    /// Source branch; the default branch when absent
    #[serde(default)]
    pub from_branch: Option<BranchName>,
}

/// Arguments for `fork_repository`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForkRepositoryArgs {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub organization: Option<String>,
}

/// Arguments for `list_commits`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListCommitsArgs {
    pub owner: String,
    pub repo: String,
    /// Branch name or commit sha to start listing from
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// Arguments for `create_issue`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateIssueArgs {
    pub owner: String,
    pub repo: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub milestone: Option<u64>,
}

/// Arguments for `get_issue`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetIssueArgs {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
}

/// Arguments for `list_issues`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListIssuesArgs {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub state: Option<IssueStateFilter>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub direction: Option<SortDirection>,
    #[serde(default)]
    pub since: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// Arguments for `update_issue`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateIssueArgs {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: Option<IssueState>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub assignees: Option<Vec<String>>,
    #[serde(default)]
    pub milestone: Option<u64>,
}

/// Arguments for `add_issue_comment`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddIssueCommentArgs {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
    pub body: String,
}

/// Arguments for `create_pull_request`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePullRequestArgs {
    pub owner: String,
    pub repo: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Branch holding the changes (`user:branch` for cross-repository)
    pub head: String,
    /// Branch to merge into
    pub base: String,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub maintainer_can_modify: Option<bool>,
}

/// Arguments for `get_pull_request`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetPullRequestArgs {
    pub owner: String,
    pub repo: String,
    pub pull_number: u64,
}

/// Arguments for `create_gist`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGistArgs {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
    /// File name to content
    pub files: BTreeMap<String, String>,
}

/// Arguments shared by the four search tools.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<SortDirection>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    CreateOrUpdateFile(CreateOrUpdateFileArgs),
    GetFileContents(GetFileContentsArgs),
    PushFiles(PushFilesArgs),
    CreateBranch(CreateBranchArgs),
    ForkRepository(ForkRepositoryArgs),
    CreateRepository(CreateRepositoryRequest),
    ListCommits(ListCommitsArgs),
    CreateIssue(CreateIssueArgs),
    GetIssue(GetIssueArgs),
    ListIssues(ListIssuesArgs),
    UpdateIssue(UpdateIssueArgs),
    AddIssueComment(AddIssueCommentArgs),
    CreatePullRequest(CreatePullRequestArgs),
    GetPullRequest(GetPullRequestArgs),
    CreateGist(CreateGistArgs),
    Search(SearchKind, SearchArgs),
}

fn args<T: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T, ToolError> {
    // A missing argument object is treated as empty.
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool,
        message: e.to_string(),
    })
}

impl ToolCall {
    /// Build a call from a tool name and its JSON arguments.
    ///
    /// # Errors
    ///
    /// - `UnknownTool` if `name` is not in [`ToolName::ALL`]
    /// - `InvalidArguments` if `arguments` does not match the tool's schema
    pub fn parse(name: &str, arguments: Value) -> Result<Self, ToolError> {
        let tool: ToolName = name.parse()?;
        Ok(match tool {
            ToolName::CreateOrUpdateFile => ToolCall::CreateOrUpdateFile(args(tool, arguments)?),
            ToolName::GetFileContents => ToolCall::GetFileContents(args(tool, arguments)?),
            ToolName::PushFiles => ToolCall::PushFiles(args(tool, arguments)?),
            ToolName::CreateBranch => ToolCall::CreateBranch(args(tool, arguments)?),
            ToolName::ForkRepository => ToolCall::ForkRepository(args(tool, arguments)?),
            ToolName::CreateRepository => ToolCall::CreateRepository(args(tool, arguments)?),
            ToolName::ListCommits => ToolCall::ListCommits(args(tool, arguments)?),
            ToolName::CreateIssue => ToolCall::CreateIssue(args(tool, arguments)?),
            ToolName::GetIssue => ToolCall::GetIssue(args(tool, arguments)?),
            ToolName::ListIssues => ToolCall::ListIssues(args(tool, arguments)?),
            ToolName::UpdateIssue => ToolCall::UpdateIssue(args(tool, arguments)?),
            ToolName::AddIssueComment => ToolCall::AddIssueComment(args(tool, arguments)?),
            ToolName::CreatePullRequest => ToolCall::CreatePullRequest(args(tool, arguments)?),
            ToolName::GetPullRequest => ToolCall::GetPullRequest(args(tool, arguments)?),
            ToolName::CreateGist => ToolCall::CreateGist(args(tool, arguments)?),
            ToolName::SearchRepositories => {
                ToolCall::Search(SearchKind::Repositories, args(tool, arguments)?)
            }
            ToolName::SearchCode => ToolCall::Search(SearchKind::Code, args(tool, arguments)?),
            ToolName::SearchIssues => ToolCall::Search(SearchKind::Issues, args(tool, arguments)?),
            ToolName::SearchUsers => ToolCall::Search(SearchKind::Users, args(tool, arguments)?),
        })
    }

    /// The tool this call invokes.
    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::CreateOrUpdateFile(_) => ToolName::CreateOrUpdateFile,
            ToolCall::GetFileContents(_) => ToolName::GetFileContents,
            ToolCall::PushFiles(_) => ToolName::PushFiles,
            ToolCall::CreateBranch(_) => ToolName::CreateBranch,
            ToolCall::ForkRepository(_) => ToolName::ForkRepository,
            ToolCall::CreateRepository(_) => ToolName::CreateRepository,
            ToolCall::ListCommits(_) => ToolName::ListCommits,
            ToolCall::CreateIssue(_) => ToolName::CreateIssue,
            ToolCall::GetIssue(_) => ToolName::GetIssue,
            ToolCall::ListIssues(_) => ToolName::ListIssues,
            ToolCall::UpdateIssue(_) => ToolName::UpdateIssue,
            ToolCall::AddIssueComment(_) => ToolName::AddIssueComment,
            ToolCall::CreatePullRequest(_) => ToolName::CreatePullRequest,
            ToolCall::GetPullRequest(_) => ToolName::GetPullRequest,
            ToolCall::CreateGist(_) => ToolName::CreateGist,
            ToolCall::Search(SearchKind::Repositories, _) => ToolName::SearchRepositories,
            ToolCall::Search(SearchKind::Code, _) => ToolName::SearchCode,
            ToolCall::Search(SearchKind::Issues, _) => ToolName::SearchIssues,
            ToolCall::Search(SearchKind::Users, _) => ToolName::SearchUsers,
        }
    }
}
