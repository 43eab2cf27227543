//! tools::dispatch
//!
//! Execution of parsed tool calls.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::call::ToolCall;
use super::{ToolError, ToolName};
use crate::core::types::RepositoryRef;
use crate::forge::models::{
    CreateGistRequest, CreateIssueRequest, CreatePrRequest, GistFileContent, ListCommitsOpts,
    ListIssuesOpts, SearchQuery, UpdateIssueRequest,
};
use crate::forge::Forge;
use crate::ops::{self, PublishRequest, WriteFileRequest};

fn repository(tool: ToolName, owner: &str, repo: &str) -> Result<RepositoryRef, ToolError> {
    RepositoryRef::new(owner, repo).map_err(|e| ToolError::InvalidArguments {
        tool,
        message: e.to_string(),
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Encode(e.to_string()))
}

/// Run a tool call and return its JSON result.
///
/// Repository-scoped calls validate `owner`/`repo` before any request.
/// File and branch tools go through [`crate::ops`]; the rest are single
/// requests on the forge.
pub async fn dispatch(forge: &dyn Forge, call: ToolCall) -> Result<Value, ToolError> {
    let tool = call.name();
    debug!(%tool, forge = forge.name(), "dispatching tool call");

    match call {
        ToolCall::CreateOrUpdateFile(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let request = WriteFileRequest {
                path: args.path,
                content: args.content,
                message: args.message,
                branch: args.branch,
                sha: args.sha,
            };
            encode(&ops::write_file(forge, &repo, request).await?)
        }
        ToolCall::GetFileContents(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let contents =
                ops::get_contents(forge, &repo, &args.path, args.branch.as_deref()).await?;
            encode(&contents)
        }
        ToolCall::PushFiles(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let request = PublishRequest {
                branch: args.branch,
                files: args.files,
                message: args.message,
            };
            encode(&ops::publish_batch(forge, &repo, &request).await?)
        }
        ToolCall::CreateBranch(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let reference =
                ops::create_branch(forge, &repo, &args.branch, args.from_branch.as_ref()).await?;
            encode(&reference)
        }
        ToolCall::ForkRepository(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            encode(
                &forge
                    .fork_repository(&repo, args.organization.as_deref())
                    .await?,
            )
        }
        ToolCall::CreateRepository(request) => encode(&forge.create_repository(request).await?),
        ToolCall::ListCommits(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let opts = ListCommitsOpts {
                sha: args.sha,
                page: args.page,
                per_page: args.per_page,
            };
            encode(&forge.list_commits(&repo, opts).await?)
        }
        ToolCall::CreateIssue(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let request = CreateIssueRequest {
                title: args.title,
                body: args.body,
                assignees: args.assignees,
                labels: args.labels,
                milestone: args.milestone,
            };
            encode(&forge.create_issue(&repo, request).await?)
        }
        ToolCall::GetIssue(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            encode(&forge.get_issue(&repo, args.issue_number).await?)
        }
        ToolCall::ListIssues(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let opts = ListIssuesOpts {
                state: args.state,
                labels: args.labels,
                sort: args.sort,
                direction: args.direction,
                since: args.since,
                page: args.page,
                per_page: args.per_page,
            };
            encode(&forge.list_issues(&repo, opts).await?)
        }
        ToolCall::UpdateIssue(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let request = UpdateIssueRequest {
                number: args.issue_number,
                title: args.title,
                body: args.body,
                state: args.state,
                labels: args.labels,
                assignees: args.assignees,
                milestone: args.milestone,
            };
            encode(&forge.update_issue(&repo, request).await?)
        }
        ToolCall::AddIssueComment(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            encode(
                &forge
                    .add_issue_comment(&repo, args.issue_number, &args.body)
                    .await?,
            )
        }
        ToolCall::CreatePullRequest(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            let request = CreatePrRequest {
                title: args.title,
                body: args.body,
                head: args.head,
                base: args.base,
                draft: args.draft,
                maintainer_can_modify: args.maintainer_can_modify,
            };
            encode(&forge.create_pull_request(&repo, request).await?)
        }
        ToolCall::GetPullRequest(args) => {
            let repo = repository(tool, &args.owner, &args.repo)?;
            encode(&forge.get_pull_request(&repo, args.pull_number).await?)
        }
        ToolCall::CreateGist(args) => {
            let request = CreateGistRequest {
                description: args.description,
                public: args.public,
                files: args
                    .files
                    .into_iter()
                    .map(|(name, content)| (name, GistFileContent { content }))
                    .collect(),
            };
            encode(&forge.create_gist(request).await?)
        }
        ToolCall::Search(kind, args) => {
            let query = SearchQuery {
                query: args.query,
                sort: args.sort,
                order: args.order,
                page: args.page,
                per_page: args.per_page,
            };
            encode(&forge.search(kind, query).await?)
        }
    }
}
