//! tools::catalog
//!
//! Tool descriptions and input schemas.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::ToolName;

/// One entry of the tool listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Describe every tool, in [`ToolName::ALL`] order.
pub fn list_tools() -> Vec<ToolDescriptor> {
    ToolName::ALL.into_iter().map(describe).collect()
}

/// Describe one tool.
pub fn describe(tool: ToolName) -> ToolDescriptor {
    let (description, properties, required): (&'static str, Value, Vec<&str>) = match tool {
        ToolName::CreateOrUpdateFile => (
            "Create or update a single file in a repository",
            with_repo(json!({
                "path": string("Path where to create/update the file"),
                "content": string("Content of the file"),
                "message": string("Commit message"),
                "branch": string("Branch to create/update the file in"),
                "sha": string("SHA of the file being replaced (required when updating)"),
            })),
            vec!["owner", "repo", "path", "content", "message", "branch"],
        ),
        ToolName::GetFileContents => (
            "Get the contents of a file or directory from a repository",
            with_repo(json!({
                "path": string("Path to the file or directory"),
                "branch": string("Branch, tag or commit to read from"),
            })),
            vec!["owner", "repo", "path"],
        ),
        ToolName::PushFiles => (
            "Push multiple files to a repository in a single commit",
            with_repo(json!({
                "branch": string("Branch to push to, e.g. 'main'"),
                "files": {
                    "type": "array",
                    "description": "Files to push",
                    "items": {
                        "type": "object",
                        "properties": {
                            "path": string("Repository-relative path"),
                            "content": string("File content"),
                        },
                        "required": ["path", "content"],
                        "additionalProperties": false,
                    },
                },
                "message": string("Commit message"),
            })),
            vec!["owner", "repo", "branch", "files", "message"],
        ),
        ToolName::CreateBranch => (
            "Create a new branch in a repository",
            with_repo(json!({
                "branch": string("Name for the new branch"),
                "from_branch": string("Source branch (defaults to the repository default branch)"),
            })),
            vec!["owner", "repo", "branch"],
        ),
        ToolName::ForkRepository => (
            "Fork a repository to your account or an organization",
            with_repo(json!({
                "organization": string("Organization to fork to (defaults to your account)"),
            })),
            vec!["owner", "repo"],
        ),
        ToolName::CreateRepository => (
            "Create a new repository in your account",
            json!({
                "name": string("Repository name"),
                "description": string("Repository description"),
                "private": boolean("Whether the repository should be private"),
                "auto_init": boolean("Initialize with a README"),
            }),
            vec!["name"],
        ),
        ToolName::ListCommits => (
            "List one page of commits on a branch",
            with_repo(with_paging(json!({
                "sha": string("Branch name or commit SHA to list from"),
            }))),
            vec!["owner", "repo"],
        ),
        ToolName::CreateIssue => (
            "Create a new issue in a repository",
            with_repo(json!({
                "title": string("Issue title"),
                "body": string("Issue body"),
                "assignees": string_array("Logins to assign"),
                "labels": string_array("Labels to apply"),
                "milestone": integer("Milestone number"),
            })),
            vec!["owner", "repo", "title"],
        ),
        ToolName::GetIssue => (
            "Get the details of an issue",
            with_repo(json!({
                "issue_number": integer("Issue number"),
            })),
            vec!["owner", "repo", "issue_number"],
        ),
        ToolName::ListIssues => (
            "List one page of issues with optional filters",
            with_repo(with_paging(json!({
                "state": enumeration(&["open", "closed", "all"], "Issue state filter"),
                "labels": string_array("Only issues with all of these labels"),
                "sort": enumeration(&["created", "updated", "comments"], "Sort field"),
                "direction": enumeration(&["asc", "desc"], "Sort direction"),
                "since": string("Only issues updated at or after this ISO 8601 timestamp"),
            }))),
            vec!["owner", "repo"],
        ),
        ToolName::UpdateIssue => (
            "Update an existing issue",
            with_repo(json!({
                "issue_number": integer("Issue number"),
                "title": string("New title"),
                "body": string("New body"),
                "state": enumeration(&["open", "closed"], "New state"),
                "labels": string_array("Replacement labels"),
                "assignees": string_array("Replacement assignees"),
                "milestone": integer("Milestone number"),
            })),
            vec!["owner", "repo", "issue_number"],
        ),
        ToolName::AddIssueComment => (
            "Add a comment to an issue or pull request",
            with_repo(json!({
                "issue_number": integer("Issue or pull request number"),
                "body": string("Comment text"),
            })),
            vec!["owner", "repo", "issue_number", "body"],
        ),
        ToolName::CreatePullRequest => (
            "Create a new pull request",
            with_repo(json!({
                "title": string("Pull request title"),
                "body": string("Pull request body"),
                "head": string("Branch containing the changes"),
                "base": string("Branch to merge into"),
                "draft": boolean("Open as a draft"),
                "maintainer_can_modify": boolean("Allow maintainers to edit"),
            })),
            vec!["owner", "repo", "title", "head", "base"],
        ),
        ToolName::GetPullRequest => (
            "Get the details of a pull request",
            with_repo(json!({
                "pull_number": integer("Pull request number"),
            })),
            vec!["owner", "repo", "pull_number"],
        ),
        ToolName::CreateGist => (
            "Create a gist",
            json!({
                "description": string("Gist description"),
                "public": boolean("Whether the gist is public"),
                "files": {
                    "type": "object",
                    "description": "File name to file content",
                    "additionalProperties": { "type": "string" },
                },
            }),
            vec!["files"],
        ),
        ToolName::SearchRepositories => (
            "Search for repositories",
            search_properties(),
            vec!["query"],
        ),
        ToolName::SearchCode => ("Search for code across repositories", search_properties(), vec!["query"]),
        ToolName::SearchIssues => (
            "Search for issues and pull requests",
            search_properties(),
            vec!["query"],
        ),
        ToolName::SearchUsers => ("Search for users", search_properties(), vec!["query"]),
    };

    ToolDescriptor {
        name: tool.as_str(),
        description,
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        }),
    }
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn integer(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 1, "description": description })
}

fn boolean(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

fn string_array(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn enumeration(values: &[&str], description: &str) -> Value {
    json!({ "type": "string", "enum": values, "description": description })
}

fn extend(base: Value, extra: Value) -> Value {
    let mut merged = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Value::Object(extra) = extra {
        merged.extend(extra);
    }
    Value::Object(merged)
}

fn with_repo(properties: Value) -> Value {
    extend(
        json!({
            "owner": string("Repository owner (user or organization)"),
            "repo": string("Repository name"),
        }),
        properties,
    )
}

fn with_paging(properties: Value) -> Value {
    extend(
        properties,
        json!({
            "page": integer("Page number"),
            "per_page": json!({
                "type": "integer",
                "minimum": 1,
                "maximum": crate::forge::models::MAX_PER_PAGE,
                "description": "Results per page",
            }),
        }),
    )
}

fn search_properties() -> Value {
    with_paging(json!({
        "query": string("Search query using the remote's search syntax"),
        "sort": string("Sort field"),
        "order": enumeration(&["asc", "desc"], "Sort order"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_tool_listed_once() {
        let tools = list_tools();
        assert_eq!(tools.len(), ToolName::ALL.len());

        let names: HashSet<_> = tools.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn required_fields_are_declared_properties() {
        for tool in list_tools() {
            let schema = &tool.input_schema;
            let properties = schema["properties"].as_object().unwrap();
            for required in schema["required"].as_array().unwrap() {
                let field = required.as_str().unwrap();
                assert!(
                    properties.contains_key(field),
                    "{} requires undeclared field {}",
                    tool.name,
                    field
                );
            }
            assert_eq!(schema["additionalProperties"], json!(false));
        }
    }

    #[test]
    fn repository_tools_take_owner_and_repo() {
        let push = describe(ToolName::PushFiles);
        let properties = push.input_schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("owner"));
        assert!(properties.contains_key("repo"));
        assert!(properties.contains_key("files"));
    }

    #[test]
    fn descriptor_serializes_input_schema_key() {
        let json = serde_json::to_value(describe(ToolName::SearchUsers)).unwrap();
        assert_eq!(json["name"], "search_users");
        assert!(json.get("inputSchema").is_some());
        assert_eq!(json["inputSchema"]["properties"]["per_page"]["maximum"], 100);
    }
}
