//! serve command - answer JSON-line tool calls.
//!
//! Input, one object per line:
//!
//! ```json
//! {"id": 1, "name": "get_issue", "arguments": {"owner": "o", "repo": "r", "issue_number": 3}}
//! ```
//!
//! Output, one object per call: `{"id": 1, "result": ...}` or
//! `{"id": 1, "error": {"kind": "not_found", "message": "..."}}`.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::forge::Forge;
use crate::tools::{dispatch, ToolCall, ToolError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServeRequest {
    #[serde(default)]
    id: Option<Value>,
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Read calls from `input` until end of input, writing one response line
/// per non-blank input line to `output`.
pub async fn serve<R, W>(forge: &dyn Forge, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(forge, &line).await;
        output.write_all(response.to_string().as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    debug!("end of input");
    Ok(())
}

/// Answer one input line.
pub async fn handle_line(forge: &dyn Forge, line: &str) -> Value {
    let request: ServeRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "malformed request line");
            return json!({
                "id": Value::Null,
                "error": { "kind": "invalid_request", "message": e.to_string() },
            });
        }
    };

    let outcome = match ToolCall::parse(&request.name, request.arguments) {
        Ok(call) => dispatch(forge, call).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => json!({ "id": request.id, "result": result }),
        Err(e) => {
            warn!(tool = %request.name, kind = e.kind(), error = %e, "tool call failed");
            error_response(request.id, &e)
        }
    }
}

fn error_response(id: Option<Value>, err: &ToolError) -> Value {
    json!({
        "id": id,
        "error": { "kind": err.kind(), "message": err.to_string() },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::github::GitHubForge;

    fn offline_forge() -> GitHubForge {
        GitHubForge::with_api_base("ghp_test", "http://127.0.0.1:9").unwrap()
    }

    #[tokio::test]
    async fn malformed_line() {
        let response = handle_line(&offline_forge(), "{oops").await;
        assert_eq!(response["error"]["kind"], "invalid_request");
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn unknown_tool_echoes_id() {
        let response = handle_line(&offline_forge(), r#"{"id": 7, "name": "nope"}"#).await;
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["kind"], "unknown_tool");
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn loop_continues_after_errors() {
        let input = b"{\"name\": \"nope\"}\n\n{bad\n{\"id\": \"x\", \"name\": \"get_issue\", \"arguments\": {}}\n";
        let mut output = Vec::new();
        serve(&offline_forge(), &input[..], &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["error"]["kind"], "unknown_tool");
        assert_eq!(lines[1]["error"]["kind"], "invalid_request");
        assert_eq!(lines[2]["id"], "x");
        assert_eq!(lines[2]["error"]["kind"], "invalid_arguments");
    }
}
