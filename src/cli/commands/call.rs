//! call command - invoke one tool.

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::forge::Forge;
use crate::tools::{dispatch, ToolCall};

/// Parse arguments (from `--args` or stdin), run the tool and print the
/// result.
pub async fn call(forge: &dyn Forge, name: &str, args: Option<String>) -> Result<()> {
    let arguments = read_arguments(args, tokio::io::stdin()).await?;
    let call = ToolCall::parse(name, arguments)?;
    let result = dispatch(forge, call).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Arguments from `--args` when given, otherwise everything on `input`.
async fn read_arguments<R>(args: Option<String>, mut input: R) -> Result<Value>
where
    R: AsyncRead + Unpin,
{
    let raw = match args {
        Some(raw) => raw,
        None => {
            let mut buf = String::new();
            input
                .read_to_string(&mut buf)
                .await
                .context("failed to read arguments from stdin")?;
            buf
        }
    };
    parse_arguments(&raw)
}

/// Blank input means "no arguments".
fn parse_arguments(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).context("arguments are not valid JSON")
}
