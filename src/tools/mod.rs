//! tools
//!
//! The tool-call boundary: a closed set of named operations with declared
//! input schemas.
//!
//! # Flow
//!
//! 1. [`list_tools`] advertises every tool with its JSON schema
//! 2. [`ToolCall::parse`] turns a name and argument object into a typed call
//! 3. [`dispatch`] runs the call against a [`Forge`](crate::forge::Forge) and
//!    returns the result as JSON
//!
//! Every failure is returned to the caller as a [`ToolError`]; nothing here
//! terminates the process.

pub mod call;
pub mod catalog;
pub mod dispatch;

pub use call::{ToolCall, ToolName};
pub use catalog::{list_tools, ToolDescriptor};
pub use dispatch::dispatch;

use thiserror::Error;

use crate::forge::ForgeError;
use crate::ops::OpError;

/// Errors reported at the tool boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: ToolName, message: String },

    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    Forge(#[from] ForgeError),

    #[error("failed to encode result: {0}")]
    Encode(String),
}

impl ToolError {
    /// Short machine-readable classification of the error.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::InvalidArguments { .. } => "invalid_arguments",
            ToolError::Encode(_) => "encode",
            ToolError::Op(OpError::InvalidInput(_)) => "invalid_input",
            ToolError::Op(OpError::BranchNotFound(_)) => "branch_not_found",
            ToolError::Op(OpError::ReferenceNotFound { .. }) => "reference_not_found",
            ToolError::Op(OpError::Forge(e)) | ToolError::Forge(e) => forge_kind(e),
        }
    }
}

fn forge_kind(err: &ForgeError) -> &'static str {
    match err {
        ForgeError::AuthRequired => "auth_required",
        ForgeError::AuthFailed(_) => "auth_failed",
        ForgeError::NotFound(_) => "not_found",
        ForgeError::Conflict(_) => "conflict",
        ForgeError::RateLimited => "rate_limited",
        ForgeError::RemoteError { .. } => "remote_error",
        ForgeError::NetworkError(_) => "network_error",
        ForgeError::Configuration(_) => "configuration",
    }
}
