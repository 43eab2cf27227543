//! ops
//!
//! Multi-step orchestration over the [`GitData`](crate::forge::GitData) seam.
//!
//! # Components
//!
//! - [`refs`]: default-branch resolution, branch creation, ref updates
//! - [`contents`]: reading paths and conditional single-file writes
//! - [`objects`]: tree and commit construction
//! - [`publish`]: atomic multi-file publish as one commit
//!
//! Every function takes an already-configured `&dyn GitData` and the target
//! repository. Nothing is cached and nothing is retried: each call maps to a
//! fixed sequence of remote requests and the first failure ends it.

pub mod contents;
pub mod objects;
pub mod publish;
pub mod refs;

pub use contents::{get_contents, write_file, WriteFileRequest};
pub use objects::{build_commit, build_tree};
pub use publish::{publish_batch, PublishOutcome, PublishRequest};
pub use refs::{
    branch_tip, create_branch, resolve_default_branch_tip, update_ref, FALLBACK_BRANCH,
    PRIMARY_BRANCH,
};

use thiserror::Error;

use crate::core::types::TypeError;
use crate::forge::ForgeError;

/// Errors from orchestration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpError {
    /// Rejected locally before any remote call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A named branch does not exist on the remote.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// None of the default-branch candidates exist.
    #[error("no default branch found (tried {})", .tried.join(", "))]
    ReferenceNotFound { tried: Vec<String> },

    #[error(transparent)]
    Forge(#[from] ForgeError),
}

impl From<TypeError> for OpError {
    fn from(err: TypeError) -> Self {
        OpError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            OpError::ReferenceNotFound {
                tried: vec!["heads/main".into(), "heads/master".into()]
            }
            .to_string(),
            "no default branch found (tried heads/main, heads/master)"
        );
        assert_eq!(
            OpError::BranchNotFound("feature".into()).to_string(),
            "branch not found: feature"
        );
        assert_eq!(
            OpError::from(ForgeError::RateLimited).to_string(),
            "rate limited"
        );
    }

    #[test]
    fn type_errors_are_invalid_input() {
        let err = crate::core::types::validate_path("../x").unwrap_err();
        assert!(matches!(OpError::from(err), OpError::InvalidInput(_)));
    }
}
