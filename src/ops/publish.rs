//! ops::publish
//!
//! Atomic multi-file publish as a single commit.
//!
//! # Sequence
//!
//! 1. read the branch tip
//! 2. create a tree of the changes layered on the tip
//! 3. create a commit of that tree with the tip as its only parent
//! 4. fast-forward the branch to the commit
//!
//! Steps 2 and 3 only create unreferenced objects, so the branch moves at
//! step 4 or not at all. If another writer moves the branch between steps 1
//! and 4 the update is not a fast-forward and fails with `Conflict`; the
//! caller re-runs the whole publish against the new tip if it wants to.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::objects::{build_commit, build_tree, tree_entries};
use super::refs::{branch_tip, update_ref};
use super::OpError;
use crate::core::types::{BranchName, Commit, FileChange, Reference, RepositoryRef, Tree};
use crate::forge::GitData;

/// A batch of file changes to publish as one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub branch: BranchName,
    pub files: Vec<FileChange>,
    pub message: String,
}

impl PublishRequest {
    /// Check the batch without touching the remote.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty file list, an empty message, a malformed
    /// path or a duplicate path.
    pub fn validate(&self) -> Result<(), OpError> {
        if self.files.is_empty() {
            return Err(OpError::InvalidInput(
                "at least one file is required".to_string(),
            ));
        }
        if self.message.trim().is_empty() {
            return Err(OpError::InvalidInput(
                "commit message cannot be empty".to_string(),
            ));
        }
        tree_entries(&self.files)?;
        Ok(())
    }
}

/// Everything a successful publish created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// The branch after the update
    pub reference: Reference,
    pub commit: Commit,
    pub tree: Tree,
}

/// Publish `request.files` to `request.branch` as one commit.
///
/// # Errors
///
/// - `InvalidInput` if the request fails [`PublishRequest::validate`]; no
///   remote call is made
/// - `BranchNotFound` if the branch does not exist
/// - `Forge(Conflict)` if the branch moved during the publish
/// - `Forge(..)` for any other remote failure
///
/// On any error after step 1 the branch is left where it was.
pub async fn publish_batch(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    request: &PublishRequest,
) -> Result<PublishOutcome, OpError> {
    request.validate()?;
    let branch = &request.branch;

    let base = branch_tip(forge, repo, branch).await?;
    let tree = build_tree(forge, repo, &request.files, Some(&base)).await?;

    let commit = build_commit(forge, repo, &request.message, &tree.sha, &[base.clone()])
        .await
        .inspect_err(|e| {
            warn!(%repo, %branch, tree = %tree.sha, error = %e, "commit failed; tree left unreferenced");
        })?;

    let reference = update_ref(forge, repo, branch, &commit.sha, false)
        .await
        .inspect_err(|e| {
            warn!(%repo, %branch, commit = %commit.sha, error = %e, "ref update failed; commit left unreferenced");
        })?;

    info!(
        %repo,
        %branch,
        files = request.files.len(),
        from = base.short(7),
        to = commit.sha.short(7),
        "published batch"
    );

    Ok(PublishOutcome {
        reference,
        commit,
        tree,
    })
}
