//! ops::refs
//!
//! Branch reference resolution and movement.
//!
//! # Default Branch
//!
//! There is no lookup of the repository's configured default branch. The
//! resolver tries `main`, then `master`, and only a `NotFound` on the first
//! moves on to the second; any other failure is returned as is.

use tracing::{debug, info};

use super::OpError;
use crate::core::types::{BranchName, Oid, Reference, RepositoryRef};
use crate::forge::GitData;

/// First default-branch candidate.
pub const PRIMARY_BRANCH: &str = "main";

/// Second default-branch candidate.
pub const FALLBACK_BRANCH: &str = "master";

/// Resolve the tip commit of the repository's default branch.
///
/// # Errors
///
/// - `ReferenceNotFound` if neither candidate branch exists
/// - `Forge` for any failure other than `NotFound`
pub async fn resolve_default_branch_tip(
    forge: &dyn GitData,
    repo: &RepositoryRef,
) -> Result<Oid, OpError> {
    let mut tried = Vec::new();

    for name in [PRIMARY_BRANCH, FALLBACK_BRANCH] {
        let branch = BranchName::new(name)?;
        match forge.get_branch_ref(repo, &branch).await {
            Ok(reference) => {
                debug!(%repo, branch = name, sha = %reference.target_sha, "resolved default branch");
                return Ok(reference.target_sha);
            }
            Err(e) if e.is_not_found() => {
                debug!(%repo, branch = name, "default branch candidate missing");
                tried.push(branch.ref_path());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(OpError::ReferenceNotFound { tried })
}

/// Tip commit of a named branch.
///
/// # Errors
///
/// `BranchNotFound` if the branch does not exist.
pub async fn branch_tip(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    branch: &BranchName,
) -> Result<Oid, OpError> {
    match forge.get_branch_ref(repo, branch).await {
        Ok(reference) => Ok(reference.target_sha),
        Err(e) if e.is_not_found() => Err(OpError::BranchNotFound(branch.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Create `branch` at the tip of `from_branch`, or of the default branch.
///
/// # Errors
///
/// - `BranchNotFound` if `from_branch` is given and missing
/// - `ReferenceNotFound` if the default branch cannot be resolved
/// - `Forge` if the remote rejects the new ref (e.g. it already exists)
pub async fn create_branch(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    branch: &BranchName,
    from_branch: Option<&BranchName>,
) -> Result<Reference, OpError> {
    let sha = match from_branch {
        Some(source) => branch_tip(forge, repo, source).await?,
        None => resolve_default_branch_tip(forge, repo).await?,
    };

    let reference = forge.create_branch_ref(repo, branch, &sha).await?;
    info!(%repo, %branch, sha = sha.short(7), "created branch");
    Ok(reference)
}

/// Move `branch` to `sha`.
///
/// With `force = false` the remote only accepts a fast-forward; anything
/// else comes back as `Forge(Conflict)` and the branch is unchanged.
pub async fn update_ref(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    branch: &BranchName,
    sha: &Oid,
    force: bool,
) -> Result<Reference, OpError> {
    let reference = forge.update_branch_ref(repo, branch, sha, force).await?;
    debug!(%repo, %branch, sha = sha.short(7), force, "updated ref");
    Ok(reference)
}
