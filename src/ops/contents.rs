//! ops::contents
//!
//! Reading repository paths and single-file conditional writes.
//!
//! # Conditional Writes
//!
//! Overwriting an existing file requires its current blob sha. When the
//! caller does not supply one, [`write_file`] looks the path up on the target
//! branch first:
//!
//! | Lookup result | Sha sent |
//! |--------------|----------|
//! | file | the file's blob sha |
//! | directory | none |
//! | `NotFound` | none (the write creates the file) |
//! | any other error | the write is abandoned |
//!
//! A sha that no longer matches the branch is rejected by the remote as
//! `Conflict`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::OpError;
use crate::core::types::{validate_path, BranchName, Contents, Oid, RepositoryRef, WriteResult};
use crate::forge::{GitData, PutContentsRequest};

/// Fetch a file or directory listing.
///
/// A leading `/` on `path` is ignored and an empty path lists the root.
/// `git_ref` may be a branch, tag or commit sha; `None` reads the remote's
/// default branch.
pub async fn get_contents(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    path: &str,
    git_ref: Option<&str>,
) -> Result<Contents, OpError> {
    let path = path.trim_start_matches('/');
    let contents = forge.get_contents(repo, path, git_ref).await?;
    debug!(%repo, path, directory = contents.is_directory(), "fetched contents");
    Ok(contents)
}

/// A single-file create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFileRequest {
    pub path: String,
    pub content: String,
    pub message: String,
    pub branch: BranchName,
    /// Blob sha of the version being replaced; looked up when absent
    #[serde(default)]
    pub sha: Option<Oid>,
}

/// Create or overwrite one file on a branch as one commit.
///
/// A leading `/` on the path is ignored, as in [`get_contents`].
///
/// # Errors
///
/// - `InvalidInput` for a malformed path or empty message
/// - `Forge(Conflict)` if the sha is stale or missing for an existing file
/// - `Forge(..)` for a failed sha lookup other than `NotFound`
pub async fn write_file(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    request: WriteFileRequest,
) -> Result<WriteResult, OpError> {
    let path = request.path.trim_start_matches('/').to_string();
    validate_path(&path)?;
    if request.message.trim().is_empty() {
        return Err(OpError::InvalidInput(
            "commit message cannot be empty".to_string(),
        ));
    }

    let sha = match request.sha {
        Some(sha) => Some(sha),
        None => current_sha(forge, repo, &path, &request.branch).await?,
    };

    let branch = request.branch.clone();
    let result = forge
        .put_contents(
            repo,
            PutContentsRequest {
                path: path.clone(),
                content: request.content,
                message: request.message,
                branch: request.branch,
                sha,
            },
        )
        .await?;

    info!(%repo, %branch, path = %path, commit = result.commit.sha.short(7), "wrote file");
    Ok(result)
}

/// Current blob sha of `path` on `branch`, if it is a file.
async fn current_sha(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    path: &str,
    branch: &BranchName,
) -> Result<Option<Oid>, OpError> {
    match forge.get_contents(repo, path, Some(branch.as_str())).await {
        Ok(Contents::File(file)) => Ok(Some(file.sha)),
        Ok(Contents::Directory(_)) => {
            warn!(%repo, %branch, path, "path is a directory; writing without a sha");
            Ok(None)
        }
        Err(e) if e.is_not_found() => {
            debug!(%repo, %branch, path, "path does not exist; creating");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ContentKind;
    use crate::forge::mock::{FailOn, MockForge, MockOperation};
    use crate::forge::ForgeError;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("octo", "demo").unwrap()
    }

    fn request(path: &str, content: &str, sha: Option<Oid>) -> WriteFileRequest {
        WriteFileRequest {
            path: path.to_string(),
            content: content.to_string(),
            message: format!("write {}", path),
            branch: BranchName::new("main").unwrap(),
            sha,
        }
    }

    #[tokio::test]
    async fn leading_slash_ignored() {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[("docs/a.md", "# A")]);

        let contents = get_contents(&forge, &repo(), "/docs/a.md", None).await.unwrap();
        let file = contents.as_file().unwrap();
        assert_eq!(file.kind, ContentKind::File);
        assert_eq!(file.content.as_deref(), Some("# A"));
    }

    #[tokio::test]
    async fn empty_path_lists_root() {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[("b.txt", "b"), ("a/x.txt", "x")]);

        let contents = get_contents(&forge, &repo(), "", None).await.unwrap();
        let Contents::Directory(entries) = contents else {
            panic!("expected directory");
        };
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b.txt"]);
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[("a", "1")]);

        let err = get_contents(&forge, &repo(), "missing", None).await.unwrap_err();
        assert!(matches!(err, OpError::Forge(ForgeError::NotFound(_))));
    }

    #[tokio::test]
    async fn create_then_update_without_sha() {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[]);

        write_file(&forge, &repo(), request("notes.txt", "v1", None))
            .await
            .unwrap();
        write_file(&forge, &repo(), request("notes.txt", "v2", None))
            .await
            .unwrap();

        assert_eq!(
            forge.file_at(&repo(), "main", "notes.txt").as_deref(),
            Some("v2")
        );
    }

    #[tokio::test]
    async fn explicit_sha_skips_lookup() {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[("a.txt", "old")]);
        let current = get_contents(&forge, &repo(), "a.txt", Some("main"))
            .await
            .unwrap()
            .as_file()
            .unwrap()
            .sha
            .clone();
        forge.clear_operations();

        write_file(&forge, &repo(), request("a.txt", "new", Some(current)))
            .await
            .unwrap();
        assert!(matches!(
            forge.operations().as_slice(),
            [MockOperation::PutContents { .. }]
        ));
    }

    #[tokio::test]
    async fn lookup_failure_is_not_swallowed() {
        let forge = MockForge::new().fail_on(FailOn::GetContents(ForgeError::RemoteError {
            status: 500,
            message: "boom".into(),
        }));
        forge.seed_branch(&repo(), "main", &[]);

        let err = write_file(&forge, &repo(), request("a.txt", "x", None))
            .await
            .unwrap_err();
        assert!(matches!(err, OpError::Forge(ForgeError::RemoteError { .. })));
        assert_eq!(forge.file_at(&repo(), "main", "a.txt"), None);
    }

    #[tokio::test]
    async fn write_ignores_leading_slash() {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[("docs/a.md", "old")]);

        write_file(&forge, &repo(), request("/docs/a.md", "new", None))
            .await
            .unwrap();

        assert_eq!(
            forge.file_at(&repo(), "main", "docs/a.md").as_deref(),
            Some("new")
        );
        let put_paths: Vec<_> = forge
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::PutContents { path, .. } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(put_paths, vec!["docs/a.md".to_string()]);
    }

    #[tokio::test]
    async fn invalid_input_makes_no_remote_call() {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[]);

        let err = write_file(&forge, &repo(), request("../etc/passwd", "x", None))
            .await
            .unwrap_err();
        assert!(matches!(err, OpError::InvalidInput(_)));

        let mut empty_message = request("a.txt", "x", None);
        empty_message.message = "  ".into();
        let err = write_file(&forge, &repo(), empty_message).await.unwrap_err();
        assert!(matches!(err, OpError::InvalidInput(_)));

        assert!(forge.operations().is_empty());
    }
}
