//! ops::objects
//!
//! Tree and commit construction.
//!
//! Both calls create immutable objects that nothing references yet; they
//! only become visible once a ref is moved to a commit.

use std::collections::BTreeSet;

use tracing::debug;

use super::OpError;
use crate::core::types::{Commit, FileChange, Oid, RepositoryRef, Tree, TreeEntry};
use crate::forge::{CreateCommitRequest, GitData};

/// Convert file changes into tree entries.
///
/// # Errors
///
/// `InvalidInput` on the first malformed path, on a path that appears
/// twice, or on a path that is also used as a directory by another entry
/// (`a` next to `a/b`).
pub fn tree_entries(files: &[FileChange]) -> Result<Vec<TreeEntry>, OpError> {
    let mut seen = BTreeSet::new();
    let entries = files
        .iter()
        .map(|change| {
            let entry = TreeEntry::from_change(change)?;
            if !seen.insert(change.path.as_str()) {
                return Err(OpError::InvalidInput(format!(
                    "duplicate path '{}'",
                    change.path
                )));
            }
            Ok(entry)
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Entries under `path/` sort first from `path/` onward.
    for path in &seen {
        let dir = format!("{}/", path);
        if let Some(child) = seen
            .range(dir.as_str()..)
            .next()
            .filter(|child| child.starts_with(&dir))
        {
            return Err(OpError::InvalidInput(format!(
                "path '{}' is both a file and the parent of '{}'",
                path, child
            )));
        }
    }

    Ok(entries)
}

/// Create a tree holding `files` layered on `base_tree`.
///
/// Every path is validated before the request is sent, so one bad path
/// creates nothing.
pub async fn build_tree(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    files: &[FileChange],
    base_tree: Option<&Oid>,
) -> Result<Tree, OpError> {
    let entries = tree_entries(files)?;
    let tree = forge.create_tree(repo, &entries, base_tree).await?;
    debug!(%repo, sha = %tree.sha, entries = entries.len(), "created tree");
    Ok(tree)
}

/// Create a commit of `tree` with the given parents.
pub async fn build_commit(
    forge: &dyn GitData,
    repo: &RepositoryRef,
    message: &str,
    tree: &Oid,
    parents: &[Oid],
) -> Result<Commit, OpError> {
    if message.trim().is_empty() {
        return Err(OpError::InvalidInput(
            "commit message cannot be empty".to_string(),
        ));
    }

    let commit = forge
        .create_commit(
            repo,
            CreateCommitRequest {
                message: message.to_string(),
                tree: tree.clone(),
                parents: parents.to_vec(),
            },
        )
        .await?;
    debug!(%repo, sha = %commit.sha, tree = %tree, "created commit");
    Ok(commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::MockForge;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("octo", "demo").unwrap()
    }

    #[test]
    fn entries_are_blobs() {
        let entries = tree_entries(&[FileChange::new("src/lib.rs", "fn main() {}")]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mode, "100644");
        assert_eq!(entries[0].kind, "blob");
    }

    #[test]
    fn duplicate_paths_rejected() {
        let err = tree_entries(&[FileChange::new("a", "1"), FileChange::new("a", "2")]).unwrap_err();
        assert!(err.to_string().contains("duplicate path 'a'"));
    }

    #[test]
    fn file_and_directory_clash_rejected() {
        let err = tree_entries(&[
            FileChange::new("docs/a.md", "1"),
            FileChange::new("docs", "2"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            OpError::InvalidInput("path 'docs' is both a file and the parent of 'docs/a.md'".into())
        );
    }

    #[test]
    fn shared_name_prefix_is_not_a_clash() {
        let entries = tree_entries(&[
            FileChange::new("docs", "1"),
            FileChange::new("docs-old/a.md", "2"),
            FileChange::new("docs.txt", "3"),
        ])
        .unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn invalid_path_creates_nothing() {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[]);
        let trees_before = forge.tree_count(&repo());

        let err = build_tree(
            &forge,
            &repo(),
            &[FileChange::new("ok.txt", "1"), FileChange::new("bad//path", "2")],
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OpError::InvalidInput(_)));
        assert_eq!(forge.tree_count(&repo()), trees_before);
        assert!(forge.operations().is_empty());
    }

    #[tokio::test]
    async fn commit_records_tree_and_parent() {
        let forge = MockForge::new();
        let tip = forge.seed_branch(&repo(), "main", &[("a", "1")]);
        let tree = build_tree(&forge, &repo(), &[FileChange::new("b", "2")], Some(&tip))
            .await
            .unwrap();

        let commit = build_commit(&forge, &repo(), "add b", &tree.sha, &[tip.clone()])
            .await
            .unwrap();
        assert_eq!(commit.tree_sha, tree.sha);
        assert_eq!(commit.parent_shas, vec![tip]);
        assert_eq!(commit.message, "add b");
    }

    #[tokio::test]
    async fn empty_message_rejected() {
        let forge = MockForge::new();
        let tip = forge.seed_branch(&repo(), "main", &[("a", "1")]);
        let tree = forge.commit(&repo(), &tip).unwrap().tree_sha;

        let err = build_commit(&forge, &repo(), "", &tree, &[tip]).await.unwrap_err();
        assert!(matches!(err, OpError::InvalidInput(_)));
    }
}
