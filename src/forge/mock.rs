//! forge::mock
//!
//! Deterministic in-memory [`GitData`] implementation for testing.
//!
//! # Design
//!
//! The mock keeps a small content-addressed object store per repository:
//!
//! - blobs and trees are addressed by a digest of their content, so two
//!   identical trees share one sha
//! - commits fold in a sequence number, so two commits with identical tree,
//!   parents and message still get distinct shas (the remote uses the
//!   timestamp for the same purpose)
//! - branch refs are the only mutable state; a non-forced update must be a
//!   fast-forward or it fails with `Conflict`
//! - contents writes are conditional on the current blob sha
//!
//! Trees are stored flat (full path to blob sha); directories in contents
//! listings are derived from path prefixes.
//!
//! # Example
//!
//! ```
//! use hubkit::core::types::{BranchName, RepositoryRef};
//! use hubkit::forge::mock::MockForge;
//! use hubkit::forge::GitData;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new();
//! let repo = RepositoryRef::new("octocat", "hello-world").unwrap();
//! let tip = forge.seed_branch(&repo, "main", &[("README.md", "# Hello")]);
//!
//! let main = BranchName::new("main").unwrap();
//! let reference = forge.get_branch_ref(&repo, &main).await.unwrap();
//! assert_eq!(reference.target_sha, tip);
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::traits::{CreateCommitRequest, ForgeError, GitData, PutContentsRequest};
use crate::core::types::{
    validate_path, BranchName, Commit, ContentKind, Contents, FileContent, Oid, Reference,
    RepositoryRef, Tree, TreeEntry, TreeItem, WriteResult, BLOB_TYPE, FILE_MODE,
};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockForge {
    inner: Arc<Mutex<MockForgeInner>>,
}

#[derive(Debug, Default)]
struct MockForgeInner {
    repos: HashMap<RepositoryRef, MockRepo>,
    /// Differentiates otherwise identical commits.
    commit_seq: u64,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

#[derive(Debug, Default)]
struct MockRepo {
    default_branch: String,
    blobs: HashMap<Oid, String>,
    /// Flat trees: full path -> blob sha.
    trees: HashMap<Oid, BTreeMap<String, Oid>>,
    commits: HashMap<Oid, StoredCommit>,
    refs: BTreeMap<String, Oid>,
}

#[derive(Debug, Clone)]
struct StoredCommit {
    tree: Oid,
    parents: Vec<Oid>,
    message: String,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetBranchRef(ForgeError),
    CreateBranchRef(ForgeError),
    UpdateBranchRef(ForgeError),
    GetContents(ForgeError),
    PutContents(ForgeError),
    CreateTree(ForgeError),
    CreateCommit(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetBranchRef {
        branch: String,
    },
    CreateBranchRef {
        branch: String,
        sha: Oid,
    },
    UpdateBranchRef {
        branch: String,
        sha: Oid,
        force: bool,
    },
    GetContents {
        path: String,
        git_ref: Option<String>,
    },
    PutContents {
        path: String,
        branch: String,
        sha: Option<Oid>,
    },
    CreateTree {
        paths: Vec<String>,
        base_tree: Option<Oid>,
    },
    CreateCommit {
        message: String,
        tree: Oid,
        parents: Vec<Oid>,
    },
}

fn digest(kind: &str, payload: &str) -> Oid {
    let mut hasher = Sha256::new();
    hasher.update(format!("{} {}\0", kind, payload.len()).as_bytes());
    hasher.update(payload.as_bytes());
    // Truncate to SHA-1 width so ids look like the remote's.
    Oid::from_digest(&hasher.finalize()[..20])
}

fn unprocessable(message: impl Into<String>) -> ForgeError {
    ForgeError::RemoteError {
        status: 422,
        message: message.into(),
    }
}

impl MockRepo {
    fn new(default_branch: &str) -> Self {
        Self {
            default_branch: default_branch.to_string(),
            ..Default::default()
        }
    }

    fn put_blob(&mut self, content: &str) -> Oid {
        let sha = digest(BLOB_TYPE, content);
        self.blobs.insert(sha.clone(), content.to_string());
        sha
    }

    fn put_tree(&mut self, files: BTreeMap<String, Oid>) -> Oid {
        let sha = Self::tree_id(&files);
        self.trees.insert(sha.clone(), files);
        sha
    }

    fn tree_id<'a>(files: impl IntoIterator<Item = (&'a String, &'a Oid)>) -> Oid {
        let listing: String = files
            .into_iter()
            .map(|(path, blob)| format!("{} {} {}\t{}\n", FILE_MODE, BLOB_TYPE, blob, path))
            .collect();
        digest("tree", &listing)
    }

    fn put_commit(&mut self, seq: u64, tree: Oid, parents: Vec<Oid>, message: &str) -> Oid {
        let mut header = format!("tree {}\n", tree);
        for parent in &parents {
            header.push_str(&format!("parent {}\n", parent));
        }
        header.push_str(&format!("seq {}\n\n{}", seq, message));
        let sha = digest("commit", &header);
        self.commits.insert(
            sha.clone(),
            StoredCommit {
                tree,
                parents,
                message: message.to_string(),
            },
        );
        sha
    }

    fn commit_view(&self, sha: &Oid) -> Option<Commit> {
        self.commits.get(sha).map(|c| Commit {
            sha: sha.clone(),
            message: c.message.clone(),
            tree_sha: c.tree.clone(),
            parent_shas: c.parents.clone(),
            html_url: None,
        })
    }

    /// Files of the tree at a branch name or commit sha.
    fn files_at(&self, git_ref: &str) -> Option<&BTreeMap<String, Oid>> {
        let commit = match self.refs.get(git_ref) {
            Some(tip) => tip.clone(),
            None => Oid::new(git_ref).ok()?,
        };
        let stored = self.commits.get(&commit)?;
        self.trees.get(&stored.tree)
    }

    /// Whether `ancestor` is reachable from `descendant` through parents.
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> bool {
        let mut pending = vec![descendant.clone()];
        while let Some(sha) = pending.pop() {
            if &sha == ancestor {
                return true;
            }
            if let Some(commit) = self.commits.get(&sha) {
                pending.extend(commit.parents.iter().cloned());
            }
        }
        false
    }
}

fn file_entry(path: &str, sha: &Oid, content: Option<&String>) -> FileContent {
    FileContent {
        kind: ContentKind::File,
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        sha: sha.clone(),
        size: content.map(|c| c.len() as u64).unwrap_or(0),
        content: content.cloned(),
        encoding: None,
        html_url: None,
        download_url: None,
    }
}

/// Immediate children of `dir` ("" for the root), sorted by name.
fn list_directory(repo: &MockRepo, files: &BTreeMap<String, Oid>, dir: &str) -> Vec<FileContent> {
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    };

    let mut children: BTreeMap<String, FileContent> = BTreeMap::new();
    let mut subdirs: BTreeMap<String, BTreeMap<&String, &Oid>> = BTreeMap::new();

    for (path, blob) in files {
        let Some(rest) = path.strip_prefix(&prefix) else {
            continue;
        };
        match rest.split_once('/') {
            Some((name, _)) => {
                subdirs
                    .entry(name.to_string())
                    .or_default()
                    .insert(path, blob);
            }
            None => {
                let mut entry = file_entry(path, blob, repo.blobs.get(blob));
                entry.content = None;
                children.insert(rest.to_string(), entry);
            }
        }
    }

    for (name, nested) in subdirs {
        let path = format!("{}{}", prefix, name);
        children.insert(
            name.clone(),
            FileContent {
                kind: ContentKind::Dir,
                name,
                path,
                sha: MockRepo::tree_id(nested),
                size: 0,
                content: None,
                encoding: None,
                html_url: None,
                download_url: None,
            },
        );
    }

    children.into_values().collect()
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or extend) `branch` with one commit holding `files`.
    ///
    /// The first branch seeded in a repository becomes its default branch.
    /// If the branch exists the new commit is a child of its tip and the
    /// files are layered on its tree. Returns the new tip.
    pub fn seed_branch(&self, repo: &RepositoryRef, branch: &str, files: &[(&str, &str)]) -> Oid {
        let mut inner = self.inner.lock().unwrap();
        inner.commit_seq += 1;
        let seq = inner.commit_seq;
        let state = inner
            .repos
            .entry(repo.clone())
            .or_insert_with(|| MockRepo::new(branch));

        let parent = state.refs.get(branch).cloned();
        let mut tree_files = parent
            .as_ref()
            .and_then(|tip| state.files_at(tip.as_str()))
            .cloned()
            .unwrap_or_default();
        for (path, content) in files {
            let blob = state.put_blob(content);
            tree_files.insert(path.to_string(), blob);
        }

        let tree = state.put_tree(tree_files);
        let message = format!("Seed {}", branch);
        let tip = state.put_commit(seq, tree, parent.into_iter().collect(), &message);
        state.refs.insert(branch.to_string(), tip.clone());
        tip
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.set_fail_on(fail_on);
        self
    }

    /// Configure a failure on a shared handle.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = Some(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Current tip of a branch (for test verification).
    pub fn branch_tip(&self, repo: &RepositoryRef, branch: &str) -> Option<Oid> {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(repo)?.refs.get(branch).cloned()
    }

    /// Text of a file at a branch or commit (for test verification).
    pub fn file_at(&self, repo: &RepositoryRef, git_ref: &str, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        let state = inner.repos.get(repo)?;
        let blob = state.files_at(git_ref)?.get(path)?;
        state.blobs.get(blob).cloned()
    }

    /// A stored commit (for test verification).
    pub fn commit(&self, repo: &RepositoryRef, sha: &Oid) -> Option<Commit> {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(repo)?.commit_view(sha)
    }

    /// Number of commit objects stored, referenced or not.
    pub fn commit_count(&self, repo: &RepositoryRef) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(repo).map_or(0, |r| r.commits.len())
    }

    /// Number of tree objects stored, referenced or not.
    pub fn tree_count(&self, repo: &RepositoryRef) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(repo).map_or(0, |r| r.trees.len())
    }

    /// Record an operation and return the configured failure for it, if any.
    fn record(&self, op: MockOperation) -> Result<(), ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        let failure = match (&inner.fail_on, &op) {
            (Some(FailOn::GetBranchRef(e)), MockOperation::GetBranchRef { .. })
            | (Some(FailOn::CreateBranchRef(e)), MockOperation::CreateBranchRef { .. })
            | (Some(FailOn::UpdateBranchRef(e)), MockOperation::UpdateBranchRef { .. })
            | (Some(FailOn::GetContents(e)), MockOperation::GetContents { .. })
            | (Some(FailOn::PutContents(e)), MockOperation::PutContents { .. })
            | (Some(FailOn::CreateTree(e)), MockOperation::CreateTree { .. })
            | (Some(FailOn::CreateCommit(e)), MockOperation::CreateCommit { .. }) => {
                Some(e.clone())
            }
            _ => None,
        };
        inner.operations.push(op);
        failure.map_or(Ok(()), Err)
    }

    /// Run `f` against a repository's state.
    fn with_repo<T>(
        &self,
        repo: &RepositoryRef,
        f: impl FnOnce(&mut MockRepo, u64) -> Result<T, ForgeError>,
    ) -> Result<T, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.commit_seq += 1;
        let seq = inner.commit_seq;
        let state = inner
            .repos
            .get_mut(repo)
            .ok_or_else(|| ForgeError::NotFound(format!("repository {}", repo)))?;
        f(state, seq)
    }
}

#[async_trait]
impl GitData for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
    ) -> Result<Reference, ForgeError> {
        self.record(MockOperation::GetBranchRef {
            branch: branch.to_string(),
        })?;

        self.with_repo(repo, |state, _| {
            state
                .refs
                .get(branch.as_str())
                .map(|tip| Reference {
                    ref_name: branch.full_ref(),
                    target_sha: tip.clone(),
                })
                .ok_or_else(|| ForgeError::NotFound(branch.full_ref()))
        })
    }

    async fn create_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
        sha: &Oid,
    ) -> Result<Reference, ForgeError> {
        self.record(MockOperation::CreateBranchRef {
            branch: branch.to_string(),
            sha: sha.clone(),
        })?;

        self.with_repo(repo, |state, _| {
            if state.refs.contains_key(branch.as_str()) {
                return Err(unprocessable("Reference already exists"));
            }
            if !state.commits.contains_key(sha) {
                return Err(unprocessable("Object does not exist"));
            }
            state.refs.insert(branch.to_string(), sha.clone());
            Ok(Reference {
                ref_name: branch.full_ref(),
                target_sha: sha.clone(),
            })
        })
    }

    async fn update_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
        sha: &Oid,
        force: bool,
    ) -> Result<Reference, ForgeError> {
        self.record(MockOperation::UpdateBranchRef {
            branch: branch.to_string(),
            sha: sha.clone(),
            force,
        })?;

        self.with_repo(repo, |state, _| {
            let current = state
                .refs
                .get(branch.as_str())
                .cloned()
                .ok_or_else(|| unprocessable("Reference does not exist"))?;
            if !state.commits.contains_key(sha) {
                return Err(unprocessable("Object does not exist"));
            }
            if !force && !state.is_ancestor(&current, sha) {
                return Err(ForgeError::Conflict("Update is not a fast forward".into()));
            }
            state.refs.insert(branch.to_string(), sha.clone());
            Ok(Reference {
                ref_name: branch.full_ref(),
                target_sha: sha.clone(),
            })
        })
    }

    async fn get_contents(
        &self,
        repo: &RepositoryRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Contents, ForgeError> {
        self.record(MockOperation::GetContents {
            path: path.to_string(),
            git_ref: git_ref.map(str::to_string),
        })?;

        self.with_repo(repo, |state, _| {
            let git_ref = git_ref.unwrap_or(state.default_branch.as_str()).to_string();
            let files = state
                .files_at(&git_ref)
                .ok_or_else(|| ForgeError::NotFound(format!("No commit found for the ref {}", git_ref)))?;

            let path = path.trim_matches('/');
            if let Some(blob) = files.get(path) {
                return Ok(Contents::File(file_entry(path, blob, state.blobs.get(blob))));
            }

            let listing = list_directory(state, files, path);
            if listing.is_empty() && !path.is_empty() {
                return Err(ForgeError::NotFound(path.to_string()));
            }
            Ok(Contents::Directory(listing))
        })
    }

    async fn put_contents(
        &self,
        repo: &RepositoryRef,
        request: PutContentsRequest,
    ) -> Result<WriteResult, ForgeError> {
        self.record(MockOperation::PutContents {
            path: request.path.clone(),
            branch: request.branch.to_string(),
            sha: request.sha.clone(),
        })?;

        self.with_repo(repo, |state, seq| {
            validate_path(&request.path).map_err(|e| unprocessable(e.to_string()))?;
            let branch = request.branch.as_str();
            let tip = state
                .refs
                .get(branch)
                .cloned()
                .ok_or_else(|| ForgeError::NotFound(format!("Branch {} not found", branch)))?;
            let mut files = state.files_at(tip.as_str()).cloned().unwrap_or_default();

            match (files.get(&request.path), &request.sha) {
                (Some(current), Some(given)) if current == given => {}
                (Some(_), None) => {
                    return Err(ForgeError::Conflict(format!(
                        "{} exists and sha wasn't supplied",
                        request.path
                    )))
                }
                (Some(_), Some(given)) => {
                    return Err(ForgeError::Conflict(format!(
                        "{} does not match {}",
                        request.path, given
                    )))
                }
                (None, Some(given)) => {
                    return Err(ForgeError::Conflict(format!(
                        "{} does not exist, so it does not match {}",
                        request.path, given
                    )))
                }
                (None, None) => {}
            }

            let blob = state.put_blob(&request.content);
            files.insert(request.path.clone(), blob.clone());
            let tree = state.put_tree(files);
            let sha = state.put_commit(seq, tree, vec![tip], &request.message);
            state.refs.insert(branch.to_string(), sha.clone());

            let mut content = file_entry(&request.path, &blob, state.blobs.get(&blob));
            content.content = None;
            let commit = state
                .commit_view(&sha)
                .ok_or_else(|| unprocessable("commit vanished"))?;
            Ok(WriteResult {
                content: Some(content),
                commit,
            })
        })
    }

    async fn create_tree(
        &self,
        repo: &RepositoryRef,
        entries: &[TreeEntry],
        base_tree: Option<&Oid>,
    ) -> Result<Tree, ForgeError> {
        self.record(MockOperation::CreateTree {
            paths: entries.iter().map(|e| e.path.clone()).collect(),
            base_tree: base_tree.cloned(),
        })?;

        self.with_repo(repo, |state, _| {
            // Validate everything before storing anything.
            for entry in entries {
                validate_path(&entry.path).map_err(|e| unprocessable(e.to_string()))?;
            }

            let mut files = match base_tree {
                None => BTreeMap::new(),
                Some(base) => {
                    let tree = state.commits.get(base).map_or(base, |c| &c.tree);
                    state
                        .trees
                        .get(tree)
                        .cloned()
                        .ok_or_else(|| unprocessable("base_tree is not a valid tree"))?
                }
            };
            for entry in entries {
                let blob = state.put_blob(&entry.content);
                files.insert(entry.path.clone(), blob);
            }

            let items = files
                .iter()
                .map(|(path, blob)| TreeItem {
                    path: path.clone(),
                    mode: FILE_MODE.to_string(),
                    kind: BLOB_TYPE.to_string(),
                    sha: blob.clone(),
                })
                .collect();
            let sha = state.put_tree(files);
            Ok(Tree {
                sha,
                entries: items,
            })
        })
    }

    async fn create_commit(
        &self,
        repo: &RepositoryRef,
        request: CreateCommitRequest,
    ) -> Result<Commit, ForgeError> {
        self.record(MockOperation::CreateCommit {
            message: request.message.clone(),
            tree: request.tree.clone(),
            parents: request.parents.clone(),
        })?;

        self.with_repo(repo, |state, seq| {
            if !state.trees.contains_key(&request.tree) {
                return Err(unprocessable("Tree SHA does not exist"));
            }
            if let Some(missing) = request
                .parents
                .iter()
                .find(|p| !state.commits.contains_key(*p))
            {
                return Err(unprocessable(format!(
                    "Parent SHA {} does not exist or is not a commit object",
                    missing
                )));
            }
            let sha = state.put_commit(seq, request.tree, request.parents, &request.message);
            state
                .commit_view(&sha)
                .ok_or_else(|| unprocessable("commit vanished"))
        })
    }
}
