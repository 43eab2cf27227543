//! forge::github
//!
//! GitHub implementation of [`GitData`] and [`Forge`] over the REST API.
//!
//! # Design
//!
//! One [`reqwest::Client`] is built per forge with the bearer token, the
//! API-version accept header and the user agent installed as default
//! headers. Every trait method is exactly one request: no retry, no
//! backoff, no pagination beyond the page the caller asked for.
//!
//! # Error Mapping
//!
//! | Status | Error |
//! |--------|-------|
//! | 401 | `AuthFailed` |
//! | 403 | `RateLimited` when the rate-limit budget is exhausted, else `AuthFailed` |
//! | 404 | `NotFound` |
//! | 409 | `Conflict` |
//! | 422 | `Conflict` for fast-forward and sha mismatches, else `RemoteError` |
//! | 429 | `RateLimited` |
//! | other | `RemoteError` |
//!
//! The body's `message` field is carried in every variant that has text.
//!
//! # Example
//!
//! ```ignore
//! use hubkit::forge::github::GitHubForge;
//! use hubkit::forge::GitData;
//! use hubkit::core::types::{BranchName, RepositoryRef};
//!
//! let forge = GitHubForge::new("ghp_xxx")?;
//! let repo = RepositoryRef::new("octocat", "hello-world")?;
//! let tip = forge.get_branch_ref(&repo, &BranchName::new("main")?).await?;
//! println!("main is at {}", tip.target_sha);
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{
    clamp_per_page, CommitSummary, CreateGistRequest, CreateIssueRequest, CreatePrRequest,
    CreateRepositoryRequest, Gist, Issue, IssueComment, IssueStateFilter, ListCommitsOpts,
    ListIssuesOpts, PullRequest, Repository, SearchKind, SearchQuery, SearchResults,
    SortDirection, UpdateIssueRequest,
};
use super::traits::{CreateCommitRequest, Forge, ForgeError, GitData, PutContentsRequest};
use crate::core::config::Config;
use crate::core::types::{
    BranchName, Commit, ContentKind, Contents, FileContent, Oid, Reference, RepositoryRef, Tree,
    TreeEntry, WriteResult,
};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default User-Agent header value.
pub const DEFAULT_USER_AGENT: &str = concat!("hubkit/", env!("CARGO_PKG_VERSION"));

/// REST API version requested on every call.
const API_VERSION: &str = "2022-11-28";

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client with authentication headers installed
    client: Client,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: Url,
    /// User-Agent sent with every request
    user_agent: String,
}

// Custom Debug so the client's default headers (which hold the token) never print
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("api_base", &self.api_base.as_str())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge against `api.github.com`.
    ///
    /// # Errors
    ///
    /// - `AuthRequired` if the token is empty
    /// - `Configuration` if the token cannot be sent as a header
    pub fn new(token: &str) -> Result<Self, ForgeError> {
        Self::with_options(token, DEFAULT_API_BASE, DEFAULT_USER_AGENT)
    }

    /// Create a forge against a custom API base (GitHub Enterprise, tests).
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self, ForgeError> {
        Self::with_options(token, api_base, DEFAULT_USER_AGENT)
    }

    /// Create a forge from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ForgeError> {
        Self::with_options(config.token(), config.api_base(), config.user_agent())
    }

    /// Create a forge with every setting explicit.
    pub fn with_options(token: &str, api_base: &str, user_agent: &str) -> Result<Self, ForgeError> {
        if token.trim().is_empty() {
            return Err(ForgeError::AuthRequired);
        }

        let api_base = Url::parse(api_base).map_err(|e| {
            ForgeError::Configuration(format!("invalid API base '{}': {}", api_base, e))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(ForgeError::Configuration(format!(
                "API base '{}' cannot carry a path",
                api_base
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| ForgeError::Configuration("token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        let agent = HeaderValue::from_str(user_agent).map_err(|_| {
            ForgeError::Configuration(format!("invalid user agent '{}'", user_agent))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, agent);
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ForgeError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_base,
            user_agent: user_agent.to_string(),
        })
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    /// Build a URL from path segments under the API base.
    ///
    /// Each segment is percent-encoded on its own.
    fn url<I>(&self, segments: I) -> Result<Url, ForgeError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ForgeError::Configuration(format!("API base '{}' cannot carry a path", self.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build URL for a repository endpoint; `tail` is split on `/`.
    fn repo_url(&self, repo: &RepositoryRef, tail: &str) -> Result<Url, ForgeError> {
        let head = ["repos", repo.owner.as_str(), repo.repo.as_str()];
        self.url(
            head.into_iter()
                .chain(tail.split('/').filter(|segment| !segment.is_empty())),
        )
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "github request");
        self.client.request(method, url)
    }

    /// Send a request and decode the success body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ForgeError> {
        let response = request
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ForgeError> {
        self.execute(self.request(Method::GET, url)).await
    }

    async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T, ForgeError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(method, url).json(body)).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::RemoteError {
                status: status.as_u16(),
                message: format!("failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }

    /// Map a non-success response to a `ForgeError`.
    async fn error_from_response(response: Response, status: StatusCode) -> ForgeError {
        // Read headers before the body consumes the response.
        let headers = response.headers();
        let required_permissions = header_string(headers, "X-Accepted-GitHub-Permissions");
        let rate_limit_exhausted =
            header_string(headers, "X-RateLimit-Remaining").as_deref() == Some("0");

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<GitHubErrorResponse>(&body) {
            Ok(err) => err.message,
            Err(_) if !body.trim().is_empty() => body.trim().to_string(),
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => {
                ForgeError::AuthFailed(format!("invalid or expired token: {}", message))
            }
            StatusCode::FORBIDDEN if rate_limit_exhausted => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("permission denied: {}", message);
                if let Some(perms) = required_permissions.filter(|p| !p.is_empty()) {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::CONFLICT => ForgeError::Conflict(message),
            StatusCode::UNPROCESSABLE_ENTITY if is_conflict_message(&message) => {
                ForgeError::Conflict(message)
            }
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::RemoteError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::RemoteError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Whether a 422 message reports a rejected fast-forward or a stale/missing
/// conditional-write sha.
///
/// GitHub quotes the field name (`"sha" wasn't supplied.`), so quotes are
/// dropped before matching.
fn is_conflict_message(message: &str) -> bool {
    let message: String = message
        .chars()
        .filter(|c| *c != '"')
        .collect::<String>()
        .to_ascii_lowercase();
    [
        "fast forward",
        "fast-forward",
        "does not match",
        "sha wasn't supplied",
        "sha was not supplied",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

/// Decode a base64 payload to text.
///
/// GitHub wraps base64 content at 60 columns, so whitespace is stripped
/// first. Returns `None` if the payload is not base64 or not UTF-8.
pub fn decode_content(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact).ok()?;
    String::from_utf8(bytes).ok()
}

#[async_trait]
impl GitData for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn get_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
    ) -> Result<Reference, ForgeError> {
        let url = self.repo_url(repo, &format!("git/refs/{}", branch.ref_path()))?;
        let lookup: RefLookup = self.get(url).await?;

        // The plural refs endpoint answers a prefix match with a list.
        let wanted = branch.full_ref();
        let found = match lookup {
            RefLookup::Single(r) => Some(r).filter(|r| r.ref_name == wanted),
            RefLookup::Many(refs) => refs.into_iter().find(|r| r.ref_name == wanted),
        };
        found
            .map(Into::into)
            .ok_or_else(|| ForgeError::NotFound(format!("{} in {}", wanted, repo)))
    }

    async fn create_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
        sha: &Oid,
    ) -> Result<Reference, ForgeError> {
        let url = self.repo_url(repo, "git/refs")?;
        let full_ref = branch.full_ref();
        let body = CreateRefBody {
            ref_name: &full_ref,
            sha: sha.as_str(),
        };
        let created: GitHubRef = self.send_json(Method::POST, url, &body).await?;
        Ok(created.into())
    }

    async fn update_branch_ref(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
        sha: &Oid,
        force: bool,
    ) -> Result<Reference, ForgeError> {
        let url = self.repo_url(repo, &format!("git/refs/{}", branch.ref_path()))?;
        let body = UpdateRefBody {
            sha: sha.as_str(),
            force,
        };
        let updated: GitHubRef = self.send_json(Method::PATCH, url, &body).await?;
        Ok(updated.into())
    }

    async fn get_contents(
        &self,
        repo: &RepositoryRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Contents, ForgeError> {
        let url = self.repo_url(repo, &format!("contents/{}", path))?;
        let mut request = self.request(Method::GET, url);
        if let Some(git_ref) = git_ref {
            request = request.query(&[("ref", git_ref)]);
        }

        let payload: ContentsPayload = self.execute(request).await?;
        Ok(match payload {
            ContentsPayload::Directory(entries) => {
                Contents::Directory(entries.into_iter().map(FileContent::from).collect())
            }
            ContentsPayload::File(entry) => Contents::File(entry.into_decoded()),
        })
    }

    async fn put_contents(
        &self,
        repo: &RepositoryRef,
        request: PutContentsRequest,
    ) -> Result<WriteResult, ForgeError> {
        let url = self.repo_url(repo, &format!("contents/{}", request.path))?;
        let body = PutContentsBody {
            message: &request.message,
            content: STANDARD.encode(request.content.as_bytes()),
            branch: request.branch.as_str(),
            sha: request.sha.as_ref().map(Oid::as_str),
        };
        let written: GitHubWriteResponse = self.send_json(Method::PUT, url, &body).await?;
        Ok(WriteResult {
            content: written.content.map(FileContent::from),
            commit: written.commit.into(),
        })
    }

    async fn create_tree(
        &self,
        repo: &RepositoryRef,
        entries: &[TreeEntry],
        base_tree: Option<&Oid>,
    ) -> Result<Tree, ForgeError> {
        let url = self.repo_url(repo, "git/trees")?;
        let body = CreateTreeBody {
            tree: entries,
            base_tree: base_tree.map(Oid::as_str),
        };
        self.send_json(Method::POST, url, &body).await
    }

    async fn create_commit(
        &self,
        repo: &RepositoryRef,
        request: CreateCommitRequest,
    ) -> Result<Commit, ForgeError> {
        let url = self.repo_url(repo, "git/commits")?;
        let body = CreateCommitBody {
            message: &request.message,
            tree: request.tree.as_str(),
            parents: request.parents.iter().map(Oid::as_str).collect(),
        };
        let commit: GitHubCommit = self.send_json(Method::POST, url, &body).await?;
        Ok(commit.into())
    }
}

#[async_trait]
impl Forge for GitHubForge {
    async fn fork_repository(
        &self,
        repo: &RepositoryRef,
        organization: Option<&str>,
    ) -> Result<Repository, ForgeError> {
        let url = self.repo_url(repo, "forks")?;
        let body = ForkBody { organization };
        self.send_json(Method::POST, url, &body).await
    }

    async fn create_repository(
        &self,
        request: CreateRepositoryRequest,
    ) -> Result<Repository, ForgeError> {
        let url = self.url(["user", "repos"])?;
        self.send_json(Method::POST, url, &request).await
    }

    async fn list_commits(
        &self,
        repo: &RepositoryRef,
        opts: ListCommitsOpts,
    ) -> Result<Vec<CommitSummary>, ForgeError> {
        let url = self.repo_url(repo, "commits")?;
        let opts = ListCommitsOpts {
            per_page: clamp_per_page(opts.per_page),
            ..opts
        };
        self.execute(self.request(Method::GET, url).query(&opts))
            .await
    }

    async fn create_issue(
        &self,
        repo: &RepositoryRef,
        request: CreateIssueRequest,
    ) -> Result<Issue, ForgeError> {
        let url = self.repo_url(repo, "issues")?;
        self.send_json(Method::POST, url, &request).await
    }

    async fn get_issue(&self, repo: &RepositoryRef, number: u64) -> Result<Issue, ForgeError> {
        let url = self.repo_url(repo, &format!("issues/{}", number))?;
        self.get(url).await
    }

    async fn list_issues(
        &self,
        repo: &RepositoryRef,
        opts: ListIssuesOpts,
    ) -> Result<Vec<Issue>, ForgeError> {
        let url = self.repo_url(repo, "issues")?;
        let labels = (!opts.labels.is_empty()).then(|| opts.labels.join(","));
        let query = ListIssuesQuery {
            state: opts.state,
            labels,
            sort: opts.sort,
            direction: opts.direction,
            since: opts.since,
            page: opts.page,
            per_page: clamp_per_page(opts.per_page),
        };
        self.execute(self.request(Method::GET, url).query(&query))
            .await
    }

    async fn update_issue(
        &self,
        repo: &RepositoryRef,
        request: UpdateIssueRequest,
    ) -> Result<Issue, ForgeError> {
        let url = self.repo_url(repo, &format!("issues/{}", request.number))?;
        self.send_json(Method::PATCH, url, &request).await
    }

    async fn add_issue_comment(
        &self,
        repo: &RepositoryRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, ForgeError> {
        let url = self.repo_url(repo, &format!("issues/{}/comments", number))?;
        self.send_json(Method::POST, url, &CommentBody { body }).await
    }

    async fn create_pull_request(
        &self,
        repo: &RepositoryRef,
        request: CreatePrRequest,
    ) -> Result<PullRequest, ForgeError> {
        let url = self.repo_url(repo, "pulls")?;
        self.send_json(Method::POST, url, &request).await
    }

    async fn get_pull_request(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<PullRequest, ForgeError> {
        let url = self.repo_url(repo, &format!("pulls/{}", number))?;
        self.get(url).await
    }

    async fn create_gist(&self, request: CreateGistRequest) -> Result<Gist, ForgeError> {
        let url = self.url(["gists"])?;
        self.send_json(Method::POST, url, &request).await
    }

    async fn search(
        &self,
        kind: SearchKind,
        query: SearchQuery,
    ) -> Result<SearchResults, ForgeError> {
        let url = self.url(["search", kind.path()])?;
        let query = SearchQuery {
            per_page: clamp_per_page(query.per_page),
            ..query
        };
        self.execute(self.request(Method::GET, url).query(&query))
            .await
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a ref.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

/// Request body for moving a ref.
#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// Request body for the contents PUT.
#[derive(Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Request body for creating a tree.
#[derive(Serialize)]
struct CreateTreeBody<'a> {
    tree: &'a [TreeEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    base_tree: Option<&'a str>,
}

/// Request body for creating a commit.
#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

/// Request body for forking.
#[derive(Serialize)]
struct ForkBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<&'a str>,
}

/// Request body for an issue comment.
#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

/// Query string for listing issues (labels are comma separated).
#[derive(Serialize)]
struct ListIssuesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<IssueStateFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    direction: Option<SortDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u32>,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// A sha wrapper as nested in ref and commit payloads.
#[derive(Deserialize)]
struct GitHubObject {
    sha: Oid,
}

/// GitHub ref format.
#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
    object: GitHubObject,
}

impl From<GitHubRef> for Reference {
    fn from(r: GitHubRef) -> Self {
        Reference {
            ref_name: r.ref_name,
            target_sha: r.object.sha,
        }
    }
}

/// Exact match, or the prefix-match list the plural endpoint falls back to.
#[derive(Deserialize)]
#[serde(untagged)]
enum RefLookup {
    Single(GitHubRef),
    Many(Vec<GitHubRef>),
}

/// GitHub commit format (git data and contents APIs).
#[derive(Deserialize)]
struct GitHubCommit {
    sha: Oid,
    message: String,
    tree: GitHubObject,
    #[serde(default)]
    parents: Vec<GitHubObject>,
    #[serde(default)]
    html_url: Option<String>,
}

impl From<GitHubCommit> for Commit {
    fn from(c: GitHubCommit) -> Self {
        Commit {
            sha: c.sha,
            message: c.message,
            tree_sha: c.tree.sha,
            parent_shas: c.parents.into_iter().map(|p| p.sha).collect(),
            html_url: c.html_url,
        }
    }
}

/// GitHub contents entry.
#[derive(Deserialize)]
struct GitHubContent {
    #[serde(rename = "type")]
    kind: ContentKind,
    name: String,
    path: String,
    sha: Oid,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

impl GitHubContent {
    /// Convert, decoding base64 text content for the single-file case.
    fn into_decoded(self) -> FileContent {
        let decoded = match (&self.encoding, &self.content) {
            (Some(encoding), Some(raw)) if encoding == "base64" => decode_content(raw),
            _ => None,
        };
        let mut file = FileContent::from(self);
        if let Some(text) = decoded {
            file.content = Some(text);
            file.encoding = None;
        }
        file
    }
}

impl From<GitHubContent> for FileContent {
    fn from(c: GitHubContent) -> Self {
        FileContent {
            kind: c.kind,
            name: c.name,
            path: c.path,
            sha: c.sha,
            size: c.size,
            content: c.content,
            encoding: c.encoding,
            html_url: c.html_url,
            download_url: c.download_url,
        }
    }
}

/// A contents lookup answers a directory with a list, anything else with an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsPayload {
    Directory(Vec<GitHubContent>),
    File(GitHubContent),
}

/// Response of the contents PUT.
#[derive(Deserialize)]
struct GitHubWriteResponse {
    content: Option<GitHubContent>,
    commit: GitHubCommit,
}
